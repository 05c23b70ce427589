use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tl", about = concat!("taskline v", env!("CARGO_PKG_VERSION"), " - tasks in JSONL, planned with an assistant"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Data file (default: $TASKLINE_FILE, then the config, then tasks.jsonl)
    #[arg(id = "data_file", short = 'f', long = "file", value_name = "PATH", global = true)]
    pub data_file: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List tasks ranked by due date and priority
    List(ListArgs),
    /// Add a task
    Add(AddArgs),
    /// Mark a task done
    Done(IdArg),
    /// Mark a task not done
    Reopen(IdArg),
    /// List projects, or add, rename and remove them
    Projects(ProjectsCmd),
    /// Print a snapshot for the assistant
    Export(ExportArgs),
    /// Import records or an operation batch
    Import(ImportArgs),
    /// Apply an operation batch
    Apply(ApplyArgs),
    /// Validate the data file
    Check,
}

// ---------------------------------------------------------------------------
// Task commands
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Include done tasks
    #[arg(long)]
    pub all: bool,
    /// Only tasks in this project
    #[arg(long)]
    pub project: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Project name
    #[arg(long)]
    pub project: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    /// Importance, 1-5
    #[arg(long)]
    pub importance: Option<f64>,
    /// Urgency, 1-5
    #[arg(long)]
    pub urgency: Option<f64>,
    /// Effort, 1-10
    #[arg(long)]
    pub effort: Option<f64>,
    /// Tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct IdArg {
    /// Task ID
    pub id: String,
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ProjectsCmd {
    #[command(subcommand)]
    pub action: Option<ProjectsAction>,
}

#[derive(Subcommand)]
pub enum ProjectsAction {
    /// List projects (default)
    List,
    /// Declare a project
    Add(ProjectNameArg),
    /// Rename a project and move its tasks
    Rename(ProjectRenameArgs),
    /// Remove a project; its tasks are kept without a project
    Rm(ProjectNameArg),
}

#[derive(Args)]
pub struct ProjectNameArg {
    /// Project name
    pub name: String,
}

#[derive(Args)]
pub struct ProjectRenameArgs {
    /// Current name
    pub old: String,
    /// New name
    pub new: String,
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ExportArgs {
    /// Leave out done tasks
    #[arg(long, conflicts_with = "briefing")]
    pub open: bool,
    /// Print the briefing text instead of the records
    #[arg(long)]
    pub briefing: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    /// File to read, or - for stdin
    #[arg(value_name = "FILE")]
    pub input: String,
    /// Show what would change without writing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// File holding the batch, or - for stdin
    #[arg(value_name = "FILE")]
    pub input: String,
    /// Show what would change without writing
    #[arg(long)]
    pub dry_run: bool,
}
