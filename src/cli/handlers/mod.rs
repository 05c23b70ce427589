mod exchange;
pub use exchange::{cmd_apply, cmd_export, cmd_import};

use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde_json::json;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::store::{load_store, save_store};
use crate::model::config::Config;
use crate::model::task::Task;
use crate::ops::fields;
use crate::ops::priority::{self, Bucket};
use crate::ops::project_ops::{self, merge_projects, same_name};
use crate::ops::task_ops::{self, TaskDraft};
use crate::ops::{OpError, check};
use crate::util::clock::{Clock, SystemClock, iso};
use crate::util::ids::UuidSource;

/// Resolved settings shared by every command.
pub struct Context {
    pub data_file: PathBuf,
    pub config: Config,
    pub config_file: PathBuf,
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config_file = config_io::config_path();
    let config = config_io::read_config_from(&config_file)?;
    let env_file = std::env::var("TASKLINE_FILE").ok();
    let data_file = resolve_data_file(cli.data_file.as_deref(), env_file.as_deref(), &config);
    tracing::debug!(path = %data_file.display(), "using data file");

    let ctx = Context {
        data_file,
        config,
        config_file,
        json: cli.json,
    };

    match cli.command {
        // Read commands
        Commands::List(args) => cmd_list(&ctx, args),
        Commands::Check => cmd_check(&ctx),

        // Write commands
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::Done(args) => cmd_set_done(&ctx, &args.id, true),
        Commands::Reopen(args) => cmd_set_done(&ctx, &args.id, false),
        Commands::Projects(args) => cmd_projects(&ctx, args),

        // Exchange
        Commands::Export(args) => cmd_export(&ctx, args),
        Commands::Import(args) => cmd_import(&ctx, args),
        Commands::Apply(args) => cmd_apply(&ctx, args),
    }
}

/// `--file`, then `TASKLINE_FILE`, then the config. Blank values are skipped.
pub fn resolve_data_file(flag: Option<&str>, env: Option<&str>, config: &Config) -> PathBuf {
    let given = |s: &&str| !s.trim().is_empty();
    flag.filter(given)
        .or(env.filter(given))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&config.store.path))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_iso() -> String {
    iso(SystemClock.now())
}

/// Save with the project list topped up from the tasks.
fn save(path: &Path, tasks: &[Task], projects: &[String]) -> Result<(), Box<dyn Error>> {
    save_store(path, tasks, &merge_projects(projects, tasks))?;
    Ok(())
}

/// Run a CLI value through the same field rules operations use.
fn check_field(name: &str, value: serde_json::Value) -> Result<(), OpError> {
    if let Some(spec) = fields::lookup(name) {
        spec.validate(&value)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context, args: ListArgs) -> Result<(), Box<dyn Error>> {
    let store = load_store(&ctx.data_file)?;
    let now = Local::now();
    let ranked: Vec<(Bucket, &Task)> = priority::rank(&store.tasks, &now)
        .into_iter()
        .filter(|(bucket, _)| args.all || *bucket != Bucket::Done)
        .filter(|(_, task)| match args.project.as_deref() {
            Some(project) => task.project.as_deref().is_some_and(|p| same_name(p, project)),
            None => true,
        })
        .collect();

    if ctx.json {
        let out: Vec<TaskJson> = ranked
            .iter()
            .map(|(bucket, task)| task_to_json(*bucket, task, &now))
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if ranked.is_empty() {
        println!("no tasks");
    } else {
        for line in format_listing(&ranked) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_check(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let store = load_store(&ctx.data_file)?;
    let result = check::check_tasks(&store.tasks, &store.projects);

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for line in format_check(&result) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> Result<(), Box<dyn Error>> {
    let store = load_store(&ctx.data_file)?;

    if let Some(due) = &args.due {
        check_field("due", json!(due))?;
    }
    for (name, value) in [
        ("importance", args.importance),
        ("urgency", args.urgency),
        ("effort", args.effort),
    ] {
        if let Some(value) = value {
            check_field(name, json!(value))?;
        }
    }

    let draft = TaskDraft {
        project: args.project,
        due: args.due,
        importance: args.importance,
        urgency: args.urgency,
        effort: args.effort,
        tags: (!args.tags.is_empty()).then_some(args.tags),
        notes: args.notes,
        ..TaskDraft::titled(&args.title)
    };
    let task = task_ops::create_task(draft, &now_iso(), &UuidSource)?;
    let id = task.id.clone().unwrap_or_default();

    let mut tasks = store.tasks;
    tasks.push(task);
    save(&ctx.data_file, &tasks, &store.projects)?;

    if ctx.json {
        println!("{}", json!({ "id": id }));
    } else {
        println!("{}", id);
    }
    Ok(())
}

fn cmd_set_done(ctx: &Context, id: &str, done: bool) -> Result<(), Box<dyn Error>> {
    let store = load_store(&ctx.data_file)?;
    let tasks = task_ops::set_done(&store.tasks, id, done, &now_iso())?;
    save(&ctx.data_file, &tasks, &store.projects)?;
    if ctx.json {
        println!("{}", json!({ "id": id, "done": done }));
    } else {
        let title = task_ops::find_task(&tasks, id)
            .map(|t| t.title.as_str())
            .unwrap_or_default();
        println!("{} {} {}", if done { "done:" } else { "reopened:" }, id, title);
    }
    Ok(())
}

fn cmd_projects(ctx: &Context, args: ProjectsCmd) -> Result<(), Box<dyn Error>> {
    let store = load_store(&ctx.data_file)?;
    match args.action.unwrap_or(ProjectsAction::List) {
        ProjectsAction::List => {
            let rows: Vec<ProjectJson> = store
                .projects
                .iter()
                .map(|name| {
                    let tasks = store.tasks.iter().filter(|t| t.in_project(name));
                    ProjectJson {
                        name: name.clone(),
                        open: tasks.clone().filter(|t| !t.done).count(),
                        total: tasks.count(),
                    }
                })
                .collect();
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("no projects");
            } else {
                for row in &rows {
                    println!("{}  {}/{} open", row.name, row.open, row.total);
                }
            }
        }
        ProjectsAction::Add(arg) => {
            let added = project_ops::add_project(&store.projects, &arg.name)?;
            save(&ctx.data_file, &store.tasks, &added.projects)?;
            if ctx.json {
                println!("{}", json!({ "name": added.name }));
            } else {
                println!("added project: {}", added.name);
            }
        }
        ProjectsAction::Rename(arg) => {
            let renamed = project_ops::rename_project(
                &store.projects,
                &store.tasks,
                &arg.old,
                &arg.new,
                &now_iso(),
            )?;
            save(&ctx.data_file, &renamed.tasks, &renamed.projects)?;
            if ctx.json {
                println!("{}", json!({ "name": renamed.name, "from": arg.old.trim() }));
            } else {
                println!("renamed project: {} -> {}", arg.old.trim(), renamed.name);
            }
        }
        ProjectsAction::Rm(arg) => {
            let deleted =
                project_ops::delete_project(&store.projects, &store.tasks, &arg.name, &now_iso());
            save(&ctx.data_file, &deleted.tasks, &deleted.projects)?;
            if ctx.json {
                println!("{}", json!({ "name": arg.name.trim(), "removed": true }));
            } else {
                println!("removed project: {}", arg.name.trim());
            }
        }
    }
    Ok(())
}
