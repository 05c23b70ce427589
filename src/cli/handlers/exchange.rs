use std::collections::HashMap;
use std::error::Error;
use std::io::Read;

use crate::cli::commands::{ApplyArgs, ExportArgs, ImportArgs};
use crate::cli::handlers::{Context, save};
use crate::cli::output::ChangeJson;
use crate::io::config_io;
use crate::io::store::load_store;
use crate::model::task::Task;
use crate::ops::apply::apply_batch;
use crate::ops::exchange::{self, Briefing, ImportContext, ImportKind};
use crate::util::clock::SystemClock;
use crate::util::ids::UuidSource;

pub fn cmd_export(ctx: &Context, args: ExportArgs) -> Result<(), Box<dyn Error>> {
    let store = load_store(&ctx.data_file)?;
    let briefing = if args.briefing {
        config_io::load_briefing(&ctx.config, &ctx.config_file)?
    } else {
        Briefing::default()
    };
    let export = exchange::build_export_with(&store.tasks, &store.projects, &briefing)?;

    let text = if args.briefing {
        export.briefing
    } else if args.open {
        export.open_tasks
    } else {
        export.full_snapshot
    };
    println!("{}", text);
    Ok(())
}

pub fn cmd_import(ctx: &Context, args: ImportArgs) -> Result<(), Box<dyn Error>> {
    let raw = read_input(&args.input)?;
    let store = load_store(&ctx.data_file)?;
    let import_ctx = ImportContext {
        base_tasks: &store.tasks,
        base_projects: &store.projects,
        clock: &SystemClock,
        ids: &UuidSource,
    };
    let outcome = exchange::parse_import(&raw, &import_ctx)?;
    let kind = match outcome.kind {
        ImportKind::Records => "records",
        ImportKind::Operations => "operations",
    };
    finish(ctx, kind, &store.tasks, outcome.tasks, outcome.projects, args.dry_run)
}

pub fn cmd_apply(ctx: &Context, args: ApplyArgs) -> Result<(), Box<dyn Error>> {
    let raw = read_input(&args.input)?;
    let batch: serde_json::Value = serde_json::from_str(raw.trim())
        .map_err(|e| format!("could not parse batch from {}: {}", args.input, e))?;
    let store = load_store(&ctx.data_file)?;
    let applied = apply_batch(&batch, &store.tasks, &store.projects, &SystemClock, &UuidSource)?;
    finish(ctx, "operations", &store.tasks, applied.tasks, applied.projects, args.dry_run)
}

/// Report what changed and save unless this is a dry run.
fn finish(
    ctx: &Context,
    kind: &'static str,
    before: &[Task],
    tasks: Vec<Task>,
    projects: Vec<String>,
    dry_run: bool,
) -> Result<(), Box<dyn Error>> {
    let (added, changed) = diff_tasks(before, &tasks);
    if !dry_run {
        save(&ctx.data_file, &tasks, &projects)?;
    }

    if ctx.json {
        let report = ChangeJson {
            kind,
            tasks: tasks.len(),
            projects: projects.len(),
            added,
            changed,
            dry_run,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let verb = if dry_run { "would import" } else { "imported" };
        println!(
            "{} {}: {} tasks, {} projects ({} added, {} changed)",
            verb,
            kind,
            tasks.len(),
            projects.len(),
            added.len(),
            changed.len()
        );
    }
    Ok(())
}

/// Ids of tasks that are new in `after`, and of tasks that differ.
fn diff_tasks(before: &[Task], after: &[Task]) -> (Vec<String>, Vec<String>) {
    let old: HashMap<&str, &Task> = before
        .iter()
        .filter_map(|t| t.id.as_deref().map(|id| (id, t)))
        .collect();
    let mut added = Vec::new();
    let mut changed = Vec::new();
    for task in after {
        let Some(id) = task.id.as_deref() else {
            continue;
        };
        match old.get(id) {
            None => added.push(id.to_string()),
            Some(prev) if *prev != task => changed.push(id.to_string()),
            Some(_) => {}
        }
    }
    (added, changed)
}

/// Read a file, or stdin for `-`.
fn read_input(file: &str) -> Result<String, Box<dyn Error>> {
    if file == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(file).map_err(|e| format!("could not read {}: {}", file, e).into())
}
