use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::model::task::Task;
use crate::ops::check::{CheckError, CheckResult, CheckWarning};
use crate::ops::priority::{Bucket, Quadrant, quadrant, score};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson<'a> {
    pub bucket: Bucket,
    pub quadrant: Quadrant,
    pub score: i64,
    #[serde(flatten)]
    pub task: &'a Task,
}

#[derive(Serialize)]
pub struct ProjectJson {
    pub name: String,
    pub open: usize,
    pub total: usize,
}

#[derive(Serialize)]
pub struct ChangeJson {
    pub kind: &'static str,
    pub tasks: usize,
    pub projects: usize,
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub dry_run: bool,
}

pub fn task_to_json<'a, Tz: TimeZone>(
    bucket: Bucket,
    task: &'a Task,
    now: &DateTime<Tz>,
) -> TaskJson<'a> {
    TaskJson {
        bucket,
        quadrant: quadrant(task, now),
        score: score(task),
        task,
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Format a single task as a one-line summary
pub fn format_task_line(task: &Task) -> String {
    let mark = if task.done { 'x' } else { ' ' };
    let id_str = task
        .id
        .as_ref()
        .map(|id| format!("{} ", id))
        .unwrap_or_default();
    let mut line = format!("[{}] {}{}", mark, id_str, task.title);
    if let Some(project) = &task.project {
        line.push_str(&format!(" @{}", project));
    }
    if let Some(due) = &task.due {
        line.push_str(&format!(" due {}", due));
    }
    for tag in &task.tags {
        line.push_str(&format!(" #{}", tag));
    }
    line.push_str(&format!("  ({})", score(task)));
    line
}

/// Format ranked tasks under one header per bucket
pub fn format_listing(ranked: &[(Bucket, &Task)]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = None;
    for (bucket, task) in ranked {
        if current != Some(*bucket) {
            if current.is_some() {
                lines.push(String::new());
            }
            lines.push(format!("== {} ==", bucket));
            current = Some(*bucket);
        }
        lines.push(format!("  {}", format_task_line(task)));
    }
    lines
}

/// Format the check report
pub fn format_check(result: &CheckResult) -> Vec<String> {
    let mut lines = vec![format!(
        "{} tasks ({} open), {} projects",
        result.tasks, result.open, result.projects
    )];
    if !result.errors.is_empty() {
        lines.push("Errors:".to_string());
        for err in &result.errors {
            lines.push(match err {
                CheckError::InvalidField {
                    task,
                    task_id,
                    message,
                } => format!("  task {}{}: {}", task, id_suffix(task_id.as_deref()), message),
                CheckError::DuplicateId { task_id, tasks } => format!(
                    "  id {} is used by tasks {}",
                    task_id,
                    tasks
                        .iter()
                        .map(|n| n.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            });
        }
    }
    if !result.warnings.is_empty() {
        lines.push("Warnings:".to_string());
        for warn in &result.warnings {
            lines.push(match warn {
                CheckWarning::MissingId { task, title } => {
                    format!("  task {} missing ID: \"{}\"", task, title)
                }
                CheckWarning::BadTimestamp { task, field, value } => {
                    format!("  task {} has unreadable {}: {}", task, field, value)
                }
            });
        }
    }
    lines.push(if result.valid {
        "✓ data file is valid".to_string()
    } else {
        "✗ data file has errors".to_string()
    });
    lines
}

fn id_suffix(id: Option<&str>) -> String {
    id.map(|id| format!(" ({})", id)).unwrap_or_default()
}
