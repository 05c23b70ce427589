//! Snapshots for the assistant, and parsing of what it sends back.

use std::collections::HashMap;

use serde_json::Value;

use crate::model::task::Task;
use crate::ops::apply::{BatchError, apply_batch};
use crate::ops::hydrate::{HydrateError, dehydrate, hydrate};
use crate::ops::project_ops::sort_projects;
use crate::ops::template;
use crate::parse::jsonl::{JsonlError, parse_jsonl};
use crate::util::clock::Clock;
use crate::util::ids::IdSource;

/// Built-in briefing. Placeholders: `{{projects}}`, `{{task_count}}`,
/// `{{snapshot}}`, `{{operations}}`, `{{instructions}}`.
pub const DEFAULT_BRIEFING_TEMPLATE: &str = "\
You are helping me plan my work. Below are my projects and open tasks as JSON records.

Projects: {{projects}}

Open tasks ({{task_count}}):
{{snapshot}}

Reply with a single JSON object of the form {\"operations\": [...]}. Each operation is an
object with exactly one key naming its type. Available operations:

{{operations}}

Operations are applied in order, all or nothing. Use `null` in `set` to clear a field.
{{instructions}}";

/// Reference card for the operation language, substituted for `{{operations}}`.
pub const OPERATIONS_REFERENCE: &str = "\
- {\"add_project\": {\"data\": {\"name\": \"...\"}}}
- {\"rename_project\": {\"data\": {\"from\": \"...\", \"to\": \"...\"}}}
- {\"add_task\": {\"data\": {\"title\": \"...\", \"project\": \"...\", \"importance\": 1-5, \"urgency\": 1-5, \"effort\": 1-10, \"due\": \"YYYY-MM-DD\", \"notes\": \"...\", \"tags\": [\"...\"]}}}
- {\"update_task_fields\": {\"data\": {\"id\": \"...\", \"set\": {\"<field>\": <value or null>}}}}
- {\"mark_complete\": {\"data\": {\"id\": \"...\", \"completed_at\": \"<optional ISO-8601>\"}}}";

/// Template and extra instructions for the briefing text.
#[derive(Debug, Clone)]
pub struct Briefing {
    pub template: String,
    pub instructions: String,
}

impl Default for Briefing {
    fn default() -> Self {
        Briefing {
            template: DEFAULT_BRIEFING_TEMPLATE.to_string(),
            instructions: String::new(),
        }
    }
}

/// Everything the export view offers.
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    /// Every project and task
    pub full_snapshot: String,
    /// Same shape, without done tasks
    pub open_tasks: String,
    /// Briefing text for the assistant, built on `open_tasks`
    pub briefing: String,
}

/// Build the export with the built-in briefing.
pub fn build_export(tasks: &[Task], projects: &[String]) -> Result<Export, serde_json::Error> {
    build_export_with(tasks, projects, &Briefing::default())
}

pub fn build_export_with(
    tasks: &[Task],
    projects: &[String],
    briefing: &Briefing,
) -> Result<Export, serde_json::Error> {
    let mut projects = projects.to_vec();
    sort_projects(&mut projects);

    let open: Vec<Task> = tasks.iter().filter(|t| !t.done).cloned().collect();
    let full_snapshot = records_json(&dehydrate(tasks, &projects)?);
    let open_tasks = records_json(&dehydrate(&open, &projects)?);

    let project_list = if projects.is_empty() {
        "(none)".to_string()
    } else {
        projects.join(", ")
    };
    let values: HashMap<&str, String> = HashMap::from([
        ("projects", project_list),
        ("task_count", open.len().to_string()),
        ("snapshot", open_tasks.clone()),
        ("operations", OPERATIONS_REFERENCE.to_string()),
        ("instructions", briefing.instructions.clone()),
    ]);
    let briefing = template::fill(&briefing.template, &values);

    Ok(Export {
        full_snapshot,
        open_tasks,
        briefing,
    })
}

/// A JSON array with one record per line.
fn records_json(records: &[Value]) -> String {
    if records.is_empty() {
        return "[]".to_string();
    }
    let body = records
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(",\n");
    format!("[\n{}\n]", body)
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Current data and providers an operation batch is applied against.
pub struct ImportContext<'a> {
    pub base_tasks: &'a [Task],
    pub base_projects: &'a [String],
    pub clock: &'a dyn Clock,
    pub ids: &'a dyn IdSource,
}

/// What the pasted text turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// A replacement set of project/task records
    Records,
    /// An operation batch applied to the base data
    Operations,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub kind: ImportKind,
    pub tasks: Vec<Task>,
    pub projects: Vec<String>,
}

/// Error type for import. Item and task numbers are 1-based.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Nothing to import")]
    Empty,
    #[error(transparent)]
    Parse(#[from] JsonlError),
    #[error("Item {0} is not a JSON object")]
    NotAnObject(usize),
    #[error(transparent)]
    Hydrate(#[from] HydrateError),
    #[error("Task {0} is missing a title")]
    MissingTitle(usize),
    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Parse assistant output: either records (JSON array, single object or
/// JSONL) or a single `{"operations": [...]}` batch.
pub fn parse_import(raw: &str, ctx: &ImportContext<'_>) -> Result<ImportOutcome, ImportError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ImportError::Empty);
    }

    let items = parse_items(text)?;
    if let Some(idx) = items.iter().position(|item| !item.is_object()) {
        return Err(ImportError::NotAnObject(idx + 1));
    }

    if let [single] = items.as_slice()
        && single.get("operations").is_some_and(Value::is_array)
    {
        tracing::debug!("import routed to operation batch");
        let applied = apply_batch(single, ctx.base_tasks, ctx.base_projects, ctx.clock, ctx.ids)?;
        return Ok(ImportOutcome {
            kind: ImportKind::Operations,
            tasks: applied.tasks,
            projects: applied.projects,
        });
    }

    let hydrated = hydrate(items)?;
    if let Some(idx) = hydrated.tasks.iter().position(|t| t.title.trim().is_empty()) {
        return Err(ImportError::MissingTitle(idx + 1));
    }
    tracing::debug!(tasks = hydrated.tasks.len(), "import routed to records");
    Ok(ImportOutcome {
        kind: ImportKind::Records,
        tasks: hydrated.tasks,
        projects: hydrated.projects,
    })
}

/// JSON first when the text looks like JSON, JSONL otherwise or when the
/// JSON parse fails.
fn parse_items(text: &str) -> Result<Vec<Value>, JsonlError> {
    if text.starts_with('[') || text.starts_with('{') {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => return Ok(items),
            Ok(value) => return Ok(vec![value]),
            Err(e) => tracing::debug!(error = %e, "not a single JSON document, trying JSONL"),
        }
    }
    parse_jsonl(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::apply::Applied;
    use crate::util::clock::FixedClock;
    use crate::util::ids::SequentialIds;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const NOW: &str = "2025-09-17T10:00:00.000Z";

    fn tasks() -> Vec<Task> {
        vec![
            Task {
                project: Some("Work".into()),
                ..Task::new(Some("a".into()), "Report".into())
            },
            Task {
                done: true,
                ..Task::new(Some("b".into()), "Taxes".into())
            },
        ]
    }

    fn projects() -> Vec<String> {
        vec!["work2".into(), "Home".into(), "Work".into()]
    }

    fn import(text: &str) -> Result<ImportOutcome, ImportError> {
        let clock = FixedClock::parse(NOW).unwrap();
        let ids = SequentialIds::new("n");
        let tasks = tasks();
        let projects = projects();
        let ctx = ImportContext {
            base_tasks: &tasks,
            base_projects: &projects,
            clock: &clock,
            ids: &ids,
        };
        parse_import(text, &ctx)
    }

    // --- export ---

    #[test]
    fn test_snapshot_lists_projects_first() {
        let export = build_export(&tasks(), &projects()).unwrap();
        let records: Vec<Value> = serde_json::from_str(&export.full_snapshot).unwrap();
        let kinds: Vec<Option<&str>> = records.iter().map(|r| r["type"].as_str()).collect();
        assert_eq!(kinds, vec![Some("project"), Some("project"), Some("project"), None, None]);
        assert_eq!(records[0]["name"], "Home");
        assert_eq!(records[1]["name"], "Work");
        assert_eq!(records[2]["name"], "work2");
        assert_eq!(records[3]["id"], "a");
        assert_eq!(records[4]["id"], "b");
    }

    #[test]
    fn test_open_tasks_excludes_done() {
        let export = build_export(&tasks(), &projects()).unwrap();
        let records: Vec<Value> = serde_json::from_str(&export.open_tasks).unwrap();
        assert!(records.iter().all(|r| r.get("done") != Some(&json!(true))));
        assert!(records.iter().any(|r| r["id"] == "a"));
    }

    #[test]
    fn test_snapshot_is_one_record_per_line() {
        let export = build_export(&[], &["Solo".to_string()]).unwrap();
        assert_eq!(export.full_snapshot, "[\n{\"type\":\"project\",\"name\":\"Solo\"}\n]");
        assert_eq!(build_export(&[], &[]).unwrap().full_snapshot, "[]");
    }

    #[test]
    fn test_briefing_fills_placeholders() {
        let export = build_export(&tasks(), &projects()).unwrap();
        assert!(export.briefing.contains("Projects: Home, Work, work2"));
        assert!(export.briefing.contains("Open tasks (1):"));
        assert!(export.briefing.contains(&export.open_tasks));
        assert!(export.briefing.contains("update_task_fields"));
        assert!(!export.briefing.contains("{{"));
    }

    #[test]
    fn test_custom_briefing_keeps_unknown_placeholders() {
        let briefing = Briefing {
            template: "{{task_count}} open; {{mood}}; {{instructions}}".into(),
            instructions: "Be brief.".into(),
        };
        let export = build_export_with(&tasks(), &projects(), &briefing).unwrap();
        insta::assert_snapshot!(export.briefing, @"1 open; {{mood}}; Be brief.");
    }

    // --- import: records ---

    #[test]
    fn test_import_jsonl_records() {
        let outcome = import("{\"type\":\"project\",\"name\":\"Alpha\"}\n{\"title\":\"Task\"}\n").unwrap();
        assert_eq!(outcome.kind, ImportKind::Records);
        assert_eq!(outcome.projects, vec!["Alpha"]);
        assert_eq!(outcome.tasks, vec![Task::new(None, "Task".into())]);
    }

    #[test]
    fn test_import_json_array() {
        let outcome = import(r#"[{"type":"project","name":"B"},{"title":"x","project":"A"}]"#).unwrap();
        assert_eq!(outcome.projects, vec!["A", "B"]);
        assert_eq!(outcome.tasks.len(), 1);
    }

    #[test]
    fn test_import_single_object() {
        let outcome = import(r#"  {"title":"Only"}  "#).unwrap();
        assert_eq!(outcome.tasks[0].title, "Only");
    }

    #[test]
    fn test_import_export_round_trip() {
        let export = build_export(&tasks(), &projects()).unwrap();
        let outcome = import(&export.full_snapshot).unwrap();
        assert_eq!(outcome.tasks, tasks());
        assert_eq!(outcome.projects, vec!["Home", "Work", "work2"]);
    }

    #[test]
    fn test_import_numeric_id_and_due() {
        let outcome = import("{\"id\":1,\"title\":\"Task\",\"due\":20250917}\n").unwrap();
        let task = &outcome.tasks[0];
        assert_eq!(task.id.as_deref(), Some("1"));
        assert_eq!(task.due, None);
        assert_eq!(task.unreadable("due"), Some(&json!(20250917)));
    }

    #[test]
    fn test_import_empty() {
        assert!(matches!(import("  \n "), Err(ImportError::Empty)));
    }

    #[test]
    fn test_import_rejects_non_objects() {
        assert!(matches!(import("[{\"title\":\"a\"}, 3]"), Err(ImportError::NotAnObject(2))));
    }

    #[test]
    fn test_import_requires_titles() {
        let err = import("{\"title\":\"ok\"}\n{\"notes\":\"no title\"}").unwrap_err();
        assert!(matches!(err, ImportError::MissingTitle(2)));
        assert_eq!(err.to_string(), "Task 2 is missing a title");
    }

    #[test]
    fn test_import_bad_jsonl_reports_line() {
        let err = import("{\"title\":\"ok\"}\n{oops").unwrap_err();
        assert_eq!(err.to_string().split(':').next(), Some("Line 2"));
    }

    #[test]
    fn test_import_multiline_json_array() {
        let outcome = import("[\n{\"title\":\"a\"},\n{\"title\":\"b\"}\n]").unwrap();
        assert_eq!(outcome.tasks.len(), 2);
    }

    // --- import: operations ---

    #[test]
    fn test_import_routes_operation_batch() {
        let batch = json!({"operations": [
            {"add_task": {"data": {"title": "From assistant"}}},
            {"mark_complete": {"data": {"id": "a"}}}
        ]});
        let outcome = import(&json!([batch.clone()]).to_string()).unwrap();
        assert_eq!(outcome.kind, ImportKind::Operations);

        let clock = FixedClock::parse(NOW).unwrap();
        let ids = SequentialIds::new("n");
        let Applied { tasks, projects } =
            apply_batch(&batch, &tasks(), &projects(), &clock, &ids).unwrap();
        assert_eq!(outcome.tasks, tasks);
        assert_eq!(outcome.projects, projects);
    }

    #[test]
    fn test_import_bare_batch_object() {
        let outcome = import(r#"{"operations": [{"add_project": {"data": {"name": "Garden"}}}]}"#).unwrap();
        assert_eq!(outcome.kind, ImportKind::Operations);
        assert!(outcome.projects.contains(&"Garden".to_string()));
    }

    #[test]
    fn test_import_batch_error_is_returned() {
        let err = import(r#"[{"operations": [{"add_task": {"data": {"title": "x", "importance": 10}}}]}]"#)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Operation 1 (add_task): importance must be between 1 and 5"
        );
    }
}
