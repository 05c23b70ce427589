use std::collections::HashMap;

use serde::Serialize;

use crate::model::task::Task;
use crate::ops::fields::TASK_FIELDS;
use crate::util::clock::parse_timestamp;

/// Structured result from `tl check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub tasks: usize,
    pub open: usize,
    pub projects: usize,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A validation error (something that should be fixed).
///
/// `task` is the 1-based position of the task among the task records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// A field holds a value its operation would reject
    #[serde(rename = "invalid_field")]
    InvalidField {
        task: usize,
        task_id: Option<String>,
        message: String,
    },
    /// Two or more tasks share an id
    #[serde(rename = "duplicate_id")]
    DuplicateId { task_id: String, tasks: Vec<usize> },
}

/// A validation warning (non-critical issue).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// Task has no id, so operations cannot address it
    #[serde(rename = "missing_id")]
    MissingId { task: usize, title: String },
    /// `created` or `updated` is not a timestamp
    #[serde(rename = "bad_timestamp")]
    BadTimestamp {
        task: usize,
        field: &'static str,
        value: String,
    },
}

/// Validate loaded tasks. Read-only.
///
/// Every modelled field is run through the same field table the operations
/// use. Ids must be unique; missing ids and unreadable timestamps are only
/// warnings.
pub fn check_tasks(tasks: &[Task], projects: &[String]) -> CheckResult {
    let mut result = CheckResult {
        tasks: tasks.len(),
        open: tasks.iter().filter(|t| !t.done).count(),
        projects: projects.len(),
        ..CheckResult::default()
    };

    let mut by_id: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, task) in tasks.iter().enumerate() {
        let n = idx + 1;
        match task.id.as_deref() {
            Some(id) => by_id.entry(id).or_default().push(n),
            None => result.warnings.push(CheckWarning::MissingId {
                task: n,
                title: task.title.clone(),
            }),
        }
        if task.unreadable("id").is_some() {
            result.errors.push(CheckError::InvalidField {
                task: n,
                task_id: None,
                message: "id must be a string or a number".into(),
            });
        }
        check_fields(task, n, &mut result);
        for (field, value) in [("created", &task.created), ("updated", &task.updated)] {
            if let Some(value) = value
                && parse_timestamp(value).is_none()
            {
                result.warnings.push(CheckWarning::BadTimestamp {
                    task: n,
                    field,
                    value: value.clone(),
                });
            }
            if let Some(raw) = task.unreadable(field) {
                result.warnings.push(CheckWarning::BadTimestamp {
                    task: n,
                    field,
                    value: raw.to_string(),
                });
            }
        }
    }

    let mut duplicates: Vec<(&str, Vec<usize>)> = by_id
        .into_iter()
        .filter(|(_, positions)| positions.len() > 1)
        .collect();
    duplicates.sort_by_key(|(_, positions)| positions[0]);
    let duplicates = duplicates.into_iter().map(|(id, tasks)| CheckError::DuplicateId {
        task_id: id.to_string(),
        tasks,
    });
    result.errors.extend(duplicates);

    result.valid = result.errors.is_empty();
    result
}

fn check_fields(task: &Task, n: usize, result: &mut CheckResult) {
    let Ok(serde_json::Value::Object(record)) = serde_json::to_value(task) else {
        return;
    };
    for spec in TASK_FIELDS {
        let value = match record.get(spec.name) {
            Some(value) => value,
            None if spec.name == "title" => &serde_json::Value::Null,
            None => continue,
        };
        if let Err(e) = spec.validate(value) {
            result.errors.push(CheckError::InvalidField {
                task: n,
                task_id: task.id.clone(),
                message: e.to_string(),
            });
        }
    }
}
