//! Atomic application of assistant operation batches.
//!
//! A batch is decoded in full before anything runs, then applied in order
//! to private copies of the tasks and projects. The caller's data is only
//! replaced if every operation succeeds.

use serde_json::Value;

use crate::model::operation::{
    AddProjectData, AddTaskData, Envelope, FieldPatch, MarkCompleteData, Operation,
    RenameProjectData, UpdateTaskFieldsData,
};
use crate::model::task::{FieldValue, Task, TaskField};
use crate::ops::fields::{self, FieldSpec};
use crate::ops::project_ops::{add_project, merge_projects, rename_project};
use crate::ops::task_ops::{TaskDraft, create_task};
use crate::ops::OpError;
use crate::util::clock::{Clock, iso, parse_timestamp};
use crate::util::ids::IdSource;

/// Defaults for `add_task` fields the operation leaves out.
const DEFAULT_IMPORTANCE: i64 = 1;
const DEFAULT_URGENCY: i64 = 1;
const DEFAULT_EFFORT: i64 = 3;

/// Task fields that exist but can never be set by an operation.
const IMMUTABLE_FIELDS: [&str; 3] = ["id", "created", "updated"];

/// The new state after a successful batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub tasks: Vec<Task>,
    pub projects: Vec<String>,
}

/// Why a batch was rejected. Operation numbers are 1-based.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BatchError {
    #[error("Batch must be an object with an \"operations\" array")]
    NotABatch,
    #[error("Operation {index} ({kind}) is malformed: {message}")]
    Malformed {
        index: usize,
        kind: String,
        message: String,
    },
    #[error("Operation {index} ({kind}): {source}")]
    Failed {
        index: usize,
        kind: &'static str,
        source: OpError,
    },
}

/// Decode and apply a raw `{"operations": [...]}` batch.
pub fn apply_batch(
    batch: &Value,
    tasks: &[Task],
    projects: &[String],
    clock: &dyn Clock,
    ids: &dyn IdSource,
) -> Result<Applied, BatchError> {
    let operations = decode_batch(batch)?;
    apply_operations(&operations, tasks, projects, clock, ids)
}

/// Decode every envelope of a batch, failing on the first malformed one.
pub fn decode_batch(batch: &Value) -> Result<Vec<Operation>, BatchError> {
    let envelopes = batch
        .get("operations")
        .and_then(Value::as_array)
        .ok_or(BatchError::NotABatch)?;
    envelopes
        .iter()
        .enumerate()
        .map(|(idx, envelope)| {
            serde_json::from_value(envelope.clone()).map_err(|e| BatchError::Malformed {
                index: idx + 1,
                kind: envelope_tag(envelope),
                message: e.to_string(),
            })
        })
        .collect()
}

/// Apply already-decoded operations, all or nothing.
pub fn apply_operations(
    operations: &[Operation],
    tasks: &[Task],
    projects: &[String],
    clock: &dyn Clock,
    ids: &dyn IdSource,
) -> Result<Applied, BatchError> {
    let now = iso(clock.now());
    let mut working = Applied {
        tasks: tasks.to_vec(),
        projects: projects.to_vec(),
    };

    for (idx, op) in operations.iter().enumerate() {
        tracing::debug!(index = idx + 1, kind = op.kind(), "applying operation");
        let result = match op {
            Operation::AddProject(Envelope { data }) => apply_add_project(&mut working, data),
            Operation::RenameProject(Envelope { data }) => {
                apply_rename_project(&mut working, data, &now)
            }
            Operation::AddTask(Envelope { data }) => apply_add_task(&mut working, data, &now, ids),
            Operation::UpdateTaskFields(Envelope { data }) => {
                apply_update_task_fields(&mut working, data, &now)
            }
            Operation::MarkComplete(Envelope { data }) => {
                apply_mark_complete(&mut working, data, &now)
            }
        };
        result.map_err(|source| {
            tracing::debug!(index = idx + 1, kind = op.kind(), error = %source, "batch rejected");
            BatchError::Failed {
                index: idx + 1,
                kind: op.kind(),
                source,
            }
        })?;
    }

    working.projects = merge_projects(&working.projects, &working.tasks);
    Ok(working)
}

fn apply_add_project(working: &mut Applied, data: &AddProjectData) -> Result<(), OpError> {
    working.projects = add_project(&working.projects, &data.name)?.projects;
    Ok(())
}

fn apply_rename_project(
    working: &mut Applied,
    data: &RenameProjectData,
    now: &str,
) -> Result<(), OpError> {
    if data.from.trim().is_empty() {
        return Err(OpError::Validation("from must not be empty".into()));
    }
    let known = merge_projects(&working.projects, &working.tasks);
    let renamed = rename_project(&known, &working.tasks, &data.from, &data.to, now)?;
    working.projects = renamed.projects;
    working.tasks = renamed.tasks;
    Ok(())
}

fn apply_add_task(
    working: &mut Applied,
    data: &AddTaskData,
    now: &str,
    ids: &dyn IdSource,
) -> Result<(), OpError> {
    let int = |field: TaskField, patch: &FieldPatch, default: i64| -> Result<Option<f64>, OpError> {
        Ok(match resolve_patch(fields::spec_for(field), patch, Some(FieldValue::Int(default)))? {
            Some(FieldValue::Int(n)) => Some(n as f64),
            _ => None,
        })
    };
    let text = |field: TaskField, patch: &FieldPatch| -> Result<Option<String>, OpError> {
        Ok(match resolve_patch(fields::spec_for(field), patch, None)? {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        })
    };
    let tags = match resolve_patch(fields::spec_for(TaskField::Tags), &data.tags, None)? {
        Some(FieldValue::List(tags)) => Some(tags),
        _ => None,
    };

    let draft = TaskDraft {
        title: data.title.clone(),
        project: text(TaskField::Project, &data.project)?,
        due: text(TaskField::Due, &data.due)?,
        notes: text(TaskField::Notes, &data.notes)?,
        importance: int(TaskField::Importance, &data.importance, DEFAULT_IMPORTANCE)?,
        urgency: int(TaskField::Urgency, &data.urgency, DEFAULT_URGENCY)?,
        effort: int(TaskField::Effort, &data.effort, DEFAULT_EFFORT)?,
        tags,
        ..TaskDraft::default()
    };
    let task = create_task(draft, now, ids)?;
    working.tasks.push(task);
    Ok(())
}

fn apply_update_task_fields(
    working: &mut Applied,
    data: &UpdateTaskFieldsData,
    now: &str,
) -> Result<(), OpError> {
    let idx = task_index(&working.tasks, &data.id)?;

    let mut changes = Vec::with_capacity(data.set.len());
    for (key, value) in &data.set {
        let spec = fields::lookup(key).ok_or_else(|| {
            if IMMUTABLE_FIELDS.contains(&key.as_str()) {
                OpError::Validation(format!("{} cannot be changed", key))
            } else {
                OpError::Validation(format!("unknown field \"{}\"", key))
            }
        })?;
        changes.push((spec.field, spec.validate(value)?));
    }

    let task = &mut working.tasks[idx];
    let mut changed = false;
    for (field, value) in changes {
        changed |= task.assign(field, value);
    }
    if changed {
        task.touch(now);
    }
    Ok(())
}

fn apply_mark_complete(
    working: &mut Applied,
    data: &MarkCompleteData,
    now: &str,
) -> Result<(), OpError> {
    let idx = task_index(&working.tasks, &data.id)?;
    let completed_at = match data.completed_at.as_deref() {
        Some(raw) => Some(parse_timestamp(raw).map(iso).ok_or_else(|| {
            OpError::Validation(format!("completed_at \"{}\" is not a valid timestamp", raw))
        })?),
        None => None,
    };

    let task = &mut working.tasks[idx];
    let flipped = task.assign(TaskField::Done, Some(FieldValue::Flag(true)));
    match completed_at {
        Some(stamp) if task.updated.as_deref() != Some(stamp.as_str()) => task.touch(&stamp),
        None if flipped => task.touch(now),
        _ => {}
    }
    Ok(())
}

/// Turn a three-state patch into the value to store: the default when the
/// key was absent, nothing when it was `null`, else the validated value.
fn resolve_patch(
    spec: &FieldSpec,
    patch: &FieldPatch,
    default: Option<FieldValue>,
) -> Result<Option<FieldValue>, OpError> {
    match patch {
        FieldPatch::Unset => Ok(default),
        FieldPatch::Clear => spec.validate(&Value::Null),
        FieldPatch::Set(value) => spec.validate(value),
    }
}

fn task_index(tasks: &[Task], id: &str) -> Result<usize, OpError> {
    tasks
        .iter()
        .position(|t| t.id.as_deref() == Some(id))
        .ok_or_else(|| OpError::NotFound(format!("Task \"{}\" not found", id)))
}

/// Best-effort operation name for error messages about undecodable envelopes.
fn envelope_tag(envelope: &Value) -> String {
    match envelope.as_object() {
        Some(obj) if obj.len() == 1 => obj.keys().next().cloned().unwrap_or_default(),
        _ => "unknown".to_string(),
    }
}
