use crate::model::task::{FieldValue, Task, TaskField};
use crate::ops::OpError;
use crate::util::ids::IdSource;

/// A partially filled-in task, as entered in a form or decoded from an
/// operation. Anything left `None` is omitted from the created task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub id: Option<String>,
    pub title: String,
    pub done: Option<bool>,
    pub project: Option<String>,
    pub due: Option<String>,
    pub importance: Option<f64>,
    pub urgency: Option<f64>,
    pub effort: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
}

impl TaskDraft {
    pub fn titled(title: &str) -> Self {
        TaskDraft {
            title: title.to_string(),
            ..TaskDraft::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// Build a complete task from a draft.
///
/// The id comes from `ids` unless the draft has one; `created`/`updated`
/// default to `now`. Numbers are kept only when finite, tags only when at
/// least one non-blank tag remains, and text fields only when non-empty.
pub fn create_task(draft: TaskDraft, now: &str, ids: &dyn IdSource) -> Result<Task, OpError> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(OpError::Validation("Title is required".into()));
    }

    let id = non_empty(draft.id).unwrap_or_else(|| ids.next_id());
    let tags = draft
        .tags
        .map(|tags| {
            let mut kept: Vec<String> = Vec::new();
            for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
                if !kept.iter().any(|k| k == tag) {
                    kept.push(tag.to_string());
                }
            }
            kept
        })
        .unwrap_or_default();

    Ok(Task {
        id: Some(id),
        title: title.to_string(),
        done: draft.done.unwrap_or(false),
        project: non_empty(draft.project).map(|p| p.trim().to_string()),
        due: non_empty(draft.due),
        importance: finite(draft.importance),
        urgency: finite(draft.urgency),
        effort: finite(draft.effort),
        tags,
        notes: non_empty(draft.notes),
        created: Some(non_empty(draft.created).unwrap_or_else(|| now.to_string())),
        updated: Some(non_empty(draft.updated).unwrap_or_else(|| now.to_string())),
        extra: Default::default(),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn finite(value: Option<f64>) -> Option<i64> {
    value.filter(|n| n.is_finite()).map(|n| n.round() as i64)
}

// ---------------------------------------------------------------------------
// Lookup and completion
// ---------------------------------------------------------------------------

pub fn find_task<'a>(tasks: &'a [Task], id: &str) -> Option<&'a Task> {
    tasks.iter().find(|t| t.id.as_deref() == Some(id))
}

pub fn find_task_mut<'a>(tasks: &'a mut [Task], id: &str) -> Option<&'a mut Task> {
    tasks.iter_mut().find(|t| t.id.as_deref() == Some(id))
}

/// Return a copy of `tasks` with the task's done flag set. `updated` is
/// only stamped when the flag actually flips.
pub fn set_done(tasks: &[Task], id: &str, done: bool, now: &str) -> Result<Vec<Task>, OpError> {
    let mut tasks = tasks.to_vec();
    let task = find_task_mut(&mut tasks, id)
        .ok_or_else(|| OpError::NotFound(format!("Task \"{}\" not found", id)))?;
    if task.assign(TaskField::Done, Some(FieldValue::Flag(done))) {
        task.touch(now);
    }
    Ok(tasks)
}
