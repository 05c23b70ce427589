use serde_json::Value;

use crate::model::record::{ProjectRecord, is_project_record, project_record_name};
use crate::model::task::Task;
use crate::ops::project_ops::merge_projects;

/// Tasks and projects recovered from flat records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hydrated {
    pub tasks: Vec<Task>,
    pub projects: Vec<String>,
}

/// Error type for hydration. Record numbers are 1-based.
#[derive(Debug, thiserror::Error)]
pub enum HydrateError {
    #[error("Record {0} is not a JSON object")]
    NotAnObject(usize),
}

/// Split records into project declarations and tasks.
///
/// `{"type":"project","name":...}` records declare projects; every other
/// object is a task with its `type` key dropped. The returned projects are
/// the declared names plus every project a task refers to.
pub fn hydrate(records: Vec<Value>) -> Result<Hydrated, HydrateError> {
    let mut declared = Vec::new();
    let mut tasks = Vec::new();

    for (idx, record) in records.into_iter().enumerate() {
        let Value::Object(mut obj) = record else {
            return Err(HydrateError::NotAnObject(idx + 1));
        };
        if is_project_record(&obj) {
            match project_record_name(&obj) {
                Some(name) => declared.push(name.to_string()),
                None => tracing::warn!(record = idx + 1, "skipping project record without a name"),
            }
            continue;
        }
        obj.shift_remove("type");
        tasks.push(Task::from_record(obj));
    }

    let projects = merge_projects(&declared, &tasks);
    tracing::debug!(tasks = tasks.len(), projects = projects.len(), "hydrated records");
    Ok(Hydrated { tasks, projects })
}

/// Flatten tasks and projects back into records: project declarations
/// first, in the given order, then tasks in their original order.
pub fn dehydrate(tasks: &[Task], projects: &[String]) -> Result<Vec<Value>, serde_json::Error> {
    let mut records = Vec::with_capacity(projects.len() + tasks.len());
    for name in projects {
        records.push(serde_json::to_value(ProjectRecord::new(name))?);
    }
    for task in tasks {
        records.push(serde_json::to_value(task)?);
    }
    Ok(records)
}
