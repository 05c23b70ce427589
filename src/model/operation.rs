use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One mutation. On the wire each envelope is an object with exactly one
/// key, the operation type, mapping to `{"data": {...}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    AddProject(Envelope<AddProjectData>),
    RenameProject(Envelope<RenameProjectData>),
    AddTask(Envelope<AddTaskData>),
    UpdateTaskFields(Envelope<UpdateTaskFieldsData>),
    MarkComplete(Envelope<MarkCompleteData>),
}

impl Operation {
    /// Every wire tag, in the order they are documented.
    pub const KINDS: [&'static str; 5] = [
        "add_project",
        "rename_project",
        "add_task",
        "update_task_fields",
        "mark_complete",
    ];

    /// The wire tag of this operation
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::AddProject(_) => "add_project",
            Operation::RenameProject(_) => "rename_project",
            Operation::AddTask(_) => "add_task",
            Operation::UpdateTaskFields(_) => "update_task_fields",
            Operation::MarkComplete(_) => "mark_complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddProjectData {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameProjectData {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddTaskData {
    pub title: String,
    #[serde(default)]
    pub project: FieldPatch,
    #[serde(default)]
    pub importance: FieldPatch,
    #[serde(default)]
    pub urgency: FieldPatch,
    #[serde(default)]
    pub effort: FieldPatch,
    #[serde(default)]
    pub due: FieldPatch,
    #[serde(default)]
    pub notes: FieldPatch,
    #[serde(default)]
    pub tags: FieldPatch,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskFieldsData {
    pub id: String,
    /// Field name to new value; `null` removes the field
    pub set: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkCompleteData {
    pub id: String,
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// Three-state optional field: key absent, explicit `null`, or a value
/// still to be validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldPatch {
    #[default]
    Unset,
    Clear,
    Set(Value),
}

impl<'de> Deserialize<'de> for FieldPatch {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Null => FieldPatch::Clear,
            value => FieldPatch::Set(value),
        })
    }
}
