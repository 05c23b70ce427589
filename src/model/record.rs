use serde::Serialize;
use serde_json::{Map, Value};

/// Value of the `type` key that marks a project declaration.
pub const PROJECT_RECORD_TYPE: &str = "project";

/// `{"type":"project","name":"..."}`
#[derive(Debug, Clone, Serialize)]
pub struct ProjectRecord<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'a str,
}

impl<'a> ProjectRecord<'a> {
    pub fn new(name: &'a str) -> Self {
        ProjectRecord {
            kind: PROJECT_RECORD_TYPE,
            name,
        }
    }
}

/// Is this object a project declaration? Only checks the `type` tag; the
/// name may still be missing or unusable.
pub fn is_project_record(obj: &Map<String, Value>) -> bool {
    obj.get("type").and_then(Value::as_str) == Some(PROJECT_RECORD_TYPE)
}

/// The trimmed, non-empty name of a project declaration.
pub fn project_record_name(obj: &Map<String, Value>) -> Option<&str> {
    obj.get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
}
