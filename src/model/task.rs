use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Keys with a dedicated field on [`Task`], in the order they are written.
const KNOWN_KEYS: [&str; 12] = [
    "id", "title", "done", "project", "due", "importance", "urgency", "effort", "tags", "notes",
    "created", "updated",
];

/// A task as stored on the wire. Absent optional fields are omitted when
/// serialized, never written as `null`.
///
/// Reading never fails: a known key whose value can't be used is left out of
/// its field and parked in `extra`, so it is written back unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Task {
    /// Stable identifier, assigned once
    pub id: Option<String>,
    pub title: String,
    pub done: bool,
    /// Name of the project this task belongs to
    pub project: Option<String>,
    /// Due date, `YYYY-MM-DD`
    pub due: Option<String>,
    /// 1-5
    pub importance: Option<i64>,
    /// 1-5
    pub urgency: Option<i64>,
    /// 1-10
    pub effort: Option<i64>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    /// ISO-8601, set once at creation
    pub created: Option<String>,
    /// ISO-8601, refreshed on every change
    pub updated: Option<String>,
    /// Keys we don't model, plus unreadable values of keys we do, kept
    /// verbatim and in order
    pub extra: IndexMap<String, Value>,
}

/// The task attributes that can be edited after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskField {
    Title,
    Done,
    Project,
    Due,
    Importance,
    Urgency,
    Effort,
    Tags,
    Notes,
}

impl TaskField {
    /// The wire name of this field.
    pub fn key(self) -> &'static str {
        match self {
            TaskField::Title => "title",
            TaskField::Done => "done",
            TaskField::Project => "project",
            TaskField::Due => "due",
            TaskField::Importance => "importance",
            TaskField::Urgency => "urgency",
            TaskField::Effort => "effort",
            TaskField::Tags => "tags",
            TaskField::Notes => "notes",
        }
    }
}

/// A validated value for one [`TaskField`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Int(i64),
    List(Vec<String>),
}

impl Task {
    /// Create a bare task with just an id and a title.
    pub fn new(id: Option<String>, title: String) -> Self {
        Task {
            id,
            title,
            ..Task::default()
        }
    }

    /// Current value of a field; `None` when the field is absent.
    pub fn field(&self, field: TaskField) -> Option<FieldValue> {
        match field {
            TaskField::Title => Some(FieldValue::Text(self.title.clone())),
            TaskField::Done => Some(FieldValue::Flag(self.done)),
            TaskField::Project => self.project.clone().map(FieldValue::Text),
            TaskField::Due => self.due.clone().map(FieldValue::Text),
            TaskField::Importance => self.importance.map(FieldValue::Int),
            TaskField::Urgency => self.urgency.map(FieldValue::Int),
            TaskField::Effort => self.effort.map(FieldValue::Int),
            TaskField::Tags if self.tags.is_empty() => None,
            TaskField::Tags => Some(FieldValue::List(self.tags.clone())),
            TaskField::Notes => self.notes.clone().map(FieldValue::Text),
        }
    }

    /// Build a task from a record object, reading each known key leniently.
    pub fn from_record(record: Map<String, Value>) -> Self {
        let mut task = Task::default();
        for (key, value) in record {
            let unread = match key.as_str() {
                "id" => lenient::id(value).map(|v| task.id = v),
                "title" => lenient::text(value).map(|v| task.title = v.unwrap_or_default()),
                "done" => lenient::flag(value).map(|v| task.done = v),
                "project" => lenient::project(value).map(|v| task.project = v),
                "due" => lenient::text(value).map(|v| task.due = v),
                "importance" => lenient::int(value).map(|v| task.importance = v),
                "urgency" => lenient::int(value).map(|v| task.urgency = v),
                "effort" => lenient::int(value).map(|v| task.effort = v),
                "tags" => lenient::tags(value).map(|v| task.tags = v),
                "notes" => lenient::text(value).map(|v| task.notes = v),
                "created" => lenient::text(value).map(|v| task.created = v),
                "updated" => lenient::text(value).map(|v| task.updated = v),
                _ => Err(value),
            };
            if let Err(raw) = unread {
                task.extra.insert(key, raw);
            }
        }
        task
    }

    /// The stored value of a known key that could not be read, if any.
    pub fn unreadable(&self, key: &str) -> Option<&Value> {
        KNOWN_KEYS
            .contains(&key)
            .then(|| self.extra.get(key))
            .flatten()
    }

    /// Set (or with `None`, remove) a field. Returns whether the task changed.
    ///
    /// A value of the wrong shape for the field, or an attempt to remove a
    /// required field, is ignored and reported as unchanged. Any unreadable
    /// value held for the field is dropped once the field is assigned.
    pub fn assign(&mut self, field: TaskField, value: Option<FieldValue>) -> bool {
        let unreadable = self.extra.contains_key(field.key());
        if !unreadable && self.field(field) == value {
            return false;
        }
        match (field, value) {
            (TaskField::Title, Some(FieldValue::Text(s))) => self.title = s,
            (TaskField::Done, Some(FieldValue::Flag(b))) => self.done = b,
            (TaskField::Project, Some(FieldValue::Text(s))) => self.project = Some(s),
            (TaskField::Project, None) => self.project = None,
            (TaskField::Due, Some(FieldValue::Text(s))) => self.due = Some(s),
            (TaskField::Due, None) => self.due = None,
            (TaskField::Importance, v) => match v {
                Some(FieldValue::Int(n)) => self.importance = Some(n),
                None => self.importance = None,
                Some(_) => return false,
            },
            (TaskField::Urgency, v) => match v {
                Some(FieldValue::Int(n)) => self.urgency = Some(n),
                None => self.urgency = None,
                Some(_) => return false,
            },
            (TaskField::Effort, v) => match v {
                Some(FieldValue::Int(n)) => self.effort = Some(n),
                None => self.effort = None,
                Some(_) => return false,
            },
            (TaskField::Tags, Some(FieldValue::List(tags))) => self.tags = tags,
            (TaskField::Tags, None) => self.tags.clear(),
            (TaskField::Notes, Some(FieldValue::Text(s))) => self.notes = Some(s),
            (TaskField::Notes, None) => self.notes = None,
            _ => return false,
        }
        self.extra.shift_remove(field.key());
        true
    }

    /// Refresh the `updated` stamp.
    pub fn touch(&mut self, now: &str) {
        self.extra.shift_remove("updated");
        self.updated = Some(now.to_string());
    }

    /// Whether this task points at the given project.
    pub fn in_project(&self, name: &str) -> bool {
        self.project.as_deref() == Some(name)
    }
}

impl<'de> Deserialize<'de> for Task {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(Task::from_record(Map::deserialize(d)?))
    }
}

impl Serialize for Task {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(None)?;
        let held = |key: &str| self.extra.contains_key(key);
        let title = (!self.title.is_empty() || !held("title")).then_some(&self.title);
        let done = (self.done || !held("done")).then_some(&self.done);
        self.entry(&mut map, "id", self.id.as_ref())?;
        self.entry(&mut map, "title", title)?;
        self.entry(&mut map, "done", done)?;
        self.entry(&mut map, "project", self.project.as_ref())?;
        self.entry(&mut map, "due", self.due.as_ref())?;
        self.entry(&mut map, "importance", self.importance.as_ref())?;
        self.entry(&mut map, "urgency", self.urgency.as_ref())?;
        self.entry(&mut map, "effort", self.effort.as_ref())?;
        self.entry(&mut map, "tags", (!self.tags.is_empty()).then_some(&self.tags))?;
        self.entry(&mut map, "notes", self.notes.as_ref())?;
        self.entry(&mut map, "created", self.created.as_ref())?;
        self.entry(&mut map, "updated", self.updated.as_ref())?;
        for (key, value) in &self.extra {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

impl Task {
    /// Write a known key: the field when set, else the unreadable value
    /// held for it, else nothing.
    fn entry<M: SerializeMap, T: Serialize>(
        &self,
        map: &mut M,
        key: &str,
        value: Option<&T>,
    ) -> Result<(), M::Error> {
        match (value, self.extra.get(key)) {
            (Some(value), _) => map.serialize_entry(key, value),
            (None, Some(raw)) => map.serialize_entry(key, raw),
            (None, None) => Ok(()),
        }
    }
}

/// Readers for the known keys. Each hands back the original value as the
/// error when it can't be used.
mod lenient {
    use serde_json::Value;

    /// String, or a number or boolean written as a string.
    pub fn id(value: Value) -> Result<Option<String>, Value> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::Bool(b) => Ok(Some(b.to_string())),
            other => Err(other),
        }
    }

    /// String or null.
    pub fn text(value: Value) -> Result<Option<String>, Value> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(other),
        }
    }

    /// Trimmed string; blank reads as no project.
    pub fn project(value: Value) -> Result<Option<String>, Value> {
        Ok(text(value)?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    /// Boolean or null.
    pub fn flag(value: Value) -> Result<bool, Value> {
        match value {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            other => Err(other),
        }
    }

    /// Any finite number, rounded, or null.
    pub fn int(value: Value) -> Result<Option<i64>, Value> {
        if value.is_null() {
            return Ok(None);
        }
        match value.as_f64().filter(|n| n.is_finite()) {
            Some(n) => Ok(Some(n.round() as i64)),
            None => Err(value),
        }
    }

    /// Array of strings, trimmed, with blanks and repeats dropped, or null.
    pub fn tags(value: Value) -> Result<Vec<String>, Value> {
        let items = match &value {
            Value::Null => return Ok(Vec::new()),
            Value::Array(items) if items.iter().all(Value::is_string) => items,
            _ => return Err(value),
        };
        let mut tags: Vec<String> = Vec::new();
        for tag in items.iter().filter_map(Value::as_str).map(str::trim) {
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_absent_fields_are_omitted() {
        let task = Task::new(Some("t-1".into()), "Write report".into());
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json, json!({"id": "t-1", "title": "Write report", "done": false}));
    }

    #[test]
    fn test_unknown_keys_survive() {
        let value = json!({"title": "A", "color": "red", "estimate": {"h": 2}});
        let task: Task = serde_json::from_value(value).unwrap();
        assert_eq!(task.extra.get("color"), Some(&json!("red")));
        let back = serde_json::to_value(&task).unwrap();
        assert_eq!(back["estimate"], json!({"h": 2}));
    }

    #[test]
    fn test_lenient_numbers() {
        let task: Task =
            serde_json::from_value(json!({"title": "A", "importance": 2.6, "urgency": "high", "effort": null}))
                .unwrap();
        assert_eq!(task.importance, Some(3));
        assert_eq!(task.urgency, None);
        assert_eq!(task.unreadable("urgency"), Some(&json!("high")));
        assert_eq!(task.effort, None);
    }

    #[test]
    fn test_lenient_tags() {
        let task: Task = serde_json::from_value(json!({"title": "A", "tags": ["x", " ", "y", "x"]})).unwrap();
        assert_eq!(task.tags, vec!["x", "y"]);

        let mixed: Task = serde_json::from_value(json!({"title": "A", "tags": ["x", 3]})).unwrap();
        assert!(mixed.tags.is_empty());
        assert_eq!(mixed.unreadable("tags"), Some(&json!(["x", 3])));
    }

    #[test]
    fn test_unreadable_values_are_written_back_in_place() {
        let value = json!({"title": "A", "effort": "lots", "importance": "high", "due": 20250917, "mood": "ok"});
        let task: Task = serde_json::from_value(value).unwrap();
        assert_eq!(task.effort, None);
        assert_eq!(task.due, None);
        let text = serde_json::to_string(&task).unwrap();
        assert_eq!(
            text,
            r#"{"title":"A","done":false,"due":20250917,"importance":"high","effort":"lots","mood":"ok"}"#
        );
    }

    #[test]
    fn test_unreadable_title_and_done_survive() {
        let task: Task = serde_json::from_value(json!({"title": ["A"], "done": "yes"})).unwrap();
        assert_eq!(task.title, "");
        assert!(!task.done);
        assert_eq!(serde_json::to_value(&task).unwrap(), json!({"title": ["A"], "done": "yes"}));
    }

    #[test]
    fn test_scalar_ids_read_as_strings() {
        let task: Task = serde_json::from_value(json!({"id": 1, "title": "A"})).unwrap();
        assert_eq!(task.id.as_deref(), Some("1"));
        let nested: Task = serde_json::from_value(json!({"id": {"n": 1}, "title": "A"})).unwrap();
        assert_eq!(nested.id, None);
        assert_eq!(serde_json::to_value(&nested).unwrap()["id"], json!({"n": 1}));
    }

    #[test]
    fn test_project_is_trimmed() {
        let task: Task = serde_json::from_value(json!({"title": "A", "project": " Work "})).unwrap();
        assert_eq!(task.project.as_deref(), Some("Work"));
        assert!(task.in_project("Work"));
        let blank: Task = serde_json::from_value(json!({"title": "A", "project": "  "})).unwrap();
        assert_eq!(blank.project, None);
    }

    #[test]
    fn test_assign_replaces_unreadable_value() {
        let mut task: Task = serde_json::from_value(json!({"title": "A", "effort": "lots"})).unwrap();
        assert!(task.assign(TaskField::Effort, Some(FieldValue::Int(3))));
        assert_eq!(task.unreadable("effort"), None);
        assert_eq!(serde_json::to_value(&task).unwrap()["effort"], json!(3));

        let mut cleared: Task = serde_json::from_value(json!({"title": "A", "effort": "lots"})).unwrap();
        assert!(cleared.assign(TaskField::Effort, None));
        assert!(serde_json::to_value(&cleared).unwrap().get("effort").is_none());
    }

    #[test]
    fn test_touch_replaces_unreadable_stamp() {
        let mut task: Task = serde_json::from_value(json!({"title": "A", "updated": 5})).unwrap();
        task.touch("2025-09-17T10:00:00.000Z");
        assert_eq!(
            serde_json::to_value(&task).unwrap()["updated"],
            json!("2025-09-17T10:00:00.000Z")
        );
    }

    #[test]
    fn test_field_keys_match_known_keys() {
        for field in [
            TaskField::Title,
            TaskField::Done,
            TaskField::Project,
            TaskField::Due,
            TaskField::Importance,
            TaskField::Urgency,
            TaskField::Effort,
            TaskField::Tags,
            TaskField::Notes,
        ] {
            assert!(KNOWN_KEYS.contains(&field.key()));
        }
    }

    #[test]
    fn test_assign_reports_change() {
        let mut task = Task::new(None, "A".into());
        assert!(task.assign(TaskField::Importance, Some(FieldValue::Int(4))));
        assert!(!task.assign(TaskField::Importance, Some(FieldValue::Int(4))));
        assert!(task.assign(TaskField::Importance, None));
        assert!(!task.assign(TaskField::Importance, None));
        assert_eq!(task.importance, None);
    }

    #[test]
    fn test_assign_refuses_to_remove_title() {
        let mut task = Task::new(None, "A".into());
        assert!(!task.assign(TaskField::Title, None));
        assert_eq!(task.title, "A");
    }

    #[test]
    fn test_assign_tags() {
        let mut task = Task::new(None, "A".into());
        assert!(task.assign(TaskField::Tags, Some(FieldValue::List(vec!["a".into()]))));
        assert_eq!(task.field(TaskField::Tags), Some(FieldValue::List(vec!["a".into()])));
        assert!(task.assign(TaskField::Tags, None));
        assert!(task.tags.is_empty());
    }
}
