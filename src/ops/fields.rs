//! Validation rules for editable task fields.
//!
//! Both `add_task` and `update_task_fields` go through [`TASK_FIELDS`], so a
//! field is checked the same way no matter which operation sets it.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

use crate::model::task::{FieldValue, TaskField};
use crate::ops::OpError;

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// Shape a field's value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// String; blank is an error when `required`, otherwise it removes the field
    Text { required: bool },
    Flag,
    /// Number rounded to an integer within `min..=max`
    Int { min: i64, max: i64 },
    /// `YYYY-MM-DD`
    Date,
    /// List of non-empty strings
    Tags,
}

/// One row of the field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field: TaskField,
    pub kind: FieldKind,
    /// Whether `null` removes the field
    pub removable: bool,
}

const TITLE: FieldSpec = FieldSpec {
    name: "title",
    field: TaskField::Title,
    kind: FieldKind::Text { required: true },
    removable: false,
};
const DONE: FieldSpec = FieldSpec {
    name: "done",
    field: TaskField::Done,
    kind: FieldKind::Flag,
    removable: false,
};
const PROJECT: FieldSpec = FieldSpec {
    name: "project",
    field: TaskField::Project,
    kind: FieldKind::Text { required: false },
    removable: true,
};
const DUE: FieldSpec = FieldSpec {
    name: "due",
    field: TaskField::Due,
    kind: FieldKind::Date,
    removable: true,
};
const IMPORTANCE: FieldSpec = FieldSpec {
    name: "importance",
    field: TaskField::Importance,
    kind: FieldKind::Int { min: 1, max: 5 },
    removable: true,
};
const URGENCY: FieldSpec = FieldSpec {
    name: "urgency",
    field: TaskField::Urgency,
    kind: FieldKind::Int { min: 1, max: 5 },
    removable: true,
};
const EFFORT: FieldSpec = FieldSpec {
    name: "effort",
    field: TaskField::Effort,
    kind: FieldKind::Int { min: 1, max: 10 },
    removable: true,
};
const TAGS: FieldSpec = FieldSpec {
    name: "tags",
    field: TaskField::Tags,
    kind: FieldKind::Tags,
    removable: true,
};
const NOTES: FieldSpec = FieldSpec {
    name: "notes",
    field: TaskField::Notes,
    kind: FieldKind::Text { required: false },
    removable: true,
};

pub const TASK_FIELDS: &[FieldSpec] = &[
    TITLE, DONE, PROJECT, DUE, IMPORTANCE, URGENCY, EFFORT, TAGS, NOTES,
];

/// Look up a field by its wire name.
pub fn lookup(name: &str) -> Option<&'static FieldSpec> {
    TASK_FIELDS.iter().find(|spec| spec.name == name)
}

/// The table row for a field.
pub fn spec_for(field: TaskField) -> &'static FieldSpec {
    match field {
        TaskField::Title => &TITLE,
        TaskField::Done => &DONE,
        TaskField::Project => &PROJECT,
        TaskField::Due => &DUE,
        TaskField::Importance => &IMPORTANCE,
        TaskField::Urgency => &URGENCY,
        TaskField::Effort => &EFFORT,
        TaskField::Tags => &TAGS,
        TaskField::Notes => &NOTES,
    }
}

impl FieldSpec {
    /// Validate a raw value. `Ok(None)` means the field is to be removed.
    pub fn validate(&self, value: &Value) -> Result<Option<FieldValue>, OpError> {
        if value.is_null() {
            return if self.removable {
                Ok(None)
            } else {
                Err(self.invalid("cannot be removed"))
            };
        }
        match self.kind {
            FieldKind::Text { required } => {
                let text = value
                    .as_str()
                    .ok_or_else(|| self.invalid("must be a string"))?
                    .trim();
                if text.is_empty() {
                    return if required {
                        Err(self.invalid("must not be empty"))
                    } else {
                        Ok(None)
                    };
                }
                Ok(Some(FieldValue::Text(text.to_string())))
            }
            FieldKind::Flag => value
                .as_bool()
                .map(|b| Some(FieldValue::Flag(b)))
                .ok_or_else(|| self.invalid("must be true or false")),
            FieldKind::Int { min, max } => {
                let n = value
                    .as_f64()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| self.invalid("must be a number"))?;
                let n = (n + 0.5).floor();
                if n < min as f64 || n > max as f64 {
                    return Err(self.invalid(&format!("must be between {} and {}", min, max)));
                }
                Ok(Some(FieldValue::Int(n as i64)))
            }
            FieldKind::Date => {
                let text = value
                    .as_str()
                    .ok_or_else(|| self.invalid("must be a date in YYYY-MM-DD format"))?
                    .trim();
                if text.is_empty() {
                    return Ok(None);
                }
                if !DATE_RE.is_match(text) || NaiveDate::parse_from_str(text, "%Y-%m-%d").is_err()
                {
                    return Err(self.invalid("must be a date in YYYY-MM-DD format"));
                }
                Ok(Some(FieldValue::Text(text.to_string())))
            }
            FieldKind::Tags => {
                let items = value
                    .as_array()
                    .ok_or_else(|| self.invalid("must be a list of strings"))?;
                let mut tags: Vec<String> = Vec::new();
                for item in items {
                    let tag = item
                        .as_str()
                        .ok_or_else(|| self.invalid("must be a list of strings"))?
                        .trim();
                    if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                        tags.push(tag.to_string());
                    }
                }
                Ok((!tags.is_empty()).then_some(FieldValue::List(tags)))
            }
        }
    }

    fn invalid(&self, reason: &str) -> OpError {
        OpError::Validation(format!("{} {}", self.name, reason))
    }
}
