use serde_json::Value;

/// A malformed line in JSON Lines text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Line {line}: {message}")]
pub struct JsonlError {
    /// 1-based line number in the input
    pub line: usize,
    pub message: String,
}

/// Parse JSON Lines text into one value per line.
///
/// Lines are trimmed; blank lines and lines starting with `#` are skipped.
/// Stops at the first line that is not valid JSON.
pub fn parse_jsonl(text: &str) -> Result<Vec<Value>, JsonlError> {
    let mut records = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let value = serde_json::from_str(line).map_err(|e| JsonlError {
            line: idx + 1,
            message: e.to_string(),
        })?;
        records.push(value);
    }
    Ok(records)
}

/// Serialize records as single-line JSON joined by `\n`, without a
/// trailing newline.
pub fn serialize_jsonl(records: &[Value]) -> String {
    records
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
