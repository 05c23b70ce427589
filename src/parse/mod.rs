pub mod jsonl;

pub use jsonl::{JsonlError, parse_jsonl, serialize_jsonl};
