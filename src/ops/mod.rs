pub mod apply;
pub mod check;
pub mod exchange;
pub mod fields;
pub mod hydrate;
pub mod priority;
pub mod project_ops;
pub mod task_ops;
pub mod template;

/// Error type for a single task or project operation.
///
/// The message is what the user sees, so every variant displays it as is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OpError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
}
