//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing or editing tasks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The status name is not one of the board's columns.
    #[error(transparent)]
    UnknownStatus(#[from] ParseTaskStatusError),
}

/// Error returned while parsing task statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
