//! Error types for access domain parsing.

use thiserror::Error;

/// Error returned when a role string names none of the known roles.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);
