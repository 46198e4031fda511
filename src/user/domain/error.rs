//! Error types for user validation.

use thiserror::Error;

/// Errors returned while constructing users.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserDomainError {
    /// The email address is not of the form `local@domain`.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
}
