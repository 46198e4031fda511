//! Audit sink and reader ports.

use crate::{audit::domain::AuditRecord, db::DbAccessError};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for audit sink operations.
pub type AuditSinkResult<T> = Result<T, AuditSinkError>;

/// Destination for audit records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends one record.
    ///
    /// # Errors
    ///
    /// Returns [`AuditSinkError`] when the record could not be stored.
    async fn record(&self, record: AuditRecord) -> AuditSinkResult<()>;
}

/// Read access to stored audit records.
#[async_trait]
pub trait AuditLogReader: Send + Sync {
    /// Returns up to `limit` records, newest first.
    async fn recent(&self, limit: usize) -> AuditSinkResult<Vec<AuditRecord>>;
}

/// Errors returned by audit sink implementations.
#[derive(Debug, Clone, Error)]
pub enum AuditSinkError {
    /// Persistence-layer failure.
    #[error("audit persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl AuditSinkError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<DbAccessError> for AuditSinkError {
    fn from(err: DbAccessError) -> Self {
        Self::persistence(err)
    }
}
