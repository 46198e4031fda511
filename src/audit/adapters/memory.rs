//! In-memory audit log.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::audit::{
    domain::AuditRecord,
    ports::{AuditLogReader, AuditSink, AuditSinkError, AuditSinkResult},
};

/// Thread-safe append-only in-memory audit log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLog {
    records: Arc<RwLock<Vec<AuditRecord>>>,
}

impl InMemoryAuditLog {
    /// Creates an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl std::fmt::Display) -> AuditSinkError {
    AuditSinkError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl AuditSink for InMemoryAuditLog {
    async fn record(&self, record: AuditRecord) -> AuditSinkResult<()> {
        self.records.write().map_err(poisoned)?.push(record);
        Ok(())
    }
}

#[async_trait]
impl AuditLogReader for InMemoryAuditLog {
    async fn recent(&self, limit: usize) -> AuditSinkResult<Vec<AuditRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}
