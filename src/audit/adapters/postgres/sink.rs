//! `PostgreSQL` audit log.

use super::{
    models::{AuditRow, NewAuditRow},
    schema::audit_logs,
};
use crate::{
    audit::{
        domain::{AuditAction, AuditRecord, PersistedAuditRecordData},
        ports::{AuditLogReader, AuditSink, AuditSinkError, AuditSinkResult},
    },
    db::{PgPool, run_blocking},
    user::domain::UserId,
};
use async_trait::async_trait;
use diesel::prelude::*;

/// `PostgreSQL`-backed audit log writing to `audit_logs`.
#[derive(Debug, Clone)]
pub struct PostgresAuditLog {
    pool: PgPool,
}

impl PostgresAuditLog {
    /// Creates a new audit log from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PostgresAuditLog {
    async fn record(&self, record: AuditRecord) -> AuditSinkResult<()> {
        let row = NewAuditRow {
            actor_id: record.actor_id().map(UserId::into_inner),
            action: record.action().as_str().to_owned(),
            resource_type: record.resource_type().to_owned(),
            resource_id: record.resource_id(),
            meta: record.meta().clone(),
            recorded_at: record.recorded_at(),
        };
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(audit_logs::table)
                .values(&row)
                .execute(connection)
                .map_err(AuditSinkError::persistence)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl AuditLogReader for PostgresAuditLog {
    async fn recent(&self, limit: usize) -> AuditSinkResult<Vec<AuditRecord>> {
        let bounded = i64::try_from(limit).unwrap_or(i64::MAX);
        run_blocking(&self.pool, move |connection| {
            let rows = audit_logs::table
                .order(audit_logs::id.desc())
                .limit(bounded)
                .select(AuditRow::as_select())
                .load::<AuditRow>(connection)
                .map_err(AuditSinkError::persistence)?;
            rows.into_iter().map(row_to_record).collect()
        })
        .await
    }
}

fn row_to_record(row: AuditRow) -> AuditSinkResult<AuditRecord> {
    let action = AuditAction::try_from(row.action.as_str()).map_err(AuditSinkError::persistence)?;
    Ok(AuditRecord::from_persisted(PersistedAuditRecordData {
        actor_id: row.actor_id.map(UserId::from_uuid),
        action,
        resource_type: row.resource_type,
        resource_id: row.resource_id,
        meta: row.meta,
        recorded_at: row.recorded_at,
    }))
}
