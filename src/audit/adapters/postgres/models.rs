//! Diesel row models for audit persistence.

use super::schema::audit_logs;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for audit records.
///
/// The `id` sequence only orders reads, so it is not selected.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = audit_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuditRow {
    /// Acting user, if known.
    pub actor_id: Option<uuid::Uuid>,
    /// Action name.
    pub action: String,
    /// Kind of resource affected.
    pub resource_type: String,
    /// Affected resource, if any.
    pub resource_id: Option<uuid::Uuid>,
    /// Action-specific detail.
    pub meta: serde_json::Value,
    /// Time the record was taken.
    pub recorded_at: DateTime<Utc>,
}

/// Insert model for audit records; the sequence is assigned by the
/// database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = audit_logs)]
pub struct NewAuditRow {
    /// Acting user, if known.
    pub actor_id: Option<uuid::Uuid>,
    /// Action name.
    pub action: String,
    /// Kind of resource affected.
    pub resource_type: String,
    /// Affected resource, if any.
    pub resource_id: Option<uuid::Uuid>,
    /// Action-specific detail.
    pub meta: serde_json::Value,
    /// Time the record was taken.
    pub recorded_at: DateTime<Utc>,
}
