//! Diesel row models for task persistence.

use super::schema::tasks;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning organization.
    pub organization_id: uuid::Uuid,
    /// Creating user.
    pub owner_id: uuid::Uuid,
    /// Title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional category label.
    pub category: Option<String>,
    /// Status column.
    pub status: String,
    /// Position within the status column.
    pub order_index: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning organization.
    pub organization_id: uuid::Uuid,
    /// Creating user.
    pub owner_id: uuid::Uuid,
    /// Title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional category label.
    pub category: Option<String>,
    /// Status column.
    pub status: String,
    /// Position within the status column.
    pub order_index: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Content-only changeset; placement columns are never touched by it.
///
/// `None` skips a column, so only edited fields are written.
/// `Some(None)` clears a nullable column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
pub struct TaskContentChangeset {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New category label.
    pub category: Option<Option<String>>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
