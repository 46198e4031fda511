//! Diesel row models for organization persistence.

use super::schema::organizations;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for organization records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = organizations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrganizationRow {
    /// Organization identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Parent organization, if any.
    pub parent_id: Option<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert and update model for organization records.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = organizations)]
#[diesel(treat_none_as_null = true)]
pub struct OrganizationRecord {
    /// Organization identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Parent organization, if any.
    pub parent_id: Option<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
