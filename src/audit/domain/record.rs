//! Audit record and action types.

use crate::user::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Kind of change an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    /// A task was created.
    #[serde(rename = "task.create")]
    TaskCreate,
    /// A task's content changed.
    #[serde(rename = "task.update")]
    TaskUpdate,
    /// A task was deleted.
    #[serde(rename = "task.delete")]
    TaskDelete,
}

impl AuditAction {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreate => "task.create",
            Self::TaskUpdate => "task.update",
            Self::TaskDelete => "task.delete",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored action name is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown audit action: {0}")]
pub struct ParseAuditActionError(pub String);

impl TryFrom<&str> for AuditAction {
    type Error = ParseAuditActionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "task.create" => Ok(Self::TaskCreate),
            "task.update" => Ok(Self::TaskUpdate),
            "task.delete" => Ok(Self::TaskDelete),
            _ => Err(ParseAuditActionError(value.to_owned())),
        }
    }
}

/// Structured description of one mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    actor_id: Option<UserId>,
    action: AuditAction,
    resource_type: String,
    resource_id: Option<Uuid>,
    meta: serde_json::Value,
    recorded_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAuditRecordData {
    /// Acting user, if known.
    pub actor_id: Option<UserId>,
    /// Recorded action.
    pub action: AuditAction,
    /// Kind of resource affected.
    pub resource_type: String,
    /// Affected resource, if any.
    pub resource_id: Option<Uuid>,
    /// Action-specific detail.
    pub meta: serde_json::Value,
    /// Time the record was taken.
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Creates a record with empty metadata and no actor or resource.
    #[must_use]
    pub fn new(action: AuditAction, resource_type: impl Into<String>, clock: &impl Clock) -> Self {
        Self {
            actor_id: None,
            action,
            resource_type: resource_type.into(),
            resource_id: None,
            meta: serde_json::Value::Object(serde_json::Map::new()),
            recorded_at: clock.utc(),
        }
    }

    /// Reconstructs a record from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedAuditRecordData) -> Self {
        Self {
            actor_id: data.actor_id,
            action: data.action,
            resource_type: data.resource_type,
            resource_id: data.resource_id,
            meta: data.meta,
            recorded_at: data.recorded_at,
        }
    }

    /// Sets the acting user.
    #[must_use]
    pub const fn with_actor(mut self, actor_id: UserId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Sets the affected resource.
    #[must_use]
    pub const fn with_resource(mut self, resource_id: Uuid) -> Self {
        self.resource_id = Some(resource_id);
        self
    }

    /// Replaces the metadata payload.
    #[must_use]
    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = meta;
        self
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn actor_id(&self) -> Option<UserId> {
        self.actor_id
    }

    /// Returns the recorded action.
    #[must_use]
    pub const fn action(&self) -> AuditAction {
        self.action
    }

    /// Returns the kind of resource affected.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Returns the affected resource.
    #[must_use]
    pub const fn resource_id(&self) -> Option<Uuid> {
        self.resource_id
    }

    /// Returns the metadata payload.
    #[must_use]
    pub const fn meta(&self) -> &serde_json::Value {
        &self.meta
    }

    /// Returns when the record was taken.
    #[must_use]
    pub const fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}
