//! Task aggregate root and content edits.

use super::{
    ColumnKey, IndexShift, OrderIndex, Placement, TaskDomainError, TaskId, TaskStatus, TaskTitle,
};
use crate::{organization::domain::OrganizationId, user::domain::UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Content supplied when creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskData {
    /// Creating user.
    pub owner_id: UserId,
    /// Validated title.
    pub title: TaskTitle,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Optional category label.
    pub category: Option<String>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted identifier.
    pub id: TaskId,
    /// Persisted creating user.
    pub owner_id: UserId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted category.
    pub category: Option<String>,
    /// Persisted column and position.
    pub placement: Placement,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Task aggregate root.
///
/// The organization is fixed at creation; status and position change only
/// through [`Task::relocate`] and bulk shifts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    owner_id: UserId,
    title: TaskTitle,
    description: Option<String>,
    category: Option<String>,
    placement: Placement,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a task at `placement`.
    #[must_use]
    pub fn new(data: NewTaskData, placement: Placement, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            owner_id: data.owner_id,
            title: data.title,
            description: data.description,
            category: data.category,
            placement,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            owner_id: data.owner_id,
            title: data.title,
            description: data.description,
            category: data.category,
            placement: data.placement,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the creating user.
    #[must_use]
    pub const fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Returns the owning organization.
    #[must_use]
    pub const fn organization_id(&self) -> OrganizationId {
        self.placement.column().organization_id()
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the category, if any.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Returns the status column.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.placement.column().status()
    }

    /// Returns the position within the column.
    #[must_use]
    pub const fn order_index(&self) -> OrderIndex {
        self.placement.index()
    }

    /// Returns the column and position.
    #[must_use]
    pub const fn placement(&self) -> Placement {
        self.placement
    }

    /// Returns the column.
    #[must_use]
    pub const fn column(&self) -> ColumnKey {
        self.placement.column()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the task to `placement` within the same organization.
    pub fn relocate(&mut self, placement: Placement, clock: &impl Clock) {
        self.placement = placement;
        self.touch(clock);
    }

    /// Copies the fields named in `changes` and the timestamp from
    /// `edited`. Placement and unchanged fields keep their current values.
    pub fn adopt_content(&mut self, edited: &Self, changes: &TaskChanges) {
        if changes.contains(TaskChanges::TITLE) {
            self.title = edited.title.clone();
        }
        if changes.contains(TaskChanges::DESCRIPTION) {
            self.description = edited.description.clone();
        }
        if changes.contains(TaskChanges::CATEGORY) {
            self.category = edited.category.clone();
        }
        self.updated_at = edited.updated_at;
    }

    /// Copies placement and timestamp from `moved`, keeping this task's
    /// content.
    pub const fn adopt_placement(&mut self, moved: &Self) {
        self.placement = moved.placement;
        self.updated_at = moved.updated_at;
    }

    /// Applies a bulk shift to this task's index.
    ///
    /// Returns `true` when the shift covered the task. The timestamp is
    /// left alone.
    pub fn apply_shift(&mut self, shift: &IndexShift) -> bool {
        if !shift.covers(self.placement) {
            return false;
        }
        self.placement = Placement::new(self.column(), shift.apply(self.placement));
        true
    }

    /// Applies a content edit and returns the field-level diff.
    ///
    /// Fields whose value does not change are left out of the diff; an
    /// empty diff leaves the task untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] for a blank title, in which
    /// case nothing is applied.
    pub fn apply_edit(
        &mut self,
        edit: TaskEdit,
        clock: &impl Clock,
    ) -> Result<TaskChanges, TaskDomainError> {
        let title = edit.title.map(TaskTitle::new).transpose()?;
        let mut changes = TaskChanges::default();

        if let Some(new_title) = title.filter(|candidate| *candidate != self.title) {
            changes.record(TaskChanges::TITLE, json!(self.title), json!(new_title));
            self.title = new_title;
        }
        if let Some(description) = edit.description.filter(|value| *value != self.description) {
            changes.record(TaskChanges::DESCRIPTION, json!(self.description), json!(description));
            self.description = description;
        }
        if let Some(category) = edit.category.filter(|value| *value != self.category) {
            changes.record(TaskChanges::CATEGORY, json!(self.category), json!(category));
            self.category = category;
        }

        if !changes.is_empty() {
            self.touch(clock);
        }
        Ok(changes)
    }

    /// Returns the `{title, status}` summary recorded on create and delete.
    #[must_use]
    pub fn summary(&self) -> Value {
        json!({
            "title": self.title,
            "status": self.status(),
        })
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

/// Partial content update.
///
/// Status and position are not editable here; use a reorder so the column
/// stays dense.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    title: Option<String>,
    description: Option<Option<String>>,
    category: Option<Option<String>>,
}

impl TaskEdit {
    /// Creates an empty edit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a new title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets a new description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Some(description.into()));
        self
    }

    /// Removes the description.
    #[must_use]
    pub fn clear_description(mut self) -> Self {
        self.description = Some(None);
        self
    }

    /// Sets a new category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(Some(category.into()));
        self
    }

    /// Removes the category.
    #[must_use]
    pub fn clear_category(mut self) -> Self {
        self.category = Some(None);
        self
    }

    /// Returns `true` when the edit names no field.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.category.is_none()
    }
}

/// Field-level diff of a content edit, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskChanges(Map<String, Value>);

impl TaskChanges {
    /// Diff key for the title.
    pub const TITLE: &'static str = "title";
    /// Diff key for the description.
    pub const DESCRIPTION: &'static str = "description";
    /// Diff key for the category.
    pub const CATEGORY: &'static str = "category";

    fn record(&mut self, field: &str, from: Value, to: Value) {
        self.0
            .insert(field.to_owned(), json!({ "from": from, "to": to }));
    }

    /// Returns `true` when no field changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the names of the changed fields.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns `true` when `field` changed.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Returns the `{from, to}` entry for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns the `{changes: ..}` payload recorded on update.
    #[must_use]
    pub fn to_audit_meta(&self) -> Value {
        json!({ "changes": self.0 })
    }
}
