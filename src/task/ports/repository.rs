//! Repository port for task persistence and atomic plan application.

use crate::{
    db::DbAccessError,
    organization::domain::OrganizationId,
    task::domain::{
        ColumnKey, InsertPlan, MovePlan, PlanConflict, RemovalPlan, Task, TaskChanges, TaskId,
    },
};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// The three ordering writes ([`insert`], [`remove`], [`apply_move`]) each
/// re-check their plan and apply its shifts together with the row write as
/// one atomic unit. No partially shifted column is ever observable.
///
/// [`insert`]: TaskRepository::insert
/// [`remove`]: TaskRepository::remove
/// [`apply_move`]: TaskRepository::apply_move
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Finds a task by identifier.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns the tasks of every listed organization ordered by
    /// organization, status and index.
    async fn find_by_organizations(
        &self,
        organizations: &BTreeSet<OrganizationId>,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the tasks of one column in index order.
    async fn find_by_column(&self, column: ColumnKey) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the number of tasks in a column.
    async fn column_len(&self, column: ColumnKey) -> TaskRepositoryResult<u32>;

    /// Inserts `task` at the plan's placement, shifting later tasks back.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Conflict`] when the column length no
    /// longer matches the plan, or [`TaskRepositoryError::DuplicateTask`]
    /// when the identifier exists.
    async fn insert(&self, task: &Task, plan: &InsertPlan) -> TaskRepositoryResult<()>;

    /// Persists the content fields named in `changes` plus the timestamp.
    ///
    /// Placement columns and unchanged fields are left alone, so a
    /// concurrent move or an edit of another field is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist.
    async fn update_content(
        &self,
        task: &Task,
        changes: &TaskChanges,
    ) -> TaskRepositoryResult<()>;

    /// Removes the planned task and closes the gap behind it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Conflict`] when the task or its column
    /// changed since planning.
    async fn remove(&self, plan: &RemovalPlan) -> TaskRepositoryResult<()>;

    /// Applies a move plan and stores `moved`'s new placement and timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Conflict`] when the task or a column
    /// changed since planning.
    async fn apply_move(&self, plan: &MovePlan, moved: &Task) -> TaskRepositoryResult<()>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The plan was computed from state another writer has since changed.
    #[error("ordering conflict: {0}")]
    Conflict(#[from] PlanConflict),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<DbAccessError> for TaskRepositoryError {
    fn from(err: DbAccessError) -> Self {
        Self::persistence(err)
    }
}

impl From<diesel::result::Error> for TaskRepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}
