//! Task board service: authorized task mutations that keep every column
//! densely indexed.
//!
//! Each ordering mutation plans its index shifts from a fresh read, then
//! hands the plan to the repository, which re-checks it and applies it
//! atomically. A plan invalidated by a concurrent writer is recomputed up
//! to the configured retry budget.

use super::{CreateTaskRequest, OrderingPolicy, ReorderTaskRequest};
use crate::{
    access::{
        domain::{Caller, Role},
        ports::{HierarchyLookup, HierarchyLookupError},
        services::{AccessError, OrgScopeAuthorizer},
    },
    audit::{
        domain::{AuditAction, AuditRecord},
        ports::AuditSink,
        services::AuditTrail,
    },
    organization::domain::OrganizationId,
    task::{
        domain::{
            ColumnKey, InsertPlan, MovePlan, NewTaskData, OrderIndex, RemovalPlan, Task,
            TaskDomainError, TaskEdit, TaskId, TaskStatus, TaskTitle,
        },
        ports::{TaskRepository, TaskRepositoryError},
    },
};
use mockable::Clock;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info};

const TASK_RESOURCE: &str = "Task";

/// Service-level errors for task board operations.
#[derive(Debug, Error)]
pub enum TaskBoardError {
    /// No task exists with the given identifier.
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// The caller's role or organization scope does not cover the task.
    #[error("{role} of organization {caller_org} is denied access to organization {target_org}")]
    Forbidden {
        /// Caller role.
        role: Role,
        /// Caller's home organization.
        caller_org: OrganizationId,
        /// Organization owning the task.
        target_org: OrganizationId,
    },

    /// Concurrent writers kept invalidating the plan.
    #[error("ordering conflict persisted after {attempts} attempts")]
    StorageConflict {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// Task validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),

    /// The organization hierarchy could not be read.
    #[error(transparent)]
    Lookup(#[from] HierarchyLookupError),
}

impl From<AccessError> for TaskBoardError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Forbidden {
                role,
                caller_org,
                target_org,
            } => Self::Forbidden {
                role,
                caller_org,
                target_org,
            },
            AccessError::Lookup(lookup) => Self::Lookup(lookup),
        }
    }
}

/// Result type for task board operations.
pub type TaskBoardResult<T> = Result<T, TaskBoardError>;

/// Task board orchestration service.
pub struct TaskBoardService<T, L, A, C>
where
    T: TaskRepository,
    L: HierarchyLookup + ?Sized,
    A: AuditSink + ?Sized,
    C: Clock + Send + Sync,
{
    tasks: Arc<T>,
    authorizer: OrgScopeAuthorizer<L>,
    audit: AuditTrail<A>,
    clock: Arc<C>,
    policy: OrderingPolicy,
}

impl<T, L, A, C> Clone for TaskBoardService<T, L, A, C>
where
    T: TaskRepository,
    L: HierarchyLookup + ?Sized,
    A: AuditSink + ?Sized,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            tasks: Arc::clone(&self.tasks),
            authorizer: self.authorizer.clone(),
            audit: self.audit.clone(),
            clock: Arc::clone(&self.clock),
            policy: self.policy,
        }
    }
}

impl<T, L, A, C> TaskBoardService<T, L, A, C>
where
    T: TaskRepository,
    L: HierarchyLookup + ?Sized,
    A: AuditSink + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a service with the default retry budget.
    #[must_use]
    pub const fn new(tasks: Arc<T>, hierarchy: Arc<L>, audit: Arc<A>, clock: Arc<C>) -> Self {
        Self {
            tasks,
            authorizer: OrgScopeAuthorizer::new(hierarchy),
            audit: AuditTrail::new(audit),
            clock,
            policy: OrderingPolicy::new(OrderingPolicy::DEFAULT_MAX_CONFLICT_RETRIES),
        }
    }

    /// Replaces the retry budget.
    #[must_use]
    pub const fn with_policy(mut self, policy: OrderingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the retry budget in use.
    #[must_use]
    pub const fn policy(&self) -> OrderingPolicy {
        self.policy
    }

    /// Creates a task in the caller's organization.
    ///
    /// Without an explicit index the task is appended to its column;
    /// otherwise it is inserted at the index (clamped to the column
    /// length) and later tasks move back by one.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::Forbidden`] for read-only roles,
    /// [`TaskBoardError::Domain`] for a blank title, and
    /// [`TaskBoardError::StorageConflict`] when the retry budget runs out.
    pub async fn create_task(
        &self,
        caller: &Caller,
        request: CreateTaskRequest,
    ) -> TaskBoardResult<Task> {
        let column = ColumnKey::new(caller.organization_id(), request.status);
        self.authorize_modify(caller, column.organization_id()).await?;
        let requested = request.order_index;
        let data = NewTaskData {
            owner_id: caller.user_id(),
            title: TaskTitle::new(request.title)?,
            description: request.description,
            category: request.category,
        };

        let task = self
            .with_conflict_retry("create", move || {
                self.try_insert(column, data.clone(), requested)
            })
            .await?;

        info!(
            task_id = %task.id(),
            placement = %task.placement(),
            "task created"
        );
        let record = self
            .audit_record(AuditAction::TaskCreate, caller, &task)
            .with_meta(task.summary());
        self.audit.emit(record).await;
        Ok(task)
    }

    /// Edits a task's title, description or category.
    ///
    /// An edit that changes nothing is not written and not audited.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::NotFound`], [`TaskBoardError::Forbidden`],
    /// or [`TaskBoardError::Domain`] for a blank title.
    pub async fn update_task(
        &self,
        caller: &Caller,
        id: TaskId,
        edit: TaskEdit,
    ) -> TaskBoardResult<Task> {
        let mut task = self.load(id).await?;
        self.authorize_modify(caller, task.organization_id()).await?;

        let changes = task.apply_edit(edit, &*self.clock)?;
        if changes.is_empty() {
            return Ok(task);
        }

        match self.tasks.update_content(&task, &changes).await {
            Ok(()) => {}
            Err(TaskRepositoryError::NotFound(missing)) => {
                return Err(TaskBoardError::NotFound(missing));
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            task_id = %task.id(),
            fields = ?changes.fields().collect::<Vec<_>>(),
            "task updated"
        );
        let record = self
            .audit_record(AuditAction::TaskUpdate, caller, &task)
            .with_meta(changes.to_audit_meta());
        self.audit.emit(record).await;
        Ok(task)
    }

    /// Deletes a task and closes the gap it leaves in its column.
    ///
    /// The audit record is emitted once, by the first attempt that reloads
    /// the task, and before that attempt removes the row. A delete that
    /// finds the task gone records nothing. A delete that exhausts its
    /// retry budget after that point keeps its record.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::NotFound`], [`TaskBoardError::Forbidden`],
    /// or [`TaskBoardError::StorageConflict`] when the retry budget runs out.
    pub async fn delete_task(&self, caller: &Caller, id: TaskId) -> TaskBoardResult<()> {
        let task = self.load(id).await?;
        self.authorize_modify(caller, task.organization_id()).await?;

        let audit_emitted = AtomicBool::new(false);
        let audited = &audit_emitted;
        let removed = self
            .with_conflict_retry("delete", move || self.try_remove(caller, id, audited))
            .await?;
        info!(
            task_id = %removed.id(),
            placement = %removed.placement(),
            "task deleted"
        );
        Ok(())
    }

    /// Moves a task within its column or into another status column.
    ///
    /// The target index is clamped to the column: `[0, n - 1]` inside the
    /// current column, `[0, n]` in another one. A move that lands on the
    /// task's current placement writes nothing and returns the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::NotFound`], [`TaskBoardError::Forbidden`],
    /// or [`TaskBoardError::StorageConflict`] when the retry budget runs out.
    pub async fn reorder_task(
        &self,
        caller: &Caller,
        id: TaskId,
        request: ReorderTaskRequest,
    ) -> TaskBoardResult<Task> {
        self.with_conflict_retry("reorder", move || self.try_move(caller, id, request))
            .await
    }

    /// Returns whether `caller` may access the task's organization.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::NotFound`] when the task does not exist.
    pub async fn check_task_access(&self, caller: &Caller, id: TaskId) -> TaskBoardResult<bool> {
        let task = self.load(id).await?;
        Ok(self
            .authorizer
            .has_access(caller, task.organization_id())
            .await?)
    }

    /// Returns a task the caller may see.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::NotFound`] or [`TaskBoardError::Forbidden`].
    pub async fn find_task(&self, caller: &Caller, id: TaskId) -> TaskBoardResult<Task> {
        let task = self.load(id).await?;
        self.authorizer
            .authorize(caller, task.organization_id())
            .await?;
        Ok(task)
    }

    /// Returns every task in the caller's scope, ordered by organization,
    /// column and index.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::Lookup`] or [`TaskBoardError::Repository`]
    /// when a read fails.
    pub async fn list_tasks(&self, caller: &Caller) -> TaskBoardResult<Vec<Task>> {
        let scope = self.authorizer.accessible_org_ids(caller).await?;
        Ok(self.tasks.find_by_organizations(&scope).await?)
    }

    /// Returns the tasks of one organization, ordered by column and index.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::Forbidden`] when the organization is out
    /// of scope.
    pub async fn list_organization_tasks(
        &self,
        caller: &Caller,
        organization_id: OrganizationId,
    ) -> TaskBoardResult<Vec<Task>> {
        self.authorizer.authorize(caller, organization_id).await?;
        Ok(self
            .tasks
            .find_by_organizations(&BTreeSet::from([organization_id]))
            .await?)
    }

    /// Returns one column in index order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::Forbidden`] when the organization is out
    /// of scope.
    pub async fn list_column(
        &self,
        caller: &Caller,
        organization_id: OrganizationId,
        status: TaskStatus,
    ) -> TaskBoardResult<Vec<Task>> {
        self.authorizer.authorize(caller, organization_id).await?;
        Ok(self
            .tasks
            .find_by_column(ColumnKey::new(organization_id, status))
            .await?)
    }

    async fn try_insert(
        &self,
        column: ColumnKey,
        data: NewTaskData,
        requested: Option<OrderIndex>,
    ) -> TaskBoardResult<Task> {
        let len = self.tasks.column_len(column).await?;
        let plan = InsertPlan::plan(column, len, requested);
        let task = Task::new(data, plan.placement(), &*self.clock);
        self.tasks.insert(&task, &plan).await?;
        Ok(task)
    }

    async fn try_remove(
        &self,
        caller: &Caller,
        id: TaskId,
        audited: &AtomicBool,
    ) -> TaskBoardResult<Task> {
        let task = self.load(id).await?;
        if !audited.swap(true, Ordering::Relaxed) {
            let record = self
                .audit_record(AuditAction::TaskDelete, caller, &task)
                .with_meta(task.summary());
            self.audit.emit(record).await;
        }
        let len = self.tasks.column_len(task.column()).await?;
        let plan = RemovalPlan::plan(id, task.placement(), len);
        self.tasks.remove(&plan).await?;
        Ok(task)
    }

    async fn try_move(
        &self,
        caller: &Caller,
        id: TaskId,
        request: ReorderTaskRequest,
    ) -> TaskBoardResult<Task> {
        let mut task = self.load(id).await?;
        self.authorize_modify(caller, task.organization_id()).await?;

        let origin = task.placement();
        let source_len = self.tasks.column_len(origin.column()).await?;
        let target_status = request.status.unwrap_or(origin.column().status());
        let plan = if target_status == origin.column().status() {
            MovePlan::within_column(id, origin, source_len, request.order_index)
        } else {
            let target = ColumnKey::new(task.organization_id(), target_status);
            let target_len = self.tasks.column_len(target).await?;
            Some(MovePlan::across_columns(
                id,
                origin,
                source_len,
                target,
                target_len,
                request.order_index,
            ))
        };
        let Some(move_plan) = plan else {
            debug!(task_id = %id, placement = %origin, "reorder lands on current placement");
            return Ok(task);
        };

        task.relocate(move_plan.destination(), &*self.clock);
        self.tasks.apply_move(&move_plan, &task).await?;
        info!(
            task_id = %id,
            from = %move_plan.origin(),
            to = %move_plan.destination(),
            "task reordered"
        );
        Ok(task)
    }

    async fn with_conflict_retry<V, F, Fut>(
        &self,
        operation: &'static str,
        mut attempt: F,
    ) -> TaskBoardResult<V>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = TaskBoardResult<V>>,
    {
        let max_attempts = self.policy.max_attempts();
        let mut attempts = 0_u32;
        loop {
            attempts = attempts.saturating_add(1);
            match attempt().await {
                Err(TaskBoardError::Repository(TaskRepositoryError::Conflict(reason))) => {
                    debug!(operation, attempts, %reason, "ordering plan invalidated");
                    if attempts >= max_attempts {
                        return Err(TaskBoardError::StorageConflict { attempts });
                    }
                    tokio::task::yield_now().await;
                }
                outcome => return outcome,
            }
        }
    }

    async fn load(&self, id: TaskId) -> TaskBoardResult<Task> {
        self.tasks
            .find_by_id(id)
            .await?
            .ok_or(TaskBoardError::NotFound(id))
    }

    async fn authorize_modify(
        &self,
        caller: &Caller,
        organization_id: OrganizationId,
    ) -> TaskBoardResult<()> {
        if !caller.role().can_modify_tasks() {
            return Err(TaskBoardError::Forbidden {
                role: caller.role(),
                caller_org: caller.organization_id(),
                target_org: organization_id,
            });
        }
        Ok(self.authorizer.authorize(caller, organization_id).await?)
    }

    fn audit_record(&self, action: AuditAction, caller: &Caller, task: &Task) -> AuditRecord {
        AuditRecord::new(action, TASK_RESOURCE, &*self.clock)
            .with_actor(caller.user_id())
            .with_resource(task.id().into_inner())
    }
}
