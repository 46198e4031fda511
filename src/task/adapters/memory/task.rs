//! In-memory repository for task board tests.
//!
//! One write lock covers plan verification, the bulk shifts and the row
//! write, so every ordering operation is atomic with respect to readers
//! and other writers.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    organization::domain::OrganizationId,
    task::{
        domain::{
            ColumnKey, IndexShift, InsertPlan, MovePlan, RemovalPlan, Task, TaskChanges, TaskId,
        },
        ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
    },
};

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, HashMap<TaskId, Task>>> {
        self.tasks
            .read()
            .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, HashMap<TaskId, Task>>> {
        self.tasks
            .write()
            .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }
}

fn count_column(tasks: &HashMap<TaskId, Task>, column: ColumnKey) -> TaskRepositoryResult<u32> {
    let count = tasks.values().filter(|task| task.column() == column).count();
    u32::try_from(count).map_err(TaskRepositoryError::persistence)
}

fn shift_others(tasks: &mut HashMap<TaskId, Task>, shift: &IndexShift, moving: Option<TaskId>) {
    for task in tasks.values_mut() {
        if Some(task.id()) != moving {
            task.apply_shift(shift);
        }
    }
}

fn sorted(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by_key(|task| (task.organization_id(), task.status(), task.order_index()));
    tasks
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn find_by_organizations(
        &self,
        organizations: &BTreeSet<OrganizationId>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self.read()?;
        Ok(sorted(
            tasks
                .values()
                .filter(|task| organizations.contains(&task.organization_id()))
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_column(&self, column: ColumnKey) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self.read()?;
        Ok(sorted(
            tasks
                .values()
                .filter(|task| task.column() == column)
                .cloned()
                .collect(),
        ))
    }

    async fn column_len(&self, column: ColumnKey) -> TaskRepositoryResult<u32> {
        let tasks = self.read()?;
        count_column(&tasks, column)
    }

    async fn insert(&self, task: &Task, plan: &InsertPlan) -> TaskRepositoryResult<()> {
        let mut tasks = self.write()?;
        if tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        plan.verify(|column| count_column(&tasks, column))?;

        if let Some(shift) = plan.shift() {
            shift_others(&mut tasks, &shift, None);
        }
        tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update_content(
        &self,
        task: &Task,
        changes: &TaskChanges,
    ) -> TaskRepositoryResult<()> {
        let mut tasks = self.write()?;
        let stored = tasks
            .get_mut(&task.id())
            .ok_or(TaskRepositoryError::NotFound(task.id()))?;
        stored.adopt_content(task, changes);
        Ok(())
    }

    async fn remove(&self, plan: &RemovalPlan) -> TaskRepositoryResult<()> {
        let mut tasks = self.write()?;
        let current = tasks.get(&plan.task_id()).map(Task::placement);
        plan.verify(current, |column| count_column(&tasks, column))?;

        tasks.remove(&plan.task_id());
        if let Some(shift) = plan.shift() {
            shift_others(&mut tasks, &shift, Some(plan.task_id()));
        }
        Ok(())
    }

    async fn apply_move(&self, plan: &MovePlan, moved: &Task) -> TaskRepositoryResult<()> {
        let mut tasks = self.write()?;
        let current = tasks.get(&plan.task_id()).map(Task::placement);
        plan.verify(current, |column| count_column(&tasks, column))?;

        for shift in plan.shifts() {
            shift_others(&mut tasks, shift, Some(plan.task_id()));
        }
        let stored = tasks
            .get_mut(&plan.task_id())
            .ok_or(TaskRepositoryError::NotFound(plan.task_id()))?;
        stored.adopt_placement(moved);
        Ok(())
    }
}
