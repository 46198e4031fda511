//! `PostgreSQL` repository implementation for the task board.
//!
//! Every ordering write runs in one transaction that first takes a
//! transaction-scoped advisory lock per touched column (in sorted order),
//! then locks the moving row, re-verifies the plan, and only then issues
//! the range-conditioned bulk shifts and the row write. The unique
//! constraint on `(organization_id, status, order_index)` is deferred to
//! commit, so shifts may collide transiently within the transaction.

use super::{
    models::{NewTaskRow, TaskContentChangeset, TaskRow},
    schema::tasks,
};
use crate::{
    db::{PgPool, run_blocking},
    organization::domain::OrganizationId,
    task::{
        domain::{
            ColumnKey, IndexShift, InsertPlan, MovePlan, OrderIndex, PersistedTaskData,
            Placement, RemovalPlan, ShiftDelta, Task, TaskChanges, TaskId, TaskStatus, TaskTitle,
        },
        ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
    },
    user::domain::UserId,
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Text;
use std::collections::BTreeSet;
use uuid::Uuid;

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        run_blocking(&self.pool, move |connection| {
            tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?
                .map(row_to_task)
                .transpose()
        })
        .await
    }

    async fn find_by_organizations(
        &self,
        organizations: &BTreeSet<OrganizationId>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let ids: Vec<Uuid> = organizations
            .iter()
            .copied()
            .map(OrganizationId::into_inner)
            .collect();
        run_blocking(&self.pool, move |connection| {
            let rows = tasks::table
                .filter(tasks::organization_id.eq_any(ids))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            let mut loaded = rows
                .into_iter()
                .map(row_to_task)
                .collect::<TaskRepositoryResult<Vec<_>>>()?;
            loaded.sort_by_key(|task| (task.organization_id(), task.status(), task.order_index()));
            Ok(loaded)
        })
        .await
    }

    async fn find_by_column(&self, column: ColumnKey) -> TaskRepositoryResult<Vec<Task>> {
        run_blocking(&self.pool, move |connection| {
            let rows = tasks::table
                .filter(tasks::organization_id.eq(column.organization_id().into_inner()))
                .filter(tasks::status.eq(column.status().as_str()))
                .order(tasks::order_index.asc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn column_len(&self, column: ColumnKey) -> TaskRepositoryResult<u32> {
        run_blocking(&self.pool, move |connection| count_column(connection, column)).await
    }

    async fn insert(&self, task: &Task, plan: &InsertPlan) -> TaskRepositoryResult<()> {
        let id = task.id();
        let row = to_new_row(task)?;
        let plan = *plan;
        run_blocking(&self.pool, move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                lock_columns(tx, &[plan.placement().column()])?;
                plan.verify(|column| count_column(tx, column))?;
                if let Some(shift) = plan.shift() {
                    apply_shift(tx, &shift, None)?;
                }
                diesel::insert_into(tasks::table)
                    .values(&row)
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            TaskRepositoryError::DuplicateTask(id)
                        }
                        _ => TaskRepositoryError::persistence(err),
                    })?;
                Ok(())
            })
        })
        .await
    }

    async fn update_content(
        &self,
        task: &Task,
        changes: &TaskChanges,
    ) -> TaskRepositoryResult<()> {
        let id = task.id();
        let changeset = TaskContentChangeset {
            title: changes
                .contains(TaskChanges::TITLE)
                .then(|| task.title().as_str().to_owned()),
            description: changes
                .contains(TaskChanges::DESCRIPTION)
                .then(|| task.description().map(str::to_owned)),
            category: changes
                .contains(TaskChanges::CATEGORY)
                .then(|| task.category().map(str::to_owned)),
            updated_at: task.updated_at(),
        };
        run_blocking(&self.pool, move |connection| {
            let updated = diesel::update(tasks::table.find(id.into_inner()))
                .set(&changeset)
                .execute(connection)?;
            if updated == 0 {
                return Err(TaskRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn remove(&self, plan: &RemovalPlan) -> TaskRepositoryResult<()> {
        let plan = *plan;
        run_blocking(&self.pool, move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                lock_columns(tx, &[plan.placement().column()])?;
                let current = lock_task_placement(tx, plan.task_id())?;
                plan.verify(current, |column| count_column(tx, column))?;
                diesel::delete(tasks::table.find(plan.task_id().into_inner())).execute(tx)?;
                if let Some(shift) = plan.shift() {
                    apply_shift(tx, &shift, Some(plan.task_id()))?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn apply_move(&self, plan: &MovePlan, moved: &Task) -> TaskRepositoryResult<()> {
        let plan = plan.clone();
        let destination = plan.destination();
        let status = destination.column().status().as_str();
        let order_index = to_db_index(destination.index())?;
        let updated_at = moved.updated_at();
        run_blocking(&self.pool, move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                lock_columns(tx, &plan.columns())?;
                let current = lock_task_placement(tx, plan.task_id())?;
                plan.verify(current, |column| count_column(tx, column))?;
                for shift in plan.shifts() {
                    apply_shift(tx, shift, Some(plan.task_id()))?;
                }
                diesel::update(tasks::table.find(plan.task_id().into_inner()))
                    .set((
                        tasks::status.eq(status),
                        tasks::order_index.eq(order_index),
                        tasks::updated_at.eq(updated_at),
                    ))
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }
}

fn column_lock_key(column: ColumnKey) -> String {
    format!("taskboard.column:{column}")
}

fn lock_columns(connection: &mut PgConnection, columns: &[ColumnKey]) -> TaskRepositoryResult<()> {
    for column in columns {
        diesel::sql_query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind::<Text, _>(column_lock_key(*column))
            .execute(connection)?;
    }
    Ok(())
}

fn lock_task_placement(
    connection: &mut PgConnection,
    id: TaskId,
) -> TaskRepositoryResult<Option<Placement>> {
    tasks::table
        .find(id.into_inner())
        .select((tasks::organization_id, tasks::status, tasks::order_index))
        .for_update()
        .first::<(Uuid, String, i32)>(connection)
        .optional()?
        .map(|(organization_id, status, order_index)| {
            placement_from_parts(organization_id, &status, order_index)
        })
        .transpose()
}

fn count_column(connection: &mut PgConnection, column: ColumnKey) -> TaskRepositoryResult<u32> {
    let count: i64 = tasks::table
        .filter(tasks::organization_id.eq(column.organization_id().into_inner()))
        .filter(tasks::status.eq(column.status().as_str()))
        .count()
        .get_result(connection)?;
    u32::try_from(count).map_err(TaskRepositoryError::persistence)
}

fn apply_shift(
    connection: &mut PgConnection,
    shift: &IndexShift,
    moving: Option<TaskId>,
) -> TaskRepositoryResult<usize> {
    let column = shift.column();
    let step: i32 = match shift.delta() {
        ShiftDelta::Increment => 1,
        ShiftDelta::Decrement => -1,
    };
    let start = to_db_index(shift.start())?;
    let end = shift.end().map(to_db_index).transpose()?.unwrap_or(i32::MAX);
    let excluded = moving.map_or(Uuid::nil(), TaskId::into_inner);
    Ok(diesel::update(tasks::table)
        .filter(tasks::organization_id.eq(column.organization_id().into_inner()))
        .filter(tasks::status.eq(column.status().as_str()))
        .filter(tasks::order_index.ge(start))
        .filter(tasks::order_index.lt(end))
        .filter(tasks::id.ne(excluded))
        .set(tasks::order_index.eq(tasks::order_index + step))
        .execute(connection)?)
}

fn to_db_index(index: OrderIndex) -> TaskRepositoryResult<i32> {
    i32::try_from(index.value()).map_err(TaskRepositoryError::persistence)
}

fn placement_from_parts(
    organization_id: Uuid,
    status: &str,
    order_index: i32,
) -> TaskRepositoryResult<Placement> {
    let parsed_status = TaskStatus::try_from(status).map_err(TaskRepositoryError::persistence)?;
    let index = u32::try_from(order_index).map_err(TaskRepositoryError::persistence)?;
    Ok(Placement::new(
        ColumnKey::new(OrganizationId::from_uuid(organization_id), parsed_status),
        OrderIndex::new(index),
    ))
}

fn to_new_row(task: &Task) -> TaskRepositoryResult<NewTaskRow> {
    Ok(NewTaskRow {
        id: task.id().into_inner(),
        organization_id: task.organization_id().into_inner(),
        owner_id: task.owner_id().into_inner(),
        title: task.title().as_str().to_owned(),
        description: task.description().map(str::to_owned),
        category: task.category().map(str::to_owned),
        status: task.status().as_str().to_owned(),
        order_index: to_db_index(task.order_index())?,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        organization_id,
        owner_id,
        title,
        description,
        category,
        status,
        order_index,
        created_at,
        updated_at,
    } = row;
    let validated_title = TaskTitle::new(title).map_err(TaskRepositoryError::persistence)?;
    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        owner_id: UserId::from_uuid(owner_id),
        title: validated_title,
        description,
        category,
        placement: placement_from_parts(organization_id, &status, order_index)?,
        created_at,
        updated_at,
    }))
}
