//! Ordering writes against `PostgreSQL`.

use std::sync::Arc;

use super::helpers::{Adapters, TestDatabase, database, test_runtime};
use mockable::DefaultClock;
use rstest::rstest;
use taskboard::{
    access::domain::{Caller, Role},
    audit::adapters::postgres::PostgresAuditLog,
    organization::{
        adapters::postgres::PostgresOrganizationRepository,
        domain::OrganizationId,
        services::{CreateOrganizationRequest, OrganizationService},
    },
    task::{
        adapters::postgres::PostgresTaskRepository,
        domain::{Task, TaskEdit, TaskStatus},
        ports::TaskRepository,
        services::{CreateTaskRequest, OrderingPolicy, ReorderTaskRequest, TaskBoardService},
    },
    user::domain::UserId,
};

type PgBoard = TaskBoardService<
    PostgresTaskRepository,
    PostgresOrganizationRepository,
    PostgresAuditLog,
    DefaultClock,
>;

async fn board_for(adapters: &Adapters) -> Result<(PgBoard, Caller), eyre::Report> {
    let organizations = OrganizationService::new(
        Arc::clone(&adapters.organizations),
        Arc::new(DefaultClock),
    );
    let acme = organizations
        .create(CreateOrganizationRequest::new("Acme"))
        .await?;
    let board = TaskBoardService::new(
        Arc::clone(&adapters.tasks),
        Arc::clone(&adapters.organizations),
        Arc::clone(&adapters.audit),
        Arc::new(DefaultClock),
    )
    .with_policy(OrderingPolicy::new(1_000));
    Ok((board, Caller::new(UserId::new(), Role::Admin, acme.id())))
}

async fn column(
    board: &PgBoard,
    caller: &Caller,
    organization: OrganizationId,
    status: TaskStatus,
) -> Result<Vec<String>, eyre::Report> {
    let tasks = board.list_column(caller, organization, status).await?;
    for (expected, task) in (0_u32..).zip(&tasks) {
        eyre::ensure!(
            task.order_index().value() == expected,
            "column {status} is not dense"
        );
    }
    Ok(tasks
        .iter()
        .map(|task| task.title().as_str().to_owned())
        .collect())
}

#[rstest]
fn create_delete_and_move_keep_columns_dense(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let test_db = database?;
    test_runtime()?.block_on(create_delete_and_move(&test_db.adapters()))
}

async fn create_delete_and_move(adapters: &Adapters) -> eyre::Result<()> {
    let (board, admin) = board_for(adapters).await?;
    let acme = admin.organization_id();

    let mut ids = Vec::new();
    for title in ["T0", "T1", "T2"] {
        ids.push(board.create_task(&admin, CreateTaskRequest::new(title)).await?.id());
    }
    for title in ["D0", "D1"] {
        board
            .create_task(&admin, CreateTaskRequest::new(title).with_status(TaskStatus::Done))
            .await?;
    }
    let [t0, t1, _] = ids.as_slice() else {
        return Err(eyre::eyre!("expected three tasks"));
    };

    board
        .reorder_task(&admin, *t0, ReorderTaskRequest::new(0).to_status(TaskStatus::Done))
        .await?;
    eyre::ensure!(column(&board, &admin, acme, TaskStatus::Todo).await? == ["T1", "T2"]);
    eyre::ensure!(
        column(&board, &admin, acme, TaskStatus::Done).await? == ["T0", "D0", "D1"]
    );

    board.delete_task(&admin, *t1).await?;
    board
        .create_task(&admin, CreateTaskRequest::new("Urgent").at_index(0))
        .await?;
    eyre::ensure!(column(&board, &admin, acme, TaskStatus::Todo).await? == ["Urgent", "T2"]);

    let edited = board
        .update_task(&admin, *t0, TaskEdit::new().with_description("moved first"))
        .await?;
    eyre::ensure!(edited.status() == TaskStatus::Done, "edit keeps placement");
    Ok(())
}

#[rstest]
fn concurrent_reorders_keep_column_dense(database: eyre::Result<TestDatabase>) -> eyre::Result<()> {
    let test_db = database?;
    test_runtime()?.block_on(concurrent_reorders(&test_db.adapters()))
}

async fn concurrent_reorders(adapters: &Adapters) -> eyre::Result<()> {
    let (board, admin) = board_for(adapters).await?;
    let acme = admin.organization_id();
    let mut ids = Vec::new();
    for n in 0..6 {
        ids.push(
            board
                .create_task(&admin, CreateTaskRequest::new(format!("task-{n}")))
                .await?
                .id(),
        );
    }

    let targets = [5_u32, 0, 3, 1, 4, 2];
    let mut handles = Vec::new();
    for (id, target) in ids.into_iter().zip(targets) {
        let worker = board.clone();
        handles.push(tokio::spawn(async move {
            worker
                .reorder_task(&admin, id, ReorderTaskRequest::new(target))
                .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    eyre::ensure!(column(&board, &admin, acme, TaskStatus::Todo).await?.len() == 6);
    Ok(())
}

#[rstest]
fn concurrent_edits_of_different_fields_both_persist(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let test_db = database?;
    test_runtime()?.block_on(concurrent_field_edits(&test_db.adapters()))
}

async fn concurrent_field_edits(adapters: &Adapters) -> eyre::Result<()> {
    let (board, admin) = board_for(adapters).await?;
    let id = board
        .create_task(&admin, CreateTaskRequest::new("original"))
        .await?
        .id();

    let stale_title = board.find_task(&admin, id).await?;
    let stale_description = board.find_task(&admin, id).await?;
    let (title_result, description_result) = tokio::join!(
        edit_from(adapters, stale_title, TaskEdit::new().with_title("renamed")),
        edit_from(adapters, stale_description, TaskEdit::new().with_description("details")),
    );
    title_result?;
    description_result?;

    let stored = board.find_task(&admin, id).await?;
    eyre::ensure!(stored.title().as_str() == "renamed", "title edit was lost");
    eyre::ensure!(stored.description() == Some("details"), "description edit was lost");
    Ok(())
}

/// Writes `edit` on top of a copy read before either edit was stored.
async fn edit_from(adapters: &Adapters, mut stale: Task, edit: TaskEdit) -> eyre::Result<()> {
    let changes = stale.apply_edit(edit, &DefaultClock)?;
    adapters.tasks.update_content(&stale, &changes).await?;
    Ok(())
}
