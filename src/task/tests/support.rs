//! Shared wiring for task board service tests.

use std::sync::Arc;

use crate::{
    access::domain::{Caller, Role},
    audit::adapters::memory::InMemoryAuditLog,
    organization::{
        adapters::memory::InMemoryOrganizationRepository,
        domain::OrganizationId,
        services::{CreateOrganizationRequest, OrganizationService},
    },
    task::{
        adapters::memory::InMemoryTaskRepository,
        domain::{Task, TaskStatus},
        services::{CreateTaskRequest, OrderingPolicy, TaskBoardService},
    },
    user::domain::UserId,
};
use mockable::DefaultClock;

pub(super) type TestBoard = TaskBoardService<
    InMemoryTaskRepository,
    InMemoryOrganizationRepository,
    InMemoryAuditLog,
    DefaultClock,
>;

/// Board wired to in-memory adapters, with Acme (root), Acme EU (child of
/// Acme) and Globex (unrelated root).
pub(super) struct Harness {
    pub(super) board: TestBoard,
    pub(super) tasks: Arc<InMemoryTaskRepository>,
    pub(super) audit: Arc<InMemoryAuditLog>,
    pub(super) acme: OrganizationId,
    pub(super) acme_eu: OrganizationId,
    pub(super) globex: OrganizationId,
}

impl Harness {
    pub(super) async fn new(policy: OrderingPolicy) -> Self {
        let organizations = Arc::new(InMemoryOrganizationRepository::new());
        let hierarchy =
            OrganizationService::new(Arc::clone(&organizations), Arc::new(DefaultClock));
        let acme = hierarchy
            .create(CreateOrganizationRequest::new("Acme"))
            .await
            .expect("root creation should succeed");
        let acme_eu = hierarchy
            .create(CreateOrganizationRequest::new("Acme EU").with_parent(acme.id()))
            .await
            .expect("child creation should succeed");
        let globex = hierarchy
            .create(CreateOrganizationRequest::new("Globex"))
            .await
            .expect("root creation should succeed");

        let audit = Arc::new(InMemoryAuditLog::new());
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let board = TaskBoardService::new(
            Arc::clone(&tasks),
            organizations,
            Arc::clone(&audit),
            Arc::new(DefaultClock),
        )
        .with_policy(policy);

        Self {
            board,
            tasks,
            audit,
            acme: acme.id(),
            acme_eu: acme_eu.id(),
            globex: globex.id(),
        }
    }

    pub(super) fn caller(role: Role, organization: OrganizationId) -> Caller {
        Caller::new(UserId::new(), role, organization)
    }

    pub(super) async fn create(&self, caller: &Caller, title: &str, status: TaskStatus) -> Task {
        self.board
            .create_task(caller, CreateTaskRequest::new(title).with_status(status))
            .await
            .expect("task creation should succeed")
    }

    /// Returns the titles of a column in index order, asserting density.
    pub(super) async fn column_titles(
        &self,
        caller: &Caller,
        organization: OrganizationId,
        status: TaskStatus,
    ) -> Vec<String> {
        let column = self
            .board
            .list_column(caller, organization, status)
            .await
            .expect("column listing should succeed");
        let indices: Vec<u32> = column.iter().map(|task| task.order_index().value()).collect();
        let expected: Vec<u32> = (0..).take(column.len()).collect();
        assert_eq!(indices, expected, "column {status} is not dense");
        column
            .iter()
            .map(|task| task.title().as_str().to_owned())
            .collect()
    }
}
