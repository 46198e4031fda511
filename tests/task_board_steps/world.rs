//! Shared world state for task ordering BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use taskboard::{
    access::domain::{Caller, Role},
    audit::adapters::memory::InMemoryAuditLog,
    organization::{
        adapters::memory::InMemoryOrganizationRepository, domain::OrganizationId,
        services::OrganizationService,
    },
    task::{
        adapters::memory::InMemoryTaskRepository,
        domain::{Task, TaskId, TaskStatus},
        services::{TaskBoardError, TaskBoardService},
    },
    user::domain::UserId,
};

/// Board service type used by the BDD world.
pub type TestBoard = TaskBoardService<
    InMemoryTaskRepository,
    InMemoryOrganizationRepository,
    InMemoryAuditLog,
    DefaultClock,
>;

/// Scenario world for task ordering behaviour tests.
pub struct TaskBoardWorld {
    pub organizations: OrganizationService<InMemoryOrganizationRepository, DefaultClock>,
    pub board: TestBoard,
    pub organization_ids: HashMap<String, OrganizationId>,
    pub admin: Option<Caller>,
    pub task_ids: HashMap<String, TaskId>,
    pub last_result: Option<Result<Task, TaskBoardError>>,
}

impl TaskBoardWorld {
    /// Creates a world with empty repositories.
    #[must_use]
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryOrganizationRepository::new());
        let clock = Arc::new(DefaultClock);
        let organizations = OrganizationService::new(Arc::clone(&repository), Arc::clone(&clock));
        let board = TaskBoardService::new(
            Arc::new(InMemoryTaskRepository::new()),
            repository,
            Arc::new(InMemoryAuditLog::new()),
            clock,
        );
        Self {
            organizations,
            board,
            organization_ids: HashMap::new(),
            admin: None,
            task_ids: HashMap::new(),
            last_result: None,
        }
    }

    /// Returns the identifier registered for `name`.
    pub fn organization(&self, name: &str) -> Result<OrganizationId, eyre::Report> {
        self.organization_ids
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("unknown organization {name:?} in scenario world"))
    }

    /// Returns the admin created by the scenario setup.
    pub fn admin(&self) -> Result<Caller, eyre::Report> {
        self.admin
            .ok_or_else(|| eyre::eyre!("missing admin in scenario world"))
    }

    /// Returns a caller with `role` in the named organization.
    pub fn caller(&self, role: Role, organization: &str) -> Result<Caller, eyre::Report> {
        Ok(Caller::new(UserId::new(), role, self.organization(organization)?))
    }

    /// Returns the identifier of the task titled `title`.
    pub fn task(&self, title: &str) -> Result<TaskId, eyre::Report> {
        self.task_ids
            .get(title)
            .copied()
            .ok_or_else(|| eyre::eyre!("unknown task {title:?} in scenario world"))
    }
}

impl Default for TaskBoardWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskBoardWorld {
    TaskBoardWorld::default()
}

/// Splits a comma-separated title list.
pub fn titles(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Parses a status column name from a step.
pub fn status(name: &str) -> Result<TaskStatus, eyre::Report> {
    TaskStatus::try_from(name).map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
