//! Shared wiring for in-memory integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use taskboard::{
    access::domain::{Caller, Role},
    audit::{adapters::memory::InMemoryAuditLog, ports::AuditSink},
    organization::{
        adapters::memory::InMemoryOrganizationRepository,
        domain::OrganizationId,
        services::{CreateOrganizationRequest, OrganizationService},
    },
    task::{adapters::memory::InMemoryTaskRepository, services::TaskBoardService},
    user::{
        adapters::memory::InMemoryUserRepository,
        services::{RegisterUserRequest, UserDirectoryService},
    },
};

/// Fully wired in-memory application.
pub struct App<A: AuditSink> {
    pub organizations: OrganizationService<InMemoryOrganizationRepository, DefaultClock>,
    pub users:
        UserDirectoryService<InMemoryUserRepository, InMemoryOrganizationRepository, DefaultClock>,
    pub board: TaskBoardService<
        InMemoryTaskRepository,
        InMemoryOrganizationRepository,
        A,
        DefaultClock,
    >,
}

/// Wires an application that records audit entries in memory.
pub fn app() -> (App<InMemoryAuditLog>, Arc<InMemoryAuditLog>) {
    let audit = Arc::new(InMemoryAuditLog::new());
    (app_with_sink(Arc::clone(&audit)), audit)
}

/// Wires an application around an arbitrary audit sink.
pub fn app_with_sink<A: AuditSink>(audit: Arc<A>) -> App<A> {
    let organizations = Arc::new(InMemoryOrganizationRepository::new());
    let clock = Arc::new(DefaultClock);
    App {
        organizations: OrganizationService::new(Arc::clone(&organizations), Arc::clone(&clock)),
        users: UserDirectoryService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::clone(&organizations),
            Arc::clone(&clock),
        ),
        board: TaskBoardService::new(
            Arc::new(InMemoryTaskRepository::new()),
            organizations,
            audit,
            clock,
        ),
    }
}

impl<A: AuditSink> App<A> {
    /// Creates an organization, optionally under `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the hierarchy rejects the organization.
    pub async fn organization(
        &self,
        name: &str,
        parent: Option<OrganizationId>,
    ) -> Result<OrganizationId, eyre::Report> {
        let request = CreateOrganizationRequest::new(name);
        let request = match parent {
            Some(parent_id) => request.with_parent(parent_id),
            None => request,
        };
        Ok(self.organizations.create(request).await?.id())
    }

    /// Registers a user and resolves the caller identity for them.
    ///
    /// # Errors
    ///
    /// Returns an error if registration or resolution fails.
    pub async fn member(
        &self,
        email: &str,
        role: Role,
        organization: OrganizationId,
    ) -> Result<Caller, eyre::Report> {
        let user = self
            .users
            .register_user(RegisterUserRequest::new(email, role, organization))
            .await?;
        Ok(self.users.resolve_caller(user.id()).await?)
    }
}
