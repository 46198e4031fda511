//! Shared world state for organization scope BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use taskboard::organization::{
    adapters::memory::InMemoryOrganizationRepository,
    domain::{Organization, OrganizationId},
    services::{OrganizationService, OrganizationServiceError},
};

/// Organization service type used by the BDD world.
pub type TestOrganizationService =
    OrganizationService<InMemoryOrganizationRepository, DefaultClock>;

/// Scenario world for organization scope behaviour tests.
pub struct OrganizationScopeWorld {
    pub service: TestOrganizationService,
    pub organization_ids: HashMap<String, OrganizationId>,
    pub last_access: Option<bool>,
    pub last_update: Option<Result<Organization, OrganizationServiceError>>,
}

impl OrganizationScopeWorld {
    /// Creates a world with an empty hierarchy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            service: OrganizationService::new(
                Arc::new(InMemoryOrganizationRepository::new()),
                Arc::new(DefaultClock),
            ),
            organization_ids: HashMap::new(),
            last_access: None,
            last_update: None,
        }
    }

    /// Returns the identifier registered for `name`.
    pub fn organization(&self, name: &str) -> Result<OrganizationId, eyre::Report> {
        self.organization_ids
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("unknown organization {name:?} in scenario world"))
    }
}

impl Default for OrganizationScopeWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> OrganizationScopeWorld {
    OrganizationScopeWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
