//! Service layer for organization creation, re-parenting and scoping.

use crate::{
    access::{
        domain::Caller,
        services::{AccessError, OrgScopeAuthorizer},
    },
    organization::{
        domain::{Organization, OrganizationDomainError, OrganizationId, OrganizationName},
        ports::{OrganizationRepository, OrganizationRepositoryError},
    },
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for creating an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrganizationRequest {
    name: String,
    parent_id: Option<OrganizationId>,
}

impl CreateOrganizationRequest {
    /// Creates a request for a root organization.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
        }
    }

    /// Places the new organization under `parent_id`.
    #[must_use]
    pub const fn with_parent(mut self, parent_id: OrganizationId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Requested change to an organization's parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentChange {
    /// Make the organization a root.
    Detach,
    /// Make the organization a direct child of the given root.
    AttachTo(OrganizationId),
}

/// Request payload for updating an organization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOrganizationRequest {
    name: Option<String>,
    parent: Option<ParentChange>,
}

impl UpdateOrganizationRequest {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renames the organization.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Changes the organization's parent.
    #[must_use]
    pub const fn with_parent(mut self, parent: ParentChange) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// Service-level errors for organization operations.
#[derive(Debug, Error)]
pub enum OrganizationServiceError {
    /// Domain validation failed, including hierarchy violations.
    #[error(transparent)]
    Domain(#[from] OrganizationDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] OrganizationRepositoryError),

    /// Scope evaluation failed or denied access.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// No organization exists with the given identifier.
    #[error("organization {0} not found")]
    NotFound(OrganizationId),

    /// The requested parent organization does not exist.
    #[error("parent organization {0} not found")]
    ParentNotFound(OrganizationId),
}

impl OrganizationServiceError {
    /// Maps a rejected write onto the same errors the up-front checks use.
    fn from_write(err: OrganizationRepositoryError) -> Self {
        match err {
            OrganizationRepositoryError::Hierarchy(violation) => Self::Domain(violation.into()),
            OrganizationRepositoryError::ParentNotFound(parent_id) => {
                Self::ParentNotFound(parent_id)
            }
            OrganizationRepositoryError::NotFound(id) => Self::NotFound(id),
            other => Self::Repository(other),
        }
    }
}

/// Result type for organization service operations.
pub type OrganizationServiceResult<T> = Result<T, OrganizationServiceError>;

/// Organization hierarchy orchestration service.
#[derive(Clone)]
pub struct OrganizationService<R, C>
where
    R: OrganizationRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    authorizer: OrgScopeAuthorizer<R>,
    clock: Arc<C>,
}

impl<R, C> OrganizationService<R, C>
where
    R: OrganizationRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new organization service.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        let authorizer = OrgScopeAuthorizer::new(Arc::clone(&repository));
        Self {
            repository,
            authorizer,
            clock,
        }
    }

    /// Returns the scope authorizer backed by this service's repository.
    #[must_use]
    pub const fn authorizer(&self) -> &OrgScopeAuthorizer<R> {
        &self.authorizer
    }

    /// Creates an organization, validating the two-level hierarchy.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizationServiceError::ParentNotFound`] when the parent
    /// does not exist, [`OrganizationServiceError::Domain`] for a blank name
    /// or a parent that is itself a child, and
    /// [`OrganizationServiceError::Repository`] when persistence fails.
    pub async fn create(
        &self,
        request: CreateOrganizationRequest,
    ) -> OrganizationServiceResult<Organization> {
        let name = OrganizationName::new(request.name)?;
        let organization = match request.parent_id {
            Some(parent_id) => {
                let parent = self
                    .repository
                    .find_by_id(parent_id)
                    .await?
                    .ok_or(OrganizationServiceError::ParentNotFound(parent_id))?;
                Organization::new_child(name, &parent, &*self.clock)?
            }
            None => Organization::new_root(name, &*self.clock),
        };

        self.repository
            .store(&organization)
            .await
            .map_err(OrganizationServiceError::from_write)?;
        info!(
            organization_id = %organization.id(),
            parent_id = ?organization.parent_id(),
            "organization created"
        );
        Ok(organization)
    }

    /// Renames and/or re-parents an organization.
    ///
    /// Validation happens before any write, and the repository repeats the
    /// hierarchy check atomically with the write. A rejected request leaves
    /// the stored organization untouched.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizationServiceError::NotFound`] or
    /// [`OrganizationServiceError::ParentNotFound`] for unknown identifiers
    /// and [`OrganizationServiceError::Domain`] for hierarchy violations.
    pub async fn update(
        &self,
        id: OrganizationId,
        request: UpdateOrganizationRequest,
    ) -> OrganizationServiceResult<Organization> {
        let mut organization = self.find(id).await?;

        match request.parent {
            Some(ParentChange::AttachTo(parent_id)) => {
                let parent = self
                    .repository
                    .find_by_id(parent_id)
                    .await?
                    .ok_or(OrganizationServiceError::ParentNotFound(parent_id))?;
                let has_children = !self.repository.find_children(id).await?.is_empty();
                organization.attach_to(&parent, has_children, &*self.clock)?;
            }
            Some(ParentChange::Detach) => organization.detach(&*self.clock),
            None => {}
        }

        if let Some(name) = request.name {
            organization.rename(OrganizationName::new(name)?, &*self.clock);
        }

        self.repository
            .update(&organization)
            .await
            .map_err(OrganizationServiceError::from_write)?;
        info!(
            organization_id = %organization.id(),
            parent_id = ?organization.parent_id(),
            "organization updated"
        );
        Ok(organization)
    }

    /// Removes an organization and its children.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizationServiceError::NotFound`] when the organization
    /// does not exist.
    pub async fn remove(&self, id: OrganizationId) -> OrganizationServiceResult<()> {
        match self.repository.remove(id).await {
            Ok(()) => {
                info!(organization_id = %id, "organization removed");
                Ok(())
            }
            Err(OrganizationRepositoryError::NotFound(missing)) => {
                Err(OrganizationServiceError::NotFound(missing))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Retrieves an organization by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizationServiceError::NotFound`] when it does not exist.
    pub async fn find(&self, id: OrganizationId) -> OrganizationServiceResult<Organization> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(OrganizationServiceError::NotFound(id))
    }

    /// Returns every organization.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizationServiceError::Repository`] when the lookup
    /// fails.
    pub async fn list(&self) -> OrganizationServiceResult<Vec<Organization>> {
        Ok(self.repository.find_all().await?)
    }

    /// Returns `true` when `child`'s immediate parent is `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizationServiceError::Repository`] when the lookup
    /// fails.
    pub async fn is_direct_child(
        &self,
        parent: OrganizationId,
        child: OrganizationId,
    ) -> OrganizationServiceResult<bool> {
        Ok(self
            .repository
            .find_by_id(child)
            .await?
            .is_some_and(|organization| organization.parent_id() == Some(parent)))
    }

    /// Returns whether `caller` may access `target`.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizationServiceError::Access`] when the hierarchy
    /// cannot be read.
    pub async fn check_org_access(
        &self,
        caller: &Caller,
        target: OrganizationId,
    ) -> OrganizationServiceResult<bool> {
        Ok(self.authorizer.has_access(caller, target).await?)
    }

    /// Returns the organizations within `caller`'s scope.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizationServiceError::NotFound`] when the caller's own
    /// organization no longer exists.
    pub async fn accessible_organizations(
        &self,
        caller: &Caller,
    ) -> OrganizationServiceResult<Vec<Organization>> {
        let home = self.find(caller.organization_id()).await?;
        let scope = self.authorizer.accessible_org_ids(caller).await?;
        let mut organizations: Vec<_> = self
            .repository
            .find_all()
            .await?
            .into_iter()
            .filter(|organization| scope.contains(&organization.id()))
            .collect();
        if !organizations.iter().any(|organization| organization.id() == home.id()) {
            organizations.insert(0, home);
        }
        Ok(organizations)
    }
}
