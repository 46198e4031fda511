//! Repository port for organization persistence.

use crate::{
    access::ports::{HierarchyLookup, HierarchyLookupError},
    db::DbAccessError,
    organization::domain::{HierarchyViolation, Organization, OrganizationId},
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for organization repository operations.
pub type OrganizationRepositoryResult<T> = Result<T, OrganizationRepositoryError>;

/// Organization persistence contract.
///
/// Every repository also answers hierarchy lookups for the access policy.
#[async_trait]
pub trait OrganizationRepository: HierarchyLookup {
    /// Stores a new organization.
    ///
    /// A child's parent is re-read and checked in the same atomic unit as
    /// the write.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizationRepositoryError::DuplicateOrganization`] when
    /// the identifier already exists,
    /// [`OrganizationRepositoryError::ParentNotFound`] when the parent is
    /// gone and [`OrganizationRepositoryError::Hierarchy`] when the parent
    /// is no longer a root.
    async fn store(&self, organization: &Organization) -> OrganizationRepositoryResult<()>;

    /// Persists name and parent changes to an existing organization.
    ///
    /// The organization and its parent are locked, and the two-level rule
    /// is re-checked against the locked rows before writing.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizationRepositoryError::NotFound`] when the
    /// organization does not exist,
    /// [`OrganizationRepositoryError::ParentNotFound`] when the parent is
    /// gone and [`OrganizationRepositoryError::Hierarchy`] when the stored
    /// hierarchy no longer admits the placement.
    async fn update(&self, organization: &Organization) -> OrganizationRepositoryResult<()>;

    /// Removes an organization together with its child organizations.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizationRepositoryError::NotFound`] when the
    /// organization does not exist.
    async fn remove(&self, id: OrganizationId) -> OrganizationRepositoryResult<()>;

    /// Finds an organization by identifier.
    async fn find_by_id(&self, id: OrganizationId)
    -> OrganizationRepositoryResult<Option<Organization>>;

    /// Returns every organization.
    async fn find_all(&self) -> OrganizationRepositoryResult<Vec<Organization>>;

    /// Returns the direct children of `parent`.
    async fn find_children(
        &self,
        parent: OrganizationId,
    ) -> OrganizationRepositoryResult<Vec<Organization>>;
}

/// Errors returned by organization repository implementations.
#[derive(Debug, Clone, Error)]
pub enum OrganizationRepositoryError {
    /// An organization with the same identifier already exists.
    #[error("duplicate organization identifier: {0}")]
    DuplicateOrganization(OrganizationId),

    /// The organization was not found.
    #[error("organization not found: {0}")]
    NotFound(OrganizationId),

    /// The parent named by a child organization does not exist.
    #[error("parent organization not found: {0}")]
    ParentNotFound(OrganizationId),

    /// The write would break the two-level hierarchy.
    #[error("hierarchy rejected: {0}")]
    Hierarchy(#[from] HierarchyViolation),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl OrganizationRepositoryError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<DbAccessError> for OrganizationRepositoryError {
    fn from(err: DbAccessError) -> Self {
        Self::persistence(err)
    }
}

impl From<diesel::result::Error> for OrganizationRepositoryError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}

impl From<OrganizationRepositoryError> for HierarchyLookupError {
    fn from(err: OrganizationRepositoryError) -> Self {
        Self::new(err)
    }
}
