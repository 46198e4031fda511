//! Hierarchy lookup port consumed by the scope policy.

use crate::organization::domain::OrganizationId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for hierarchy lookups.
pub type HierarchyLookupResult<T> = Result<T, HierarchyLookupError>;

/// Read-only view of the organization hierarchy.
///
/// Implemented by organization repositories. Lookups may perform I/O; the
/// policy built on top of them performs none of its own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HierarchyLookup: Send + Sync {
    /// Returns `true` when `child`'s immediate parent is `parent`.
    ///
    /// Unknown organizations are never children of anything.
    async fn is_direct_child_of(
        &self,
        parent: OrganizationId,
        child: OrganizationId,
    ) -> HierarchyLookupResult<bool>;

    /// Returns the identifiers of every organization whose parent is
    /// `parent`.
    async fn direct_children_of(
        &self,
        parent: OrganizationId,
    ) -> HierarchyLookupResult<Vec<OrganizationId>>;

    /// Returns the identifiers of every known organization.
    async fn all_organization_ids(&self) -> HierarchyLookupResult<Vec<OrganizationId>>;
}

/// Failure raised by a hierarchy lookup implementation.
#[derive(Debug, Clone, Error)]
#[error("hierarchy lookup failed: {0}")]
pub struct HierarchyLookupError(Arc<dyn std::error::Error + Send + Sync>);

impl HierarchyLookupError {
    /// Wraps an implementation error.
    #[must_use]
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
