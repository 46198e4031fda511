//! Error types for organization validation.

use super::OrganizationId;
use thiserror::Error;

/// Errors returned while constructing or mutating organizations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrganizationDomainError {
    /// The organization name is empty after trimming.
    #[error("organization name must not be empty")]
    EmptyName,

    /// The requested parent assignment breaks the two-level hierarchy.
    #[error("invalid hierarchy: {0}")]
    InvalidHierarchy(#[from] HierarchyViolation),
}

/// Specific reason a parent assignment was rejected.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum HierarchyViolation {
    /// The organization was named as its own parent.
    #[error("organization {0} cannot be its own parent")]
    SelfParent(OrganizationId),

    /// The proposed parent is itself a child organization.
    #[error("organization {parent} is a child of {grandparent}; maximum depth is 2 levels")]
    ParentIsChild {
        /// Proposed parent.
        parent: OrganizationId,
        /// The proposed parent's own parent.
        grandparent: OrganizationId,
    },

    /// The organization already has children and cannot become a child.
    #[error("organization {0} has child organizations and cannot become a child")]
    HasChildren(OrganizationId),
}
