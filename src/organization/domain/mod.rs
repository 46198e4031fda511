//! Domain model for the organization hierarchy.

mod error;
mod ids;
mod organization;

pub use error::{HierarchyViolation, OrganizationDomainError};
pub use ids::{OrganizationId, OrganizationName};
pub use organization::{HierarchyLevel, Organization, PersistedOrganizationData};
