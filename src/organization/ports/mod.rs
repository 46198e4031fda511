//! Port contracts for organization persistence.

pub mod repository;

pub use repository::{
    OrganizationRepository, OrganizationRepositoryError, OrganizationRepositoryResult,
};
