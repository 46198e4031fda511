//! Application services for organization hierarchy management.

mod hierarchy;

pub use hierarchy::{
    CreateOrganizationRequest, OrganizationService, OrganizationServiceError,
    OrganizationServiceResult, ParentChange, UpdateOrganizationRequest,
};
