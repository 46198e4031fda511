//! Authenticated caller identity.

use super::Role;
use crate::{organization::domain::OrganizationId, user::domain::UserId};
use serde::{Deserialize, Serialize};

/// Identity of the authenticated user issuing a request.
///
/// Produced by the authentication layer (or
/// [`crate::user::services::UserDirectoryService::resolve_caller`]) and
/// threaded through every task operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    user_id: UserId,
    role: Role,
    organization_id: OrganizationId,
}

impl Caller {
    /// Creates a caller identity.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role, organization_id: OrganizationId) -> Self {
        Self {
            user_id,
            role,
            organization_id,
        }
    }

    /// Returns the caller's user identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the caller's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns the organization the caller belongs to.
    #[must_use]
    pub const fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }
}
