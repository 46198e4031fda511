//! Service layer for user registration and caller resolution.

use crate::{
    access::domain::{Caller, Role},
    organization::{
        domain::OrganizationId,
        ports::{OrganizationRepository, OrganizationRepositoryError},
    },
    user::{
        domain::{EmailAddress, User, UserDomainError, UserId},
        ports::{UserRepository, UserRepositoryError},
    },
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for registering a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUserRequest {
    email: String,
    role: Role,
    organization_id: OrganizationId,
}

impl RegisterUserRequest {
    /// Creates a registration request.
    #[must_use]
    pub fn new(email: impl Into<String>, role: Role, organization_id: OrganizationId) -> Self {
        Self {
            email: email.into(),
            role,
            organization_id,
        }
    }
}

/// Service-level errors for user directory operations.
#[derive(Debug, Error)]
pub enum UserDirectoryError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] UserDomainError),

    /// User repository operation failed.
    #[error(transparent)]
    Repository(#[from] UserRepositoryError),

    /// Organization lookup failed.
    #[error(transparent)]
    Organization(#[from] OrganizationRepositoryError),

    /// The requested organization does not exist.
    #[error("organization {0} not found")]
    OrganizationNotFound(OrganizationId),

    /// No user exists with the given identifier.
    #[error("user {0} not found")]
    UserNotFound(UserId),
}

/// Result type for user directory operations.
pub type UserDirectoryResult<T> = Result<T, UserDirectoryError>;

/// User registration and lookup service.
#[derive(Clone)]
pub struct UserDirectoryService<U, O, C>
where
    U: UserRepository,
    O: OrganizationRepository,
    C: Clock + Send + Sync,
{
    users: Arc<U>,
    organizations: Arc<O>,
    clock: Arc<C>,
}

impl<U, O, C> UserDirectoryService<U, O, C>
where
    U: UserRepository,
    O: OrganizationRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new user directory service.
    #[must_use]
    pub const fn new(users: Arc<U>, organizations: Arc<O>, clock: Arc<C>) -> Self {
        Self {
            users,
            organizations,
            clock,
        }
    }

    /// Registers a user in an existing organization.
    ///
    /// # Errors
    ///
    /// Returns [`UserDirectoryError::Domain`] for a malformed email,
    /// [`UserDirectoryError::OrganizationNotFound`] for an unknown
    /// organization, and [`UserDirectoryError::Repository`] with
    /// [`UserRepositoryError::DuplicateEmail`] when the address is taken.
    pub async fn register_user(&self, request: RegisterUserRequest) -> UserDirectoryResult<User> {
        let email = EmailAddress::new(request.email)?;
        if self
            .organizations
            .find_by_id(request.organization_id)
            .await?
            .is_none()
        {
            return Err(UserDirectoryError::OrganizationNotFound(
                request.organization_id,
            ));
        }
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(UserRepositoryError::DuplicateEmail(email).into());
        }

        let user = User::new(email, request.role, request.organization_id, &*self.clock);
        self.users.store(&user).await?;
        info!(
            user_id = %user.id(),
            organization_id = %user.organization_id(),
            role = %user.role(),
            "user registered"
        );
        Ok(user)
    }

    /// Retrieves a user by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`UserDirectoryError::UserNotFound`] when it does not exist.
    pub async fn find_user(&self, id: UserId) -> UserDirectoryResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(UserDirectoryError::UserNotFound(id))
    }

    /// Retrieves a user by email address, normalising it first.
    ///
    /// # Errors
    ///
    /// Returns [`UserDirectoryError::Domain`] for a malformed address.
    pub async fn find_by_email(&self, email: &str) -> UserDirectoryResult<Option<User>> {
        let address = EmailAddress::new(email)?;
        Ok(self.users.find_by_email(&address).await?)
    }

    /// Lists the users of an organization.
    ///
    /// # Errors
    ///
    /// Returns [`UserDirectoryError::Repository`] when the lookup fails.
    pub async fn list_members(
        &self,
        organization_id: OrganizationId,
    ) -> UserDirectoryResult<Vec<User>> {
        Ok(self.users.find_by_organization(organization_id).await?)
    }

    /// Resolves the caller identity for a stored user.
    ///
    /// # Errors
    ///
    /// Returns [`UserDirectoryError::UserNotFound`] when it does not exist.
    pub async fn resolve_caller(&self, user_id: UserId) -> UserDirectoryResult<Caller> {
        Ok(self.find_user(user_id).await?.as_caller())
    }
}
