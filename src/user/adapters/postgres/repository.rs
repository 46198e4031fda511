//! `PostgreSQL` repository implementation for users.

use super::{
    models::{NewUserRow, UserRow},
    schema::users,
};
use crate::{
    access::domain::Role,
    db::{PgPool, run_blocking},
    organization::domain::OrganizationId,
    user::{
        domain::{EmailAddress, PersistedUserData, User, UserId},
        ports::{UserRepository, UserRepositoryError, UserRepositoryResult},
    },
};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

/// `PostgreSQL`-backed user repository.
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn store(&self, user: &User) -> UserRepositoryResult<()> {
        let id = user.id();
        let email = user.email().clone();
        let row = NewUserRow {
            id: id.into_inner(),
            email: user.email().as_str().to_owned(),
            role: user.role().as_str().to_owned(),
            organization_id: user.organization_id().into_inner(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        };
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(users::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if info.constraint_name() == Some(EMAIL_UNIQUE_CONSTRAINT) =>
                    {
                        UserRepositoryError::DuplicateEmail(email)
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        UserRepositoryError::DuplicateUser(id)
                    }
                    _ => UserRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: UserId) -> UserRepositoryResult<Option<User>> {
        run_blocking(&self.pool, move |connection| {
            users::table
                .find(id.into_inner())
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()
                .map_err(UserRepositoryError::persistence)?
                .map(row_to_user)
                .transpose()
        })
        .await
    }

    async fn find_by_email(&self, email: &EmailAddress) -> UserRepositoryResult<Option<User>> {
        let address = email.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            users::table
                .filter(users::email.eq(address))
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()
                .map_err(UserRepositoryError::persistence)?
                .map(row_to_user)
                .transpose()
        })
        .await
    }

    async fn find_by_organization(
        &self,
        organization_id: OrganizationId,
    ) -> UserRepositoryResult<Vec<User>> {
        run_blocking(&self.pool, move |connection| {
            let rows = users::table
                .filter(users::organization_id.eq(organization_id.into_inner()))
                .order((users::created_at.asc(), users::id.asc()))
                .select(UserRow::as_select())
                .load::<UserRow>(connection)
                .map_err(UserRepositoryError::persistence)?;
            rows.into_iter().map(row_to_user).collect()
        })
        .await
    }
}

fn row_to_user(row: UserRow) -> UserRepositoryResult<User> {
    let UserRow {
        id,
        email,
        role,
        organization_id,
        created_at,
        updated_at,
    } = row;
    let address = EmailAddress::new(email).map_err(UserRepositoryError::persistence)?;
    let parsed_role = Role::try_from(role.as_str()).map_err(UserRepositoryError::persistence)?;
    Ok(User::from_persisted(PersistedUserData {
        id: UserId::from_uuid(id),
        email: address,
        role: parsed_role,
        organization_id: OrganizationId::from_uuid(organization_id),
        created_at,
        updated_at,
    }))
}
