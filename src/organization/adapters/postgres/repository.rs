//! `PostgreSQL` repository implementation for the organization hierarchy.

use super::{
    models::{OrganizationRecord, OrganizationRow},
    schema::organizations,
};
use crate::{
    access::ports::{HierarchyLookup, HierarchyLookupResult},
    db::{PgPool, run_blocking},
    organization::{
        domain::{Organization, OrganizationId, OrganizationName, PersistedOrganizationData},
        ports::{OrganizationRepository, OrganizationRepositoryError, OrganizationRepositoryResult},
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

/// `PostgreSQL`-backed organization repository.
///
/// Child organizations reference their parent with `ON DELETE CASCADE`, so
/// removing a root removes its children in the same statement. Writes that
/// place an organization under a parent lock both rows `FOR UPDATE` and
/// re-check the two-level rule before committing.
#[derive(Debug, Clone)]
pub struct PostgresOrganizationRepository {
    pool: PgPool,
}

impl PostgresOrganizationRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationRepository for PostgresOrganizationRepository {
    async fn store(&self, organization: &Organization) -> OrganizationRepositoryResult<()> {
        let id = organization.id();
        let record = to_record(organization);
        let candidate = organization.clone();
        run_blocking(&self.pool, move |connection| {
            connection.transaction::<_, OrganizationRepositoryError, _>(|tx| {
                let locked = lock_organizations(tx, &candidate)?;
                verify_hierarchy(tx, &candidate, &locked)?;
                diesel::insert_into(organizations::table)
                    .values(&record)
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            OrganizationRepositoryError::DuplicateOrganization(id)
                        }
                        _ => OrganizationRepositoryError::persistence(err),
                    })?;
                Ok(())
            })
        })
        .await
    }

    async fn update(&self, organization: &Organization) -> OrganizationRepositoryResult<()> {
        let id = organization.id();
        let record = to_record(organization);
        let candidate = organization.clone();
        run_blocking(&self.pool, move |connection| {
            connection.transaction::<_, OrganizationRepositoryError, _>(|tx| {
                let locked = lock_organizations(tx, &candidate)?;
                if !locked.iter().any(|row| row.id() == id) {
                    return Err(OrganizationRepositoryError::NotFound(id));
                }
                verify_hierarchy(tx, &candidate, &locked)?;
                diesel::update(organizations::table.find(id.into_inner()))
                    .set(&record)
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn remove(&self, id: OrganizationId) -> OrganizationRepositoryResult<()> {
        run_blocking(&self.pool, move |connection| {
            let removed = diesel::delete(organizations::table.find(id.into_inner()))
                .execute(connection)
                .map_err(OrganizationRepositoryError::persistence)?;
            if removed == 0 {
                return Err(OrganizationRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: OrganizationId,
    ) -> OrganizationRepositoryResult<Option<Organization>> {
        run_blocking(&self.pool, move |connection| {
            organizations::table
                .find(id.into_inner())
                .select(OrganizationRow::as_select())
                .first::<OrganizationRow>(connection)
                .optional()
                .map_err(OrganizationRepositoryError::persistence)?
                .map(row_to_organization)
                .transpose()
        })
        .await
    }

    async fn find_all(&self) -> OrganizationRepositoryResult<Vec<Organization>> {
        run_blocking(&self.pool, move |connection| {
            let rows = organizations::table
                .order((organizations::created_at.asc(), organizations::id.asc()))
                .select(OrganizationRow::as_select())
                .load::<OrganizationRow>(connection)
                .map_err(OrganizationRepositoryError::persistence)?;
            rows.into_iter().map(row_to_organization).collect()
        })
        .await
    }

    async fn find_children(
        &self,
        parent: OrganizationId,
    ) -> OrganizationRepositoryResult<Vec<Organization>> {
        run_blocking(&self.pool, move |connection| {
            let rows = organizations::table
                .filter(organizations::parent_id.eq(parent.into_inner()))
                .order((organizations::created_at.asc(), organizations::id.asc()))
                .select(OrganizationRow::as_select())
                .load::<OrganizationRow>(connection)
                .map_err(OrganizationRepositoryError::persistence)?;
            rows.into_iter().map(row_to_organization).collect()
        })
        .await
    }
}

#[async_trait]
impl HierarchyLookup for PostgresOrganizationRepository {
    async fn is_direct_child_of(
        &self,
        parent: OrganizationId,
        child: OrganizationId,
    ) -> HierarchyLookupResult<bool> {
        let matches = run_blocking(&self.pool, move |connection| {
            diesel::select(diesel::dsl::exists(
                organizations::table
                    .filter(organizations::id.eq(child.into_inner()))
                    .filter(organizations::parent_id.eq(parent.into_inner())),
            ))
            .get_result::<bool>(connection)
            .map_err(OrganizationRepositoryError::persistence)
        })
        .await?;
        Ok(matches)
    }

    async fn direct_children_of(
        &self,
        parent: OrganizationId,
    ) -> HierarchyLookupResult<Vec<OrganizationId>> {
        let ids = run_blocking(&self.pool, move |connection| {
            organizations::table
                .filter(organizations::parent_id.eq(parent.into_inner()))
                .select(organizations::id)
                .load::<Uuid>(connection)
                .map_err(OrganizationRepositoryError::persistence)
        })
        .await?;
        Ok(ids.into_iter().map(OrganizationId::from_uuid).collect())
    }

    async fn all_organization_ids(&self) -> HierarchyLookupResult<Vec<OrganizationId>> {
        let ids = run_blocking(&self.pool, move |connection| {
            organizations::table
                .select(organizations::id)
                .load::<Uuid>(connection)
                .map_err(OrganizationRepositoryError::persistence)
        })
        .await?;
        Ok(ids.into_iter().map(OrganizationId::from_uuid).collect())
    }
}

/// Locks the organization and its proposed parent, in identifier order.
fn lock_organizations(
    connection: &mut PgConnection,
    organization: &Organization,
) -> OrganizationRepositoryResult<Vec<Organization>> {
    let ids: Vec<Uuid> = std::iter::once(organization.id())
        .chain(organization.parent_id())
        .map(OrganizationId::into_inner)
        .collect();
    let rows = organizations::table
        .filter(organizations::id.eq_any(ids))
        .order(organizations::id.asc())
        .for_update()
        .select(OrganizationRow::as_select())
        .load::<OrganizationRow>(connection)?;
    rows.into_iter().map(row_to_organization).collect()
}

fn verify_hierarchy(
    connection: &mut PgConnection,
    organization: &Organization,
    locked: &[Organization],
) -> OrganizationRepositoryResult<()> {
    let Some(parent_id) = organization.parent_id() else {
        return Ok(());
    };
    let parent = locked
        .iter()
        .find(|row| row.id() == parent_id)
        .ok_or(OrganizationRepositoryError::ParentNotFound(parent_id))?;
    let has_children = diesel::select(diesel::dsl::exists(
        organizations::table.filter(organizations::parent_id.eq(organization.id().into_inner())),
    ))
    .get_result::<bool>(connection)?;
    organization.verify_placement(parent, has_children)?;
    Ok(())
}

fn to_record(organization: &Organization) -> OrganizationRecord {
    OrganizationRecord {
        id: organization.id().into_inner(),
        name: organization.name().as_str().to_owned(),
        parent_id: organization.parent_id().map(OrganizationId::into_inner),
        created_at: organization.created_at(),
        updated_at: organization.updated_at(),
    }
}

fn row_to_organization(row: OrganizationRow) -> OrganizationRepositoryResult<Organization> {
    let OrganizationRow {
        id,
        name,
        parent_id,
        created_at,
        updated_at,
    } = row;
    let validated_name =
        OrganizationName::new(name).map_err(OrganizationRepositoryError::persistence)?;
    Ok(Organization::from_persisted(PersistedOrganizationData {
        id: OrganizationId::from_uuid(id),
        name: validated_name,
        parent: parent_id.map(OrganizationId::from_uuid),
        created_at,
        updated_at,
    }))
}
