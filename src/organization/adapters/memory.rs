//! In-memory repository for organization hierarchy tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    access::ports::{HierarchyLookup, HierarchyLookupResult},
    organization::{
        domain::{Organization, OrganizationId},
        ports::{OrganizationRepository, OrganizationRepositoryError, OrganizationRepositoryResult},
    },
};

/// Thread-safe in-memory organization repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrganizationRepository {
    organizations: Arc<RwLock<HashMap<OrganizationId, Organization>>>,
}

impl InMemoryOrganizationRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> OrganizationRepositoryResult<RwLockReadGuard<'_, HashMap<OrganizationId, Organization>>>
    {
        self.organizations.read().map_err(|err| {
            OrganizationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(
        &self,
    ) -> OrganizationRepositoryResult<RwLockWriteGuard<'_, HashMap<OrganizationId, Organization>>>
    {
        self.organizations.write().map_err(|err| {
            OrganizationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryOrganizationRepository {
    async fn store(&self, organization: &Organization) -> OrganizationRepositoryResult<()> {
        let mut organizations = self.write()?;
        if organizations.contains_key(&organization.id()) {
            return Err(OrganizationRepositoryError::DuplicateOrganization(
                organization.id(),
            ));
        }
        verify_hierarchy(&organizations, organization)?;
        organizations.insert(organization.id(), organization.clone());
        Ok(())
    }

    async fn update(&self, organization: &Organization) -> OrganizationRepositoryResult<()> {
        let mut organizations = self.write()?;
        if !organizations.contains_key(&organization.id()) {
            return Err(OrganizationRepositoryError::NotFound(organization.id()));
        }
        verify_hierarchy(&organizations, organization)?;
        organizations.insert(organization.id(), organization.clone());
        Ok(())
    }

    async fn remove(&self, id: OrganizationId) -> OrganizationRepositoryResult<()> {
        let mut organizations = self.write()?;
        if organizations.remove(&id).is_none() {
            return Err(OrganizationRepositoryError::NotFound(id));
        }
        organizations.retain(|_, organization| organization.parent_id() != Some(id));
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: OrganizationId,
    ) -> OrganizationRepositoryResult<Option<Organization>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn find_all(&self) -> OrganizationRepositoryResult<Vec<Organization>> {
        let mut all: Vec<_> = self.read()?.values().cloned().collect();
        all.sort_by_key(|organization| (organization.created_at(), organization.id()));
        Ok(all)
    }

    async fn find_children(
        &self,
        parent: OrganizationId,
    ) -> OrganizationRepositoryResult<Vec<Organization>> {
        let mut children: Vec<_> = self
            .read()?
            .values()
            .filter(|organization| organization.parent_id() == Some(parent))
            .cloned()
            .collect();
        children.sort_by_key(|organization| (organization.created_at(), organization.id()));
        Ok(children)
    }
}

#[async_trait]
impl HierarchyLookup for InMemoryOrganizationRepository {
    async fn is_direct_child_of(
        &self,
        parent: OrganizationId,
        child: OrganizationId,
    ) -> HierarchyLookupResult<bool> {
        let organizations = self.read()?;
        Ok(organizations
            .get(&child)
            .is_some_and(|organization| organization.parent_id() == Some(parent)))
    }

    async fn direct_children_of(
        &self,
        parent: OrganizationId,
    ) -> HierarchyLookupResult<Vec<OrganizationId>> {
        let children = self.find_children(parent).await?;
        Ok(children.iter().map(Organization::id).collect())
    }

    async fn all_organization_ids(&self) -> HierarchyLookupResult<Vec<OrganizationId>> {
        let all = self.find_all().await?;
        Ok(all.iter().map(Organization::id).collect())
    }
}

fn verify_hierarchy(
    organizations: &HashMap<OrganizationId, Organization>,
    organization: &Organization,
) -> OrganizationRepositoryResult<()> {
    let Some(parent_id) = organization.parent_id() else {
        return Ok(());
    };
    let parent = organizations
        .get(&parent_id)
        .ok_or(OrganizationRepositoryError::ParentNotFound(parent_id))?;
    let has_children = organizations
        .values()
        .any(|candidate| candidate.parent_id() == Some(organization.id()));
    organization.verify_placement(parent, has_children)?;
    Ok(())
}
