//! Role and hierarchy based access policy.

use crate::{
    access::{
        domain::{Caller, Role},
        ports::{HierarchyLookup, HierarchyLookupError, HierarchyLookupResult},
    },
    organization::domain::OrganizationId,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Decides whether `role` in `caller_org` may access `target_org`.
///
/// - `Owner` reaches every organization.
/// - `Admin` reaches its own organization and its direct children.
/// - `Viewer` reaches only its own organization.
///
/// `lookup` is consulted only for an `Admin` aimed at a foreign
/// organization.
///
/// # Errors
///
/// Propagates [`HierarchyLookupError`] from the lookup.
pub async fn has_access<L>(
    role: Role,
    caller_org: OrganizationId,
    target_org: OrganizationId,
    lookup: &L,
) -> HierarchyLookupResult<bool>
where
    L: HierarchyLookup + ?Sized,
{
    match role {
        Role::Owner => Ok(true),
        Role::Admin if target_org == caller_org => Ok(true),
        Role::Admin => lookup.is_direct_child_of(caller_org, target_org).await,
        Role::Viewer => Ok(target_org == caller_org),
    }
}

/// Expands the access policy into the set of reachable organizations.
///
/// # Errors
///
/// Propagates [`HierarchyLookupError`] from the lookup.
pub async fn accessible_org_ids<L>(
    role: Role,
    caller_org: OrganizationId,
    lookup: &L,
) -> HierarchyLookupResult<BTreeSet<OrganizationId>>
where
    L: HierarchyLookup + ?Sized,
{
    match role {
        Role::Owner => Ok(lookup.all_organization_ids().await?.into_iter().collect()),
        Role::Admin => {
            let mut scope: BTreeSet<_> = lookup
                .direct_children_of(caller_org)
                .await?
                .into_iter()
                .collect();
            scope.insert(caller_org);
            Ok(scope)
        }
        Role::Viewer => Ok(BTreeSet::from([caller_org])),
    }
}

/// Errors returned by [`OrgScopeAuthorizer::authorize`].
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    /// The caller's scope does not cover the target organization.
    #[error("{role} of organization {caller_org} may not access organization {target_org}")]
    Forbidden {
        /// Caller role.
        role: Role,
        /// Caller's home organization.
        caller_org: OrganizationId,
        /// Organization that was requested.
        target_org: OrganizationId,
    },

    /// The hierarchy could not be consulted.
    #[error(transparent)]
    Lookup(#[from] HierarchyLookupError),
}

/// Result type for authorizer operations.
pub type AccessResult<T> = Result<T, AccessError>;

/// Applies the scope policy against a shared hierarchy lookup.
#[derive(Debug)]
pub struct OrgScopeAuthorizer<L>
where
    L: HierarchyLookup + ?Sized,
{
    lookup: Arc<L>,
}

impl<L> Clone for OrgScopeAuthorizer<L>
where
    L: HierarchyLookup + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            lookup: Arc::clone(&self.lookup),
        }
    }
}

impl<L> OrgScopeAuthorizer<L>
where
    L: HierarchyLookup + ?Sized,
{
    /// Creates an authorizer over `lookup`.
    #[must_use]
    pub const fn new(lookup: Arc<L>) -> Self {
        Self { lookup }
    }

    /// Returns whether `caller` may access `target_org`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Lookup`] when the hierarchy cannot be read.
    pub async fn has_access(
        &self,
        caller: &Caller,
        target_org: OrganizationId,
    ) -> AccessResult<bool> {
        Ok(has_access(
            caller.role(),
            caller.organization_id(),
            target_org,
            self.lookup.as_ref(),
        )
        .await?)
    }

    /// Fails unless `caller` may access `target_org`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Forbidden`] when the scope does not cover the
    /// target, or [`AccessError::Lookup`] when the hierarchy cannot be read.
    pub async fn authorize(
        &self,
        caller: &Caller,
        target_org: OrganizationId,
    ) -> AccessResult<()> {
        if self.has_access(caller, target_org).await? {
            return Ok(());
        }
        Err(AccessError::Forbidden {
            role: caller.role(),
            caller_org: caller.organization_id(),
            target_org,
        })
    }

    /// Returns every organization `caller` may see.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Lookup`] when the hierarchy cannot be read.
    pub async fn accessible_org_ids(
        &self,
        caller: &Caller,
    ) -> AccessResult<BTreeSet<OrganizationId>> {
        Ok(accessible_org_ids(
            caller.role(),
            caller.organization_id(),
            self.lookup.as_ref(),
        )
        .await?)
    }
}
