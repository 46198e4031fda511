//! Organization aggregate root.

use super::{HierarchyViolation, OrganizationDomainError, OrganizationId, OrganizationName};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Position of an organization in the two-level hierarchy.
///
/// The level is carried explicitly, so depth checks compare one field
/// instead of walking parent links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum HierarchyLevel {
    /// Top-level organization without a parent.
    Root,
    /// Direct child of a root organization.
    Child {
        /// The root organization owning this child.
        parent: OrganizationId,
    },
}

impl HierarchyLevel {
    /// Builds the level implied by an optional parent.
    #[must_use]
    pub const fn from_parent(parent: Option<OrganizationId>) -> Self {
        match parent {
            Some(parent) => Self::Child { parent },
            None => Self::Root,
        }
    }

    /// Returns the parent identifier for child organizations.
    #[must_use]
    pub const fn parent(self) -> Option<OrganizationId> {
        match self {
            Self::Root => None,
            Self::Child { parent } => Some(parent),
        }
    }
}

/// Organization aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    id: OrganizationId,
    name: OrganizationName,
    level: HierarchyLevel,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedOrganizationData {
    /// Persisted identifier.
    pub id: OrganizationId,
    /// Persisted display name.
    pub name: OrganizationName,
    /// Persisted parent, if any.
    pub parent: Option<OrganizationId>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Creates a new root organization.
    #[must_use]
    pub fn new_root(name: OrganizationName, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: OrganizationId::new(),
            name,
            level: HierarchyLevel::Root,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Creates a new child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizationDomainError::InvalidHierarchy`] when `parent` is
    /// not a root organization.
    pub fn new_child(
        name: OrganizationName,
        parent: &Self,
        clock: &impl Clock,
    ) -> Result<Self, OrganizationDomainError> {
        let mut organization = Self::new_root(name, clock);
        ensure_valid_parent(organization.id, false, parent)?;
        organization.level = HierarchyLevel::Child { parent: parent.id };
        Ok(organization)
    }

    /// Reconstructs an organization from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedOrganizationData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            level: HierarchyLevel::from_parent(data.parent),
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the organization identifier.
    #[must_use]
    pub const fn id(&self) -> OrganizationId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub const fn name(&self) -> &OrganizationName {
        &self.name
    }

    /// Returns the hierarchy level.
    #[must_use]
    pub const fn level(&self) -> HierarchyLevel {
        self.level
    }

    /// Returns the parent organization, if any.
    #[must_use]
    pub const fn parent_id(&self) -> Option<OrganizationId> {
        self.level.parent()
    }

    /// Returns `true` for top-level organizations.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        matches!(self.level, HierarchyLevel::Root)
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces the display name.
    pub fn rename(&mut self, name: OrganizationName, clock: &impl Clock) {
        self.name = name;
        self.touch(clock);
    }

    /// Makes this organization a direct child of `parent`.
    ///
    /// `has_children` reports whether any organization currently names
    /// this one as its parent.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizationDomainError::InvalidHierarchy`] when the move
    /// would create a self-reference or a third hierarchy level.
    pub fn attach_to(
        &mut self,
        parent: &Self,
        has_children: bool,
        clock: &impl Clock,
    ) -> Result<(), OrganizationDomainError> {
        ensure_valid_parent(self.id, has_children, parent)?;
        self.level = HierarchyLevel::Child { parent: parent.id };
        self.touch(clock);
        Ok(())
    }

    /// Re-checks this organization's stored parent against the current
    /// state of the hierarchy.
    ///
    /// Repositories call this inside their write lock or transaction, with
    /// the freshly read parent and child count.
    ///
    /// # Errors
    ///
    /// Returns the [`HierarchyViolation`] the placement would cause. Root
    /// organizations always pass.
    pub fn verify_placement(
        &self,
        parent: &Self,
        has_children: bool,
    ) -> Result<(), HierarchyViolation> {
        match self.level {
            HierarchyLevel::Root => Ok(()),
            HierarchyLevel::Child { .. } => ensure_valid_parent(self.id, has_children, parent),
        }
    }

    /// Promotes this organization to a root.
    pub fn detach(&mut self, clock: &impl Clock) {
        self.level = HierarchyLevel::Root;
        self.touch(clock);
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

fn ensure_valid_parent(
    child: OrganizationId,
    child_has_children: bool,
    parent: &Organization,
) -> Result<(), HierarchyViolation> {
    if parent.id == child {
        return Err(HierarchyViolation::SelfParent(child));
    }
    if let HierarchyLevel::Child { parent: grandparent } = parent.level {
        return Err(HierarchyViolation::ParentIsChild {
            parent: parent.id,
            grandparent,
        });
    }
    if child_has_children {
        return Err(HierarchyViolation::HasChildren(child));
    }
    Ok(())
}
