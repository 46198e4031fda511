//! Port contracts for organization-scope authorization.

pub mod hierarchy;

pub use hierarchy::{HierarchyLookup, HierarchyLookupError, HierarchyLookupResult};

#[cfg(test)]
pub use hierarchy::MockHierarchyLookup;
