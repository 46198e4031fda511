//! Organization hierarchy management.
//!
//! Organizations form a hierarchy at most two levels deep: root
//! organizations and their direct children. This module validates every
//! parent assignment against that rule and exposes the hierarchy to the
//! [`crate::access`] policy through
//! [`crate::access::ports::HierarchyLookup`]:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
