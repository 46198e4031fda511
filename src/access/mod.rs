//! Organization-scope authorization.
//!
//! Decides whether a caller's role and home organization grant access to
//! a target organization, and expands the same policy into the set of
//! organizations a caller may list. The hierarchy itself is consulted
//! only through the [`ports::HierarchyLookup`] port:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Policy functions and the authorizer in [`services`]

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
