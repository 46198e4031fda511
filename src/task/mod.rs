//! Task board with densely ordered status columns.
//!
//! Tasks live in columns keyed by organization and status. Within every
//! column the `order_index` values are exactly `0..n`, and every create,
//! delete and reorder keeps them that way: the pure planner in
//! [`domain`] computes the index shifts, and repositories apply a plan
//! atomically after checking that the column still looks the way the plan
//! assumed. Stale plans are rejected and recomputed by
//! [`services::TaskBoardService`].
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
