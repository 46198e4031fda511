//! Taskboard: multi-tenant task tracking with densely ordered columns.
//!
//! Organizations form a two-level hierarchy (roots and their direct
//! children). Users belong to one organization and hold a role that
//! decides which organizations they may reach. Tasks sit in columns keyed
//! by organization and status, and every column keeps its `order_index`
//! values dense from zero under concurrent create, delete and reorder
//! requests.
//!
//! # Architecture
//!
//! Taskboard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`access`]: Organization-scope authorization by role
//! - [`organization`]: Two-level organization hierarchy
//! - [`user`]: User directory and caller resolution
//! - [`task`]: Task board with dense per-column ordering
//! - [`audit`]: Audit records for task mutations
//! - [`config`]: Environment-driven configuration
//! - [`db`]: Shared `PostgreSQL` pool helpers

pub mod access;
pub mod audit;
pub mod config;
pub mod db;
pub mod organization;
pub mod task;
pub mod user;
