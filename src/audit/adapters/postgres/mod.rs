//! `PostgreSQL` adapters for audit recording.

mod models;
mod sink;
pub(crate) mod schema;

pub use sink::PostgresAuditLog;
