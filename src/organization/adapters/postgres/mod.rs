//! `PostgreSQL` adapters for organization persistence.

mod models;
mod repository;
pub(crate) mod schema;

pub use repository::PostgresOrganizationRepository;
