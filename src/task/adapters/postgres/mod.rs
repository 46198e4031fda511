//! `PostgreSQL` adapters for the task board.

mod models;
mod repository;
pub(crate) mod schema;

pub use repository::PostgresTaskRepository;
