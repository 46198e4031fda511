//! Shared `PostgreSQL` plumbing for the Diesel adapters.
//!
//! Every repository owns a clone of the same r2d2 pool and offloads its
//! synchronous Diesel work onto the blocking thread pool through
//! [`run_blocking`].

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use thiserror::Error;

/// `PostgreSQL` connection pool type used by all adapters.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Failures raised before a closure reaches its database connection.
#[derive(Debug, Error)]
pub enum DbAccessError {
    /// No connection could be checked out of the pool.
    #[error("failed to acquire pooled connection: {0}")]
    Pool(#[from] PoolError),

    /// The blocking task panicked or was cancelled.
    #[error("blocking database task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Builds a connection pool for `database_url`.
///
/// # Errors
///
/// Returns [`PoolError`] when the pool cannot establish its initial
/// connections.
pub fn build_pool(database_url: &str, max_size: u32) -> Result<PgPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().max_size(max_size).build(manager)
}

/// Runs `f` on a pooled connection inside `spawn_blocking`.
pub(crate) async fn run_blocking<F, T, E>(pool: &PgPool, f: F) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<DbAccessError> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = pool.get().map_err(DbAccessError::from)?;
        f(&mut connection)
    })
    .await
    .map_err(DbAccessError::from)?
}
