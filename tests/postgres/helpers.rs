//! Shared test helpers for `PostgreSQL` integration tests.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::fixture;
use std::sync::Arc;
use taskboard::{
    audit::adapters::postgres::PostgresAuditLog,
    config::TaskBoardConfig,
    db::PgPool,
    organization::adapters::postgres::PostgresOrganizationRepository,
    task::adapters::postgres::PostgresTaskRepository,
    user::adapters::postgres::PostgresUserRepository,
};
use tokio::runtime::Runtime;
use tracing::warn;
use uuid::Uuid;

/// Boxed error used by cluster helpers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// SQL creating every table.
pub const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_taskboard_tables/up.sql");

/// Template database holding the migrated schema.
pub const TEMPLATE_DB: &str = "taskboard_test_template";

/// Connections per test database pool.
const POOL_SIZE: u32 = 8;

/// Builds a runtime for driving async adapters from synchronous tests.
///
/// Multi-threaded so concurrent writers genuinely overlap.
///
/// # Errors
///
/// Returns an error if the runtime cannot be built.
pub fn test_runtime() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
}

/// Creates the template database once per cluster.
///
/// # Errors
///
/// Returns an error if the template cannot be created or migrated.
pub fn ensure_template(cluster: &TestCluster) -> Result<(), BoxError> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut connection = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            connection
                .batch_execute(CREATE_SCHEMA_SQL)
                .map_err(|e| eyre::eyre!("{e}"))?;
            Ok(())
        })
        .map_err(|e| Box::new(e) as BoxError)
}

/// Migrated database private to one test, dropped on scope exit.
///
/// The pool is declared first so its connections close before the
/// database is dropped.
pub struct TestDatabase {
    pub pool: PgPool,
    _cleanup: CleanupGuard,
}

impl TestDatabase {
    /// Clones the template into a fresh database and opens a pool on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the template, database or pool cannot be created.
    pub fn create(cluster: &'static TestCluster) -> eyre::Result<Self> {
        ensure_template(cluster).map_err(|e| eyre::eyre!("template setup: {e}"))?;
        let db_name = format!("taskboard_test_{}", Uuid::new_v4().simple());
        cluster
            .create_database_from_template(db_name.as_str(), TEMPLATE_DB)
            .map_err(|e| eyre::eyre!("database setup: {e}"))?;
        let cleanup = CleanupGuard { cluster, db_name };

        let config = TaskBoardConfig {
            database_url: Some(cluster.connection().database_url(&cleanup.db_name)),
            pool_max_size: POOL_SIZE,
            ..TaskBoardConfig::default()
        };
        let pool = config.build_pool()?;
        Ok(Self {
            pool,
            _cleanup: cleanup,
        })
    }

    /// Returns every adapter bound to this database.
    #[must_use]
    pub fn adapters(&self) -> Adapters {
        Adapters {
            organizations: Arc::new(PostgresOrganizationRepository::new(self.pool.clone())),
            users: Arc::new(PostgresUserRepository::new(self.pool.clone())),
            tasks: Arc::new(PostgresTaskRepository::new(self.pool.clone())),
            audit: Arc::new(PostgresAuditLog::new(self.pool.clone())),
        }
    }
}

/// Drops the test database even when the test panics.
struct CleanupGuard {
    cluster: &'static TestCluster,
    db_name: String,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Err(reason) = self.cluster.drop_database(self.db_name.as_str()) {
            warn!(database = %self.db_name, %reason, "failed to drop test database");
        }
    }
}

/// Adapters sharing one test database.
pub struct Adapters {
    pub organizations: Arc<PostgresOrganizationRepository>,
    pub users: Arc<PostgresUserRepository>,
    pub tasks: Arc<PostgresTaskRepository>,
    pub audit: Arc<PostgresAuditLog>,
}

/// Provides a fresh migrated database on the shared embedded cluster.
///
/// # Errors
///
/// Returns an error if the database cannot be prepared.
#[fixture]
pub fn database(shared_test_cluster: &'static TestCluster) -> eyre::Result<TestDatabase> {
    TestDatabase::create(shared_test_cluster)
}
