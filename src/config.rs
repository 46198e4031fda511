//! Runtime configuration sourced from environment variables.

use crate::db::{self, PgPool};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the reorder/delete retry budget.
pub const MAX_CONFLICT_RETRIES_ENV: &str = "TASKBOARD_MAX_CONFLICT_RETRIES";
/// Environment variable holding the `PostgreSQL` connection URL.
pub const DATABASE_URL_ENV: &str = "TASKBOARD_DATABASE_URL";
/// Environment variable holding the connection pool size.
pub const POOL_MAX_SIZE_ENV: &str = "TASKBOARD_POOL_MAX_SIZE";

/// Errors raised while reading configuration values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric variable could not be parsed.
    #[error("invalid value '{value}' for {key}: expected an unsigned integer")]
    InvalidNumber {
        /// Variable name.
        key: &'static str,
        /// Raw value found in the environment.
        value: String,
    },

    /// The pool size must allow at least one connection.
    #[error("TASKBOARD_POOL_MAX_SIZE must be at least 1")]
    EmptyPool,

    /// A pool was requested but no database URL is configured.
    #[error("TASKBOARD_DATABASE_URL is not set")]
    MissingDatabaseUrl,

    /// The pool could not open its initial connections.
    #[error("failed to build connection pool: {reason}")]
    Pool {
        /// Driver-reported failure.
        reason: String,
    },
}

/// Top-level configuration for the task board services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskBoardConfig {
    /// Internal retries granted to an ordering mutation that hits a
    /// concurrent modification before it surfaces `StorageConflict`.
    pub max_conflict_retries: u32,
    /// `PostgreSQL` connection URL; `None` selects in-memory adapters.
    pub database_url: Option<String>,
    /// Maximum number of pooled database connections.
    pub pool_max_size: u32,
}

impl Default for TaskBoardConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 5,
            database_url: None,
            pool_max_size: 8,
        }
    }
}

impl TaskBoardConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// Unset keys keep their defaults; blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is present but malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let max_conflict_retries = match read(MAX_CONFLICT_RETRIES_ENV) {
            Some(raw) => parse_u32(MAX_CONFLICT_RETRIES_ENV, &raw)?,
            None => defaults.max_conflict_retries,
        };
        let pool_max_size = match read(POOL_MAX_SIZE_ENV) {
            Some(raw) => parse_u32(POOL_MAX_SIZE_ENV, &raw)?,
            None => defaults.pool_max_size,
        };
        if pool_max_size == 0 {
            return Err(ConfigError::EmptyPool);
        }

        Ok(Self {
            max_conflict_retries,
            database_url: read(DATABASE_URL_ENV).map(|url| url.trim().to_owned()),
            pool_max_size,
        })
    }

    /// Opens a connection pool on the configured database.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDatabaseUrl`] when no URL is set,
    /// [`ConfigError::EmptyPool`] for a zero pool size, and
    /// [`ConfigError::Pool`] when the server cannot be reached.
    pub fn build_pool(&self) -> Result<PgPool, ConfigError> {
        let url = self
            .database_url
            .as_deref()
            .ok_or(ConfigError::MissingDatabaseUrl)?;
        if self.pool_max_size == 0 {
            return Err(ConfigError::EmptyPool);
        }
        db::build_pool(url, self.pool_max_size).map_err(|err| ConfigError::Pool {
            reason: err.to_string(),
        })
    }
}

fn parse_u32(key: &'static str, raw: &str) -> Result<u32, ConfigError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidNumber {
            key,
            value: raw.to_owned(),
        })
}
