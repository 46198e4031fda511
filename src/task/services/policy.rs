//! Retry budget for ordering mutations.

use crate::config::TaskBoardConfig;

/// How many times an ordering mutation is re-planned after a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderingPolicy {
    max_conflict_retries: u32,
}

impl OrderingPolicy {
    /// Retry budget used when nothing else is configured.
    pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 5;

    /// Creates a policy allowing `max_conflict_retries` retries.
    #[must_use]
    pub const fn new(max_conflict_retries: u32) -> Self {
        Self {
            max_conflict_retries,
        }
    }

    /// Returns the number of retries after the first attempt.
    #[must_use]
    pub const fn max_conflict_retries(self) -> u32 {
        self.max_conflict_retries
    }

    /// Returns the total number of attempts, including the first.
    #[must_use]
    pub const fn max_attempts(self) -> u32 {
        self.max_conflict_retries.saturating_add(1)
    }
}

impl Default for OrderingPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_CONFLICT_RETRIES)
    }
}

impl From<&TaskBoardConfig> for OrderingPolicy {
    fn from(config: &TaskBoardConfig) -> Self {
        Self::new(config.max_conflict_retries)
    }
}
