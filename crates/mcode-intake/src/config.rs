//! # Intake Configuration
//!
//! Timeouts, retry limits and the local offset used for ledger columns.
//! All values have sane defaults with override capability.

use chrono::{FixedOffset, Local, Offset};
use std::time::Duration;
use thiserror::Error;

/// Configuration for sessions, the orchestrator and the allocator.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Idle time after which a session may be disposed.
    pub session_idle_timeout: Duration,
    /// How often the runtime sweeps idle sessions.
    pub sweep_interval: Duration,
    /// Total append attempts per allocation (first try included).
    pub max_append_attempts: u32,
    /// Pause between append attempts.
    pub append_retry_backoff: Duration,
    /// Offset that date, weekday and time columns are rendered in. Defaults
    /// to the host's local offset at construction.
    pub record_offset: FixedOffset,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            session_idle_timeout: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(60),
            max_append_attempts: 3,
            append_retry_backoff: Duration::from_millis(200),
            record_offset: Local::now().offset().fix(),
        }
    }
}

impl IntakeConfig {
    /// Upper bound on append attempts; retries must stay small.
    pub const MAX_APPEND_ATTEMPTS_LIMIT: u32 = 10;

    /// Reject configurations the workflow cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_append_attempts == 0
            || self.max_append_attempts > Self::MAX_APPEND_ATTEMPTS_LIMIT
        {
            return Err(ConfigError::AppendAttemptsOutOfRange {
                attempts: self.max_append_attempts,
                limit: Self::MAX_APPEND_ATTEMPTS_LIMIT,
            });
        }
        if self.session_idle_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "session_idle_timeout",
            });
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "sweep_interval",
            });
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_append_attempts must be between 1 and {limit}, got {attempts}")]
    AppendAttemptsOutOfRange { attempts: u32, limit: u32 },

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
}
