//! # Runtime Configuration
//!
//! Where the ledger and roster live, plus the core [`IntakeConfig`].
//!
//! ## Environment
//!
//! | Variable | Field |
//! |----------|-------|
//! | `INTAKE_LEDGER_PATH` | `ledger_path` |
//! | `INTAKE_ROSTER_PATH` | `roster_path` (built-in roster when unset) |
//! | `INTAKE_SESSION_IDLE_SECS` | `intake.session_idle_timeout` |
//! | `INTAKE_SWEEP_SECS` | `intake.sweep_interval` |
//! | `INTAKE_MAX_APPEND_ATTEMPTS` | `intake.max_append_attempts` |
//! | `INTAKE_UTC_OFFSET_MINUTES` | `intake.record_offset` |
//!
//! Unparsable values are logged and ignored; the default stays in effect.

use chrono::FixedOffset;
use mcode_intake::{ConfigError, IntakeConfig};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

pub const ENV_LEDGER_PATH: &str = "INTAKE_LEDGER_PATH";
pub const ENV_ROSTER_PATH: &str = "INTAKE_ROSTER_PATH";
pub const ENV_SESSION_IDLE_SECS: &str = "INTAKE_SESSION_IDLE_SECS";
pub const ENV_SWEEP_SECS: &str = "INTAKE_SWEEP_SECS";
pub const ENV_MAX_APPEND_ATTEMPTS: &str = "INTAKE_MAX_APPEND_ATTEMPTS";
pub const ENV_UTC_OFFSET_MINUTES: &str = "INTAKE_UTC_OFFSET_MINUTES";

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Append-only ledger file.
    pub ledger_path: PathBuf,
    /// JSON roster file; `None` uses the built-in roster.
    pub roster_path: Option<PathBuf>,
    /// Session, retry and record settings.
    pub intake: IntakeConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("./data/mcode_ledger.jsonl"),
            roster_path: None,
            intake: IntakeConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Build from an arbitrary variable source. `load_config` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_LEDGER_PATH).filter(|p| !p.trim().is_empty()) {
            config.ledger_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_ROSTER_PATH).filter(|p| !p.trim().is_empty()) {
            config.roster_path = Some(PathBuf::from(path));
        }

        if let Some(secs) = parse_var::<u64>(&lookup, ENV_SESSION_IDLE_SECS) {
            config.intake.session_idle_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_SWEEP_SECS) {
            config.intake.sweep_interval = Duration::from_secs(secs);
        }
        if let Some(attempts) = parse_var::<u32>(&lookup, ENV_MAX_APPEND_ATTEMPTS) {
            config.intake.max_append_attempts = attempts;
        }
        if let Some(minutes) = parse_var::<i32>(&lookup, ENV_UTC_OFFSET_MINUTES) {
            match minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
            {
                Some(offset) => config.intake.record_offset = offset,
                None => warn!(
                    "{} out of range ({} minutes), keeping {}",
                    ENV_UTC_OFFSET_MINUTES, minutes, config.intake.record_offset
                ),
            }
        }

        config
    }

    /// Validate before wiring anything up.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.intake.validate()
    }
}

/// Load configuration from the process environment.
pub fn load_config() -> RuntimeConfig {
    let config = RuntimeConfig::from_lookup(|name| std::env::var(name).ok());
    info!(
        "Loaded configuration: ledger={}, roster={}",
        config.ledger_path.display(),
        config
            .roster_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in".to_string())
    );
    config
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparsable {}={:?}", name, raw);
            None
        }
    }
}
