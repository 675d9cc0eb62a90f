//! Root configuration model.
//!
//! Loaded from `config.toml` by the infrastructure layer. Every field has a
//! default so a missing or partial file still yields a usable configuration.

use crate::error::{InboxError, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT_HOURS: i64 = 24;
const DEFAULT_CLEANUP_INTERVAL_MINUTES: u64 = 60;

/// Tunables for the persona session state machine.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Inactivity window after which a session is expired.
    pub timeout_hours: i64,
    /// Period of the background cleanup sweep.
    pub cleanup_interval_minutes: u64,
    /// A checkpoint is recorded whenever the parameter count is a positive
    /// multiple of this value.
    pub checkpoint_interval: usize,
    /// Number of most recent checkpoints retained per session.
    pub max_checkpoints: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_hours: DEFAULT_TIMEOUT_HOURS,
            cleanup_interval_minutes: DEFAULT_CLEANUP_INTERVAL_MINUTES,
            checkpoint_interval: 2,
            max_checkpoints: 5,
        }
    }
}

impl SessionConfig {
    /// Inactivity window. Falls back to the default for values that
    /// [`SessionConfig::validate`] would reject.
    pub fn timeout(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.timeout_hours)
            .filter(|timeout| *timeout > chrono::Duration::zero())
            .unwrap_or_else(|| chrono::Duration::hours(DEFAULT_TIMEOUT_HOURS))
    }

    /// Sweep period, at least one minute.
    pub fn cleanup_interval(&self) -> std::time::Duration {
        let secs = self
            .cleanup_interval_minutes
            .max(1)
            .checked_mul(60)
            .unwrap_or(DEFAULT_CLEANUP_INTERVAL_MINUTES * 60);
        std::time::Duration::from_secs(secs)
    }

    /// Rejects values a hand-edited `config.toml` may carry but the session
    /// manager cannot represent.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_hours <= 0 || chrono::Duration::try_hours(self.timeout_hours).is_none() {
            return Err(InboxError::config(format!(
                "persona_session.timeout_hours must be a positive number of hours, got {}",
                self.timeout_hours
            )));
        }
        if self.cleanup_interval_minutes.checked_mul(60).is_none() {
            return Err(InboxError::config(format!(
                "persona_session.cleanup_interval_minutes is out of range: {}",
                self.cleanup_interval_minutes
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set.
    pub filter: String,
    /// Emit JSON lines instead of the human-readable format.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RootConfig {
    pub persona_session: SessionConfig,
    pub logging: LoggingConfig,
}

impl RootConfig {
    pub fn validate(&self) -> Result<()> {
        self.persona_session.validate()
    }
}
