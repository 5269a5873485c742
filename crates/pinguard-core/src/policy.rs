//! PIN and lockout policy
//!
//! The default policy allows 3 failures inside a 5 minute window and then
//! locks the user out for 5 minutes. Attempts are kept for one hour.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::format::LengthBounds;
use crate::{
    PinError, Result, ATTEMPT_RETENTION_SECS, FAILURE_WINDOW_SECS, LOCKOUT_DURATION_SECS,
    MAX_ATTEMPTS, MAX_PIN_LENGTH, MIN_PIN_LENGTH, PIN_LENGTH,
};

/// Tunable PIN and lockout policy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinPolicy {
    /// Canonical length for generated PINs
    pub pin_length: usize,
    /// Shortest accepted PIN
    pub min_length: usize,
    /// Longest accepted PIN
    pub max_length: usize,
    /// Failures inside the window before lockout
    pub max_attempts: u32,
    /// Lockout duration (seconds)
    pub lockout_duration_secs: u64,
    /// Trailing window for counting failures (seconds)
    pub failure_window_secs: u64,
    /// Attempt history retention (seconds)
    pub retention_secs: u64,
}

impl Default for PinPolicy {
    fn default() -> Self {
        Self {
            pin_length: PIN_LENGTH,
            min_length: MIN_PIN_LENGTH,
            max_length: MAX_PIN_LENGTH,
            max_attempts: MAX_ATTEMPTS,
            lockout_duration_secs: LOCKOUT_DURATION_SECS,
            failure_window_secs: FAILURE_WINDOW_SECS,
            retention_secs: ATTEMPT_RETENTION_SECS,
        }
    }
}

impl PinPolicy {
    /// Create a strict policy (fewer attempts, longer lockout)
    pub fn strict() -> Self {
        Self {
            max_attempts: 2,
            lockout_duration_secs: 15 * 60, // 15 minutes
            failure_window_secs: 15 * 60,
            retention_secs: 4 * 60 * 60,
            ..Self::default()
        }
    }

    /// Create a lenient policy (more attempts allowed)
    pub fn lenient() -> Self {
        Self {
            max_attempts: 5,
            lockout_duration_secs: 60, // 1 minute
            failure_window_secs: 2 * 60,
            ..Self::default()
        }
    }

    /// Length bounds used by format validation
    pub fn bounds(&self) -> LengthBounds {
        LengthBounds::new(self.min_length, self.max_length)
    }

    pub fn lockout_duration(&self) -> Duration {
        Duration::from_secs(self.lockout_duration_secs)
    }

    pub fn failure_window(&self) -> Duration {
        Duration::from_secs(self.failure_window_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub(crate) fn lockout_duration_ms(&self) -> i64 {
        secs_to_ms(self.lockout_duration_secs)
    }

    pub(crate) fn failure_window_ms(&self) -> i64 {
        secs_to_ms(self.failure_window_secs)
    }

    pub(crate) fn retention_ms(&self) -> i64 {
        secs_to_ms(self.retention_secs)
    }

    /// Check the policy for inconsistent values
    pub fn validate(&self) -> Result<()> {
        if self.min_length == 0 || self.min_length > self.max_length {
            return Err(PinError::Config(format!(
                "invalid length bounds {}-{}",
                self.min_length, self.max_length
            )));
        }
        if !self.bounds().contains(self.pin_length) {
            return Err(PinError::Config(format!(
                "pin_length {} outside {}-{}",
                self.pin_length, self.min_length, self.max_length
            )));
        }
        if self.max_attempts == 0 {
            return Err(PinError::Config("max_attempts must be at least 1".into()));
        }
        if self.lockout_duration_secs == 0 || self.failure_window_secs == 0 {
            return Err(PinError::Config(
                "lockout duration and failure window must be non-zero".into(),
            ));
        }
        if self.retention_secs < self.failure_window_secs {
            return Err(PinError::Config(
                "retention must cover the failure window".into(),
            ));
        }
        Ok(())
    }

    /// Load and validate a policy from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let policy: Self = toml::from_str(&content)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Save the policy as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn secs_to_ms(secs: u64) -> i64 {
    i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX)
}
