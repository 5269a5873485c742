//! Attempt and lockout records
//!
//! Records are plain data. All time arithmetic takes `now` explicitly so
//! lockout state is a pure function of `(now, record)`.

use serde::{Deserialize, Serialize};

/// A single PIN validation attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinAttempt {
    pub user_id: String,
    /// Unix epoch milliseconds
    pub timestamp: i64,
    pub success: bool,
}

impl PinAttempt {
    pub fn new(user_id: impl Into<String>, timestamp: i64, success: bool) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp,
            success,
        }
    }

    /// Whether the attempt happened strictly less than `window_ms` before `now`
    pub fn is_within(&self, now: i64, window_ms: i64) -> bool {
        now.saturating_sub(self.timestamp) < window_ms
    }
}

/// An active (or stale) lockout for a user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinLockout {
    pub user_id: String,
    /// Unix epoch milliseconds
    pub locked_until: i64,
    /// Failures inside the window when the lockout was applied
    pub attempts: u32,
}

impl PinLockout {
    pub fn is_active(&self, now: i64) -> bool {
        now < self.locked_until
    }

    /// Whole seconds left, rounded up; 0 once expired
    pub fn remaining_secs(&self, now: i64) -> u64 {
        let remaining_ms = self.locked_until.saturating_sub(now);
        if remaining_ms <= 0 {
            return 0;
        }
        (remaining_ms as u64).div_ceil(1000)
    }
}

/// Drop attempts older than the retention window
pub(crate) fn prune(attempts: &mut Vec<PinAttempt>, now: i64, retention_ms: i64) {
    attempts.retain(|a| a.is_within(now, retention_ms));
}

/// Count failures inside the trailing window
pub(crate) fn recent_failures(attempts: &[PinAttempt], now: i64, window_ms: i64) -> u32 {
    attempts
        .iter()
        .filter(|a| !a.success && a.is_within(now, window_ms))
        .count() as u32
}

/// Human-readable lockout countdown
///
/// ```
/// use pinguard_core::format_lockout_time;
///
/// assert_eq!(format_lockout_time(45), "45 secondes");
/// assert_eq!(format_lockout_time(135), "2m 15s");
/// assert_eq!(format_lockout_time(180), "3 minutes");
/// ```
pub fn format_lockout_time(seconds: u64) -> String {
    if seconds < 60 {
        return match seconds {
            0 | 1 => format!("{} seconde", seconds),
            _ => format!("{} secondes", seconds),
        };
    }

    let minutes = seconds / 60;
    let rest = seconds % 60;
    match (minutes, rest) {
        (1, 0) => "1 minute".to_string(),
        (m, 0) => format!("{} minutes", m),
        (m, s) => format!("{}m {}s", m, s),
    }
}
