//! PIN validation and lockout guard
//!
//! Per user the guard is either unlocked or locked. A user becomes locked
//! when failures inside the trailing failure window reach
//! `max_attempts`, and unlocks either on reset or the first time their
//! state is read at or after `locked_until` (lazy expiry, which also clears
//! their attempt history). There are no timers.
//!
//! Every public operation holds a single mutex over the store for its whole
//! duration, and runs inside the store's `begin`/`commit` bracket, so
//! recording a failure and checking the threshold can never interleave with
//! another caller in this process or, for shared stores, another process.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::hash::ReferencePin;
use crate::lockout::{self, PinAttempt, PinLockout};
use crate::policy::PinPolicy;
use crate::store::{MemoryStore, PinAttemptStore};
use crate::Result;

/// Outcome of [`PinGuard::validate_pin`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verification {
    /// PIN matched; attempts have been reset
    Success,
    /// No reference PIN exists for the user
    NotConfigured,
    /// PIN did not match and the user is not yet locked
    Mismatch { remaining_attempts: u32 },
    /// The user is locked out
    LockedOut { remaining_secs: u64 },
}

impl Verification {
    pub fn is_success(&self) -> bool {
        matches!(self, Verification::Success)
    }
}

impl std::fmt::Display for Verification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verification::Success => write!(f, "PIN accepted"),
            Verification::NotConfigured => write!(f, "No PIN configured for this user"),
            Verification::Mismatch {
                remaining_attempts: 1,
            } => write!(f, "Incorrect PIN (1 attempt remaining)"),
            Verification::Mismatch { remaining_attempts } => {
                write!(f, "Incorrect PIN ({} attempts remaining)", remaining_attempts)
            }
            Verification::LockedOut { remaining_secs } => write!(
                f,
                "Too many attempts, try again in {}",
                lockout::format_lockout_time(*remaining_secs)
            ),
        }
    }
}

/// What [`PinGuard::record_attempt`] did
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptRecord {
    /// Failures inside the window after this attempt (0 for a success)
    pub recent_failures: u32,
    /// Lockout applied by this attempt, if it crossed the threshold
    pub lockout: Option<PinLockout>,
}

/// Snapshot of a user's lockout state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptStatus {
    pub locked: bool,
    pub remaining_secs: u64,
    pub recent_failures: u32,
    pub remaining_attempts: u32,
}

/// PIN guard over an attempt store
pub struct PinGuard<S = MemoryStore, C = SystemClock> {
    store: Mutex<S>,
    clock: C,
    policy: PinPolicy,
}

impl PinGuard<MemoryStore, SystemClock> {
    /// In-memory guard with the default policy and the system clock
    pub fn new() -> Self {
        Self {
            store: Mutex::new(MemoryStore::new()),
            clock: SystemClock,
            policy: PinPolicy::default(),
        }
    }
}

impl Default for PinGuard<MemoryStore, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: PinAttemptStore, C: Clock> PinGuard<S, C> {
    /// Build a guard, rejecting an inconsistent policy
    pub fn with_parts(store: S, clock: C, policy: PinPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            store: Mutex::new(store),
            clock,
            policy,
        })
    }

    pub fn policy(&self) -> &PinPolicy {
        &self.policy
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Tear down the guard and hand back its store
    pub fn into_store(self) -> S {
        self.store.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one operation against the store under the mutex and the store's
    /// begin/commit bracket
    fn with_store<T>(&self, op: impl FnOnce(&mut S, i64) -> Result<T>) -> Result<T> {
        // Stores only see whole-record writes, so a panicked holder leaves
        // nothing half-applied
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);

        store.begin()?;
        let now = self.clock.now_ms();
        match op(&mut *store, now) {
            Ok(value) => {
                store.commit()?;
                Ok(value)
            }
            Err(e) => {
                store.rollback();
                Err(e)
            }
        }
    }

    /// Whether the user is currently locked out
    pub fn is_locked_out(&self, user_id: &str) -> Result<bool> {
        self.with_store(|store, now| Ok(self.active_lockout(store, user_id, now)?.is_some()))
    }

    /// Seconds until the lockout ends, 0 when not locked
    pub fn lockout_time_remaining(&self, user_id: &str) -> Result<u64> {
        self.with_store(|store, now| {
            Ok(self
                .active_lockout(store, user_id, now)?
                .map(|l| l.remaining_secs(now))
                .unwrap_or(0))
        })
    }

    /// Record an attempt and apply a lockout if the threshold is reached
    pub fn record_attempt(&self, user_id: &str, success: bool) -> Result<AttemptRecord> {
        self.with_store(|store, now| {
            self.active_lockout(store, user_id, now)?;
            self.record(store, user_id, success, now)
        })
    }

    /// Clear all attempts and any lockout for the user
    pub fn reset_attempts(&self, user_id: &str) -> Result<()> {
        self.with_store(|store, _now| store.clear_user(user_id))?;
        info!(user_id, "PIN attempts reset");
        Ok(())
    }

    /// Lock state plus failure counts for display
    pub fn status(&self, user_id: &str) -> Result<AttemptStatus> {
        self.with_store(|store, now| {
            let active = self.active_lockout(store, user_id, now)?;
            let attempts = store.attempts(user_id)?;
            let recent_failures =
                lockout::recent_failures(&attempts, now, self.policy.failure_window_ms());

            Ok(AttemptStatus {
                locked: active.is_some(),
                remaining_secs: active.map(|l| l.remaining_secs(now)).unwrap_or(0),
                recent_failures,
                remaining_attempts: self.remaining_attempts(recent_failures),
            })
        })
    }

    /// Check a submitted PIN against the user's reference PIN
    ///
    /// The comparison is exact and format is not checked here; callers
    /// reject malformed input before submitting it. A success resets the
    /// user's attempts; a mismatch is recorded and may lock the user out.
    pub fn validate_pin(
        &self,
        user_id: &str,
        submitted: &str,
        reference: Option<&ReferencePin>,
    ) -> Result<Verification> {
        self.with_store(|store, now| {
            if let Some(active) = self.active_lockout(store, user_id, now)? {
                return Ok(Verification::LockedOut {
                    remaining_secs: active.remaining_secs(now),
                });
            }

            let Some(reference) = reference else {
                debug!(user_id, "no reference PIN configured");
                return Ok(Verification::NotConfigured);
            };

            let matched = reference.matches(submitted)?;
            let record = self.record(store, user_id, matched, now)?;

            if matched {
                store.clear_user(user_id)?;
                debug!(user_id, "PIN accepted");
                return Ok(Verification::Success);
            }

            Ok(match record.lockout {
                Some(applied) => Verification::LockedOut {
                    remaining_secs: applied.remaining_secs(now),
                },
                None => Verification::Mismatch {
                    remaining_attempts: self.remaining_attempts(record.recent_failures),
                },
            })
        })
    }

    /// Drop expired lockouts and attempts past retention for every user
    ///
    /// Returns the number of users whose records changed.
    pub fn purge_expired(&self) -> Result<usize> {
        let touched = self.with_store(|store, now| {
            let mut touched = 0;

            for user_id in store.users()? {
                if let Some(existing) = store.lockout(&user_id)? {
                    if !existing.is_active(now) {
                        store.clear_user(&user_id)?;
                        touched += 1;
                    }
                    continue;
                }

                let mut attempts = store.attempts(&user_id)?;
                let before = attempts.len();
                lockout::prune(&mut attempts, now, self.policy.retention_ms());
                if attempts.len() != before {
                    store.put_attempts(&user_id, attempts)?;
                    touched += 1;
                }
            }
            Ok(touched)
        })?;

        if touched > 0 {
            info!(users = touched, "purged expired PIN records");
        }
        Ok(touched)
    }

    /// Current lockout, expiring it (and the user's history) if stale
    fn active_lockout(&self, store: &mut S, user_id: &str, now: i64) -> Result<Option<PinLockout>> {
        match store.lockout(user_id)? {
            Some(lockout) if lockout.is_active(now) => Ok(Some(lockout)),
            Some(_) => {
                store.clear_user(user_id)?;
                info!(user_id, "PIN lockout expired");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn record(&self, store: &mut S, user_id: &str, success: bool, now: i64) -> Result<AttemptRecord> {
        let mut attempts = store.attempts(user_id)?;
        attempts.push(PinAttempt::new(user_id, now, success));
        lockout::prune(&mut attempts, now, self.policy.retention_ms());

        let recent_failures = if success {
            0
        } else {
            lockout::recent_failures(&attempts, now, self.policy.failure_window_ms())
        };
        store.put_attempts(user_id, attempts)?;

        debug!(user_id, success, recent_failures, "PIN attempt recorded");

        if success || recent_failures < self.policy.max_attempts {
            return Ok(AttemptRecord {
                recent_failures,
                lockout: None,
            });
        }

        let lockout = PinLockout {
            user_id: user_id.to_string(),
            locked_until: now.saturating_add(self.policy.lockout_duration_ms()),
            attempts: recent_failures,
        };
        store.put_lockout(lockout.clone())?;

        warn!(
            user_id,
            attempts = recent_failures,
            lockout_secs = self.policy.lockout_duration_secs,
            "user locked out after repeated PIN failures"
        );

        Ok(AttemptRecord {
            recent_failures,
            lockout: Some(lockout),
        })
    }

    fn remaining_attempts(&self, recent_failures: u32) -> u32 {
        self.policy.max_attempts.saturating_sub(recent_failures)
    }
}
