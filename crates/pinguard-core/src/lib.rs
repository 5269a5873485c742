//! PinGuard Core - PIN validation and brute-force lockout
//!
//! This crate provides the decision logic behind PIN confirmation of
//! sensitive actions:
//! - Format and strength checks for candidate PINs
//! - A per-user attempt ledger with time-boxed lockout
//! - Validation orchestration against a reference PIN
//! - Secure PIN generation and Argon2id hashing helpers
//!
//! Expected outcomes (bad format, wrong PIN, active lockout) are returned as
//! values. `Err` is reserved for environment failures such as store I/O or
//! an unavailable random source.

pub mod clock;
pub mod error;
pub mod file_store;
pub mod format;
pub mod generate;
pub mod guard;
pub mod hash;
pub mod lockout;
pub mod policy;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{PinError, Result};
pub use file_store::JsonFileStore;
pub use format::{check_format, is_weak_pin, validate_format, FormatCheck, FormatError, LengthBounds};
pub use generate::{generate_default_pin, generate_secure_pin};
pub use guard::{AttemptRecord, AttemptStatus, PinGuard, Verification};
pub use hash::{hash_pin, verify_pin_hash, ReferencePin};
pub use lockout::{format_lockout_time, PinAttempt, PinLockout};
pub use policy::PinPolicy;
pub use store::{MemoryStore, PinAttemptStore};

/// Canonical PIN length
pub const PIN_LENGTH: usize = 6;

/// Minimum accepted PIN length
pub const MIN_PIN_LENGTH: usize = 4;

/// Maximum accepted PIN length
pub const MAX_PIN_LENGTH: usize = 8;

/// Failed attempts inside the failure window that trigger a lockout
pub const MAX_ATTEMPTS: u32 = 3;

/// Lockout duration in seconds
pub const LOCKOUT_DURATION_SECS: u64 = 5 * 60;

/// Trailing window in which failures count toward a lockout, in seconds
pub const FAILURE_WINDOW_SECS: u64 = 5 * 60;

/// How long attempts are kept in the ledger, in seconds
pub const ATTEMPT_RETENTION_SECS: u64 = 60 * 60;

/// Draws allowed before `generate_secure_pin` gives up on avoiding weak PINs
pub const MAX_GENERATION_ATTEMPTS: u32 = 100;
