//! PIN format and strength checks
//!
//! These checks are stateless and run before any attempt is recorded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{MAX_PIN_LENGTH, MIN_PIN_LENGTH};

/// Inclusive bounds on PIN length (in characters)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl LengthBounds {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, len: usize) -> bool {
        len >= self.min && len <= self.max
    }
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self::new(MIN_PIN_LENGTH, MAX_PIN_LENGTH)
    }
}

/// Reasons a PIN is rejected before comparison
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FormatError {
    #[error("PIN is required")]
    EmptyPin,

    #[error("PIN must be {min}-{max} digits")]
    LengthOutOfRange { min: usize, max: usize },

    #[error("PIN must contain only digits")]
    NonNumeric,

    #[error("PIN is too easy to guess (repeated or sequential digits)")]
    WeakPattern,
}

/// Outcome of [`validate_format`], shaped for direct rendering by a UI
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FormatError>,
}

impl From<std::result::Result<(), FormatError>> for FormatCheck {
    fn from(result: std::result::Result<(), FormatError>) -> Self {
        match result {
            Ok(()) => Self {
                valid: true,
                error: None,
            },
            Err(e) => Self {
                valid: false,
                error: Some(e),
            },
        }
    }
}

/// Validate a candidate PIN against the given bounds
pub fn validate_format(pin: &str, bounds: LengthBounds) -> FormatCheck {
    check_format(pin, bounds).into()
}

/// Same checks as [`validate_format`], as a `Result`
///
/// Checks run in order: empty, length, digits, weakness.
pub fn check_format(pin: &str, bounds: LengthBounds) -> std::result::Result<(), FormatError> {
    if pin.is_empty() {
        return Err(FormatError::EmptyPin);
    }

    if !bounds.contains(pin.chars().count()) {
        return Err(FormatError::LengthOutOfRange {
            min: bounds.min,
            max: bounds.max,
        });
    }

    if !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(FormatError::NonNumeric);
    }

    if is_weak_pin(pin) {
        return Err(FormatError::WeakPattern);
    }

    Ok(())
}

/// Check whether a digit string is a low-entropy pattern
///
/// Weak means every digit is the same, or the digits run up or down by
/// exactly one at each step ("123456", "654321"). Input containing anything
/// other than ASCII digits is never weak. A PIN of length 0 or 1 is weak.
pub fn is_weak_pin(pin: &str) -> bool {
    if !pin.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let digits: Vec<i8> = pin.bytes().map(|b| (b - b'0') as i8).collect();

    let steps_all = |step: i8| digits.windows(2).all(|w| w[1] - w[0] == step);

    steps_all(0) || steps_all(1) || steps_all(-1)
}
