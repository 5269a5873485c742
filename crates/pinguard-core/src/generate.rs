//! Secure PIN generation

use rand::{rngs::OsRng, RngCore};
use tracing::warn;
use zeroize::Zeroizing;

use crate::format::is_weak_pin;
use crate::{PinError, Result, MAX_GENERATION_ATTEMPTS, PIN_LENGTH};

/// Generate a random PIN of the canonical length
pub fn generate_default_pin() -> Result<String> {
    generate_secure_pin(PIN_LENGTH)
}

/// Generate a random digit string from the OS random source
///
/// Each byte is reduced modulo 10. Weak candidates are redrawn up to
/// [`MAX_GENERATION_ATTEMPTS`] times; if every draw is weak the last one is
/// returned. Fails only when the random source is unavailable.
pub fn generate_secure_pin(length: usize) -> Result<String> {
    let mut bytes = Zeroizing::new(vec![0u8; length]);
    let mut candidate = String::new();

    for _ in 0..MAX_GENERATION_ATTEMPTS {
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| PinError::Entropy(e.to_string()))?;

        candidate = bytes.iter().map(|b| char::from(b'0' + b % 10)).collect();

        if !is_weak_pin(&candidate) {
            return Ok(candidate);
        }
    }

    warn!(
        length,
        attempts = MAX_GENERATION_ATTEMPTS,
        "every generated PIN was weak, returning last candidate"
    );
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_length() {
        let pin = generate_default_pin().unwrap();
        assert_eq!(pin.len(), PIN_LENGTH);
        assert!(pin.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_custom_length() {
        for length in [4, 8, 12] {
            assert_eq!(generate_secure_pin(length).unwrap().len(), length);
        }
    }

    #[test]
    fn test_never_weak() {
        for _ in 0..1000 {
            let pin = generate_secure_pin(6).unwrap();
            assert!(!is_weak_pin(&pin), "generated weak PIN {}", pin);
        }
    }

    #[test]
    fn test_degenerate_length_returns_last_candidate() {
        // Every 1-digit PIN is weak, so the retry budget runs out
        let pin = generate_secure_pin(1).unwrap();
        assert_eq!(pin.len(), 1);
        assert!(is_weak_pin(&pin));

        assert_eq!(generate_secure_pin(0).unwrap(), "");
    }
}
