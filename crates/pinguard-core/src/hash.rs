//! Reference PINs and Argon2id hashing helpers
//!
//! A reference PIN is held either in the clear (zeroized on drop) or as an
//! Argon2id PHC string.

use std::fmt;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use zeroize::Zeroizing;

use crate::{PinError, Result};

/// The PIN a submission is compared against
#[derive(Clone)]
pub enum ReferencePin {
    /// Compared by exact string equality
    Plain(Zeroizing<String>),
    /// Argon2id PHC string produced by [`hash_pin`]
    Hashed(String),
}

impl ReferencePin {
    pub fn plain(pin: impl Into<String>) -> Self {
        ReferencePin::Plain(Zeroizing::new(pin.into()))
    }

    pub fn hashed(phc: impl Into<String>) -> Self {
        ReferencePin::Hashed(phc.into())
    }

    /// Check a submitted PIN; no trimming or normalisation is applied
    pub fn matches(&self, submitted: &str) -> Result<bool> {
        match self {
            ReferencePin::Plain(reference) => Ok(reference.as_str() == submitted),
            ReferencePin::Hashed(phc) => verify_pin_hash(submitted, phc),
        }
    }
}

impl fmt::Debug for ReferencePin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferencePin::Plain(_) => f.write_str("ReferencePin::Plain(..)"),
            ReferencePin::Hashed(_) => f.write_str("ReferencePin::Hashed(..)"),
        }
    }
}

/// Hash a PIN with Argon2id and a random salt
pub fn hash_pin(pin: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let pin_bytes = Zeroizing::new(pin.as_bytes().to_vec());

    let hash = Argon2::default()
        .hash_password(&pin_bytes, &salt)
        .map_err(|e| PinError::Hash(format!("Failed to hash PIN: {}", e)))?
        .to_string();

    Ok(hash)
}

/// Verify a PIN against a PHC string from [`hash_pin`]
///
/// A wrong PIN is `Ok(false)`; a malformed hash is an error.
pub fn verify_pin_hash(pin: &str, phc: &str) -> Result<bool> {
    let parsed = PasswordHash::new(phc)
        .map_err(|e| PinError::Hash(format!("Invalid stored hash: {}", e)))?;

    let pin_bytes = Zeroizing::new(pin.as_bytes().to_vec());
    match Argon2::default().verify_password(&pin_bytes, &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
