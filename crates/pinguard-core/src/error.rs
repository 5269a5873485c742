//! Error types for PinGuard
//!
//! Only environment failures live here. Wrong PINs, format problems and
//! lockouts are reported through [`crate::Verification`] and
//! [`crate::FormatError`].

use thiserror::Error;

/// Result type alias for PinGuard operations
pub type Result<T> = std::result::Result<T, PinError>;

/// Errors that can occur in PinGuard
#[derive(Debug, Error)]
pub enum PinError {
    /// The operating system random source failed
    #[error("Random source unavailable: {0}")]
    Entropy(String),

    /// Attempt store failure
    #[error("Store error: {0}")]
    Store(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Hashing backend failure or malformed stored hash
    #[error("Hash error: {0}")]
    Hash(String),

    /// Invalid policy configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for PinError {
    fn from(e: serde_json::Error) -> Self {
        PinError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for PinError {
    fn from(e: toml::de::Error) -> Self {
        PinError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for PinError {
    fn from(e: toml::ser::Error) -> Self {
        PinError::Serialization(e.to_string())
    }
}

impl From<argon2::password_hash::Error> for PinError {
    fn from(e: argon2::password_hash::Error) -> Self {
        PinError::Hash(e.to_string())
    }
}
