//! PinGuard CLI - operator tooling for PIN validation and lockout
//!
//! Wraps pinguard-core with a durable JSON ledger so lockouts persist
//! between invocations.

pub mod commands;
pub mod settings;

pub use commands::{execute, Cli, Commands, Outcome};
pub use settings::Settings;
