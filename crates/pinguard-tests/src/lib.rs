//! Integration and E2E tests for PinGuard
//!
//! The tests live in `tests/`; this crate has no library code of its own.
