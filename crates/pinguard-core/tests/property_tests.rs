//! Property-based tests for pinguard-core using proptest
//!
//! These tests verify invariants that should hold for all valid inputs.

use std::time::Duration;

use proptest::prelude::*;
use pinguard_core::{
    check_format, format_lockout_time, is_weak_pin, FormatError, LengthBounds, ManualClock,
    MemoryStore, PinGuard, PinPolicy, ReferencePin, Verification,
};

// ============================================
// Strategies
// ============================================

fn arb_repeated_pin() -> impl Strategy<Value = String> {
    (0u8..=9, 1usize..=12).prop_map(|(d, len)| {
        std::iter::repeat(char::from(b'0' + d))
            .take(len)
            .collect::<String>()
    })
}

fn arb_run_pin() -> impl Strategy<Value = String> {
    // Ascending or descending by one, staying inside 0-9
    (2usize..=10, prop::bool::ANY).prop_flat_map(|(len, ascending)| {
        let max_start = 10 - len as u8;
        (0u8..=max_start).prop_map(move |start| {
            let digits: Vec<u8> = (0..len as u8).map(|i| start + i).collect();
            let digits: Vec<u8> = if ascending {
                digits
            } else {
                digits.into_iter().rev().collect()
            };
            digits.into_iter().map(|d| char::from(b'0' + d)).collect::<String>()
        })
    })
}

fn manual_guard() -> (PinGuard<MemoryStore, ManualClock>, ManualClock) {
    let clock = ManualClock::new(1_700_000_000_000);
    let guard =
        PinGuard::with_parts(MemoryStore::new(), clock.clone(), PinPolicy::default()).unwrap();
    (guard, clock)
}

// ============================================
// Property Tests
// ============================================

proptest! {
    // ----------------------------------------
    // Weakness
    // ----------------------------------------

    #[test]
    fn repeated_digits_are_weak(pin in arb_repeated_pin()) {
        prop_assert!(is_weak_pin(&pin));
    }

    #[test]
    fn unit_runs_are_weak(pin in arb_run_pin()) {
        prop_assert!(is_weak_pin(&pin));
    }

    #[test]
    fn weak_pins_are_constant_or_unit_steps(pin in "[0-9]{6}") {
        let bytes = pin.as_bytes();
        let steps: Vec<i16> = bytes.windows(2).map(|w| w[1] as i16 - w[0] as i16).collect();
        let expected = steps.iter().all(|&s| s == steps[0]) && matches!(steps[0], -1..=1);
        prop_assert_eq!(is_weak_pin(&pin), expected);
    }

    // ----------------------------------------
    // Format
    // ----------------------------------------

    #[test]
    fn non_digit_is_rejected(prefix in "[0-9]{2}", bad in "[a-zA-Z ]", suffix in "[0-9]{3}") {
        let pin = format!("{}{}{}", prefix, bad, suffix);
        prop_assert_eq!(check_format(&pin, LengthBounds::default()), Err(FormatError::NonNumeric));
    }

    #[test]
    fn short_pins_are_out_of_range(pin in "[0-9]{1,3}") {
        prop_assert_eq!(
            check_format(&pin, LengthBounds::default()),
            Err(FormatError::LengthOutOfRange { min: 4, max: 8 })
        );
    }

    #[test]
    fn accepted_pins_are_strong_digits(pin in "[0-9]{4,8}") {
        if check_format(&pin, LengthBounds::default()).is_ok() {
            prop_assert!(pin.chars().all(|c| c.is_ascii_digit()));
            prop_assert!(!is_weak_pin(&pin));
        }
    }

    // ----------------------------------------
    // Time formatting
    // ----------------------------------------

    #[test]
    fn mixed_minutes_format(minutes in 1u64..120, seconds in 1u64..60) {
        prop_assert_eq!(
            format_lockout_time(minutes * 60 + seconds),
            format!("{}m {}s", minutes, seconds)
        );
    }

    // ----------------------------------------
    // Lockout
    // ----------------------------------------

    #[test]
    fn remaining_time_is_monotonic(steps in prop::collection::vec(0u64..20_000, 1..30)) {
        let (guard, clock) = manual_guard();
        for _ in 0..3 {
            guard.record_attempt("alice", false).unwrap();
        }

        let mut previous = guard.lockout_time_remaining("alice").unwrap();
        prop_assert_eq!(previous, 300);

        for ms in steps {
            clock.advance(Duration::from_millis(ms));
            let remaining = guard.lockout_time_remaining("alice").unwrap();
            prop_assert!(remaining <= previous);
            prop_assert_eq!(guard.is_locked_out("alice").unwrap(), remaining > 0);
            previous = remaining;
        }
    }

    #[test]
    fn never_unlocked_at_threshold(outcomes in prop::collection::vec(prop::bool::ANY, 1..20)) {
        let (guard, clock) = manual_guard();
        for success in outcomes {
            clock.advance(Duration::from_secs(10));
            guard.record_attempt("alice", success).unwrap();
            let status = guard.status("alice").unwrap();
            if status.recent_failures >= 3 {
                prop_assert!(status.locked);
            }
        }
    }

    #[test]
    fn correct_pin_always_clears(wrong in 0usize..3, pin in "[0-9]{6}") {
        prop_assume!(pin != "482910");
        let (guard, _clock) = manual_guard();
        let reference = ReferencePin::plain("482910");

        for _ in 0..wrong {
            guard.validate_pin("alice", &pin, Some(&reference)).unwrap();
        }
        prop_assert_eq!(
            guard.validate_pin("alice", "482910", Some(&reference)).unwrap(),
            Verification::Success
        );
        prop_assert_eq!(guard.status("alice").unwrap().recent_failures, 0);
    }
}
