#![no_main]

use libfuzzer_sys::fuzz_target;
use pinguard_core::{check_format, is_weak_pin, FormatError, LengthBounds};

fuzz_target!(|data: &[u8]| {
    let Ok(pin) = std::str::from_utf8(data) else {
        return;
    };

    // Must never panic on arbitrary input
    let result = check_format(pin, LengthBounds::default());

    if result.is_ok() {
        assert!(pin.bytes().all(|b| b.is_ascii_digit()));
        assert!(!is_weak_pin(pin));
    }
    if pin.is_empty() {
        assert_eq!(result, Err(FormatError::EmptyPin));
    }
});
