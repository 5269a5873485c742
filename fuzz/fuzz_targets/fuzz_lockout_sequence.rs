#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pinguard_core::{ManualClock, MemoryStore, PinGuard, PinPolicy};
use std::time::Duration;

#[derive(Arbitrary, Debug)]
enum Op {
    Record { user: u8, success: bool },
    Reset { user: u8 },
    Advance { secs: u16 },
    Purge,
}

fuzz_target!(|ops: Vec<Op>| {
    let clock = ManualClock::new(0);
    let guard =
        PinGuard::with_parts(MemoryStore::new(), clock.clone(), PinPolicy::default()).unwrap();

    for op in ops {
        match op {
            Op::Record { user, success } => {
                let user = format!("user-{}", user % 4);
                guard.record_attempt(&user, success).unwrap();
            }
            Op::Reset { user } => guard.reset_attempts(&format!("user-{}", user % 4)).unwrap(),
            Op::Advance { secs } => clock.advance(Duration::from_secs(secs as u64)),
            Op::Purge => {
                guard.purge_expired().unwrap();
            }
        }

        // Threshold reached always means locked
        for i in 0..4 {
            let status = guard.status(&format!("user-{}", i)).unwrap();
            assert!(status.recent_failures < 3 || status.locked);
            assert!(status.remaining_secs <= 300);
        }
    }
});
