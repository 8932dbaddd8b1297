use std::time::Instant;

mod sleep;
pub use sleep::{Sleep, sleep, sleep_for, sleep_until};

/// The current instant on the monotonic clock all deadlines are measured
/// against.
pub fn now() -> Instant {
    Instant::now()
}
