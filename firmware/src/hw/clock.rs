//! The shared millisecond counter.
//!
//! The counter is the only state touched from two execution contexts: the
//! millisecond tick task writes it, the control loop reads it. A 32-bit
//! atomic keeps the read untorn without masking interrupts around it.

use portable_atomic::{AtomicU32, Ordering};
use trailbot_core::scheduler::Millis;

static MILLIS: AtomicU32 = AtomicU32::new(0);

/// Advances the counter by one millisecond.
pub fn advance() {
    MILLIS.fetch_add(1, Ordering::Relaxed);
}

/// Current counter value, for the scheduler bank.
pub fn now() -> Millis {
    Millis::new(MILLIS.load(Ordering::Relaxed))
}
