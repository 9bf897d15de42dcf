//! Tick/frequency scheduler built on the board's millisecond counter.
//!
//! A hardware timer interrupt increments a millisecond counter; the control
//! loop feeds the current value into [`CounterBank::tick`] once per
//! iteration and every frequency bucket recomputes whether it fires this
//! cycle. A bucket's flag is a pure function of elapsed time, so the same
//! bank can be driven by the MCU timer, the emulator clock, or a scripted
//! test sequence.

use core::fmt;

/// Milliseconds since boot, modular arithmetic.
///
/// The counter wraps after roughly 49.7 days. Deltas use wrapping
/// subtraction so a wrap can never double-fire or stall a bucket.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Millis(u32);

impl Millis {
    pub const ZERO: Self = Self(0);

    /// Wraps a raw counter value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Wraparound-safe elapsed time since `earlier`, in milliseconds.
    #[must_use]
    pub const fn since(self, earlier: Self) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Advances the timestamp, wrapping at the counter width.
    #[must_use]
    pub const fn offset(self, ms: u32) -> Self {
        Self(self.0.wrapping_add(ms))
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Named frequency buckets available to the control loop.
///
/// Coarse buckets pace human-readable output, fine buckets pace debouncing
/// and animation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Bucket {
    /// Status lines on the serial console.
    OneHz,
    /// Pause chase light, waiting blink, manual drive pulses.
    TwoHz,
    /// Spare coarse bucket for diagnostics output.
    TenHz,
    /// Position tracking, lap ladder, telemetry frames.
    TwelveHz,
    /// Frozen-mode chase light.
    ThirtyTwoHz,
}

impl Bucket {
    /// Number of buckets in the bank.
    pub const COUNT: usize = 5;

    /// Every bucket, in bank order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::OneHz,
        Self::TwoHz,
        Self::TenHz,
        Self::TwelveHz,
        Self::ThirtyTwoHz,
    ];

    const fn as_index(self) -> usize {
        match self {
            Self::OneHz => 0,
            Self::TwoHz => 1,
            Self::TenHz => 2,
            Self::TwelveHz => 3,
            Self::ThirtyTwoHz => 4,
        }
    }

    /// Milliseconds that must elapse between fires.
    #[must_use]
    pub const fn period_ms(self) -> u32 {
        match self {
            Self::OneHz => 1000,
            Self::TwoHz => 500,
            Self::TenHz => 100,
            Self::TwelveHz => 83,
            Self::ThirtyTwoHz => 31,
        }
    }
}

/// One periodic "due this cycle" flag.
#[derive(Copy, Clone, Debug)]
struct Counter {
    threshold: u32,
    last_fire: Millis,
    due: bool,
}

impl Counter {
    const fn new(threshold: u32) -> Self {
        Self {
            threshold,
            last_fire: Millis::ZERO,
            due: false,
        }
    }

    fn update(&mut self, now: Millis) {
        if now.since(self.last_fire) > self.threshold {
            self.last_fire = now;
            self.due = true;
        } else {
            self.due = false;
        }
    }
}

/// The fixed bank of frequency counters, created once at boot.
#[derive(Clone, Debug)]
pub struct CounterBank {
    counters: [Counter; Bucket::COUNT],
}

impl CounterBank {
    /// Creates the bank with every counter idle at time zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counters: [
                Counter::new(Bucket::OneHz.period_ms()),
                Counter::new(Bucket::TwoHz.period_ms()),
                Counter::new(Bucket::TenHz.period_ms()),
                Counter::new(Bucket::TwelveHz.period_ms()),
                Counter::new(Bucket::ThirtyTwoHz.period_ms()),
            ],
        }
    }

    /// Recomputes every bucket for this cycle.
    ///
    /// A counter whose threshold has elapsed fires and re-anchors to `now`
    /// in the same update; all others report not-due until their own
    /// threshold passes.
    pub fn tick(&mut self, now: Millis) {
        for counter in &mut self.counters {
            counter.update(now);
        }
    }

    /// Whether the bucket fires this cycle.
    #[must_use]
    pub fn is_due(&self, bucket: Bucket) -> bool {
        self.counters[bucket.as_index()].due
    }
}

impl Default for CounterBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;

    fn fires(bank: &mut CounterBank, bucket: Bucket, times: &[u32]) -> Vec<u32> {
        let mut fired = Vec::new();
        for &t in times {
            bank.tick(Millis::new(t));
            if bank.is_due(bucket) {
                fired.push(t);
            }
        }
        fired
    }

    #[test]
    fn bucket_fires_once_per_threshold_window() {
        let mut bank = CounterBank::new();
        let times: Vec<u32> = (0..=5_000).step_by(10).collect();
        let fired = fires(&mut bank, Bucket::OneHz, &times);

        assert!(!fired.is_empty());
        for pair in fired.windows(2) {
            assert!(
                pair[1] - pair[0] > Bucket::OneHz.period_ms(),
                "fires at {} and {} are closer than the threshold",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn flag_clears_on_the_cycle_after_a_fire() {
        let mut bank = CounterBank::new();
        bank.tick(Millis::new(1_100));
        assert!(bank.is_due(Bucket::OneHz));
        bank.tick(Millis::new(1_110));
        assert!(!bank.is_due(Bucket::OneHz));
    }

    #[test]
    fn counter_wraparound_keeps_spacing() {
        let mut bank = CounterBank::new();
        let start = u32::MAX - 50;

        bank.tick(Millis::new(start));
        assert!(bank.is_due(Bucket::TenHz));

        // 60ms later the counter has wrapped; the bucket must stay quiet.
        bank.tick(Millis::new(start.wrapping_add(60)));
        assert!(!bank.is_due(Bucket::TenHz));

        // 120ms after the fire the threshold has elapsed across the wrap.
        bank.tick(Millis::new(start.wrapping_add(120)));
        assert!(bank.is_due(Bucket::TenHz));
    }

    #[test]
    fn buckets_fire_independently() {
        let mut bank = CounterBank::new();
        bank.tick(Millis::new(40));
        assert!(bank.is_due(Bucket::ThirtyTwoHz));
        assert!(!bank.is_due(Bucket::TwelveHz));
        assert!(!bank.is_due(Bucket::OneHz));

        bank.tick(Millis::new(130));
        assert!(bank.is_due(Bucket::TwelveHz));
        assert!(bank.is_due(Bucket::TenHz));
        assert!(!bank.is_due(Bucket::OneHz));
    }
}
