//! Tri-sensor sampling and majority-vote debouncing.
//!
//! The optical sensor array flickers: a worn line, glare, or an uneven
//! floor can flip a bit for a single sample. The control loop therefore
//! never acts on a raw reading. Every cycle pushes the instantaneous
//! vector into a short ring and each sensor bit is accepted only when it
//! holds a majority of the ring, which rejects single-sample spikes
//! without waiting for full unanimity.

use heapless::HistoryBuf;

/// Instantaneous reading of the three line sensors.
///
/// Bit layout matches the telemetry wire encoding: LEFT=1, CENTER=2,
/// RIGHT=4.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TriSensor(u8);

impl TriSensor {
    /// No sensor sees the line.
    pub const BLANK: Self = Self(0);
    pub const LEFT: Self = Self(1);
    pub const CENTER: Self = Self(2);
    pub const RIGHT: Self = Self(4);
    /// All three sensors active: the start-field signature. Consumed by
    /// the position tracker, never a steering input.
    pub const ALL: Self = Self(7);

    /// Builds a vector from raw bits; anything above the low three bits is
    /// discarded.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Raw bit pattern, as sent over the telemetry link.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no sensor sees the line.
    #[must_use]
    pub const fn is_blank(self) -> bool {
        self.0 == 0
    }

    /// Union of two readings.
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Depth of the raw-sample ring used for debouncing.
pub const WINDOW_DEPTH: usize = 4;

/// A bit is accepted once it appears in at least this many ringed samples.
pub const VOTE_THRESHOLD: usize = 2;

/// Ring of the most recent raw samples with per-bit majority filtering.
#[derive(Debug)]
pub struct SensorWindow {
    history: HistoryBuf<TriSensor, WINDOW_DEPTH>,
}

impl SensorWindow {
    /// Creates an empty window; every bit debounces low until samples
    /// arrive.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            history: HistoryBuf::new(),
        }
    }

    /// Records a raw sample and returns the filtered vector.
    pub fn push(&mut self, raw: TriSensor) -> TriSensor {
        self.history.write(raw);
        self.debounced()
    }

    /// Majority vote over the ring, independently per sensor bit.
    #[must_use]
    pub fn debounced(&self) -> TriSensor {
        let mut bits = 0u8;
        for bit in [TriSensor::LEFT, TriSensor::CENTER, TriSensor::RIGHT] {
            let votes = self
                .history
                .oldest_ordered()
                .filter(|sample| sample.contains(bit))
                .count();
            if votes >= VOTE_THRESHOLD {
                bits |= bit.bits();
            }
        }
        TriSensor::from_bits(bits)
    }
}

impl Default for SensorWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Capability interface for the optical sensor array and battery probe.
///
/// The firmware backs this with the ADC; the emulator with a simulated
/// track; tests with scripted readings.
pub trait SensorSource {
    /// Instantaneous raw tri-sensor vector.
    fn read_tri_sensor(&mut self) -> TriSensor;

    /// Battery charge estimate in percent (0..=100). Only consulted when a
    /// telemetry frame goes out, so implementations may measure lazily.
    fn battery_percent(&mut self) -> u8;
}

/// Sensor source that reads blank forever; useful for tools and tests.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopSensorSource;

impl NoopSensorSource {
    /// Creates a new no-op sensor source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SensorSource for NoopSensorSource {
    fn read_tri_sensor(&mut self) -> TriSensor {
        TriSensor::BLANK
    }

    fn battery_percent(&mut self) -> u8 {
        100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_noisy_sample_is_rejected() {
        let mut window = SensorWindow::new();
        window.push(TriSensor::CENTER);
        window.push(TriSensor::CENTER);
        window.push(TriSensor::CENTER.with(TriSensor::LEFT));
        let debounced = window.push(TriSensor::CENTER);

        assert_eq!(debounced, TriSensor::CENTER);
    }

    #[test]
    fn majority_wins_over_one_dropout() {
        let mut window = SensorWindow::new();
        window.push(TriSensor::LEFT);
        window.push(TriSensor::LEFT);
        window.push(TriSensor::BLANK);
        let debounced = window.push(TriSensor::LEFT);

        assert_eq!(debounced, TriSensor::LEFT);
    }

    #[test]
    fn bits_vote_independently() {
        let mut window = SensorWindow::new();
        window.push(TriSensor::LEFT.with(TriSensor::CENTER));
        window.push(TriSensor::CENTER);
        window.push(TriSensor::LEFT);
        let debounced = window.push(TriSensor::CENTER);

        // LEFT and CENTER each hold two of four slots.
        assert_eq!(debounced, TriSensor::LEFT.with(TriSensor::CENTER));
    }

    #[test]
    fn empty_window_reads_blank() {
        let window = SensorWindow::new();
        assert_eq!(window.debounced(), TriSensor::BLANK);
    }

    #[test]
    fn out_of_range_bits_are_masked() {
        assert_eq!(TriSensor::from_bits(0xFF), TriSensor::ALL);
    }
}
