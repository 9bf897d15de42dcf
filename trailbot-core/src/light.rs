//! LED frames and the chase/blink animation steppers.
//!
//! Only the pattern logic lives here. Clocking frames into the shift
//! register (or painting them in the emulator) is the presentation
//! collaborator's job; the core just decides which of the three LEDs are
//! lit each time an animation bucket fires.

use crate::sensing::TriSensor;

/// Bit pattern for the three status LEDs (RIGHT=1, CENTER=2, LEFT=4).
///
/// The bit order mirrors the shift-register wiring, which is reversed
/// relative to the sensor vector.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LedFrame(u8);

impl LedFrame {
    pub const OFF: Self = Self(0);
    pub const RIGHT: Self = Self(1);
    pub const CENTER: Self = Self(2);
    pub const LEFT: Self = Self(4);
    pub const ALL: Self = Self(7);

    /// Builds a frame from raw bits; anything above the low three bits is
    /// discarded.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Raw bit pattern, most significant LED first when shifted out.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// Frame mirroring the debounced sensor vector one LED per sensor.
#[must_use]
pub fn mirror(sensor: TriSensor) -> LedFrame {
    let mut bits = 0u8;
    if sensor.contains(TriSensor::LEFT) {
        bits |= LedFrame::LEFT.bits();
    }
    if sensor.contains(TriSensor::CENTER) {
        bits |= LedFrame::CENTER.bits();
    }
    if sensor.contains(TriSensor::RIGHT) {
        bits |= LedFrame::RIGHT.bits();
    }
    LedFrame::from_bits(bits)
}

/// Phase store for the chase and blink animations.
///
/// The state machine resets the phase when the robot enters a calm mode so
/// the animation always restarts from its first frame.
#[derive(Copy, Clone, Debug, Default)]
pub struct LightState {
    frame: u8,
    chase_reverse: bool,
}

impl LightState {
    /// Creates a dark, forward-running phase store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frame: 0,
            chase_reverse: false,
        }
    }

    /// Restarts the animation from its first frame.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advances the chase one step: a single lit LED bouncing
    /// right-center-left and back.
    pub fn chase(&mut self) -> LedFrame {
        if self.frame == 0 {
            self.frame = LedFrame::RIGHT.bits();
            self.chase_reverse = false;
        } else if self.chase_reverse {
            self.frame >>= 1;
            if self.frame == LedFrame::RIGHT.bits() {
                self.chase_reverse = false;
            }
        } else {
            self.frame <<= 1;
            if self.frame == LedFrame::LEFT.bits() {
                self.chase_reverse = true;
            }
        }
        LedFrame::from_bits(self.frame)
    }

    /// Toggles all LEDs between lit and dark.
    pub fn blink(&mut self) -> LedFrame {
        self.frame = if self.frame == 0 {
            LedFrame::ALL.bits()
        } else {
            0
        };
        LedFrame::from_bits(self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chase_bounces_between_outer_leds() {
        let mut light = LightState::new();
        let frames: [LedFrame; 6] = core::array::from_fn(|_| light.chase());
        assert_eq!(
            frames,
            [
                LedFrame::RIGHT,
                LedFrame::CENTER,
                LedFrame::LEFT,
                LedFrame::CENTER,
                LedFrame::RIGHT,
                LedFrame::CENTER,
            ]
        );
    }

    #[test]
    fn blink_alternates_all_and_off() {
        let mut light = LightState::new();
        assert_eq!(light.blink(), LedFrame::ALL);
        assert_eq!(light.blink(), LedFrame::OFF);
        assert_eq!(light.blink(), LedFrame::ALL);
    }

    #[test]
    fn reset_restarts_the_pattern() {
        let mut light = LightState::new();
        light.chase();
        light.chase();
        light.reset();
        assert_eq!(light.chase(), LedFrame::RIGHT);
    }

    #[test]
    fn mirror_reverses_the_bit_order() {
        assert_eq!(mirror(TriSensor::LEFT), LedFrame::LEFT);
        assert_eq!(mirror(TriSensor::RIGHT), LedFrame::RIGHT);
        assert_eq!(mirror(TriSensor::ALL), LedFrame::ALL);
        assert_eq!(mirror(TriSensor::BLANK), LedFrame::OFF);
    }
}
