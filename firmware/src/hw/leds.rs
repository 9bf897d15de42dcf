//! Status LEDs behind a two-wire shift register.
//!
//! Frames are shifted most significant LED first, one clock pulse per
//! bit, exactly as wide as the chain.

use embassy_stm32::gpio::Output;
use trailbot_core::light::LedFrame;

/// LEDs on the chain.
const CHAIN_LEN: u8 = 3;

/// Bit-banged shift register holding the three status LEDs.
pub struct ShiftRegisterLeds<'d> {
    data: Output<'d>,
    clock: Output<'d>,
}

impl<'d> ShiftRegisterLeds<'d> {
    /// Wires the register and darkens the chain.
    pub fn new(data: Output<'d>, clock: Output<'d>) -> Self {
        let mut leds = Self { data, clock };
        leds.apply(LedFrame::OFF);
        leds
    }

    /// Clocks a frame into the chain.
    pub fn apply(&mut self, frame: LedFrame) {
        for position in (0..CHAIN_LEN).rev() {
            if frame.bits() >> position & 1 == 1 {
                self.data.set_high();
            } else {
                self.data.set_low();
            }
            self.pulse_clock();
        }
    }

    fn pulse_clock(&mut self) {
        self.clock.set_low();
        self.clock.set_high();
        self.clock.set_low();
    }
}
