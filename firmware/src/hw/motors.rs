//! H-bridge drive train behind the [`MotorDriver`] trait.
//!
//! Two DC motors on an L298-style bridge: one PWM channel per side sets
//! the speed, two GPIO lines per side select the winding polarity. The
//! mapping from motion commands to wheel profiles lives in
//! [`crate::config`] so it can be tuned without touching this driver.

use embassy_stm32::gpio::Output;
use embassy_stm32::timer::GeneralInstance4Channel;
use embassy_stm32::timer::simple_pwm::SimplePwm;
use trailbot_core::steering::{DriveCommand, MotorDriver};

use crate::config::{self, WheelDrive};

/// PWM plus polarity pins for both sides of the bridge.
pub struct HBridgeMotors<'d, T: GeneralInstance4Channel> {
    pwm: SimplePwm<'d, T>,
    left_forward: Output<'d>,
    left_backward: Output<'d>,
    right_forward: Output<'d>,
    right_backward: Output<'d>,
}

impl<'d, T: GeneralInstance4Channel> HBridgeMotors<'d, T> {
    /// Wires the driver; channel 1 feeds the left enable pin, channel 2
    /// the right.
    pub fn new(
        mut pwm: SimplePwm<'d, T>,
        left_forward: Output<'d>,
        left_backward: Output<'d>,
        right_forward: Output<'d>,
        right_backward: Output<'d>,
    ) -> Self {
        pwm.ch1().enable();
        pwm.ch2().enable();
        let mut motors = Self {
            pwm,
            left_forward,
            left_backward,
            right_forward,
            right_backward,
        };
        motors.drive(DriveCommand::Stop);
        motors
    }

    fn apply_left(&mut self, wheel: WheelDrive) {
        set_polarity(
            &mut self.left_forward,
            &mut self.left_backward,
            wheel,
        );
        let duty = scale_duty(&self.pwm, wheel.duty);
        self.pwm.ch1().set_duty_cycle(duty);
    }

    fn apply_right(&mut self, wheel: WheelDrive) {
        set_polarity(
            &mut self.right_forward,
            &mut self.right_backward,
            wheel,
        );
        let duty = scale_duty(&self.pwm, wheel.duty);
        self.pwm.ch2().set_duty_cycle(duty);
    }
}

impl<'d, T: GeneralInstance4Channel> MotorDriver for HBridgeMotors<'d, T> {
    fn drive(&mut self, command: DriveCommand) {
        let profile = config::wheel_profile(command);
        self.apply_left(profile.left);
        self.apply_right(profile.right);
    }
}

/// Both polarity lines low on zero duty so the winding freewheels rather
/// than shorting the bridge.
fn set_polarity(forward: &mut Output<'_>, backward: &mut Output<'_>, wheel: WheelDrive) {
    if wheel.duty == 0 {
        forward.set_low();
        backward.set_low();
    } else if wheel.forward {
        forward.set_high();
        backward.set_low();
    } else {
        forward.set_low();
        backward.set_high();
    }
}

fn scale_duty<T: GeneralInstance4Channel>(pwm: &SimplePwm<'_, T>, duty: u8) -> u16 {
    let max = u32::from(pwm.max_duty_cycle());
    u16::try_from(u32::from(duty) * max / 255).unwrap_or(u16::MAX)
}
