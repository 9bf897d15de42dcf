//! Board tuning constants: wheel duty profiles, sensor thresholds, link
//! and loop timing.
//!
//! Kept apart from the drivers so a speed or threshold change is a
//! one-line diff and the values stay visible to host-side tooling.

#![allow(dead_code)]

use trailbot_core::steering::DriveCommand;

/// Control loop period in milliseconds. The scheduler buckets pace
/// themselves off the millisecond counter; the loop only has to spin
/// faster than the finest bucket.
pub const CONTROL_PERIOD_MS: u64 = 5;

/// Baud rate of the operator serial link.
pub const LINK_BAUD: u32 = 9_600;

/// Duty for both wheels on a straight stretch (0..=255 of full scale).
pub const DUTY_STRAIGHT: u8 = 125;
/// Duty of the outer wheel in a pivot turn.
pub const DUTY_TURN_OUTER: u8 = 220;
/// Duty of the inner (counter-rotating) wheel in a pivot turn.
pub const DUTY_TURN_INNER: u8 = 200;
/// Duty for the smooth reverse used on the homeward leg.
pub const DUTY_REVERSE: u8 = 90;

/// ADC count above which a line-sensor channel reads "line".
pub const LINE_THRESHOLD: u16 = 600;
/// Raw conversions averaged per channel per reading.
pub const ADC_SAMPLES: u8 = 8;

/// Battery divider reading mapped to 100 percent.
pub const BATTERY_FULL_COUNTS: u16 = 930;
/// Battery divider reading mapped to 0 percent.
pub const BATTERY_EMPTY_COUNTS: u16 = 660;

/// Drive level of one wheel: direction plus duty; zero duty brakes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct WheelDrive {
    pub forward: bool,
    pub duty: u8,
}

impl WheelDrive {
    const fn forward(duty: u8) -> Self {
        Self { forward: true, duty }
    }

    const fn backward(duty: u8) -> Self {
        Self {
            forward: false,
            duty,
        }
    }

    const fn braked() -> Self {
        Self {
            forward: true,
            duty: 0,
        }
    }
}

/// Per-wheel drive levels for one motion command.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct WheelProfile {
    pub left: WheelDrive,
    pub right: WheelDrive,
}

/// Maps a motion command onto the wheel profile the H-bridge applies.
///
/// Turns pivot: the inner wheel counter-rotates so the robot can follow
/// the tight bends of the course.
#[must_use]
pub const fn wheel_profile(command: DriveCommand) -> WheelProfile {
    match command {
        DriveCommand::Forward => WheelProfile {
            left: WheelDrive::forward(DUTY_STRAIGHT),
            right: WheelDrive::forward(DUTY_STRAIGHT),
        },
        DriveCommand::Left => WheelProfile {
            left: WheelDrive::backward(DUTY_TURN_INNER),
            right: WheelDrive::forward(DUTY_TURN_OUTER),
        },
        DriveCommand::Right => WheelProfile {
            left: WheelDrive::forward(DUTY_TURN_OUTER),
            right: WheelDrive::backward(DUTY_TURN_INNER),
        },
        DriveCommand::Back => WheelProfile {
            left: WheelDrive::backward(DUTY_REVERSE),
            right: WheelDrive::backward(DUTY_REVERSE),
        },
        DriveCommand::Stop => WheelProfile {
            left: WheelDrive::braked(),
            right: WheelDrive::braked(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_brakes_both_wheels() {
        let profile = wheel_profile(DriveCommand::Stop);
        assert_eq!(profile.left.duty, 0);
        assert_eq!(profile.right.duty, 0);
    }

    #[test]
    fn turns_counter_rotate_the_inner_wheel() {
        let right = wheel_profile(DriveCommand::Right);
        assert!(right.left.forward);
        assert!(!right.right.forward);
        assert!(right.left.duty > right.right.duty);

        let left = wheel_profile(DriveCommand::Left);
        assert!(!left.left.forward);
        assert!(left.right.forward);
    }

    #[test]
    fn reverse_is_slower_than_straight() {
        let back = wheel_profile(DriveCommand::Back);
        assert!(back.left.duty < DUTY_STRAIGHT);
        assert!(!back.left.forward);
        assert!(!back.right.forward);
    }
}
