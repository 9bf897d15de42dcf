//! A small closed-course model the emulator drives the core against.
//!
//! The course is a loop with a start field at its origin and gentle
//! alternating bends. The robot is reduced to two numbers: distance along
//! the loop and lateral offset from the line. Steering commands pull the
//! offset back toward zero, curvature pushes it away, and the tri-sensor
//! reading falls out of the offset geometrically.

use trailbot_core::sensing::{SensorSource, TriSensor};
use trailbot_core::steering::DriveCommand;

/// Loop length in centimeters.
const COURSE_LEN_CM: f32 = 400.0;
/// The start field covers the first stretch of the loop.
const START_FIELD_LEN_CM: f32 = 20.0;
/// Ground speed on a straight at cruise duty, cm/s.
const CRUISE_CM_S: f32 = 30.0;
/// Ground speed while pivoting, cm/s.
const TURN_ADVANCE_CM_S: f32 = 9.0;
/// Reverse speed, cm/s.
const REVERSE_CM_S: f32 = 18.0;
/// How hard a pivot pulls the robot back over the line, cm/s.
const TURN_PULL_CM_S: f32 = 4.0;
/// How hard a bend pushes the robot off the line, cm/s.
const BEND_PUSH_CM_S: f32 = 1.6;
/// Offset beyond which only an outer sensor still sees the line, cm.
const CENTER_HALF_WIDTH_CM: f32 = 0.6;
/// Offset beyond which the line is lost entirely, cm.
const CAPTURE_HALF_WIDTH_CM: f32 = 2.0;

/// Robot pose on the simulated course.
pub struct Track {
    /// Distance along the loop, wraps at [`COURSE_LEN_CM`].
    distance_cm: f32,
    /// Lateral offset: positive means the robot sits right of the line,
    /// so the line shows up under the left sensor.
    offset_cm: f32,
    battery: f32,
}

impl Track {
    /// Robot parked in the middle of the start field, on the line.
    pub fn new() -> Self {
        Self {
            distance_cm: START_FIELD_LEN_CM / 2.0,
            offset_cm: 0.0,
            battery: 100.0,
        }
    }

    /// Advances the physics by `dt` seconds under the motor command.
    pub fn advance(&mut self, dt: f32, command: DriveCommand) {
        match command {
            DriveCommand::Forward => {
                self.distance_cm += CRUISE_CM_S * dt;
                self.offset_cm += self.bend_push() * dt;
            }
            DriveCommand::Left => {
                self.distance_cm += TURN_ADVANCE_CM_S * dt;
                self.offset_cm -= TURN_PULL_CM_S * dt;
            }
            DriveCommand::Right => {
                self.distance_cm += TURN_ADVANCE_CM_S * dt;
                self.offset_cm += TURN_PULL_CM_S * dt;
            }
            DriveCommand::Back => {
                self.distance_cm -= REVERSE_CM_S * dt;
            }
            DriveCommand::Stop => {}
        }

        self.distance_cm = self.distance_cm.rem_euclid(COURSE_LEN_CM);
        self.battery = (self.battery - 0.02 * dt).max(0.0);
    }

    /// Whether the pose lies on the start field.
    pub fn on_start_field(&self) -> bool {
        self.distance_cm < START_FIELD_LEN_CM
    }

    /// Signed push the current bend applies to the offset.
    ///
    /// Alternating 50cm segments bend the other way; the start field
    /// stretch is straight.
    fn bend_push(&self) -> f32 {
        if self.on_start_field() {
            return 0.0;
        }
        let segment = (self.distance_cm / 50.0) as i32;
        if segment % 2 == 0 {
            BEND_PUSH_CM_S
        } else {
            -BEND_PUSH_CM_S
        }
    }
}

impl Default for Track {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSource for Track {
    fn read_tri_sensor(&mut self) -> TriSensor {
        if self.on_start_field() {
            return TriSensor::ALL;
        }
        let offset = self.offset_cm;
        if offset.abs() <= CENTER_HALF_WIDTH_CM {
            TriSensor::CENTER
        } else if offset > 0.0 && offset <= CAPTURE_HALF_WIDTH_CM {
            // Robot displaced right of the line: the left sensor sees it.
            TriSensor::LEFT
        } else if offset < 0.0 && offset >= -CAPTURE_HALF_WIDTH_CM {
            TriSensor::RIGHT
        } else {
            TriSensor::BLANK
        }
    }

    fn battery_percent(&mut self) -> u8 {
        self.battery as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_the_field_reading_all() {
        let mut track = Track::new();
        assert!(track.on_start_field());
        assert_eq!(track.read_tri_sensor(), TriSensor::ALL);
    }

    #[test]
    fn forward_leaves_the_field_eventually() {
        let mut track = Track::new();
        for _ in 0..100 {
            track.advance(0.02, DriveCommand::Forward);
        }
        assert!(!track.on_start_field());
    }

    #[test]
    fn displacement_maps_to_the_facing_sensor() {
        let mut track = Track::new();
        track.distance_cm = 100.0;
        track.offset_cm = 1.0;
        assert_eq!(track.read_tri_sensor(), TriSensor::LEFT);
        track.offset_cm = -1.0;
        assert_eq!(track.read_tri_sensor(), TriSensor::RIGHT);
        track.offset_cm = 0.0;
        assert_eq!(track.read_tri_sensor(), TriSensor::CENTER);
        track.offset_cm = 5.0;
        assert_eq!(track.read_tri_sensor(), TriSensor::BLANK);
    }

    #[test]
    fn a_full_loop_wraps_back_onto_the_field() {
        let mut track = Track::new();
        let mut left = false;
        let mut returned = false;
        for _ in 0..5_000 {
            track.advance(0.01, DriveCommand::Forward);
            // Keep the pose glued to the line; steering is not under test.
            track.offset_cm = 0.0;
            if track.on_start_field() {
                returned = left;
            } else {
                left = true;
            }
            if returned {
                break;
            }
        }
        assert!(left);
        assert!(returned);
    }
}
