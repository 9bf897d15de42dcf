//! One emulator session: the robot core wired to the simulated track.

use std::time::Instant;

use trailbot_core::light::LedFrame;
use trailbot_core::machine::{Mode, ResetControl, RobotState};
use trailbot_core::scheduler::Millis;
use trailbot_core::steering::{DriveCommand, MotorDriver};

use crate::track::Track;

/// Holds the last motor command so the track physics can integrate it.
#[derive(Default)]
struct SimMotors {
    current: Option<DriveCommand>,
}

impl MotorDriver for SimMotors {
    fn drive(&mut self, command: DriveCommand) {
        self.current = Some(command);
    }
}

/// Records the watchdog hand-off instead of resetting anything.
#[derive(Default)]
struct SimReset {
    requested: bool,
}

impl ResetControl for SimReset {
    fn trigger_hard_reset(&mut self) {
        self.requested = true;
    }
}

pub struct Session {
    robot: RobotState,
    track: Track,
    motors: SimMotors,
    reset: SimReset,
    booted: Instant,
    last_step: Instant,
    last_led: LedFrame,
    last_mode: Mode,
}

impl Session {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            robot: RobotState::new(),
            track: Track::new(),
            motors: SimMotors::default(),
            reset: SimReset::default(),
            booted: now,
            last_step: now,
            last_led: LedFrame::OFF,
            last_mode: Mode::Waiting,
        }
    }

    /// Advances the simulation and runs one control cycle, returning the
    /// lines to print.
    pub fn cycle(&mut self, input: Option<u8>) -> Vec<String> {
        let dt = self.last_step.elapsed().as_secs_f32();
        self.last_step = Instant::now();
        if let Some(command) = self.motors.current {
            self.track.advance(dt, command);
        }

        let now = Millis::new(self.booted.elapsed().as_millis() as u32);
        let out = self.robot.cycle(
            now,
            input,
            &mut self.track,
            &mut self.motors,
            &mut self.reset,
        );

        let mut lines = Vec::new();
        if self.robot.mode != self.last_mode {
            self.last_mode = self.robot.mode;
            lines.push(format!("mode -> {:?}", self.robot.mode));
        }
        for notice in &out.notices {
            lines.push(notice.to_string());
        }
        if let Some(frame) = out.telemetry {
            lines.push(format!("ui <- {}", frame.render().trim_end()));
        }
        if let Some(frame) = out.led
            && frame != self.last_led
        {
            self.last_led = frame;
            lines.push(render_leds(frame));
        }
        lines
    }

    /// Whether the core handed the robot to the watchdog.
    pub fn reset_requested(&self) -> bool {
        self.reset.requested
    }

    /// Current operating mode, for the prompt line.
    pub fn mode(&self) -> Mode {
        self.robot.mode
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn render_leds(frame: LedFrame) -> String {
    let lamp = |bit: LedFrame| {
        if frame.bits() & bit.bits() != 0 {
            '*'
        } else {
            '.'
        }
    };
    format!(
        "leds [{} {} {}]",
        lamp(LedFrame::LEFT),
        lamp(LedFrame::CENTER),
        lamp(LedFrame::RIGHT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_session_boots_waiting() {
        let session = Session::new();
        assert_eq!(session.mode(), Mode::Waiting);
        assert!(!session.reset_requested());
    }

    #[test]
    fn reset_command_reaches_the_sim_watchdog() {
        let mut session = Session::new();
        session.cycle(Some(b'R'));
        session.cycle(None);
        assert!(session.reset_requested());
    }

    #[test]
    fn led_line_renders_lamp_states() {
        assert_eq!(render_leds(LedFrame::CENTER), "leds [. * .]");
        assert_eq!(render_leds(LedFrame::ALL), "leds [* * *]");
    }
}
