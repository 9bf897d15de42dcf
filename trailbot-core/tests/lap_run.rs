//! End-to-end scenarios for the three-lap run: start-field detection, the
//! lap ladder, pause/resume, return-home, and the final hand-off to the
//! reset collaborator.

use trailbot_core::machine::{
    LapProgress, Mode, ResetControl, RobotState, TrackPosition,
};
use trailbot_core::scheduler::Millis;
use trailbot_core::sensing::{SensorSource, TriSensor};
use trailbot_core::status::Notice;
use trailbot_core::steering::{DriveCommand, MotorDriver};

struct ScriptedSensors {
    reading: TriSensor,
    battery: u8,
}

impl SensorSource for ScriptedSensors {
    fn read_tri_sensor(&mut self) -> TriSensor {
        self.reading
    }

    fn battery_percent(&mut self) -> u8 {
        self.battery
    }
}

#[derive(Default)]
struct RecordingMotors {
    commands: Vec<DriveCommand>,
}

impl MotorDriver for RecordingMotors {
    fn drive(&mut self, command: DriveCommand) {
        self.commands.push(command);
    }
}

#[derive(Default)]
struct RecordingReset {
    calls: usize,
}

impl ResetControl for RecordingReset {
    fn trigger_hard_reset(&mut self) {
        self.calls += 1;
    }
}

struct Harness {
    robot: RobotState,
    sensors: ScriptedSensors,
    motors: RecordingMotors,
    reset: RecordingReset,
    clock: u32,
}

/// Step width that makes the position-check bucket fire every cycle.
const QUALIFYING_STEP_MS: u32 = 100;
/// Step width that keeps every bucket quiet.
const QUIET_STEP_MS: u32 = 10;

impl Harness {
    fn new() -> Self {
        Self {
            robot: RobotState::new(),
            sensors: ScriptedSensors {
                reading: TriSensor::BLANK,
                battery: 90,
            },
            motors: RecordingMotors::default(),
            reset: RecordingReset::default(),
            clock: 0,
        }
    }

    fn step(&mut self, step_ms: u32, input: Option<u8>) -> trailbot_core::machine::CycleOutputs {
        self.clock += step_ms;
        self.robot.cycle(
            Millis::new(self.clock),
            input,
            &mut self.sensors,
            &mut self.motors,
            &mut self.reset,
        )
    }

    fn cycle(&mut self, input: Option<u8>) -> trailbot_core::machine::CycleOutputs {
        self.step(QUALIFYING_STEP_MS, input)
    }

    fn cycles(&mut self, count: usize) {
        for _ in 0..count {
            self.cycle(None);
        }
    }

    fn see(&mut self, reading: TriSensor) {
        self.sensors.reading = reading;
    }

    fn progress(&self) -> Option<LapProgress> {
        self.robot.mode.progress()
    }

    /// Places the robot on the start field and waits for the tracker to
    /// agree.
    fn settle_on_start_field(&mut self) {
        self.see(TriSensor::ALL);
        self.cycles(5);
        assert_eq!(self.robot.position, TrackPosition::OnStartField);
    }

    /// Drives off the field and comes back around: exactly one
    /// OnTrack-to-OnStartField edge.
    fn drive_one_circuit(&mut self) {
        self.see(TriSensor::CENTER);
        self.cycles(5);
        assert_eq!(self.robot.position, TrackPosition::OnTrack);
        self.see(TriSensor::ALL);
        self.cycles(5);
        assert_eq!(self.robot.position, TrackPosition::OnStartField);
    }
}

#[test]
fn start_field_needs_three_qualifying_ticks() {
    let mut h = Harness::new();
    h.see(TriSensor::ALL);

    // First qualifying tick still debounces the ring; the next two build
    // the streak.
    h.cycles(3);
    assert_ne!(h.robot.position, TrackPosition::OnStartField);

    h.cycles(1);
    assert_eq!(h.robot.position, TrackPosition::OnStartField);
}

#[test]
fn happy_path_reaches_lap_zero() {
    let mut h = Harness::new();
    h.settle_on_start_field();

    // Command lands between qualifying ticks: the run is armed first...
    let out = h.step(QUIET_STEP_MS, Some(b'S'));
    assert!(out.notices.is_empty());
    assert_eq!(
        h.robot.mode,
        Mode::Driving {
            progress: LapProgress::AwaitingStart
        }
    );

    // ...and the next qualifying tick crosses into the zero lap.
    let out = h.cycle(None);
    assert_eq!(h.progress(), Some(LapProgress::Lap0));
    assert!(out.notices.contains(&Notice::StartingRun));
}

#[test]
fn lap_ladder_advances_once_per_circuit() {
    let mut h = Harness::new();
    h.settle_on_start_field();
    h.cycle(Some(b'S'));
    assert_eq!(h.progress(), Some(LapProgress::Lap0));

    h.drive_one_circuit();
    assert_eq!(h.progress(), Some(LapProgress::Lap1));

    h.drive_one_circuit();
    assert_eq!(h.progress(), Some(LapProgress::Lap2));
}

#[test]
fn third_circuit_completes_the_run_and_resets() {
    let mut h = Harness::new();
    h.settle_on_start_field();
    h.cycle(Some(b'S'));

    h.drive_one_circuit();
    h.drive_one_circuit();
    h.drive_one_circuit();

    // The ladder has passed Lap3 and is parking.
    h.cycles(2);
    assert_eq!(h.robot.mode, Mode::Resetting);
    assert_eq!(h.motors.commands.last(), Some(&DriveCommand::Stop));

    // The announcement cycle has passed; the watchdog hand-off follows.
    h.cycles(1);
    assert!(h.reset.calls >= 1);
}

#[test]
fn sitting_on_the_field_advances_at_most_one_lap() {
    let mut h = Harness::new();
    h.settle_on_start_field();
    h.cycle(Some(b'S'));
    h.drive_one_circuit();
    assert_eq!(h.progress(), Some(LapProgress::Lap1));

    // Lingering on the field produces no further edges.
    h.cycles(10);
    assert_eq!(h.progress(), Some(LapProgress::Lap1));
}

#[test]
fn pause_restores_the_exact_progress() {
    let mut h = Harness::new();
    h.settle_on_start_field();
    h.cycle(Some(b'S'));
    h.drive_one_circuit();
    assert_eq!(h.progress(), Some(LapProgress::Lap1));

    h.cycle(Some(b'P'));
    assert_eq!(
        h.robot.mode,
        Mode::Paused {
            resume: LapProgress::Lap1
        }
    );

    h.cycle(Some(b'P'));
    assert_eq!(h.progress(), Some(LapProgress::Lap1));
    assert!(h.robot.mode.is_driving());
}

#[test]
fn pausing_stops_the_motors_before_anything_else() {
    let mut h = Harness::new();
    h.settle_on_start_field();
    h.cycle(Some(b'S'));
    h.see(TriSensor::CENTER);
    h.cycles(5);

    h.motors.commands.clear();
    h.cycle(Some(b'P'));

    // The stop lands and nothing drives afterwards within the cycle.
    assert_eq!(h.motors.commands, vec![DriveCommand::Stop]);
}

#[test]
fn return_home_follows_the_line_to_the_field() {
    let mut h = Harness::new();
    h.settle_on_start_field();
    h.cycle(Some(b'S'));
    h.see(TriSensor::CENTER);
    h.cycles(5);

    h.cycle(Some(b'C'));
    assert_eq!(
        h.robot.mode,
        Mode::ReturningHome {
            progress: LapProgress::ReturningToStart
        }
    );

    // Still line-following on the way back.
    assert_eq!(h.motors.commands.last(), Some(&DriveCommand::Forward));

    h.see(TriSensor::ALL);
    h.cycles(6);
    assert_eq!(h.robot.mode, Mode::Resetting);
    assert_eq!(h.motors.commands.last(), Some(&DriveCommand::Stop));
}

#[test]
fn blank_stretch_keeps_the_last_turn() {
    let mut h = Harness::new();
    h.settle_on_start_field();
    h.cycle(Some(b'S'));

    // Curve to the right, then the line vanishes for a moment.
    h.see(TriSensor::RIGHT);
    h.cycles(5);
    assert_eq!(h.motors.commands.last(), Some(&DriveCommand::Right));

    h.see(TriSensor::BLANK);
    h.cycles(5);
    assert_eq!(h.motors.commands.last(), Some(&DriveCommand::Right));
}

#[test]
fn telemetry_frames_flow_while_attached() {
    let mut h = Harness::new();
    h.settle_on_start_field();
    h.cycle(Some(b'Y'));

    let out = h.cycle(None);
    let frame = out.telemetry.expect("qualifying tick should carry a frame");
    assert_eq!(frame.mode_code, 0);
    assert!(frame.on_start_field);
    assert!(!frame.is_manual);
    assert_eq!(frame.battery_percent, 90);
    assert_eq!(frame.render().as_str(), "[(7,0,0,1,0,90)]\n");

    h.cycle(Some(b'Q'));
    let out = h.cycle(None);
    assert!(out.telemetry.is_none());
}
