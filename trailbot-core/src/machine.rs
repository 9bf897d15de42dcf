//! The hierarchical operating-mode state machine and the control cycle.
//!
//! Everything the robot is allowed to do funnels through here. The outer
//! [`Mode`] governs which commands apply and which sub-loop runs; the inner
//! [`LapProgress`] ladder only exists while a mode variant carries it, so a
//! lap count outside a driving mode is unrepresentable. One call to
//! [`RobotState::cycle`] consumes the scheduler flags, the pending command
//! byte, and a fresh sensor sample, then emits motor commands through the
//! drive collaborator and everything display-worthy as data.

use heapless::Vec;

use crate::command::{self, Decoded, Request};
use crate::light::{self, LedFrame, LightState};
use crate::scheduler::{Bucket, CounterBank, Millis};
use crate::sensing::{SensorSource, SensorWindow, TriSensor};
use crate::status::{HelpContext, Notice};
use crate::steering::{Direction, DirectionResolver, DriveCommand, MotorDriver};
use crate::telemetry::TelemetryFrame;

/// Qualifying position-check ticks the all-active signature must hold
/// before the robot believes it sits on the start field.
pub const HOME_STREAK_CAP: u8 = 3;

/// Upper bound on notices a single cycle can produce.
pub const MAX_NOTICES: usize = 6;

/// Progress through the three-lap run.
///
/// `Lap0` is the zero state entered while still standing on the start
/// field; it keeps "arrived at start" and "completed a lap" one tick
/// apart so the lap count cannot be off by one.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum LapProgress {
    /// Driving has not been selected yet.
    #[default]
    NotStarted,
    /// Run selected, waiting for the position tracker to confirm the
    /// start field.
    AwaitingStart,
    /// On the start field, about to cross the line into lap one.
    Lap0,
    /// Lap one finished, lap two underway.
    Lap1,
    /// Lap two finished, lap three underway.
    Lap2,
    /// All three laps finished.
    Lap3,
    /// Reversing until the start field is under the robot again.
    ReturningToStart,
    /// Parked; hand over to the reset collaborator.
    Finished,
}

impl LapProgress {
    /// 1-based number of the lap currently underway, if one is.
    #[must_use]
    pub const fn round_number(self) -> Option<u8> {
        match self {
            Self::Lap0 => Some(1),
            Self::Lap1 => Some(2),
            Self::Lap2 => Some(3),
            _ => None,
        }
    }
}

/// Position on the field, derived from the debounced sensors.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum TrackPosition {
    /// Not driving and not confirmed on the start field.
    #[default]
    Unknown,
    /// The all-active signature has held for the full streak.
    OnStartField,
    /// Driving laps somewhere on the track.
    OnTrack,
}

/// Outer operating mode.
///
/// Inner state rides inside the variants that need it: the lap ladder
/// under `Driving`/`ReturningHome`, the saved progress under `Paused`,
/// the pending pulse under `Manual`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    /// Idle, listening for instructions.
    Waiting,
    /// Driving the three-lap run.
    Driving {
        /// Ladder state for the run.
        progress: LapProgress,
    },
    /// Run suspended; `resume` restores the exact ladder state.
    Paused {
        /// Progress to restore when the run resumes.
        resume: LapProgress,
    },
    /// Safe state: only `X` (no-op) and `R` are heard.
    Frozen,
    /// Following the line back to the start field, then resetting.
    ReturningHome {
        /// `ReturningToStart` until the field is reached, then `Finished`.
        progress: LapProgress,
    },
    /// Operator-driven single pulses over serial.
    Manual {
        /// Direction staged by the last pulse byte, if any.
        pending: Option<Direction>,
        /// Whether the previous pulse tick drove (the next one stops).
        drove_last_pulse: bool,
    },
    /// Terminal: the reset collaborator owns the robot now.
    Resetting,
}

impl Mode {
    /// Fresh manual mode with nothing staged.
    #[must_use]
    pub const fn manual() -> Self {
        Self::Manual {
            pending: None,
            drove_last_pulse: false,
        }
    }

    /// Wire code for the telemetry protocol.
    #[must_use]
    pub const fn wire_code(self) -> u8 {
        match self {
            Self::Waiting => 0,
            Self::Driving { .. } => 1,
            Self::Resetting => 2,
            Self::Paused { .. } => 3,
            Self::Frozen => 4,
            Self::ReturningHome { .. } => 5,
            Self::Manual { .. } => 6,
        }
    }

    /// Whether the robot is driving the lap run right now.
    #[must_use]
    pub const fn is_driving(self) -> bool {
        matches!(self, Self::Driving { .. })
    }

    /// Whether manual drive is active.
    #[must_use]
    pub const fn is_manual(self) -> bool {
        matches!(self, Self::Manual { .. })
    }

    /// Ladder state, present only while a driving mode carries one.
    #[must_use]
    pub const fn progress(self) -> Option<LapProgress> {
        match self {
            Self::Driving { progress } | Self::ReturningHome { progress } => Some(progress),
            _ => None,
        }
    }
}

/// Capability that hands the robot to the watchdog.
///
/// On hardware the call starves the watchdog and never returns; test
/// doubles and the emulator record it instead. The control cycle keeps
/// invoking it while the mode stays `Resetting`, so a double that returns
/// sees the call repeated.
pub trait ResetControl {
    /// Requests a full hardware reset.
    fn trigger_hard_reset(&mut self);
}

/// Reset control that does nothing; useful for tools.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopResetControl;

impl NoopResetControl {
    /// Creates a new no-op reset control.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ResetControl for NoopResetControl {
    fn trigger_hard_reset(&mut self) {}
}

/// Effects produced by one control cycle, for the runtime to render.
#[derive(Clone, Debug, Default)]
pub struct CycleOutputs {
    /// Console-worthy events, oldest first.
    pub notices: Vec<Notice, MAX_NOTICES>,
    /// Telemetry frame due this cycle (only while a peer is attached).
    pub telemetry: Option<TelemetryFrame>,
    /// LED frame due this cycle.
    pub led: Option<LedFrame>,
}

impl CycleOutputs {
    /// The buffer bounds a single cycle's worth of notices; rendering is
    /// cosmetic, so an overflowing notice is dropped rather than treated
    /// as an error.
    fn note(&mut self, notice: Notice) {
        let _ = self.notices.push(notice);
    }
}

/// The single mutable aggregate driving all behavior.
///
/// Created once at boot, owned exclusively by the control loop, mutated
/// only by [`RobotState::cycle`]. A hardware reset recreates it wholesale.
#[derive(Debug)]
pub struct RobotState {
    /// Outer operating mode, including any inner state it carries.
    pub mode: Mode,
    /// Position derived by the tracker, not an authoritative input.
    pub position: TrackPosition,
    /// Position recorded on the previous qualifying position-check tick.
    pub last_position: TrackPosition,
    /// Debounced sensor vector of this cycle.
    pub sensor_now: TriSensor,
    /// Debounced sensor vector of the previous cycle.
    pub sensor_prev: TriSensor,
    /// Raw-sample ring feeding the debouncer.
    pub window: SensorWindow,
    /// Steering resolution and its dropout memories.
    pub resolver: DirectionResolver,
    /// Consecutive qualifying ticks of the all-active signature.
    pub home_streak: u8,
    /// Sticky: a lap run has been started since boot.
    pub has_driven_once: bool,
    /// Whether a telemetry peer is attached.
    pub ui_connected: bool,
    /// Chase/blink animation phase.
    pub light: LightState,
    /// The fixed frequency-counter bank.
    pub counters: CounterBank,
}

impl RobotState {
    /// Boot state: waiting, position unknown, counters idle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: Mode::Waiting,
            position: TrackPosition::Unknown,
            last_position: TrackPosition::Unknown,
            sensor_now: TriSensor::BLANK,
            sensor_prev: TriSensor::BLANK,
            window: SensorWindow::new(),
            resolver: DirectionResolver::new(),
            home_streak: 0,
            has_driven_once: false,
            ui_connected: false,
            light: LightState::new(),
            counters: CounterBank::new(),
        }
    }

    /// Runs one control cycle.
    ///
    /// Order matters: the scheduler flags are recomputed first so every
    /// consumer sees this cycle's flags; the command byte is applied before
    /// the mode logic so a mode change governs the rest of the cycle; the
    /// position tracker runs before the lap ladder that feeds on it.
    pub fn cycle<S, M, R>(
        &mut self,
        now: Millis,
        input: Option<u8>,
        sensors: &mut S,
        motors: &mut M,
        reset: &mut R,
    ) -> CycleOutputs
    where
        S: SensorSource,
        M: MotorDriver,
        R: ResetControl,
    {
        let mut out = CycleOutputs::default();
        let entry_mode = self.mode;

        self.counters.tick(now);

        if let Some(byte) = input {
            self.apply_input(byte, &mut out, motors);
        }

        self.sensor_prev = self.sensor_now;
        self.sensor_now = self.window.push(sensors.read_tri_sensor());

        self.update_position(&mut out);
        self.run_mode(entry_mode, &mut out, motors, reset);
        self.emit_status(&mut out);
        self.emit_telemetry(&mut out, sensors);

        out
    }

    fn apply_input<M: MotorDriver>(&mut self, byte: u8, out: &mut CycleOutputs, motors: &mut M) {
        match command::decode(byte, self.mode, self.position) {
            Decoded::Accepted(request) => self.apply_request(request, out, motors),
            Decoded::Rejected(rejection) => out.note(Notice::from(rejection)),
            Decoded::Ignored => {}
        }
    }

    fn apply_request<M: MotorDriver>(
        &mut self,
        request: Request,
        out: &mut CycleOutputs,
        motors: &mut M,
    ) {
        match request {
            Request::StartLaps => {
                // A run already underway (or merely paused) is left alone.
                if !matches!(self.mode, Mode::Driving { .. } | Mode::Paused { .. }) {
                    self.transition(
                        Mode::Driving {
                            progress: LapProgress::AwaitingStart,
                        },
                        out,
                        motors,
                    );
                }
            }
            Request::Freeze => self.transition(Mode::Frozen, out, motors),
            Request::TogglePause => match self.mode {
                Mode::Driving { progress } => {
                    self.transition(Mode::Paused { resume: progress }, out, motors);
                }
                Mode::Paused { resume } => {
                    self.transition(Mode::Driving { progress: resume }, out, motors);
                }
                _ => {}
            },
            Request::ReturnHome => {
                if self.mode.is_driving() {
                    self.transition(
                        Mode::ReturningHome {
                            progress: LapProgress::ReturningToStart,
                        },
                        out,
                        motors,
                    );
                }
            }
            Request::ToggleManual => {
                let next = if self.mode.is_manual() {
                    Mode::Waiting
                } else {
                    Mode::manual()
                };
                self.transition(next, out, motors);
            }
            Request::Reset => self.transition(Mode::Resetting, out, motors),
            Request::Help => out.note(Notice::Help(HelpContext {
                on_start_field: self.position == TrackPosition::OnStartField,
                has_driven_once: self.has_driven_once,
            })),
            Request::AttachUi => self.ui_connected = true,
            Request::DetachUi => self.ui_connected = false,
            Request::ManualPulse(direction) => {
                if let Mode::Manual { pending, .. } = &mut self.mode {
                    *pending = Some(direction);
                }
            }
        }
    }

    /// Switches the outer mode and applies the transition side effects.
    fn transition<M: MotorDriver>(&mut self, next: Mode, out: &mut CycleOutputs, motors: &mut M) {
        if self.mode == next {
            return;
        }

        // Stop the drive train before the new mode's logic runs so a stale
        // motor command cannot leak one cycle.
        if self.mode.is_driving() && !next.is_driving() {
            motors.drive(DriveCommand::Stop);
        }

        self.mode = next;
        match next {
            Mode::Waiting | Mode::Frozen | Mode::Paused { .. } => self.light.reset(),
            Mode::Driving { .. } => self.has_driven_once = true,
            Mode::Resetting => out.note(Notice::ResetPending),
            _ => {}
        }
    }

    /// Derives the field position on the position-check bucket.
    fn update_position(&mut self, out: &mut CycleOutputs) {
        if !self.counters.is_due(Bucket::TwelveHz) {
            return;
        }
        self.last_position = self.position;

        if self.sensor_now == TriSensor::ALL {
            if self.home_streak < HOME_STREAK_CAP {
                self.home_streak += 1;
            }
            if self.home_streak >= HOME_STREAK_CAP {
                if self.position != TrackPosition::OnStartField {
                    out.note(Notice::StartFieldFound);
                }
                self.position = TrackPosition::OnStartField;
            }
            return;
        }

        self.home_streak = 0;
        if self.mode.is_driving() {
            if self.position == TrackPosition::OnStartField {
                out.note(Notice::StartFieldLost);
            }
            self.position = TrackPosition::OnTrack;
        } else {
            self.position = TrackPosition::Unknown;
        }
    }

    fn run_mode<M: MotorDriver, R: ResetControl>(
        &mut self,
        entry_mode: Mode,
        out: &mut CycleOutputs,
        motors: &mut M,
        reset: &mut R,
    ) {
        match self.mode {
            Mode::Waiting | Mode::Frozen | Mode::Paused { .. } => {}
            Mode::Driving { .. } => self.run_laps(out, motors),
            Mode::ReturningHome { .. } => self.run_home(out, motors),
            Mode::Manual { .. } => self.run_manual(motors),
            Mode::Resetting => {
                // The cycle that announced the reset still gets rendered;
                // the hand-off happens from the next cycle on.
                if matches!(entry_mode, Mode::Resetting) {
                    reset.trigger_hard_reset();
                }
            }
        }
    }

    fn run_laps<M: MotorDriver>(&mut self, out: &mut CycleOutputs, motors: &mut M) {
        // Ladder evaluation is bounded to the position-check bucket so one
        // noisy pass over the field cannot register several completions.
        if self.counters.is_due(Bucket::TwelveHz) {
            self.advance_ladder(out);
        }

        let Mode::Driving { progress } = self.mode else {
            return;
        };
        match progress {
            LapProgress::Lap0 | LapProgress::Lap1 | LapProgress::Lap2 | LapProgress::Lap3 => {
                self.follow_line(motors);
            }
            LapProgress::ReturningToStart => motors.drive(DriveCommand::Back),
            LapProgress::Finished => {
                motors.drive(DriveCommand::Stop);
                self.transition(Mode::Resetting, out, motors);
            }
            LapProgress::NotStarted | LapProgress::AwaitingStart => {}
        }
    }

    /// One ladder step per qualifying tick, edge-triggered on the position
    /// recorded at the previous qualifying tick.
    fn advance_ladder(&mut self, out: &mut CycleOutputs) {
        let Mode::Driving { progress } = self.mode else {
            return;
        };
        let on_field = self.position == TrackPosition::OnStartField;
        let (next, notice) = match progress {
            LapProgress::AwaitingStart if on_field => {
                (LapProgress::Lap0, Some(Notice::StartingRun))
            }
            LapProgress::Lap0 if self.crossed_start_line() => {
                (LapProgress::Lap1, Some(Notice::RoundDone(1)))
            }
            LapProgress::Lap1 if self.crossed_start_line() => {
                (LapProgress::Lap2, Some(Notice::RoundDone(2)))
            }
            LapProgress::Lap2 if self.crossed_start_line() => {
                (LapProgress::Lap3, Some(Notice::RunComplete))
            }
            LapProgress::Lap3 => (LapProgress::ReturningToStart, None),
            LapProgress::ReturningToStart if on_field => (LapProgress::Finished, None),
            _ => return,
        };
        self.set_progress(next);
        if let Some(notice) = notice {
            out.note(notice);
        }
    }

    fn run_home<M: MotorDriver>(&mut self, out: &mut CycleOutputs, motors: &mut M) {
        if self.counters.is_due(Bucket::TwelveHz)
            && self.position == TrackPosition::OnStartField
        {
            self.set_progress(LapProgress::Finished);
        }

        let Mode::ReturningHome { progress } = self.mode else {
            return;
        };
        if progress == LapProgress::Finished {
            motors.drive(DriveCommand::Stop);
            self.transition(Mode::Resetting, out, motors);
        } else {
            self.follow_line(motors);
        }
    }

    /// One keypress, one bounded movement: drive on one pulse tick, stop
    /// on the next.
    fn run_manual<M: MotorDriver>(&mut self, motors: &mut M) {
        if !self.counters.is_due(Bucket::TwoHz) {
            return;
        }
        let Mode::Manual {
            pending,
            drove_last_pulse,
        } = &mut self.mode
        else {
            return;
        };

        if *drove_last_pulse {
            motors.drive(DriveCommand::Stop);
            *drove_last_pulse = false;
            *pending = None;
        } else if let Some(direction) = *pending
            && let Some(pulse) = DriveCommand::from_direction(direction)
        {
            motors.drive(pulse);
            *drove_last_pulse = true;
        }
    }

    /// Line-following drive step shared by the lap run and the homeward
    /// leg.
    fn follow_line<M: MotorDriver>(&mut self, motors: &mut M) {
        if self.sensor_now == TriSensor::ALL {
            // Crossing the home field. The signature belongs to the
            // position tracker, so hold course and leave the steering
            // memories alone.
            motors.drive(DriveCommand::Forward);
            return;
        }
        let direction = self.resolver.resolve(self.sensor_now);
        if let Some(pulse) = DriveCommand::from_direction(direction) {
            motors.drive(pulse);
        }
    }

    fn emit_status(&mut self, out: &mut CycleOutputs) {
        let one_hz = self.counters.is_due(Bucket::OneHz);
        match self.mode {
            Mode::Driving { progress } => {
                if one_hz && let Some(round) = progress.round_number() {
                    out.note(Notice::RoundStatus(round));
                }
                out.led = Some(light::mirror(self.sensor_now));
            }
            Mode::Waiting => {
                if self.position == TrackPosition::OnStartField {
                    if one_hz {
                        out.note(Notice::WaitingOnStartField);
                    }
                    if self.counters.is_due(Bucket::TwoHz) {
                        out.led = Some(self.light.blink());
                    }
                } else {
                    if one_hz {
                        out.note(Notice::WaitingOffStartField);
                    }
                    out.led = Some(light::mirror(self.sensor_now));
                }
            }
            Mode::Paused { .. } => {
                if one_hz {
                    out.note(Notice::PausedStatus);
                }
                if self.counters.is_due(Bucket::TwoHz) {
                    out.led = Some(self.light.chase());
                }
            }
            Mode::Frozen => {
                if one_hz {
                    out.note(Notice::FrozenStatus);
                }
                if self.counters.is_due(Bucket::ThirtyTwoHz) {
                    out.led = Some(self.light.chase());
                }
            }
            Mode::ReturningHome { .. } => {
                if one_hz {
                    out.note(Notice::ReturningHomeStatus);
                }
            }
            Mode::Manual { .. } => {
                out.led = Some(light::mirror(self.sensor_now));
            }
            Mode::Resetting => {}
        }
    }

    fn emit_telemetry<S: SensorSource>(&mut self, out: &mut CycleOutputs, sensors: &mut S) {
        if !self.ui_connected || !self.counters.is_due(Bucket::TwelveHz) {
            return;
        }
        out.telemetry = Some(TelemetryFrame {
            sensor: self.sensor_now,
            direction: self.resolver.last_direction(),
            mode_code: self.mode.wire_code(),
            on_start_field: self.position == TrackPosition::OnStartField,
            is_manual: self.mode.is_manual(),
            battery_percent: sensors.battery_percent(),
        });
    }

    fn crossed_start_line(&self) -> bool {
        self.last_position == TrackPosition::OnTrack
            && self.position == TrackPosition::OnStartField
    }

    fn set_progress(&mut self, next: LapProgress) {
        if let Mode::Driving { progress } | Mode::ReturningHome { progress } = &mut self.mode {
            *progress = next;
        }
    }
}

impl Default for RobotState {
    fn default() -> Self {
        Self::new()
    }
}

impl From<command::Rejection> for Notice {
    fn from(rejection: command::Rejection) -> Self {
        match rejection {
            command::Rejection::NotOnStartField => Self::RejectedStartNotOnField,
            command::Rejection::NotDrivingForPause => Self::RejectedPauseNotDriving,
            command::Rejection::NotDrivingForHome => Self::RejectedHomeNotDriving,
            command::Rejection::Frozen => Self::RejectedFrozen,
        }
    }
}
