//! Single-byte serial command decoding with mode guards.
//!
//! The operator protocol is one ASCII byte per command, case-sensitive.
//! Decoding validates each byte against the current operating mode: a byte
//! can come out as an accepted request, a guard rejection worth a console
//! notice, or silence. Nothing here mutates state; the state machine
//! applies accepted requests.

use crate::machine::{Mode, TrackPosition};
use crate::steering::Direction;

/// Request decoded from one serial byte.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Request {
    /// `S` — begin the three-lap run.
    StartLaps,
    /// `X` — enter the safe state.
    Freeze,
    /// `P` — pause the run or resume it.
    TogglePause,
    /// `C` — abandon the run and drive back to the start field.
    ReturnHome,
    /// `M` — enter or leave manual drive.
    ToggleManual,
    /// `R` — hand the robot to the reset collaborator.
    Reset,
    /// `?` — render the help listing.
    Help,
    /// `Y` — a telemetry peer attached.
    AttachUi,
    /// `Q` — the telemetry peer detached.
    DetachUi,
    /// Manual-mode directional byte; one bounded movement.
    ManualPulse(Direction),
}

/// Why a structurally valid byte was refused in the current mode.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Rejection {
    /// `S` while not placed on the start field.
    NotOnStartField,
    /// `P` while neither driving nor paused.
    NotDrivingForPause,
    /// `C` while not driving laps.
    NotDrivingForHome,
    /// Anything but `X`/`R` while frozen.
    Frozen,
}

/// Outcome of feeding one byte to the decoder.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Decoded {
    /// Accepted; the state machine should apply the request.
    Accepted(Request),
    /// Refused by a mode guard; surfaced as a notice, no state change.
    Rejected(Rejection),
    /// Not a command in the current mode; dropped without comment.
    Ignored,
}

/// Decodes one command byte against the current mode and position.
#[must_use]
pub fn decode(byte: u8, mode: Mode, position: TrackPosition) -> Decoded {
    // The watchdog owns the robot once a reset is pending.
    if matches!(mode, Mode::Resetting) {
        return Decoded::Ignored;
    }

    if matches!(mode, Mode::Frozen) {
        return match byte {
            b'X' => Decoded::Ignored,
            b'R' => Decoded::Accepted(Request::Reset),
            _ => Decoded::Rejected(Rejection::Frozen),
        };
    }

    match byte {
        b'S' if position == TrackPosition::OnStartField => {
            Decoded::Accepted(Request::StartLaps)
        }
        b'S' => Decoded::Rejected(Rejection::NotOnStartField),
        b'X' => Decoded::Accepted(Request::Freeze),
        b'P' => match mode {
            Mode::Driving { .. } | Mode::Paused { .. } => {
                Decoded::Accepted(Request::TogglePause)
            }
            _ => Decoded::Rejected(Rejection::NotDrivingForPause),
        },
        b'C' => match mode {
            Mode::Driving { .. } => Decoded::Accepted(Request::ReturnHome),
            _ => Decoded::Rejected(Rejection::NotDrivingForHome),
        },
        b'M' => Decoded::Accepted(Request::ToggleManual),
        b'R' => Decoded::Accepted(Request::Reset),
        b'?' => Decoded::Accepted(Request::Help),
        b'Y' => Decoded::Accepted(Request::AttachUi),
        b'Q' => Decoded::Accepted(Request::DetachUi),
        other => decode_manual(other, mode),
    }
}

/// Directional pulse bytes, meaningful only while manual drive is active.
fn decode_manual(byte: u8, mode: Mode) -> Decoded {
    if !matches!(mode, Mode::Manual { .. }) {
        return Decoded::Ignored;
    }
    match byte {
        b'W' => Decoded::Accepted(Request::ManualPulse(Direction::Forward)),
        b'A' => Decoded::Accepted(Request::ManualPulse(Direction::Left)),
        b'D' => Decoded::Accepted(Request::ManualPulse(Direction::Right)),
        b'B' => Decoded::Accepted(Request::ManualPulse(Direction::Back)),
        _ => Decoded::Ignored,
    }
}
