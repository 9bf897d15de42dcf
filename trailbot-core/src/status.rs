//! Typed notices surfaced to the serial console.
//!
//! The decision logic never formats text; it pushes [`Notice`] values and
//! the presentation side (firmware console, emulator, desktop UI) renders
//! them. `Display` gives the canonical wording so every front-end prints
//! the same thing.

use core::fmt;

/// Inputs that shape the help listing.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HelpContext {
    /// Whether the robot currently sits on the start field.
    pub on_start_field: bool,
    /// Whether a lap run has been started since the last reset. Once it
    /// has, the long listing is withheld.
    pub has_driven_once: bool,
}

/// One console-worthy event produced by a control cycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Notice {
    /// Idle on the start field, ready for instructions.
    WaitingOnStartField,
    /// Idle but not placed on the start field yet.
    WaitingOffStartField,
    /// Periodic round announcement while driving (1-based).
    RoundStatus(u8),
    /// Crossing the start line for the first time.
    StartingRun,
    /// A round was completed (1-based).
    RoundDone(u8),
    /// The third round was completed.
    RunComplete,
    /// Paused, waiting for the resume command.
    PausedStatus,
    /// Frozen in the safe state.
    FrozenStatus,
    /// Following the line back to the start field.
    ReturningHomeStatus,
    /// Reset accepted; the watchdog takes over shortly.
    ResetPending,
    /// The start field was recognized under the robot.
    StartFieldFound,
    /// The start field slipped away under the robot.
    StartFieldLost,
    /// `S` received while not on the start field.
    RejectedStartNotOnField,
    /// `P` received while neither driving nor paused.
    RejectedPauseNotDriving,
    /// `C` received while not driving laps.
    RejectedHomeNotDriving,
    /// Any byte other than `X`/`R` received while frozen.
    RejectedFrozen,
    /// `?` received; render the help listing.
    Help(HelpContext),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingOnStartField => {
                f.write_str("On the start field, waiting for instructions. Send ? for help.")
            }
            Self::WaitingOffStartField => {
                f.write_str("Not on the start field yet, please place me there. Send ? for help.")
            }
            Self::RoundStatus(round) => write!(f, "Lap {round} of 3 underway"),
            Self::StartingRun => f.write_str("Crossing the start line, lap 1 begins"),
            Self::RoundDone(round) => write!(f, "Lap {round} done, {} to go", 3 - round),
            Self::RunComplete => f.write_str("All three laps done, heading back to park"),
            Self::PausedStatus => f.write_str("Paused. Send P again to resume."),
            Self::FrozenStatus => {
                f.write_str("Safe state engaged, ignoring everything until a reset")
            }
            Self::ReturningHomeStatus => {
                f.write_str("Returning to the start field, will reset there")
            }
            Self::ResetPending => f.write_str("Resetting shortly, hold on..."),
            Self::StartFieldFound => f.write_str("Start field detected"),
            Self::StartFieldLost => f.write_str("Start field left behind"),
            Self::RejectedStartNotOnField => {
                f.write_str("Can't start a run while off the start field")
            }
            Self::RejectedPauseNotDriving => f.write_str("Nothing to pause, not driving laps"),
            Self::RejectedHomeNotDriving => {
                f.write_str("Can't be called home, not driving laps")
            }
            Self::RejectedFrozen => f.write_str("Frozen. Only R gets me out of here."),
            Self::Help(context) => write_help(f, *context),
        }
    }
}

fn write_help(f: &mut fmt::Formatter<'_>, context: HelpContext) -> fmt::Result {
    if context.has_driven_once {
        return f.write_str("Already out on the track, no help listing until the next reset.");
    }
    if context.on_start_field {
        f.write_str("On the start field, the full command set is available:\n")?;
        f.write_str(" - S: drive 3 laps\n")?;
        f.write_str(" - P: pause/resume\n")?;
        f.write_str(" - C: come home\n")?;
    } else {
        f.write_str("Off the start field, these commands are available:\n")?;
    }
    f.write_str(" - X: safe state (freeze)\n")?;
    f.write_str(" - R: reset\n")?;
    f.write_str(" - ?: this listing\n")?;
    f.write_str(" - M: manual drive on/off\n")?;
    f.write_str(" -- W: pulse forward\n")?;
    f.write_str(" -- A: pulse left\n")?;
    f.write_str(" -- D: pulse right\n")?;
    f.write_str(" -- B: pulse backward")
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::format;
    use std::string::String;

    use super::*;

    #[test]
    fn help_is_withheld_after_the_first_run() {
        let text = format!(
            "{}",
            Notice::Help(HelpContext {
                on_start_field: true,
                has_driven_once: true,
            })
        );
        assert!(text.contains("no help listing"));
        assert!(!text.contains("- S:"));
    }

    #[test]
    fn help_lists_start_commands_only_on_the_field() {
        let on_field: String = format!(
            "{}",
            Notice::Help(HelpContext {
                on_start_field: true,
                has_driven_once: false,
            })
        );
        assert!(on_field.contains("- S: drive 3 laps"));
        assert!(on_field.contains("- X: safe state"));

        let off_field: String = format!(
            "{}",
            Notice::Help(HelpContext {
                on_start_field: false,
                has_driven_once: false,
            })
        );
        assert!(!off_field.contains("- S: drive 3 laps"));
        assert!(off_field.contains("- X: safe state"));
    }

    #[test]
    fn round_notices_name_the_round() {
        assert_eq!(format!("{}", Notice::RoundStatus(2)), "Lap 2 of 3 underway");
        assert_eq!(format!("{}", Notice::RoundDone(1)), "Lap 1 done, 2 to go");
    }
}
