//! Telemetry frames streamed to an attached desktop UI.
//!
//! While a peer is attached (the `Y` command) the control loop emits one
//! frame per position-check tick. The wire format is a bracketed tuple of
//! small integers so the UI side can parse it with a single split; the
//! numeric codes are part of the protocol and must stay stable.

use core::fmt::Write as _;

use heapless::String;

use crate::sensing::TriSensor;
use crate::steering::Direction;

/// Rendered telemetry line, `\n`-terminated.
pub type TelemetryLine = String<32>;

/// Snapshot of the state the UI renders.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TelemetryFrame {
    /// Debounced sensor vector.
    pub sensor: TriSensor,
    /// Last driven direction.
    pub direction: Direction,
    /// Operating-mode wire code.
    pub mode_code: u8,
    /// Whether the robot sits on the start field.
    pub on_start_field: bool,
    /// Whether manual drive is active.
    pub is_manual: bool,
    /// Battery charge estimate in percent.
    pub battery_percent: u8,
}

impl TelemetryFrame {
    /// Renders the bracketed tuple line the UI parses.
    ///
    /// The widest frame (`[(7,4,6,1,1,100)]` plus newline) is 18 bytes, so
    /// the line buffer cannot overflow.
    #[must_use]
    pub fn render(&self) -> TelemetryLine {
        let mut line = TelemetryLine::new();
        let _ = write!(
            line,
            "[({},{},{},{},{},{})]\n",
            self.sensor.bits(),
            self.direction.wire_code(),
            self.mode_code,
            u8::from(self.on_start_field),
            u8::from(self.is_manual),
            self.battery_percent,
        );
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_renders_the_wire_tuple() {
        let frame = TelemetryFrame {
            sensor: TriSensor::CENTER,
            direction: Direction::Forward,
            mode_code: 1,
            on_start_field: false,
            is_manual: false,
            battery_percent: 87,
        };
        assert_eq!(frame.render().as_str(), "[(2,1,1,0,0,87)]\n");
    }

    #[test]
    fn widest_frame_fits_the_line_buffer() {
        let frame = TelemetryFrame {
            sensor: TriSensor::ALL,
            direction: Direction::Back,
            mode_code: 6,
            on_start_field: true,
            is_manual: true,
            battery_percent: 100,
        };
        assert_eq!(frame.render().as_str(), "[(7,4,6,1,1,100)]\n");
    }
}
