//! Steering decisions derived from the debounced sensor vector.
//!
//! Resolution is deliberately forgiving: the line disappearing for a few
//! samples (a junction, a gap in the tape) must not stop the robot or send
//! it wandering. The resolver keeps two memories for that case — the last
//! non-blank direction and the last turn — and coasts on them until the
//! line comes back.

use crate::sensing::TriSensor;

/// Steering direction resolved from the line sensors.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Direction {
    /// No line seen and no usable memory.
    #[default]
    None,
    Forward,
    Right,
    Left,
    Back,
}

impl Direction {
    /// Wire code used by the telemetry protocol.
    #[must_use]
    pub const fn wire_code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Forward => 1,
            Self::Right => 2,
            Self::Left => 3,
            Self::Back => 4,
        }
    }

    /// Whether this is a Left/Right turn.
    #[must_use]
    pub const fn is_turn(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Motion command handed to the drive collaborator.
///
/// How a command maps onto wheel speeds (outer/inner wheel split for
/// turns, smooth reverse) is the driver's tuning concern, not a decision
/// made here.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DriveCommand {
    Forward,
    Left,
    Right,
    Back,
    Stop,
}

impl DriveCommand {
    /// Maps a resolved steering direction onto a motion command, if the
    /// direction calls for movement at all.
    #[must_use]
    pub const fn from_direction(direction: Direction) -> Option<Self> {
        match direction {
            Direction::None => None,
            Direction::Forward => Some(Self::Forward),
            Direction::Right => Some(Self::Right),
            Direction::Left => Some(Self::Left),
            Direction::Back => Some(Self::Back),
        }
    }
}

/// Abstraction over the physical drive train.
pub trait MotorDriver {
    /// Applies the requested motion; it holds until the next command.
    fn drive(&mut self, command: DriveCommand);
}

/// Motor driver that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopMotorDriver;

impl NoopMotorDriver {
    /// Creates a new no-op motor driver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MotorDriver for NoopMotorDriver {
    fn drive(&mut self, _: DriveCommand) {}
}

/// Direction resolution with short-term memory for sensor dropouts.
#[derive(Copy, Clone, Debug, Default)]
pub struct DirectionResolver {
    last_direction: Direction,
    last_turn: Direction,
}

impl DirectionResolver {
    /// Creates a resolver with empty memories.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_direction: Direction::None,
            last_turn: Direction::None,
        }
    }

    /// Most recent non-blank resolved direction.
    #[must_use]
    pub const fn last_direction(&self) -> Direction {
        self.last_direction
    }

    /// Most recent Left/Right resolution — the fallback used when the
    /// sensors go fully blank.
    #[must_use]
    pub const fn last_turn(&self) -> Direction {
        self.last_turn
    }

    /// Resolves a debounced vector into a steering direction.
    ///
    /// Center plus agreeing outer sensors reads as Forward; otherwise an
    /// outer sensor wins, Right before Left. A blank vector falls back to
    /// the remembered turn so a brief gap continues the turn in progress,
    /// and holds the previous direction when no turn is remembered. The
    /// all-active start-field signature is the caller's concern and must
    /// not be passed here.
    pub fn resolve(&mut self, debounced: TriSensor) -> Direction {
        if debounced.is_blank() {
            return if self.last_turn.is_turn() {
                self.last_turn
            } else {
                self.last_direction
            };
        }

        let left = debounced.contains(TriSensor::LEFT);
        let right = debounced.contains(TriSensor::RIGHT);
        let resolved = if debounced.contains(TriSensor::CENTER) && left == right {
            Direction::Forward
        } else if right {
            Direction::Right
        } else {
            Direction::Left
        };

        self.last_direction = resolved;
        if resolved.is_turn() {
            self.last_turn = resolved;
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_alone_reads_forward() {
        let mut resolver = DirectionResolver::new();
        assert_eq!(resolver.resolve(TriSensor::CENTER), Direction::Forward);
    }

    #[test]
    fn all_outer_sensors_active_is_the_field_signature() {
        // Center plus both outers is exactly the start-field signature the
        // position tracker consumes; the resolver never sees it.
        let wide = TriSensor::LEFT
            .with(TriSensor::CENTER)
            .with(TriSensor::RIGHT);
        assert_eq!(wide, TriSensor::ALL);
    }

    #[test]
    fn outer_sensor_wins_over_center() {
        let mut resolver = DirectionResolver::new();
        assert_eq!(
            resolver.resolve(TriSensor::CENTER.with(TriSensor::RIGHT)),
            Direction::Right
        );
        assert_eq!(
            resolver.resolve(TriSensor::CENTER.with(TriSensor::LEFT)),
            Direction::Left
        );
    }

    #[test]
    fn blank_falls_back_to_last_turn() {
        let mut resolver = DirectionResolver::new();
        assert_eq!(resolver.resolve(TriSensor::LEFT), Direction::Left);
        assert_eq!(resolver.resolve(TriSensor::BLANK), Direction::Left);
        assert_eq!(resolver.last_turn(), Direction::Left);
    }

    #[test]
    fn blank_without_turn_memory_holds_previous() {
        let mut resolver = DirectionResolver::new();
        assert_eq!(resolver.resolve(TriSensor::CENTER), Direction::Forward);
        assert_eq!(resolver.resolve(TriSensor::BLANK), Direction::Forward);
    }

    #[test]
    fn blank_resolution_leaves_memories_alone() {
        let mut resolver = DirectionResolver::new();
        resolver.resolve(TriSensor::RIGHT);
        resolver.resolve(TriSensor::CENTER);
        resolver.resolve(TriSensor::BLANK);

        assert_eq!(resolver.last_direction(), Direction::Forward);
        assert_eq!(resolver.last_turn(), Direction::Right);
    }

    #[test]
    fn blank_with_no_memory_reads_none() {
        let mut resolver = DirectionResolver::new();
        assert_eq!(resolver.resolve(TriSensor::BLANK), Direction::None);
    }
}
