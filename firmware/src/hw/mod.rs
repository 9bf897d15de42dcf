//! Hardware bindings for the robot peripherals.
//!
//! Every module here implements one of the core's collaborator traits on
//! top of the actual MCU peripherals; nothing above this layer touches a
//! register.

pub mod clock;
pub mod leds;
pub mod motors;
pub mod reset;
pub mod sensors;
