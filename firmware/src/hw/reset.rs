//! The watchdog-backed reset collaborator.
//!
//! A reset is not performed directly: the independent watchdog is started
//! and then deliberately starved, which yields a clean full-chip reset a
//! moment later. The call never returns.

use embassy_stm32::peripherals::IWDG;
use embassy_stm32::wdg::IndependentWatchdog;
use trailbot_core::machine::ResetControl;

/// Watchdog timeout before the chip resets.
const RESET_DELAY_US: u32 = 5_000_000;

/// Holds the watchdog until the core asks for the hand-off.
pub struct WatchdogReset<'d> {
    watchdog: IndependentWatchdog<'d, IWDG>,
}

impl<'d> WatchdogReset<'d> {
    /// Prepares (but does not start) the watchdog.
    pub fn new(watchdog: embassy_stm32::Peri<'d, IWDG>) -> Self {
        Self {
            watchdog: IndependentWatchdog::new(watchdog, RESET_DELAY_US),
        }
    }
}

impl<'d> ResetControl for WatchdogReset<'d> {
    fn trigger_hard_reset(&mut self) {
        defmt::warn!("starving the watchdog, reset imminent");
        self.watchdog.unleash();
        loop {
            cortex_m::asm::nop();
        }
    }
}
