//! ADC sampling for the optical line sensors and the battery divider.
//!
//! Each sensor channel is averaged over a handful of conversions to take
//! the edge off ADC noise before the reading even reaches the core's
//! majority filter. The battery divider is read lazily — the core only
//! asks when a telemetry frame goes out.

use embassy_stm32::adc::{Adc, AnyAdcChannel, Instance};
use trailbot_core::sensing::{SensorSource, TriSensor};

use crate::config;

/// The three line-sensor channels plus the battery divider on one ADC.
pub struct AdcSensors<'d, T: Instance> {
    adc: Adc<'d, T>,
    left: AnyAdcChannel<T>,
    center: AnyAdcChannel<T>,
    right: AnyAdcChannel<T>,
    battery: AnyAdcChannel<T>,
}

impl<'d, T: Instance> AdcSensors<'d, T> {
    /// Wires the sensor block to its ADC channels.
    pub fn new(
        adc: Adc<'d, T>,
        left: AnyAdcChannel<T>,
        center: AnyAdcChannel<T>,
        right: AnyAdcChannel<T>,
        battery: AnyAdcChannel<T>,
    ) -> Self {
        Self {
            adc,
            left,
            center,
            right,
            battery,
        }
    }

    fn read_avg(adc: &mut Adc<'d, T>, channel: &mut AnyAdcChannel<T>) -> u16 {
        let mut sum = 0u32;
        for _ in 0..config::ADC_SAMPLES {
            sum += u32::from(adc.blocking_read(channel));
        }
        u16::try_from(sum / u32::from(config::ADC_SAMPLES)).unwrap_or(u16::MAX)
    }

    fn channel_high(adc: &mut Adc<'d, T>, channel: &mut AnyAdcChannel<T>) -> bool {
        Self::read_avg(adc, channel) > config::LINE_THRESHOLD
    }
}

impl<'d, T: Instance> SensorSource for AdcSensors<'d, T> {
    fn read_tri_sensor(&mut self) -> TriSensor {
        let mut reading = TriSensor::BLANK;
        if Self::channel_high(&mut self.adc, &mut self.left) {
            reading = reading.with(TriSensor::LEFT);
        }
        if Self::channel_high(&mut self.adc, &mut self.center) {
            reading = reading.with(TriSensor::CENTER);
        }
        if Self::channel_high(&mut self.adc, &mut self.right) {
            reading = reading.with(TriSensor::RIGHT);
        }
        reading
    }

    fn battery_percent(&mut self) -> u8 {
        let counts = Self::read_avg(&mut self.adc, &mut self.battery);
        let clamped = counts.clamp(config::BATTERY_EMPTY_COUNTS, config::BATTERY_FULL_COUNTS);
        let span = u32::from(config::BATTERY_FULL_COUNTS - config::BATTERY_EMPTY_COUNTS);
        let above = u32::from(clamped - config::BATTERY_EMPTY_COUNTS);
        u8::try_from(above * 100 / span).unwrap_or(100)
    }
}
