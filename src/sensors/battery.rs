//! Battery voltage via a switched resistor divider.
//!
//! The divider is only connected while sampling so it does not drain the
//! pack between cycles.  Ten raw ADC samples are averaged and scaled:
//!
//! ```text
//!   mV = avg × 3600 / 4095 × 1.529411765
//! ```
//!
//! 3600 mV is the ADC full scale at 12 dB attenuation; 1.5294 is the
//! divider ratio (680k / 1.04M).

use embedded_hal::digital::OutputPin;
use log::{debug, warn};

use crate::error::SensorError;

pub const SAMPLE_COUNT: usize = 10;
const ADC_FULL_SCALE_MV: f32 = 3600.0;
const ADC_MAX: f32 = 4095.0;
const DIVIDER_RATIO: f32 = 1.529_411_765;

/// One-shot ADC channel.
pub trait AnalogSample {
    fn sample(&mut self) -> Option<u16>;
}

impl<F: FnMut() -> Option<u16>> AnalogSample for F {
    fn sample(&mut self) -> Option<u16> {
        self()
    }
}

pub struct BatteryMonitor<A, E> {
    adc: A,
    divider_en: E,
}

impl<A: AnalogSample, E: OutputPin> BatteryMonitor<A, E> {
    pub fn new(adc: A, divider_en: E) -> Self {
        Self { adc, divider_en }
    }

    /// Averaged battery voltage in millivolts.
    pub fn read_mv(&mut self) -> Result<i16, SensorError> {
        if self.divider_en.set_high().is_err() {
            warn!("Battery divider enable failed");
        }
        let result = self.average_raw();
        if self.divider_en.set_low().is_err() {
            warn!("Battery divider disable failed");
        }

        let avg = result?;
        let mv = raw_to_mv(avg);
        debug!("Battery: raw avg {} -> {} mV", avg, mv);
        Ok(mv)
    }

    fn average_raw(&mut self) -> Result<i32, SensorError> {
        let mut sum: i32 = 0;
        for _ in 0..SAMPLE_COUNT {
            let raw = self.adc.sample().ok_or(SensorError::AdcReadFailed)?;
            sum += i32::from(raw);
        }
        Ok(sum / SAMPLE_COUNT as i32)
    }
}

/// Scale an averaged 12-bit reading to battery millivolts.
pub fn raw_to_mv(avg: i32) -> i16 {
    let mv = avg as f32 * ADC_FULL_SCALE_MV / ADC_MAX * DIVIDER_RATIO;
    mv as i16
}
