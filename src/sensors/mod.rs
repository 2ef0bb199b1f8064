//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns the ranger, battery monitor, and thermometer, plus the
//! selector positions sampled at boot.  Battery and temperature faults are
//! absorbed here into `None`; the record encoder maps them to their wire
//! sentinels.

pub mod battery;
pub mod selector;
pub mod temperature;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use log::warn;

use crate::app::ports::SensorPort;
use crate::ranging::line::ByteSource;
use crate::ranging::model::SensorModel;
use crate::ranging::{RangeFinder, RangingOutcome};
use battery::{AnalogSample, BatteryMonitor};
use selector::SelectorSwitches;
use temperature::Tmp102;

/// Aggregates all sensor drivers.
pub struct SensorHub<R, B, T> {
    pub ranger: R,
    pub battery: B,
    pub thermometer: T,
    selectors: SelectorSwitches,
}

impl<R, B, T> SensorHub<R, B, T> {
    /// Construct a new hub.  Drivers are built in main where peripheral
    /// ownership is established; `selectors` is the boot-time sample.
    pub fn new(ranger: R, battery: B, thermometer: T, selectors: SelectorSwitches) -> Self {
        Self {
            ranger,
            battery,
            thermometer,
            selectors,
        }
    }
}

impl<U, P, D, A, E, I> SensorPort
    for SensorHub<RangeFinder<U, P, D>, BatteryMonitor<A, E>, Tmp102<I>>
where
    U: ByteSource,
    P: OutputPin,
    D: DelayNs,
    A: AnalogSample,
    E: OutputPin,
    I: I2c,
{
    fn selectors(&self) -> SelectorSwitches {
        self.selectors
    }

    fn acquire_ranging(&mut self, model: SensorModel) -> RangingOutcome {
        self.ranger.acquire(model)
    }

    fn battery_mv(&mut self) -> Option<i16> {
        self.battery
            .read_mv()
            .map_err(|e| warn!("Battery read failed: {}", e))
            .ok()
    }

    fn temperature_c(&mut self) -> Option<f32> {
        self.thermometer
            .read_celsius()
            .map_err(|e| warn!("Temperature read failed: {}", e))
            .ok()
    }
}
