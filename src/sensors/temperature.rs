//! TMP102 digital temperature sensor (I2C, address 0x48).
//!
//! The sensor is left in shutdown between cycles.  A reading triggers one
//! one-shot conversion, waits for the configuration register's first byte
//! to settle at `0x01` (shutdown set, conversion finished), then reads the
//! 12-bit result.
//!
//! ```text
//!   temp register: [MSB][LSB]  → i16 >> 4  → × 0.0625 °C
//! ```

use embedded_hal::i2c::I2c;
use log::{debug, warn};

use crate::error::SensorError;

pub const TMP102_ADDR: u8 = 0x48;

const REG_TEMPERATURE: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;
/// One-shot + shutdown.
const CONFIG_ONE_SHOT: u8 = 0x81;
/// Config MSB once the one-shot conversion has finished.
const CONFIG_DONE: u8 = 0x01;
/// Upper bound on config polls; a conversion takes ~26 ms.
pub const MAX_CONVERSION_POLLS: u32 = 1000;

pub struct Tmp102<I> {
    i2c: I,
}

impl<I: I2c> Tmp102<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Trigger a one-shot conversion and return degrees Celsius.
    pub fn read_celsius(&mut self) -> Result<f32, SensorError> {
        self.i2c
            .write(TMP102_ADDR, &[REG_CONFIG, CONFIG_ONE_SHOT])
            .map_err(|_| SensorError::BusFailed)?;

        self.wait_conversion()?;

        let mut raw = [0u8; 2];
        self.i2c
            .write_read(TMP102_ADDR, &[REG_TEMPERATURE], &mut raw)
            .map_err(|_| SensorError::BusFailed)?;

        let celsius = raw_to_celsius(raw);
        debug!("TMP102: {:02x}{:02x} -> {:.2} C", raw[0], raw[1], celsius);
        Ok(celsius)
    }

    fn wait_conversion(&mut self) -> Result<(), SensorError> {
        let mut config = [0u8; 1];
        for _ in 0..MAX_CONVERSION_POLLS {
            self.i2c
                .write_read(TMP102_ADDR, &[REG_CONFIG], &mut config)
                .map_err(|_| SensorError::BusFailed)?;
            if config[0] == CONFIG_DONE {
                return Ok(());
            }
        }
        warn!("TMP102 conversion did not complete (config={:02x})", config[0]);
        Err(SensorError::ConversionTimeout)
    }
}

/// Convert the two temperature-register bytes to °C.
pub fn raw_to_celsius(raw: [u8; 2]) -> f32 {
    let value = i16::from_be_bytes(raw) >> 4;
    f32::from(value) / 16.0
}
