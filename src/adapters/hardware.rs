//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`](crate::sensors::SensorHub), the serial modem,
//! the task watchdog, the retained trip tally, and the blocking delay, and
//! exposes them as one [`Board`](crate::app::ports::Board).  This is the
//! only module besides the drivers that touches actual hardware.  On
//! non-espidf targets the pieces are host stand-ins, so the same adapter
//! is exercised by the integration tests.

use embedded_hal::delay::DelayNs;

use crate::app::ports::{ModemPort, SensorPort, TransportPort, TripStore, WatchdogPort};
use crate::error::{ModemError, TransportError};
use crate::link::registration::RegistrationStatus;
use crate::link::response::Response;
use crate::ranging::RangingOutcome;
use crate::ranging::model::SensorModel;
use crate::sensors::selector::SelectorSwitches;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<S, M, W, T, D> {
    sensors: S,
    modem: M,
    watchdog: W,
    tally: T,
    delay: D,
}

impl<S, M, W, T, D> HardwareAdapter<S, M, W, T, D> {
    pub fn new(sensors: S, modem: M, watchdog: W, tally: T, delay: D) -> Self {
        Self {
            sensors,
            modem,
            watchdog,
            tally,
            delay,
        }
    }

    pub fn modem(&self) -> &M {
        &self.modem
    }

    pub fn watchdog(&self) -> &W {
        &self.watchdog
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<S: SensorPort, M, W, T, D> SensorPort for HardwareAdapter<S, M, W, T, D> {
    fn selectors(&self) -> SelectorSwitches {
        self.sensors.selectors()
    }

    fn acquire_ranging(&mut self, model: SensorModel) -> RangingOutcome {
        self.sensors.acquire_ranging(model)
    }

    fn battery_mv(&mut self) -> Option<i16> {
        self.sensors.battery_mv()
    }

    fn temperature_c(&mut self) -> Option<f32> {
        self.sensors.temperature_c()
    }
}

// ── ModemPort / TransportPort implementation ──────────────────

impl<S, M: ModemPort, W, T, D> ModemPort for HardwareAdapter<S, M, W, T, D> {
    fn command(&mut self, cmd: &str) -> Result<Response, ModemError> {
        self.modem.command(cmd)
    }

    fn take_registration(&mut self) -> Option<RegistrationStatus> {
        self.modem.take_registration()
    }
}

impl<S, M: TransportPort, W, T, D> TransportPort for HardwareAdapter<S, M, W, T, D> {
    fn open(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        self.modem.open(host, port)
    }

    fn send(&mut self, payload: &[u8]) -> Result<usize, TransportError> {
        self.modem.send(payload)
    }
}

// ── Watchdog / tally / delay ──────────────────────────────────

impl<S, M, W: WatchdogPort, T, D> WatchdogPort for HardwareAdapter<S, M, W, T, D> {
    fn feed(&mut self) {
        self.watchdog.feed();
    }
}

impl<S, M, W, T: TripStore, D> TripStore for HardwareAdapter<S, M, W, T, D> {
    fn load_tally(&self) -> u8 {
        self.tally.load_tally()
    }

    fn store_tally(&mut self, tally: u8) {
        self.tally.store_tally(tally);
    }
}

impl<S, M, W, T, D: DelayNs> DelayNs for HardwareAdapter<S, M, W, T, D> {
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}

// ── ESP-IDF ranger UART ───────────────────────────────────────

#[cfg(target_os = "espidf")]
impl crate::ranging::line::ByteSource for esp_idf_hal::uart::UartDriver<'_> {
    fn poll_byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        match self.read(&mut buf, esp_idf_hal::delay::NON_BLOCK) {
            Ok(1) => Some(buf[0]),
            _ => None,
        }
    }
}
