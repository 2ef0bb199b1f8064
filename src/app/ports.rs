//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Supervisor (domain)
//! ```
//!
//! Driven adapters (sensors, modem, transport, watchdog, persisted tally,
//! event sinks, config storage) implement these traits.  The
//! [`Supervisor`](super::service::Supervisor) consumes them via generics,
//! so the cycle logic never touches hardware directly.
//!
//! ## Contract notes
//!
//! - **ModemPort** round-trips are bounded by the adapter's own timeout.
//! - **ConfigPort** implementations MUST validate before persisting.
//! - **TripStore** must survive a warm reset but not a power cycle.

use embedded_hal::delay::DelayNs;

use crate::config::DeviceConfig;
use crate::error::{ModemError, TransportError};
pub use crate::error::ConfigError;
use crate::link::registration::RegistrationStatus;
use crate::link::response::Response;
use crate::ranging::RangingOutcome;
use crate::ranging::model::SensorModel;
use crate::sensors::selector::SelectorSwitches;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain measurements.
pub trait SensorPort {
    /// Selector positions sampled at boot.
    fn selectors(&self) -> SelectorSwitches;

    /// Power the ranger and run the quorum/retry acquisition.
    fn acquire_ranging(&mut self, model: SensorModel) -> RangingOutcome;

    /// Battery millivolts; `None` on ADC failure.
    fn battery_mv(&mut self) -> Option<i16>;

    /// Board temperature; `None` on bus failure.
    fn temperature_c(&mut self) -> Option<f32>;
}

// ───────────────────────────────────────────────────────────────
// Modem port (driven adapter: domain ↔ AT command channel)
// ───────────────────────────────────────────────────────────────

/// One AT command in, one response out.
pub trait ModemPort {
    /// Send `cmd` and return the information text preceding the final `OK`.
    fn command(&mut self, cmd: &str) -> Result<Response, ModemError>;

    /// Latest unconsumed registration report, if any.  Non-blocking.
    fn take_registration(&mut self) -> Option<RegistrationStatus>;
}

// ───────────────────────────────────────────────────────────────
// Transport port (driven adapter: domain → datagram socket)
// ───────────────────────────────────────────────────────────────

pub trait TransportPort {
    /// Open the datagram socket and bind it to the collector.
    fn open(&mut self, host: &str, port: u16) -> Result<(), TransportError>;

    /// Send one datagram; returns the number of payload bytes accepted.
    fn send(&mut self, payload: &[u8]) -> Result<usize, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Watchdog & persisted tally
// ───────────────────────────────────────────────────────────────

pub trait WatchdogPort {
    fn feed(&mut self);
}

/// Reset-surviving trip tally.
pub trait TripStore {
    /// Stored tally, or 0 if the backing memory is not initialised.
    fn load_tally(&self) -> u8;

    fn store_tally(&mut self, tally: u8);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists device configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`DeviceConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<DeviceConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &DeviceConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Board bundle
// ───────────────────────────────────────────────────────────────

/// Everything one supervisor cycle touches.
pub trait Board: SensorPort + ModemPort + TransportPort + WatchdogPort + TripStore + DelayNs {}

impl<T> Board for T where T: SensorPort + ModemPort + TransportPort + WatchdogPort + TripStore + DelayNs {}
