//! Device configuration parameters
//!
//! Operational values for the gauge.  Defaults come from build-time
//! environment variables (`WLG_SERVER_ADDRESS`, `WLG_SERVER_PORT`,
//! `WLG_PERIOD_SECS`, `WLG_APN`) and can be overridden via NVS.
//!
//! Sensor model and carrier are *not* stored here: they are read from the
//! selector switches every boot (see [`crate::ranging::model`] and
//! [`crate::link::connect`]).

use serde::{Deserialize, Serialize};

/// Extra watchdog headroom on top of the transmission period.
pub const WATCHDOG_MARGIN_SECS: u32 = 30;

const DEFAULT_SERVER_ADDRESS: &str = "192.0.2.10";
const DEFAULT_SERVER_PORT: u16 = 5000;
const DEFAULT_PERIOD_SECS: u32 = 600;
const DEFAULT_APN: &str = "sakura";
const DEFAULT_REGISTRATION_TIMEOUT_SECS: u32 = 30;

/// Core device configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    // --- Schedule ---
    /// Seconds between the end of one cycle and the start of the next.
    pub transmission_period_secs: u32,

    // --- Server ---
    /// Collector address (IPv4 literal or hostname).
    pub server_address: heapless::String<64>,
    /// Collector UDP port.
    pub server_port: u16,

    // --- Network ---
    /// PDP context access point name.
    pub apn: heapless::String<32>,
    /// Budget for the initial network registration after attach.
    pub registration_timeout_secs: u32,
}

impl DeviceConfig {
    /// Hardware watchdog timeout: one period plus [`WATCHDOG_MARGIN_SECS`].
    pub fn watchdog_timeout_ms(&self) -> u32 {
        self.transmission_period_secs
            .saturating_add(WATCHDOG_MARGIN_SECS)
            .saturating_mul(1000)
    }

    pub fn period_ms(&self) -> u32 {
        self.transmission_period_secs.saturating_mul(1000)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let period = option_env!("WLG_PERIOD_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PERIOD_SECS);
        let port = option_env!("WLG_SERVER_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SERVER_PORT);

        Self {
            transmission_period_secs: period,
            server_address: bounded_or(
                option_env!("WLG_SERVER_ADDRESS"),
                DEFAULT_SERVER_ADDRESS,
            ),
            server_port: port,
            apn: bounded_or(option_env!("WLG_APN"), DEFAULT_APN),
            registration_timeout_secs: DEFAULT_REGISTRATION_TIMEOUT_SECS,
        }
    }
}

/// Use the build-time override if it fits, otherwise the fallback.
fn bounded_or<const N: usize>(value: Option<&str>, fallback: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    let chosen = value.filter(|v| !v.is_empty() && v.len() <= N).unwrap_or(fallback);
    let _ = out.push_str(chosen);
    out
}
