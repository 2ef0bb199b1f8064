//! Network registration: `+CEREG` parsing and the bounded wait.
//!
//! The modem reports EPS registration changes as unsolicited lines
//! (`+CEREG: <stat>[,<tac>,<ci>,...]`).  The modem adapter publishes each
//! one into a [`RegistrationSignal`]; the supervisor's attach step waits on
//! it with [`await_registration`], polling in 100 ms steps until the budget
//! runs out.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::app::ports::ModemPort;

/// Step between checks of the registration signal.
pub const POLL_STEP_MS: u32 = 100;

const CEREG_PREFIX: &str = "+CEREG: ";

/// EPS registration status (`<stat>` of `+CEREG`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    NotSearching,
    Home,
    Searching,
    Denied,
    Unknown,
    Roaming,
    /// Emergency-only, UICC failure, or anything newer.
    Other(u8),
}

impl RegistrationStatus {
    pub fn from_stat(stat: u8) -> Self {
        match stat {
            0 => Self::NotSearching,
            1 => Self::Home,
            2 => Self::Searching,
            3 => Self::Denied,
            4 => Self::Unknown,
            5 => Self::Roaming,
            other => Self::Other(other),
        }
    }

    /// Registered on the home network or roaming.
    pub const fn is_registered(self) -> bool {
        matches!(self, Self::Home | Self::Roaming)
    }
}

/// Parse a `+CEREG:` URC line.  Returns `None` for any other line.
pub fn parse_cereg_urc(line: &str) -> Option<RegistrationStatus> {
    let rest = line.trim().strip_prefix(CEREG_PREFIX)?;
    let stat = rest.split(',').next()?.trim().parse().ok()?;
    Some(RegistrationStatus::from_stat(stat))
}

/// Latest registration status, written by the modem reader and consumed
/// by the waiter.  Newer statuses overwrite unconsumed ones.
pub struct RegistrationSignal(Signal<CriticalSectionRawMutex, RegistrationStatus>);

impl RegistrationSignal {
    pub const fn new() -> Self {
        Self(Signal::new())
    }

    pub fn publish(&self, status: RegistrationStatus) {
        debug!("CEREG -> {:?}", status);
        self.0.signal(status);
    }

    pub fn try_take(&self) -> Option<RegistrationStatus> {
        self.0.try_take()
    }
}

impl Default for RegistrationSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// The registration budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationTimeout;

/// Wait up to `budget_ms` for the modem to report registration.
pub fn await_registration(
    hw: &mut (impl ModemPort + DelayNs),
    budget_ms: u32,
) -> Result<(), RegistrationTimeout> {
    let mut waited: u32 = 0;
    loop {
        if let Some(status) = hw.take_registration() {
            if status.is_registered() {
                info!("Registered ({:?}) after {} ms", status, waited);
                return Ok(());
            }
            debug!("Registration pending: {:?}", status);
        }
        if waited >= budget_ms {
            warn!("No registration within {} ms", budget_ms);
            return Err(RegistrationTimeout);
        }
        hw.delay_ms(POLL_STEP_MS);
        waited = waited.saturating_add(POLL_STEP_MS);
    }
}
