//! Trip tally and cold-start backoff.
//!
//! The trip tally counts failed attach attempts across resets.  Each boot
//! sleeps according to the tally before trying again:
//!
//! ```text
//!   tally   0  1  2  3  4  ≥5
//!   minutes 0  1  2  4  8  0   (≥5 clears the tally first)
//! ```
//!
//! Only an attach that never registers (and a hardware watchdog expiry)
//! increments it; it is cleared after every fully successful cycle.

use core::fmt;

use crate::transmit::TransmissionPolicy;

/// Backoff in minutes, indexed by tally.
pub const BACKOFF_TABLE: [u32; 5] = [0, 1, 2, 4, 8];
/// Largest tally that still maps to a backoff step.
pub const MAX_TRIP_TALLY: u8 = (BACKOFF_TABLE.len() - 1) as u8;
pub const MS_PER_MINUTE: u32 = 60_000;

/// Reset-surviving count of failed attach attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TripTally(u8);

impl TripTally {
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Tallies past the table wrap back to zero.
    pub const fn clamped(self) -> Self {
        if self.0 > MAX_TRIP_TALLY { Self(0) } else { self }
    }

    pub const fn incremented(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn backoff_minutes(self) -> u32 {
        backoff_minutes(self.0)
    }
}

/// Cold-start sleep for a stored tally.
pub fn backoff_minutes(tally: u8) -> u32 {
    BACKOFF_TABLE
        .get(usize::from(tally))
        .copied()
        .unwrap_or(BACKOFF_TABLE[0])
}

/// Why the supervisor asked for a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    /// The initial registration wait ran out (tally incremented).
    RegistrationTimeout,
    /// The datagram socket could not be opened.
    TransportSetup,
    /// Three consecutive sends failed.
    SendFailures,
    /// The operator query reported no registration after a send.
    LinkLost,
}

impl ResetReason {
    /// Whether this reset path records a trip.
    pub const fn counts_as_trip(self) -> bool {
        matches!(self, Self::RegistrationTimeout)
    }
}

impl fmt::Display for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegistrationTimeout => write!(f, "registration timeout"),
            Self::TransportSetup => write!(f, "transport setup failed"),
            Self::SendFailures => write!(f, "consecutive send failures"),
            Self::LinkLost => write!(f, "link lost"),
        }
    }
}

/// In-memory recovery state owned by the supervisor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryState {
    /// Tally as loaded at boot (after clamping).
    pub tally: TripTally,
    pub transmission: TransmissionPolicy,
}
