//! Send accounting and escalation.
//!
//! One datagram per cycle.  Consecutive failures are counted; a success
//! clears the count.  Reaching [`SEND_FAILURE_LIMIT`] escalates to a
//! reset.  The send sequence number starts at 1 and advances once per
//! completed cycle whatever the outcome, so gaps at the collector mean
//! lost datagrams and a restart at 1 means the device rebooted.

use log::{info, warn};

use crate::app::ports::TransportPort;

pub const SEND_FAILURE_LIMIT: u8 = 3;
/// IPv4 + UDP header bytes, for on-air size logging.
pub const UDP_IP_HEADER_SIZE: usize = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmissionOutcome {
    Sent,
    SendFailed,
}

/// What the caller must do after recording an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    Continue,
    /// Feed the watchdog, then reset.
    Reset,
}

/// Per-boot transmission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmissionPolicy {
    consecutive_failures: u8,
    send_sequence: u32,
}

impl Default for TransmissionPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl TransmissionPolicy {
    pub const fn new() -> Self {
        Self {
            consecutive_failures: 0,
            send_sequence: 1,
        }
    }

    /// Sequence number for the record being built this cycle.
    pub fn send_sequence(&self) -> u32 {
        self.send_sequence
    }

    pub fn consecutive_failures(&self) -> u8 {
        self.consecutive_failures
    }

    /// Send `record` once and account for the result.
    pub fn transmit(
        &mut self,
        transport: &mut impl TransportPort,
        record: &str,
    ) -> (TransmissionOutcome, Escalation) {
        info!(
            "Transmitting UDP payload of {} bytes (seq {})",
            record.len() + UDP_IP_HEADER_SIZE,
            self.send_sequence
        );
        let outcome = match transport.send(record.as_bytes()) {
            Ok(_) => TransmissionOutcome::Sent,
            Err(e) => {
                warn!("UDP send failed: {}", e);
                TransmissionOutcome::SendFailed
            }
        };
        (outcome, self.record(outcome))
    }

    /// Update the failure count for `outcome`.
    pub fn record(&mut self, outcome: TransmissionOutcome) -> Escalation {
        match outcome {
            TransmissionOutcome::Sent => {
                self.consecutive_failures = 0;
                Escalation::Continue
            }
            TransmissionOutcome::SendFailed => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                warn!("UDP error count {}", self.consecutive_failures);
                if self.consecutive_failures >= SEND_FAILURE_LIMIT {
                    Escalation::Reset
                } else {
                    Escalation::Continue
                }
            }
        }
    }

    /// Advance the sequence at the end of a completed cycle.
    pub fn complete_cycle(&mut self) {
        self.send_sequence = self.send_sequence.wrapping_add(1);
    }
}
