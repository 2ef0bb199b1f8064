//! Outbound application events.
//!
//! The [`Supervisor`](super::service::Supervisor) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log today).

use crate::fsm::StateId;
use crate::recovery::ResetReason;
use crate::transmit::TransmissionOutcome;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The supervisor started; carries the tally loaded from retained memory.
    Started { trip_tally: u8 },

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// Cold-start backoff is about to sleep.
    Backoff { trip_tally: u8, minutes: u32 },

    /// The modem registered and the datagram socket is open.
    LinkUp,

    /// A ranging acquisition finished.
    Ranging(RangingSummary),

    /// One cycle's record, as sent.
    Record { send_seq: u32, len: usize },

    /// Result of the cycle's send attempt.
    Transmitted {
        send_seq: u32,
        outcome: TransmissionOutcome,
        consecutive_failures: u8,
    },

    /// A cycle finished with the link confirmed; the tally is clear.
    CycleComplete { send_seq: u32 },

    /// The supervisor gave up; the device is about to restart.
    ResetRequested(ResetReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangingSummary {
    pub attempts: u8,
    pub invalid: usize,
    pub quorum_met: bool,
}
