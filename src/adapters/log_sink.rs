//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC console in the field).

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::transmit::TransmissionOutcome;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { trip_tally } => {
                info!("START | trip_tally={}", trip_tally);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::Backoff {
                trip_tally,
                minutes,
            } => {
                info!("BACKOFF | tally={} sleeping {} min", trip_tally, minutes);
            }
            AppEvent::LinkUp => {
                info!("LINK | registered, socket open");
            }
            AppEvent::Ranging(r) => {
                info!(
                    "RANGE | attempts={} invalid={} quorum={}",
                    r.attempts,
                    r.invalid,
                    if r.quorum_met { "OK" } else { "MISSED" }
                );
            }
            AppEvent::Record { send_seq, len } => {
                info!("RECORD | seq={} len={}", send_seq, len);
            }
            AppEvent::Transmitted {
                send_seq,
                outcome,
                consecutive_failures,
            } => match outcome {
                TransmissionOutcome::Sent => info!("SEND | seq={} ok", send_seq),
                TransmissionOutcome::SendFailed => warn!(
                    "SEND | seq={} failed ({} consecutive)",
                    send_seq, consecutive_failures
                ),
            },
            AppEvent::CycleComplete { send_seq } => {
                info!("CYCLE | seq={} complete", send_seq);
            }
            AppEvent::ResetRequested(reason) => {
                error!("RESET | {}", reason);
            }
        }
    }
}
