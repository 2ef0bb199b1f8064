//! Supervisor service: the hexagonal core.
//!
//! [`Supervisor`] owns the FSM and the cycle blackboard.  Each call to
//! [`Supervisor::step`] runs the current state's work against the injected
//! [`Board`] and feeds the resulting [`StepEvent`] to the FSM.
//!
//! ```text
//!  SensorPort ──▶ ┌─────────────────────────┐ ──▶ EventSink
//!  ModemPort  ◀─▶ │       Supervisor        │
//!  Transport  ◀── │  FSM · tally · policy   │ ──▶ ResetReason
//!  Watchdog   ◀── └─────────────────────────┘
//! ```
//!
//! The service never restarts the chip itself: reaching `Reset` makes
//! [`Supervisor::run`] return the reason, and the binary performs the
//! restart.

use log::{error, info, warn};

use crate::config::DeviceConfig;
use crate::error::Error;
use crate::fsm::context::{CycleContext, Measurements};
use crate::fsm::{Fsm, StateId, StepEvent};
use crate::link::connect::{connect_script, run_connect_script};
use crate::link::registration::await_registration;
use crate::link::{query_identity, query_link, query_registration};
use crate::record::encode;
use crate::recovery::{MS_PER_MINUTE, ResetReason, TripTally};
use crate::transmit::Escalation;

use super::events::{AppEvent, RangingSummary};
use super::ports::{Board, EventSink};

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

pub struct Supervisor {
    fsm: Fsm,
    ctx: CycleContext,
}

impl Supervisor {
    /// Construct the supervisor in `ColdStart`.  Nothing runs until the
    /// first [`step`](Self::step).
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            fsm: Fsm::new(),
            ctx: CycleContext::new(config),
        }
    }

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn context(&self) -> &CycleContext {
        &self.ctx
    }

    /// Sequence number the next record will carry.
    pub fn send_sequence(&self) -> u32 {
        self.ctx.recovery.transmission.send_sequence()
    }

    // ── Driving ───────────────────────────────────────────────

    /// Run states until one asks for a reset, and return why.
    pub fn run(&mut self, hw: &mut impl Board, sink: &mut impl EventSink) -> ResetReason {
        loop {
            self.step(hw, sink);
            if let Some(reason) = self.ctx.reset_reason {
                return reason;
            }
        }
    }

    /// Run the current state's work and take the resulting transition.
    pub fn step(&mut self, hw: &mut impl Board, sink: &mut impl EventSink) -> StateId {
        let event = match self.fsm.current_state() {
            StateId::ColdStart => self.cold_start(hw, sink),
            StateId::BackoffSleep => self.backoff_sleep(hw, sink),
            StateId::AwaitLink => self.await_link(hw, sink),
            StateId::Acquire => self.acquire(hw, sink),
            StateId::Extract => self.extract(hw),
            StateId::Encode => self.encode(sink),
            StateId::Transmit => self.transmit(hw, sink),
            StateId::RearmOrReset => self.rearm_or_reset(hw, sink),
            StateId::ScheduledWait => self.scheduled_wait(hw),
            StateId::Reset => StepEvent::Done,
        };

        let (from, to) = self.fsm.fire(event);
        if from != to {
            sink.emit(&AppEvent::StateChanged { from, to });
            if to == StateId::Reset {
                self.enter_reset(event, hw, sink);
            }
        }
        to
    }

    // ── State actions ─────────────────────────────────────────

    fn cold_start(&mut self, hw: &mut impl Board, sink: &mut impl EventSink) -> StepEvent {
        let raw = hw.load_tally();
        let tally = TripTally::new(raw).clamped();
        if tally.get() != raw {
            info!("Trip tally {} past backoff table, cleared", raw);
            hw.store_tally(tally.get());
        }
        self.ctx.recovery.tally = tally;

        let selectors = hw.selectors();
        self.ctx.apply_selectors(&selectors);
        info!(
            "Cold start: tally={} model={:?} ({:?}) carrier={:?} period={}s",
            raw,
            self.ctx.model,
            self.ctx.model.variant(),
            self.ctx.carrier,
            self.ctx.config.transmission_period_secs
        );
        sink.emit(&AppEvent::Started { trip_tally: raw });
        StepEvent::Done
    }

    fn backoff_sleep(&mut self, hw: &mut impl Board, sink: &mut impl EventSink) -> StepEvent {
        let tally = self.ctx.recovery.tally;
        let minutes = tally.backoff_minutes();
        sink.emit(&AppEvent::Backoff {
            trip_tally: tally.get(),
            minutes,
        });
        for elapsed in 1..=minutes {
            hw.feed();
            hw.delay_ms(MS_PER_MINUTE);
            info!("Backoff {}/{} min", elapsed, minutes);
        }
        StepEvent::Done
    }

    fn await_link(&mut self, hw: &mut impl Board, sink: &mut impl EventSink) -> StepEvent {
        let script = connect_script(&self.ctx.config, self.ctx.carrier);
        run_connect_script(hw, &script);

        let budget_ms = self.ctx.config.registration_timeout_secs.saturating_mul(1000);
        if await_registration(hw, budget_ms).is_err() {
            return StepEvent::RegistrationTimedOut;
        }
        // Registration can take most of the budget; restart the window.
        hw.feed();

        let config = &self.ctx.config;
        if let Err(e) = hw.open(&config.server_address, config.server_port) {
            error!(
                "UDP socket to {}:{} failed: {}",
                config.server_address,
                config.server_port,
                Error::from(e)
            );
            return StepEvent::SocketFailed;
        }

        sink.emit(&AppEvent::LinkUp);
        StepEvent::Done
    }

    fn acquire(&mut self, hw: &mut impl Board, sink: &mut impl EventSink) -> StepEvent {
        self.ctx.begin_cycle();

        let ranging = hw.acquire_ranging(self.ctx.model);
        let battery_mv = hw.battery_mv();
        let temperature_c = hw.temperature_c();

        if !ranging.quorum_met {
            warn!("Ranging quorum not met, sending degraded batch");
        }
        sink.emit(&AppEvent::Ranging(RangingSummary {
            attempts: ranging.attempts,
            invalid: ranging.invalid_count(),
            quorum_met: ranging.quorum_met,
        }));

        self.ctx.measurements = Some(Measurements {
            ranging,
            battery_mv,
            temperature_c,
        });
        StepEvent::Done
    }

    fn extract(&mut self, hw: &mut impl Board) -> StepEvent {
        self.ctx.link = query_link(hw);
        self.ctx.identity = query_identity(hw);
        StepEvent::Done
    }

    fn encode(&mut self, sink: &mut impl EventSink) -> StepEvent {
        let sample = self.ctx.sample_set();
        let send_seq = self.send_sequence();
        self.ctx.record = encode(&sample, &self.ctx.link, send_seq);

        info!("UDP send data [{}]", self.ctx.record);
        sink.emit(&AppEvent::Record {
            send_seq,
            len: self.ctx.record.len(),
        });
        StepEvent::Done
    }

    fn transmit(&mut self, hw: &mut impl Board, sink: &mut impl EventSink) -> StepEvent {
        let send_seq = self.send_sequence();
        let policy = &mut self.ctx.recovery.transmission;
        let (outcome, escalation) = policy.transmit(hw, &self.ctx.record);
        self.ctx.last_outcome = Some(outcome);

        sink.emit(&AppEvent::Transmitted {
            send_seq,
            outcome,
            consecutive_failures: policy.consecutive_failures(),
        });

        match escalation {
            Escalation::Continue => StepEvent::Done,
            Escalation::Reset => {
                // Feed first so the watchdog does not also count this reset.
                hw.feed();
                StepEvent::SendLimitReached
            }
        }
    }

    fn rearm_or_reset(&mut self, hw: &mut impl Board, sink: &mut impl EventSink) -> StepEvent {
        if !query_registration(hw) {
            error!("CONNECTION ERROR: operator lost after send");
            return StepEvent::NotRegistered;
        }

        hw.feed();
        self.ctx.recovery.tally = TripTally::default();
        hw.store_tally(0);

        let send_seq = self.send_sequence();
        self.ctx.recovery.transmission.complete_cycle();
        self.ctx.cycles_completed = self.ctx.cycles_completed.wrapping_add(1);
        sink.emit(&AppEvent::CycleComplete { send_seq });
        StepEvent::Done
    }

    fn scheduled_wait(&mut self, hw: &mut impl Board) -> StepEvent {
        info!(
            "Next transmission in {} s",
            self.ctx.config.transmission_period_secs
        );
        hw.delay_ms(self.ctx.config.period_ms());
        StepEvent::Done
    }

    // ── Terminal ──────────────────────────────────────────────

    fn enter_reset(&mut self, event: StepEvent, hw: &mut impl Board, sink: &mut impl EventSink) {
        let Some(reason) = event.reset_reason() else {
            return;
        };
        if reason.counts_as_trip() {
            let tally = self.ctx.recovery.tally.incremented();
            self.ctx.recovery.tally = tally;
            hw.store_tally(tally.get());
            warn!("Trip tally now {}", tally.get());
        }
        error!("Reset requested: {}", reason);
        self.ctx.reset_reason = Some(reason);
        sink.emit(&AppEvent::ResetRequested(reason));
    }
}
