//! Mock hardware for integration tests.
//!
//! [`MockBoard`] implements every port the supervisor touches and records
//! what it was asked to do, so tests can assert on the full history
//! without a modem or a ranger.  [`ScriptedUart`] stands in for the modem
//! UART when the real [`SerialModem`](waterlevel::adapters::modem::SerialModem)
//! is under test.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use waterlevel::adapters::modem::AtUart;
use waterlevel::app::events::AppEvent;
use waterlevel::app::ports::{
    EventSink, ModemPort, SensorPort, TransportPort, TripStore, WatchdogPort,
};
use waterlevel::error::{ModemError, TransportError};
use waterlevel::link::registration::RegistrationStatus;
use waterlevel::link::response::Response;
use waterlevel::ranging::model::SensorModel;
use waterlevel::ranging::{RangingOutcome, RangingReading};
use waterlevel::sensors::selector::SelectorSwitches;

// ── Canned modem replies ──────────────────────────────────────

pub const MONITOR: &str =
    "%XMONITOR: 1,\"EDAV\",\"EDAV\",\"44020\",\"1A2B\",7,20,\"00E1C13B\",7,2300,63,44";
pub const CONEVAL: &str = "%CONEVAL: 0,1,7,49,25,21,\"00E1C13B\",\"44020\",47,1300";
pub const CLOCK: &str = "+CCLK: \"23/04/01,12:34:56+36\"";
pub const ICCID: &str = "%XICCID: 89810400000000000019";
pub const COPS_REGISTERED: &str = "+COPS: 1,2,\"44020\"";
pub const COPS_NO_OPERATOR: &str = "+COPS: 0";

/// Record produced from the canned replies and [`good_ranging`] with the
/// MB7388 selected.
pub fn expected_record(send_seq: u32) -> String {
    format!(
        "23/04/01,12:34:56+36,8981040000000000001,3712,+23.50,\
         1234,-1,1236,1240,1238,{:010},20,\"44020\",\"1A2B\",\
         \"00E1C13B\",7,49,25,21,1,03",
        send_seq
    )
}

pub fn good_ranging() -> RangingOutcome {
    RangingOutcome {
        readings: [
            RangingReading::Valid(1234),
            RangingReading::OutOfRange,
            RangingReading::Valid(1236),
            RangingReading::Valid(1240),
            RangingReading::Valid(1238),
        ],
        attempts: 4,
        quorum_met: true,
    }
}

/// SW2 on: MB7388, SoftBank.
pub fn mb7388_selectors() -> SelectorSwitches {
    SelectorSwitches {
        sw2: true,
        ..SelectorSwitches::default()
    }
}

fn response(text: &str) -> Response {
    let mut r = Response::new();
    r.push_str(text).expect("canned reply fits");
    r
}

// ── FixedSensors ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FixedSensors {
    pub selectors: SelectorSwitches,
    pub ranging: RangingOutcome,
    pub battery_mv: Option<i16>,
    pub temperature_c: Option<f32>,
    pub acquisitions: Vec<SensorModel>,
}

impl Default for FixedSensors {
    fn default() -> Self {
        Self {
            selectors: mb7388_selectors(),
            ranging: good_ranging(),
            battery_mv: Some(3712),
            temperature_c: Some(23.5),
            acquisitions: Vec::new(),
        }
    }
}

impl SensorPort for FixedSensors {
    fn selectors(&self) -> SelectorSwitches {
        self.selectors
    }

    fn acquire_ranging(&mut self, model: SensorModel) -> RangingOutcome {
        self.acquisitions.push(model);
        self.ranging
    }

    fn battery_mv(&mut self) -> Option<i16> {
        self.battery_mv
    }

    fn temperature_c(&mut self) -> Option<f32> {
        self.temperature_c
    }
}

// ── MemoryTally / NoopDelay ───────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryTally {
    pub tally: u8,
    pub writes: Vec<u8>,
}

impl TripStore for MemoryTally {
    fn load_tally(&self) -> u8 {
        self.tally
    }

    fn store_tally(&mut self, tally: u8) {
        self.tally = tally;
        self.writes.push(tally);
    }
}

#[derive(Debug, Default)]
pub struct NoopDelay {
    pub total_ms: u64,
}

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ms += u64::from(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += u64::from(ms);
    }
}

// ── MockBoard ─────────────────────────────────────────────────

pub struct MockBoard {
    pub sensors: FixedSensors,

    /// Reply per exact command; anything else answers a bare `OK`.
    pub replies: HashMap<&'static str, Result<&'static str, ModemError>>,
    pub commands: Vec<String>,
    pub registrations: VecDeque<RegistrationStatus>,

    pub open_result: Result<(), TransportError>,
    pub opened: Vec<(String, u16)>,
    pub send_results: VecDeque<Result<usize, TransportError>>,
    pub fail_every_send: bool,
    pub sent: Vec<String>,

    pub feeds: u32,
    pub tally: MemoryTally,
    pub delays: Vec<u32>,
    /// `feeds` as it stood when each delay began.
    pub feeds_at_delay: Vec<u32>,
}

impl MockBoard {
    /// A board where everything works.
    pub fn healthy() -> Self {
        let replies = HashMap::from([
            ("AT%XMONITOR", Ok(MONITOR)),
            ("AT%CONEVAL", Ok(CONEVAL)),
            ("AT+CCLK?", Ok(CLOCK)),
            ("AT%XICCID", Ok(ICCID)),
            ("AT+COPS?", Ok(COPS_REGISTERED)),
        ]);
        Self {
            sensors: FixedSensors::default(),
            replies,
            commands: Vec::new(),
            registrations: VecDeque::from([
                RegistrationStatus::Searching,
                RegistrationStatus::Home,
            ]),
            open_result: Ok(()),
            opened: Vec::new(),
            send_results: VecDeque::new(),
            fail_every_send: false,
            sent: Vec::new(),
            feeds: 0,
            tally: MemoryTally::default(),
            delays: Vec::new(),
            feeds_at_delay: Vec::new(),
        }
    }

    pub fn with_tally(mut self, tally: u8) -> Self {
        self.tally.tally = tally;
        self
    }

    pub fn reply(mut self, cmd: &'static str, reply: Result<&'static str, ModemError>) -> Self {
        self.replies.insert(cmd, reply);
        self
    }

    pub fn minute_delays(&self) -> usize {
        self.delays.iter().filter(|&&ms| ms == 60_000).count()
    }
}

impl SensorPort for MockBoard {
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

impl ModemPort for MockBoard {
    fn command(&mut self, cmd: &str) -> Result<Response, ModemError> {
        self.commands.push(cmd.to_owned());
        match self.replies.get(cmd) {
            Some(Ok(text)) => Ok(response(text)),
            Some(Err(e)) => Err(*e),
            None => Ok(Response::new()),
        }
    }

    fn take_registration(&mut self) -> Option<RegistrationStatus> {
        self.registrations.pop_front()
    }
}

impl TransportPort for MockBoard {
    fn open(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        self.opened.push((host.to_owned(), port));
        self.open_result
    }

    fn send(&mut self, payload: &[u8]) -> Result<usize, TransportError> {
        self.sent.push(String::from_utf8_lossy(payload).into_owned());
        if self.fail_every_send {
            return Err(TransportError::SendFailed);
        }
        self.send_results.pop_front().unwrap_or(Ok(payload.len()))
    }
}

impl WatchdogPort for MockBoard {
    fn feed(&mut self) {
        self.feeds += 1;
    }
}

impl TripStore for MockBoard {
    fn load_tally(&self) -> u8 {
        self.tally.load_tally()
    }

    fn store_tally(&mut self, tally: u8) {
        self.tally.store_tally(tally);
    }
}

impl DelayNs for MockBoard {
    fn delay_ns(&mut self, ns: u32) {
        self.delays.push(ns / 1_000_000);
        self.feeds_at_delay.push(self.feeds);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
        self.feeds_at_delay.push(self.feeds);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── ScriptedUart ──────────────────────────────────────────────

/// Modem UART that answers each command by prefix match.
///
/// The transmit log is shared so it stays readable after the UART has
/// been moved into the adapter.
pub struct ScriptedUart {
    rx: VecDeque<u8>,
    pending: String,
    replies: Vec<(&'static str, &'static str)>,
    pub log: Rc<RefCell<Vec<String>>>,
}

impl ScriptedUart {
    /// Commands without a matching prefix answer `OK`.
    pub fn new(replies: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            rx: VecDeque::new(),
            pending: String::new(),
            replies,
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl AtUart for ScriptedUart {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), ModemError> {
        self.pending.push_str(&String::from_utf8_lossy(bytes));
        if let Some(cmd) = self.pending.strip_suffix("\r\n") {
            let cmd = cmd.to_owned();
            let reply = self
                .replies
                .iter()
                .find(|(prefix, _)| cmd.starts_with(*prefix))
                .map_or("OK\r\n", |(_, reply)| *reply);
            self.rx.extend(reply.bytes());
            self.log.borrow_mut().push(cmd);
            self.pending.clear();
        }
        Ok(())
    }

    fn read_byte(&mut self, _timeout_ms: u32) -> Option<u8> {
        self.rx.pop_front()
    }
}

/// Decode the hex payload of an `AT#XSEND=0,"…"` command.
pub fn decode_send(cmd: &str) -> Option<String> {
    let hex = cmd.strip_prefix("AT#XSEND=0,\"")?.strip_suffix('"')?;
    let bytes: Option<Vec<u8>> = (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect();
    String::from_utf8(bytes?).ok()
}
