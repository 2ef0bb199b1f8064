//! Link-status extraction from modem query responses.
//!
//! ```text
//!   AT%XMONITOR ─▶ plmn(3) tac(4) band(6) cell(7)
//!   AT%CONEVAL  ─▶ result(0)=="0" ? es(2) rsrp(3) rsrq(4) snr(5) : defaults
//!   AT%XICCID   ─▶ iccid            (digits, ≤20)
//!   AT+CCLK?    ─▶ network time     (quoted, ≤20)
//!   AT+COPS?    ─▶ registered?      (mode only ⇒ no operator)
//! ```
//!
//! A failed query never fails the cycle: every field falls back to its
//! documented default and the record still goes out.

pub mod connect;
pub mod registration;
pub mod response;

use log::{debug, info, warn};

use crate::app::ports::ModemPort;
use crate::bounded::Bounded;
use response::{Charset, MAX_PAYLOAD_CHARS, field, scan_prefixed, tokenize};

pub const CMD_MONITOR: &str = "AT%XMONITOR";
pub const CMD_CONEVAL: &str = "AT%CONEVAL";
pub const CMD_CLOCK: &str = "AT+CCLK?";
pub const CMD_ICCID: &str = "AT%XICCID";
pub const CMD_OPERATOR: &str = "AT+COPS?";

const CONEVAL_SUCCESS: &str = "0";

/// Serving-cell and link-quality snapshot, already cut to wire widths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkStatus {
    /// Operator code, quotes included (`"44020"`).
    pub plmn: Bounded<7>,
    pub tac: Bounded<6>,
    pub band: Bounded<2>,
    pub cell_id: Bounded<10>,
    pub energy_eff: Bounded<1>,
    pub rsrp: Bounded<3>,
    pub rsrq: Bounded<3>,
    pub snr: Bounded<3>,
}

impl Default for LinkStatus {
    fn default() -> Self {
        let mut status = Self {
            plmn: Bounded::new(),
            tac: Bounded::new(),
            band: Bounded::new(),
            cell_id: Bounded::new(),
            energy_eff: Bounded::new(),
            rsrp: Bounded::new(),
            rsrq: Bounded::new(),
            snr: Bounded::new(),
        };
        status.reset_quality();
        status
    }
}

impl LinkStatus {
    /// Link-quality defaults used when the evaluation query fails.
    pub fn reset_quality(&mut self) {
        self.energy_eff = Bounded::truncated("0");
        self.rsrp = Bounded::truncated("255");
        self.rsrq = Bounded::truncated("255");
        self.snr = Bounded::truncated("127");
    }

    /// Fill the serving-cell fields from an `%XMONITOR` payload.
    pub fn apply_monitor(&mut self, payload: &str) {
        let f = tokenize(payload);
        self.plmn = Bounded::truncated(field(&f, 3));
        self.tac = Bounded::truncated(field(&f, 4));
        self.band = Bounded::truncated(field(&f, 6));
        self.cell_id = Bounded::truncated(field(&f, 7));
    }

    /// Fill the quality fields from a `%CONEVAL` payload, or fall back to
    /// the defaults if the evaluation did not succeed.
    pub fn apply_coneval(&mut self, payload: &str) {
        let f = tokenize(payload);
        if field(&f, 0) == CONEVAL_SUCCESS {
            self.energy_eff = Bounded::truncated(field(&f, 2));
            self.rsrp = Bounded::truncated(field(&f, 3));
            self.rsrq = Bounded::truncated(field(&f, 4));
            self.snr = Bounded::truncated(field(&f, 5));
        } else {
            warn!("CONEVAL result {:?}, using quality defaults", field(&f, 0));
            self.reset_quality();
        }
    }
}

/// SIM identity and network time, re-read every cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub iccid: Option<Bounded<20>>,
    /// `yy/MM/dd,hh:mm:ss±zz`
    pub timestamp: Option<Bounded<20>>,
}

/// What the operator query says about the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRegistration {
    /// An operator is selected.
    Registered,
    /// The reply carries a selection mode but no operator.
    NotRegistered,
    /// The query itself failed; no evidence either way.
    Unknown,
}

/// Query serving cell and link quality.
pub fn query_link(modem: &mut impl ModemPort) -> LinkStatus {
    let mut status = LinkStatus::default();

    match query_payload(modem, CMD_MONITOR, "%XMONITOR: ") {
        Some(p) => status.apply_monitor(&p),
        None => warn!("XMONITOR unavailable, cell fields left empty"),
    }

    match query_payload(modem, CMD_CONEVAL, "%CONEVAL: ") {
        Some(p) => status.apply_coneval(&p),
        None => warn!("CONEVAL unavailable, using quality defaults"),
    }

    info!(
        "Link: plmn={} tac={} band={} cell={} es={} rsrp={} rsrq={} snr={}",
        status.plmn,
        status.tac,
        status.band,
        status.cell_id,
        status.energy_eff,
        status.rsrp,
        status.rsrq,
        status.snr
    );
    status
}

/// Query ICCID and network time.
pub fn query_identity(modem: &mut impl ModemPort) -> Identity {
    let timestamp = modem.command(CMD_CLOCK).ok().and_then(|r| {
        scan_prefixed(&r, "+CCLK: \"", Charset::Clock, 20).map(Bounded::truncated)
    });
    let iccid = modem.command(CMD_ICCID).ok().and_then(|r| {
        scan_prefixed(&r, "%XICCID: ", Charset::Digits, 20).map(Bounded::truncated)
    });

    if timestamp.is_none() {
        warn!("Network time unavailable");
    }
    if iccid.is_none() {
        warn!("ICCID unavailable");
    }
    Identity { iccid, timestamp }
}

/// Classify the operator-selection reply.
pub fn classify_registration(modem: &mut impl ModemPort) -> LinkRegistration {
    let Ok(resp) = modem.command(CMD_OPERATOR) else {
        warn!("COPS query failed");
        return LinkRegistration::Unknown;
    };
    let Some(payload) = scan_prefixed(&resp, "+COPS: ", Charset::Operator, 14) else {
        warn!("COPS reply not understood");
        return LinkRegistration::Unknown;
    };
    debug!("COPS: {}", payload);

    if tokenize(payload).len() <= 1 {
        LinkRegistration::NotRegistered
    } else {
        LinkRegistration::Registered
    }
}

/// `false` only when the modem positively reports no operator.
pub fn query_registration(modem: &mut impl ModemPort) -> bool {
    classify_registration(modem) != LinkRegistration::NotRegistered
}

/// Run `cmd` and return its prefixed payload, bounded to the field charset.
fn query_payload(
    modem: &mut impl ModemPort,
    cmd: &str,
    prefix: &str,
) -> Option<heapless::String<MAX_PAYLOAD_CHARS>> {
    let resp = modem.command(cmd).ok()?;
    let payload = scan_prefixed(&resp, prefix, Charset::Field, MAX_PAYLOAD_CHARS)?;
    debug!("{} -> {}", cmd, payload);
    let mut owned = heapless::String::new();
    owned.push_str(payload).ok()?;
    Some(owned)
}
