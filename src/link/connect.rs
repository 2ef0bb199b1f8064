//! Modem attach script.
//!
//! Configures the PDP context, pins the radio to LTE-M, selects the
//! carrier chosen on SW0/SW1, and brings the radio up with PSM and eDRX
//! enabled.  Each command is best-effort: a failure is logged and the
//! script moves on, because the registration wait that follows is the
//! real success criterion.

use core::fmt::Write;

use log::{info, warn};

use crate::app::ports::ModemPort;
use crate::config::DeviceConfig;
use crate::sensors::selector::SelectorSwitches;

/// Longest single command in the script.
pub const COMMAND_CAPACITY: usize = 96;
/// Commands in the script.
pub const SCRIPT_LEN: usize = 12;

pub type Command = heapless::String<COMMAND_CAPACITY>;
pub type Script = heapless::Vec<Command, SCRIPT_LEN>;

/// Carrier selected on the SW0/SW1 pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Carrier {
    SoftBank,
    Docomo,
    Kddi,
}

impl Carrier {
    /// `(SW0, SW1)`: off/off → SoftBank, on/off → docomo, off/on → KDDI,
    /// on/on → SoftBank.
    pub fn from_switches(sw: &SelectorSwitches) -> Self {
        match (sw.sw0, sw.sw1) {
            (true, false) => Self::Docomo,
            (false, true) => Self::Kddi,
            (false, false) | (true, true) => Self::SoftBank,
        }
    }

    pub const fn plmn(self) -> &'static str {
        match self {
            Self::SoftBank => "44020",
            Self::Docomo => "44010",
            Self::Kddi => "44051",
        }
    }
}

/// Build the attach script for `config` and `carrier`.
pub fn connect_script(config: &DeviceConfig, carrier: Carrier) -> Script {
    let mut script = Script::new();
    let mut push = |args: core::fmt::Arguments<'_>| {
        let mut cmd = Command::new();
        if cmd.write_fmt(args).is_err() || script.push(cmd).is_err() {
            warn!("Attach command dropped (too long)");
        }
    };

    push(format_args!("AT"));
    push(format_args!("AT+CGDCONT=1,\"IP\",\"{}\"", config.apn));
    push(format_args!("AT+CEREG=1"));
    push(format_args!("AT%XSYSTEMMODE=1,0,0,1"));
    push(format_args!("AT+CFUN=0"));
    push(format_args!("AT+COPS=1,2,\"{}\"", carrier.plmn()));
    push(format_args!("AT+SSRDA=1,1,0"));
    push(format_args!("AT+CFUN=1"));
    push(format_args!("AT%XDATAPRFL=0"));
    push(format_args!("AT+CPSMS=1,\"\",\"\",\"00100110\",\"00000000\""));
    push(format_args!("AT%XPTW=4,\"1111\""));
    push(format_args!("AT+CEDRXS=2,4,\"1010\""));
    script
}

/// Run every command in `script`; returns how many failed.
pub fn run_connect_script(modem: &mut impl ModemPort, script: &Script) -> usize {
    let mut failures = 0;
    for cmd in script {
        info!("> {}", cmd);
        if let Err(e) = modem.command(cmd) {
            warn!("*** {} failed: {}", cmd, e);
            failures += 1;
        }
    }
    if failures > 0 {
        warn!("Attach script finished with {} failed command(s)", failures);
    }
    failures
}
