//! End-to-end tests through the real serial modem adapter.
//!
//! The supervisor drives a [`HardwareAdapter`] whose modem is a
//! [`SerialModem`] on a scripted UART, so AT framing, URC routing, socket
//! setup, and hex-encoded sends are all exercised together.

use crate::mock_hw::{
    CLOCK, CONEVAL, FixedSensors, ICCID, MONITOR, MemoryTally, NoopDelay, RecordingSink,
    ScriptedUart, decode_send, expected_record,
};

use waterlevel::adapters::hardware::HardwareAdapter;
use waterlevel::adapters::modem::SerialModem;
use waterlevel::app::ports::{ModemPort, TripStore};
use waterlevel::app::service::Supervisor;
use waterlevel::config::DeviceConfig;
use waterlevel::drivers::watchdog::Watchdog;
use waterlevel::fsm::StateId;
use waterlevel::link::registration::{RegistrationStatus, await_registration};
use waterlevel::link::{query_identity, query_link};
use waterlevel::recovery::ResetReason;

type Board = HardwareAdapter<FixedSensors, SerialModem<ScriptedUart>, Watchdog, MemoryTally, NoopDelay>;

fn board(uart: ScriptedUart, tally: u8) -> Board {
    HardwareAdapter::new(
        FixedSensors::default(),
        SerialModem::new(uart),
        Watchdog::arm(630_000),
        MemoryTally {
            tally,
            writes: Vec::new(),
        },
        NoopDelay::default(),
    )
}

fn healthy_replies() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "AT+CFUN=1",
            "OK\r\n+CEREG: 2\r\n+CEREG: 5,\"1A2B\",\"00E1C13B\",7\r\n",
        ),
        ("AT#XSOCKET=1", "#XSOCKET: 0,2,17\r\nOK\r\n"),
        ("AT#XCONNECT", "#XCONNECT: 1\r\nOK\r\n"),
        ("AT%XMONITOR", leak(format!("\r\n{MONITOR}\r\n\r\nOK\r\n"))),
        ("AT%CONEVAL", leak(format!("{CONEVAL}\r\nOK\r\n"))),
        ("AT+CCLK?", leak(format!("{CLOCK}\r\nOK\r\n"))),
        ("AT%XICCID", leak(format!("{ICCID}\r\nOK\r\n"))),
        ("AT+COPS?", "+COPS: 1,2,\"44020\"\r\nOK\r\n"),
    ]
}

fn leak(s: String) -> &'static str {
    Box::leak(s.into_boxed_str())
}

#[test]
fn full_cycle_over_serial_modem() {
    let uart = ScriptedUart::new(healthy_replies());
    let log = uart.log.clone();
    let mut hw = board(uart, 0);
    let mut sink = RecordingSink::new();
    let mut sup = Supervisor::new(DeviceConfig::default());

    for _ in 0..8 {
        sup.step(&mut hw, &mut sink);
    }
    assert_eq!(sup.state(), StateId::ScheduledWait);

    let log = log.borrow();
    let send = log
        .iter()
        .find(|c| c.starts_with("AT#XSEND"))
        .expect("record was sent");
    assert_eq!(decode_send(send).as_deref(), Some(expected_record(1).as_str()));

    // Attach script first, operator check last.
    assert_eq!(log.first().map(String::as_str), Some("AT"));
    assert_eq!(log.last().map(String::as_str), Some("AT+COPS?"));
    // One feed after registration, one at re-arm.
    assert_eq!(hw.watchdog().feeds(), 2);
    assert_eq!(hw.load_tally(), 0);
}

#[test]
fn silent_network_times_out_and_counts_a_trip() {
    let uart = ScriptedUart::new(vec![("AT+CFUN=1", "OK\r\n+CEREG: 2\r\n")]);
    let mut hw = board(uart, 0);
    let mut sink = RecordingSink::new();
    let mut sup = Supervisor::new(DeviceConfig {
        registration_timeout_secs: 1,
        ..DeviceConfig::default()
    });

    assert_eq!(sup.run(&mut hw, &mut sink), ResetReason::RegistrationTimeout);
    assert_eq!(hw.load_tally(), 1);
    assert!(!hw.modem().is_socket_open());
}

#[test]
fn registration_wait_sees_urc_delivered_between_commands() {
    let uart = ScriptedUart::new(vec![("AT+CFUN=1", "OK\r\n+CEREG: 1,\"1A2B\",\"00E1C13B\",7\r\n")]);
    let mut hw = board(uart, 0);

    hw.command("AT+CFUN=1").unwrap();
    assert!(await_registration(&mut hw, 1_000).is_ok());
    assert_eq!(hw.take_registration(), None::<RegistrationStatus>);
}

#[test]
fn failing_queries_fall_back_to_defaults() {
    let uart = ScriptedUart::new(vec![
        ("AT%XMONITOR", "ERROR\r\n"),
        ("AT%CONEVAL", "%CONEVAL: 7\r\nOK\r\n"),
        ("AT+CCLK?", "+CME ERROR: 8\r\n"),
        ("AT%XICCID", "%XICCID: 8981\r\nOK\r\n"),
    ]);
    let mut hw = board(uart, 0);

    let link = query_link(&mut hw);
    assert!(link.plmn.is_empty());
    assert_eq!(link.rsrp.as_str(), "255");
    assert_eq!(link.snr.as_str(), "127");

    let id = query_identity(&mut hw);
    assert!(id.timestamp.is_none());
    assert_eq!(id.iccid.as_ref().map(|i| i.as_str()), Some("8981"));
}
