//! Integration tests for the Supervisor → FSM → ports pipeline.
//!
//! Every reset path and the steady-state cycle run against [`MockBoard`],
//! so the tests see exactly which commands, sends, feeds, and tally
//! writes each path produces.

use crate::mock_hw::{COPS_NO_OPERATOR, MockBoard, RecordingSink, expected_record};

use waterlevel::app::events::AppEvent;
use waterlevel::app::service::Supervisor;
use waterlevel::config::DeviceConfig;
use waterlevel::error::{ModemError, TransportError};
use waterlevel::fsm::StateId;
use waterlevel::ranging::model::SensorModel;
use waterlevel::ranging::{RangingOutcome, RangingReading};
use waterlevel::recovery::ResetReason;
use waterlevel::sensors::selector::SelectorSwitches;
use waterlevel::transmit::TransmissionOutcome;

fn config() -> DeviceConfig {
    DeviceConfig {
        transmission_period_secs: 600,
        registration_timeout_secs: 30,
        ..DeviceConfig::default()
    }
}

/// Step until `target` is reached; returns the number of steps taken.
fn step_until(
    sup: &mut Supervisor,
    hw: &mut MockBoard,
    sink: &mut RecordingSink,
    target: StateId,
) -> usize {
    for n in 1..=64 {
        if sup.step(hw, sink) == target {
            return n;
        }
    }
    panic!("never reached {target:?}, stuck in {:?}", sup.state());
}

// ── Steady state ──────────────────────────────────────────────

#[test]
fn first_cycle_sends_record_and_clears_tally() {
    let mut hw = MockBoard::healthy().with_tally(2);
    let mut sink = RecordingSink::new();
    let mut sup = Supervisor::new(config());

    let steps = step_until(&mut sup, &mut hw, &mut sink, StateId::ScheduledWait);
    assert_eq!(steps, 8, "ColdStart through RearmOrReset");

    assert_eq!(hw.sent, vec![expected_record(1)]);
    assert_eq!(hw.opened, vec![(config().server_address.to_string(), config().server_port)]);

    // Two backoff minutes, each fed, one feed after registration, one at re-arm.
    assert_eq!(hw.minute_delays(), 2);
    assert_eq!(hw.feeds, 4);
    assert_eq!(hw.tally.tally, 0);
    assert_eq!(hw.tally.writes, vec![0]);

    assert_eq!(sink.events[0], AppEvent::Started { trip_tally: 2 });
    assert!(sink.contains(&AppEvent::Backoff {
        trip_tally: 2,
        minutes: 2
    }));
    assert!(sink.contains(&AppEvent::CycleComplete { send_seq: 1 }));
    assert_eq!(sup.send_sequence(), 2);
    assert_eq!(sup.context().cycles_completed, 1);
}

#[test]
fn attach_runs_once_and_cycles_repeat_after_one_period() {
    let mut hw = MockBoard::healthy();
    let mut sink = RecordingSink::new();
    let mut sup = Supervisor::new(config());

    step_until(&mut sup, &mut hw, &mut sink, StateId::ScheduledWait);
    assert_eq!(sup.step(&mut hw, &mut sink), StateId::Acquire);
    assert_eq!(hw.delays.last(), Some(&600_000));

    step_until(&mut sup, &mut hw, &mut sink, StateId::ScheduledWait);
    assert_eq!(hw.sent, vec![expected_record(1), expected_record(2)]);

    let attaches = hw.commands.iter().filter(|c| *c == "AT+CFUN=1").count();
    assert_eq!(attaches, 1);
    assert_eq!(hw.opened.len(), 1);
    assert_eq!(hw.sensors.acquisitions, vec![SensorModel::Mb7388; 2]);
}

#[test]
fn attach_script_targets_selected_carrier() {
    let mut hw = MockBoard::healthy();
    hw.sensors.selectors = SelectorSwitches {
        sw0: true,
        sw3: true,
        ..SelectorSwitches::default()
    };
    let mut sink = RecordingSink::new();
    let mut sup = Supervisor::new(config());

    step_until(&mut sup, &mut hw, &mut sink, StateId::Extract);
    assert!(hw.commands.iter().any(|c| c == "AT+COPS=1,2,\"44010\""));
    assert!(hw.commands.iter().any(|c| c.starts_with("AT+CGDCONT=1,\"IP\",")));
    assert_eq!(hw.sensors.acquisitions, vec![SensorModel::Mb7051]);
}

#[test]
fn degraded_cycle_still_sends_sentinels() {
    let mut hw = MockBoard::healthy()
        .reply("AT+CCLK?", Err(ModemError::Timeout))
        .reply("AT%XICCID", Err(ModemError::CommandFailed));
    hw.sensors.ranging = RangingOutcome {
        readings: [RangingReading::Timeout; 5],
        attempts: 10,
        quorum_met: false,
    };
    hw.sensors.battery_mv = None;
    hw.sensors.temperature_c = None;
    let mut sink = RecordingSink::new();
    let mut sup = Supervisor::new(config());

    step_until(&mut sup, &mut hw, &mut sink, StateId::ScheduledWait);
    assert_eq!(
        hw.sent[0],
        "-1,-1,-1,-001,+99.00,-999,-999,-999,-999,-999,0000000001,20,\"44020\",\
         \"1A2B\",\"00E1C13B\",7,49,25,21,1,09"
    );
}

#[test]
fn failed_operator_query_counts_as_connected() {
    let mut hw = MockBoard::healthy().reply("AT+COPS?", Err(ModemError::Timeout));
    let mut sink = RecordingSink::new();
    let mut sup = Supervisor::new(config());

    step_until(&mut sup, &mut hw, &mut sink, StateId::ScheduledWait);
    assert!(sink.contains(&AppEvent::CycleComplete { send_seq: 1 }));
}

// ── Reset paths ───────────────────────────────────────────────

#[test]
fn registration_timeout_counts_a_trip() {
    let mut hw = MockBoard::healthy().with_tally(1);
    hw.registrations.clear();
    let mut sink = RecordingSink::new();
    let mut sup = Supervisor::new(DeviceConfig {
        registration_timeout_secs: 1,
        ..config()
    });

    let reason = sup.run(&mut hw, &mut sink);
    assert_eq!(reason, ResetReason::RegistrationTimeout);
    assert_eq!(sup.state(), StateId::Reset);
    assert_eq!(hw.tally.writes, vec![2]);
    assert_eq!(hw.minute_delays(), 1);
    assert!(hw.opened.is_empty());
    assert!(hw.sent.is_empty());
    assert_eq!(
        sink.events.last(),
        Some(&AppEvent::ResetRequested(ResetReason::RegistrationTimeout))
    );
}

#[test]
fn tally_past_backoff_table_restarts_at_zero() {
    let mut hw = MockBoard::healthy().with_tally(7);
    hw.registrations.clear();
    let mut sink = RecordingSink::new();
    let mut sup = Supervisor::new(DeviceConfig {
        registration_timeout_secs: 1,
        ..config()
    });

    sup.run(&mut hw, &mut sink);
    assert_eq!(hw.tally.writes, vec![0, 1]);
    assert_eq!(hw.minute_delays(), 0);
}

#[test]
fn backoff_feeds_before_each_minute() {
    let mut hw = MockBoard::healthy().with_tally(2);
    let mut sink = RecordingSink::new();
    let mut sup = Supervisor::new(config());

    step_until(&mut sup, &mut hw, &mut sink, StateId::AwaitLink);
    assert_eq!(hw.delays, vec![60_000, 60_000]);
    assert_eq!(hw.feeds_at_delay, vec![1, 2]);
}

#[test]
fn three_send_failures_reset_without_a_trip() {
    let mut hw = MockBoard::healthy();
    hw.fail_every_send = true;
    let mut sink = RecordingSink::new();
    let mut sup = Supervisor::new(config());

    let reason = sup.run(&mut hw, &mut sink);
    assert_eq!(reason, ResetReason::SendFailures);
    assert_eq!(hw.sent.len(), 3);
    assert_eq!(hw.tally.tally, 0);
    assert!(hw.tally.writes.iter().all(|&t| t == 0));
    // Registration, two re-arms, then the feed before the reset.
    assert_eq!(hw.feeds, 4);

    let failures: Vec<u8> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Transmitted {
                outcome: TransmissionOutcome::SendFailed,
                consecutive_failures,
                ..
            } => Some(*consecutive_failures),
            _ => None,
        })
        .collect();
    assert_eq!(failures, vec![1, 2, 3]);
}

#[test]
fn a_success_between_failures_resets_the_count() {
    let mut hw = MockBoard::healthy();
    hw.send_results = [
        Err(TransportError::SendFailed),
        Err(TransportError::SendFailed),
        Ok(100),
        Err(TransportError::SendFailed),
        Err(TransportError::SendFailed),
    ]
    .into();
    let mut sink = RecordingSink::new();
    let mut sup = Supervisor::new(config());

    for _ in 0..5 {
        step_until(&mut sup, &mut hw, &mut sink, StateId::ScheduledWait);
    }
    assert_eq!(sup.context().recovery.transmission.consecutive_failures(), 2);
    assert!(sup.context().reset_reason.is_none());
}

#[test]
fn operator_lost_after_send_resets_without_a_trip() {
    let mut hw = MockBoard::healthy()
        .with_tally(1)
        .reply("AT+COPS?", Ok(COPS_NO_OPERATOR));
    let mut sink = RecordingSink::new();
    let mut sup = Supervisor::new(config());

    let reason = sup.run(&mut hw, &mut sink);
    assert_eq!(reason, ResetReason::LinkLost);
    assert_eq!(hw.sent.len(), 1);
    assert_eq!(hw.tally.tally, 1);
    assert!(hw.tally.writes.is_empty());
}

#[test]
fn socket_failure_resets_without_a_trip() {
    let mut hw = MockBoard::healthy().with_tally(3);
    hw.open_result = Err(TransportError::SocketOpenFailed);
    let mut sink = RecordingSink::new();
    let mut sup = Supervisor::new(config());

    let reason = sup.run(&mut hw, &mut sink);
    assert_eq!(reason, ResetReason::TransportSetup);
    assert_eq!(hw.minute_delays(), 4);
    assert!(hw.sent.is_empty());
    assert!(hw.tally.writes.is_empty());
}

#[test]
fn reset_is_terminal() {
    let mut hw = MockBoard::healthy();
    hw.registrations.clear();
    let mut sink = RecordingSink::new();
    let mut sup = Supervisor::new(DeviceConfig {
        registration_timeout_secs: 1,
        ..config()
    });

    sup.run(&mut hw, &mut sink);
    let events = sink.events.len();
    assert_eq!(sup.step(&mut hw, &mut sink), StateId::Reset);
    assert_eq!(sink.events.len(), events);
}
