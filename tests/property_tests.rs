//! Property tests for the cycle's pure logic.
//!
//! Runs on host (x86_64) only — proptest is not available for ESP32 targets.
//! On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use proptest::prelude::*;

use waterlevel::bounded::Bounded;
use waterlevel::link::LinkStatus;
use waterlevel::link::response::{Charset, MAX_FIELDS, scan_prefixed, tokenize};
use waterlevel::ranging::model::{SensorModel, SensorVariant};
use waterlevel::ranging::{
    LONG_RANGE_MAX_RAW_CM, MAX_ATTEMPTS, RawBatch, RangingReading, REJECT_INVALID_COUNT,
    SAMPLE_SLOTS, acquire_with, evaluate_batch, invalid_count, scale_cm_to_mm, validate,
};
use waterlevel::record::{RECORD_CAPACITY, SampleSet, encode};
use waterlevel::recovery::{BACKOFF_TABLE, MAX_TRIP_TALLY, TripTally};
use waterlevel::transmit::{Escalation, SEND_FAILURE_LIMIT, TransmissionOutcome, TransmissionPolicy};

fn model() -> impl Strategy<Value = SensorModel> {
    prop_oneof![
        Just(SensorModel::Mb7389),
        Just(SensorModel::Mb7388),
        Just(SensorModel::Mb7051),
    ]
}

fn batch() -> impl Strategy<Value = RawBatch> {
    prop_oneof![
        1 => Just(RawBatch::TimedOut),
        4 => prop::array::uniform5(-50i32..12_000).prop_map(RawBatch::Complete),
    ]
}

fn reading() -> impl Strategy<Value = RangingReading> {
    prop_oneof![
        (0u16..=9998).prop_map(RangingReading::Valid),
        Just(RangingReading::OutOfRange),
        Just(RangingReading::Timeout),
    ]
}

// ── Ranging quorum / retry ────────────────────────────────────

proptest! {
    /// Attempts stop at the first acceptable batch and never exceed the cap;
    /// the kept readings are those of the last batch read.
    #[test]
    fn retry_stops_at_first_quorum(
        model in model(),
        batches in prop::collection::vec(batch(), MAX_ATTEMPTS as usize),
    ) {
        let outcome = acquire_with(model, |n| batches[usize::from(n) - 1]);

        prop_assert!(outcome.attempts >= 1 && outcome.attempts <= MAX_ATTEMPTS);
        let last = &batches[usize::from(outcome.attempts) - 1];
        prop_assert_eq!(outcome.readings, evaluate_batch(model, last));

        let first_ok = batches
            .iter()
            .position(|b| invalid_count(&evaluate_batch(model, b)) < REJECT_INVALID_COUNT);
        match first_ok {
            Some(i) => {
                prop_assert!(outcome.quorum_met);
                prop_assert_eq!(usize::from(outcome.attempts), i + 1);
            }
            None => {
                prop_assert!(!outcome.quorum_met);
                prop_assert_eq!(outcome.attempts, MAX_ATTEMPTS);
            }
        }
        prop_assert_eq!(outcome.retry_count(), outcome.attempts - 1);
    }

    /// A timed-out batch is entirely `Timeout`, never `OutOfRange`.
    #[test]
    fn timed_out_batch_is_all_timeout(model in model()) {
        let readings = evaluate_batch(model, &RawBatch::TimedOut);
        prop_assert_eq!(readings, [RangingReading::Timeout; SAMPLE_SLOTS]);
    }
}

// ── Scaling and bands ─────────────────────────────────────────

proptest! {
    #[test]
    fn centimetres_scale_by_ten_up_to_the_limit(cm in -1000i32..5000) {
        match scale_cm_to_mm(cm) {
            Some(mm) => {
                prop_assert!(cm <= LONG_RANGE_MAX_RAW_CM);
                prop_assert_eq!(mm, cm * 10);
            }
            None => prop_assert!(cm > LONG_RANGE_MAX_RAW_CM),
        }
    }

    #[test]
    fn validation_follows_variant_band(mm in -100i32..20_000) {
        for variant in [SensorVariant::Short5m, SensorVariant::Long10m] {
            let valid = validate(variant, mm).is_valid();
            prop_assert_eq!(valid, variant.valid_band().contains(&mm));
            if valid {
                prop_assert_eq!(validate(variant, mm), RangingReading::Valid(mm as u16));
            }
        }
    }

    /// MB7051 readings come out in millimetres: every valid value is a
    /// multiple of ten.
    #[test]
    fn long_form_readings_are_whole_centimetres(raw in prop::array::uniform5(0i32..1200)) {
        let readings = evaluate_batch(SensorModel::Mb7051, &RawBatch::Complete(raw));
        for (r, cm) in readings.iter().zip(raw) {
            if let RangingReading::Valid(mm) = r {
                prop_assert_eq!(i32::from(*mm), cm * 10);
            }
        }
    }
}

// ── Backoff ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn backoff_comes_from_the_table(raw in any::<u8>()) {
        let tally = TripTally::new(raw).clamped();
        prop_assert!(tally.get() <= MAX_TRIP_TALLY);
        if raw > MAX_TRIP_TALLY {
            prop_assert_eq!(tally.get(), 0);
        } else {
            prop_assert_eq!(tally.get(), raw);
        }
        prop_assert_eq!(tally.backoff_minutes(), BACKOFF_TABLE[usize::from(tally.get())]);
    }
}

// ── Escalation ────────────────────────────────────────────────

proptest! {
    /// Reset is requested exactly when the run of failures since the last
    /// success reaches the limit.
    #[test]
    fn escalation_tracks_consecutive_failures(outcomes in prop::collection::vec(any::<bool>(), 0..40)) {
        let mut policy = TransmissionPolicy::default();
        let mut run: u8 = 0;
        for ok in outcomes {
            let outcome = if ok { TransmissionOutcome::Sent } else { TransmissionOutcome::SendFailed };
            run = if ok { 0 } else { run.saturating_add(1) };
            let escalation = policy.record(outcome);
            prop_assert_eq!(policy.consecutive_failures(), run);
            let expected = if run >= SEND_FAILURE_LIMIT { Escalation::Reset } else { Escalation::Continue };
            prop_assert_eq!(escalation, expected);
        }
    }
}

// ── Response parsing ──────────────────────────────────────────

proptest! {
    #[test]
    fn tokenizer_keeps_positions(payload in "[A-Za-z0-9\",-]{0,80}") {
        let fields = tokenize(&payload);
        prop_assert!(fields.len() <= MAX_FIELDS);
        prop_assert!(!fields.is_empty());
        if payload.split(',').count() <= MAX_FIELDS {
            prop_assert_eq!(fields.join(","), payload.as_str());
        }
    }

    #[test]
    fn scan_respects_charset_and_bound(body in ".{0,200}", max in 1usize..64) {
        let response = format!("junk\n%XMONITOR: {body}\nOK");
        if let Some(found) = scan_prefixed(&response, "%XMONITOR: ", Charset::Field, max) {
            prop_assert!(!found.is_empty());
            prop_assert!(found.chars().count() <= max);
            prop_assert!(found.chars().all(|c| Charset::Field.accepts(c)));
        }
    }
}

// ── Record shape ──────────────────────────────────────────────

proptest! {
    /// Whatever was measured, the record has the same number of fields and
    /// fits its buffer.
    #[test]
    fn record_shape_is_fixed(
        readings in prop::array::uniform5(reading()),
        battery in prop::option::of(any::<i16>()),
        temperature in prop::option::of(-60.0f32..150.0),
        retry in 0u8..10,
        seq in any::<u32>(),
        iccid in prop::option::of("[0-9]{1,22}"),
    ) {
        let sample = SampleSet {
            timestamp: None,
            device_id: iccid.as_deref().map(Bounded::truncated),
            battery_mv: battery,
            temperature_c: temperature,
            ranging_mm: readings,
            sensor_variant: SensorVariant::Long10m,
            retry_count: retry,
        };
        let rec = encode(&sample, &LinkStatus::default(), seq);
        prop_assert!(rec.len() < RECORD_CAPACITY);
        prop_assert_eq!(rec.split(',').count(), 21);
        let suffix = format!(",1,{retry:02}");
        prop_assert!(rec.ends_with(&suffix));
    }
}
