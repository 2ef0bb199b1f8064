//! Fuzz target: ranger line reader and batch evaluation
//!
//! Streams arbitrary bytes through the carriage-return line reader, then
//! evaluates whatever parsed as a batch for every ranger model.  Lines
//! must respect their capacity and every reading must respect its band.
//!
//! cargo fuzz run fuzz_ranging_line

#![no_main]

use embedded_hal::delay::DelayNs;
use libfuzzer_sys::fuzz_target;
use waterlevel::ranging::line::{ByteSource, LINE_CAPACITY, read_line};
use waterlevel::ranging::model::SensorModel;
use waterlevel::ranging::{RangingReading, RawBatch, SAMPLE_SLOTS, evaluate_batch};

struct Bytes<'a>(core::slice::Iter<'a, u8>);

impl ByteSource for Bytes<'_> {
    fn poll_byte(&mut self) -> Option<u8> {
        self.0.next().copied()
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

fuzz_target!(|data: &[u8]| {
    let mut src = Bytes(data.iter());
    let mut raw = [0i32; SAMPLE_SLOTS];
    let mut complete = true;

    for slot in &mut raw {
        match read_line(&mut src, &mut NoDelay) {
            Ok(line) => {
                assert!(line.as_bytes().len() <= LINE_CAPACITY);
                *slot = line.value();
            }
            Err(_) => {
                complete = false;
                break;
            }
        }
    }

    let batch = if complete {
        RawBatch::Complete(raw)
    } else {
        RawBatch::TimedOut
    };
    for model in [SensorModel::Mb7389, SensorModel::Mb7388, SensorModel::Mb7051] {
        for reading in evaluate_batch(model, &batch) {
            if let RangingReading::Valid(mm) = reading {
                assert!(model.variant().valid_band().contains(&i32::from(mm)));
            }
        }
    }
});
