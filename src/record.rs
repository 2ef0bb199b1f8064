//! Wire record encoder.
//!
//! One ASCII line per cycle, comma separated, fixed field order:
//!
//! ```text
//!  ts(≤20),iccid(≤19),batt(%04d),temp(%+06.2f),r1,r2,r3,r4,r5(≤4 each),
//!  seq(%010d),band(≤2),plmn(≤7),tac(≤6),cell(≤10),es(≤1),
//!  rsrp(≤3),rsrq(≤3),snr(≤3),variant(0|1),retry(%02d)
//! ```
//!
//! Collectors parse by position, so order and widths are a contract.
//! Missing values become sentinels here and nowhere else:
//!
//! | field       | missing  |
//! |-------------|----------|
//! | timestamp   | `-1,-1`  |
//! | ICCID       | `-1`     |
//! | battery     | `-001`   |
//! | temperature | `+99.00` |
//! | ranging     | `-1` out of range, `-999` timeout |

use core::fmt::Write;

use crate::bounded::{Bounded, truncate};
use crate::link::LinkStatus;
use crate::ranging::model::SensorVariant;
use crate::ranging::{RangingReading, SAMPLE_SLOTS};

pub const RECORD_CAPACITY: usize = 256;

pub type RecordBuf = heapless::String<RECORD_CAPACITY>;

const TIMESTAMP_WIDTH: usize = 20;
const ICCID_WIDTH: usize = 19;
const RANGING_WIDTH: usize = 4;

const MISSING_TIMESTAMP: &str = "-1,-1";
const MISSING_ICCID: &str = "-1";
const MISSING_BATTERY_MV: i16 = -1;
const MISSING_TEMPERATURE_C: f32 = 99.0;
const OUT_OF_RANGE: &str = "-1";
const TIMED_OUT: &str = "-999";

/// Everything measured in one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    pub timestamp: Option<Bounded<20>>,
    pub device_id: Option<Bounded<20>>,
    pub battery_mv: Option<i16>,
    pub temperature_c: Option<f32>,
    pub ranging_mm: [RangingReading; SAMPLE_SLOTS],
    pub sensor_variant: SensorVariant,
    /// Ranging retries beyond the first batch, 0..=9.
    pub retry_count: u8,
}

/// Render one record.  Never fails; oversized fields are truncated.
pub fn encode(sample: &SampleSet, link: &LinkStatus, send_seq: u32) -> RecordBuf {
    let mut out = RecordBuf::new();

    let timestamp = sample
        .timestamp
        .as_ref()
        .map_or(MISSING_TIMESTAMP, Bounded::as_str);
    let iccid = sample
        .device_id
        .as_ref()
        .map_or(MISSING_ICCID, Bounded::as_str);

    // The longest possible record is well under RECORD_CAPACITY.
    let _ = write!(
        out,
        "{},{},{:04},{:+06.2},",
        truncate(timestamp, TIMESTAMP_WIDTH),
        truncate(iccid, ICCID_WIDTH),
        sample.battery_mv.unwrap_or(MISSING_BATTERY_MV),
        sample.temperature_c.unwrap_or(MISSING_TEMPERATURE_C),
    );

    for reading in &sample.ranging_mm {
        let _ = write_reading(&mut out, *reading);
        let _ = out.push(',');
    }

    let _ = write!(
        out,
        "{:010},{},{},{},{},{},{},{},{},{},{:02}",
        send_seq,
        link.band,
        link.plmn,
        link.tac,
        link.cell_id,
        link.energy_eff,
        link.rsrp,
        link.rsrq,
        link.snr,
        sample.sensor_variant.wire_flag(),
        sample.retry_count,
    );
    out
}

fn write_reading(out: &mut RecordBuf, reading: RangingReading) -> core::fmt::Result {
    match reading {
        RangingReading::Valid(mm) => {
            let mut digits: heapless::String<8> = heapless::String::new();
            write!(digits, "{}", mm)?;
            out.push_str(truncate(&digits, RANGING_WIDTH))
                .map_err(|_| core::fmt::Error)
        }
        RangingReading::OutOfRange => out.push_str(OUT_OF_RANGE).map_err(|_| core::fmt::Error),
        RangingReading::Timeout => out.push_str(TIMED_OUT).map_err(|_| core::fmt::Error),
    }
}
