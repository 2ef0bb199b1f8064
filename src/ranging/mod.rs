//! Fault-tolerant ultrasonic ranging acquisition.
//!
//! One acquisition powers the ranger, lets it print its boot banner, then
//! reads batches of 13 lines until a batch has a quorum of valid samples
//! or ten batches have been tried.
//!
//! ```text
//!  power on ─▶ settle 170 ms ─▶ ┌─ read 13 lines ──────────────┐
//!                               │  any line timeout → Timeout×5│
//!                               │  MB7051: lines 8–12 × 10     │
//!                               │  band check lines 8–12       │
//!                               └──────────────┬───────────────┘
//!                       invalid ≥ 3 && attempt < 10 │ retry
//!                                                   ▼
//!                                         power off (always)
//! ```
//!
//! Only the last five lines of a batch are samples; the first eight give
//! the ranger's filter time to settle.

pub mod line;
pub mod model;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};

use line::{ByteSource, read_line};
use model::{SensorModel, SensorVariant};

/// Lines read per batch.
pub const LINES_PER_BATCH: usize = 13;
/// Trailing lines of a batch that count as samples.
pub const SAMPLE_SLOTS: usize = 5;
/// Index of the first sample line.
pub const FIRST_SAMPLE_LINE: usize = LINES_PER_BATCH - SAMPLE_SLOTS;
/// Boot-banner settle time after power-on.
pub const SETTLE_MS: u32 = 170;
/// Batches tried before the last one is accepted as-is.
pub const MAX_ATTEMPTS: u8 = 10;
/// A batch with this many invalid samples is rejected.
pub const REJECT_INVALID_COUNT: usize = 3;
/// Largest centimetre reading that still scales to a distance.
pub const LONG_RANGE_MAX_RAW_CM: i32 = 999;

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// A single distance sample after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangingReading {
    /// In-band distance in millimetres.
    Valid(u16),
    /// Parsed, but outside the variant's band (or overflowed scaling).
    OutOfRange,
    /// The batch timed out before this sample was read.
    Timeout,
}

impl RangingReading {
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// What one batch read produced, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawBatch {
    /// All 13 lines arrived; these are the parsed values of lines 8–12.
    Complete([i32; SAMPLE_SLOTS]),
    /// A line timed out; the whole batch is void.
    TimedOut,
}

/// Result of a full acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangingOutcome {
    pub readings: [RangingReading; SAMPLE_SLOTS],
    /// Batches read, 1..=MAX_ATTEMPTS.
    pub attempts: u8,
    /// False if the final batch was accepted only because attempts ran out.
    pub quorum_met: bool,
}

impl RangingOutcome {
    /// Retries beyond the first batch (0..=9).
    pub fn retry_count(&self) -> u8 {
        self.attempts.saturating_sub(1)
    }

    pub fn invalid_count(&self) -> usize {
        invalid_count(&self.readings)
    }
}

// ---------------------------------------------------------------------------
// Pure batch logic
// ---------------------------------------------------------------------------

/// Centimetres to millimetres for the long-form ranger.  `None` when the
/// raw value exceeds [`LONG_RANGE_MAX_RAW_CM`] (the ranger's "no target").
pub fn scale_cm_to_mm(cm: i32) -> Option<i32> {
    if cm > LONG_RANGE_MAX_RAW_CM {
        None
    } else {
        Some(cm.saturating_mul(10))
    }
}

/// Check one millimetre value against the variant's band.
pub fn validate(variant: SensorVariant, mm: i32) -> RangingReading {
    if variant.valid_band().contains(&mm) {
        // The widest band tops out at 9998, well inside u16.
        RangingReading::Valid(mm as u16)
    } else {
        RangingReading::OutOfRange
    }
}

/// Turn a raw batch into validated readings for `model`.
pub fn evaluate_batch(model: SensorModel, batch: &RawBatch) -> [RangingReading; SAMPLE_SLOTS] {
    let RawBatch::Complete(raw) = batch else {
        return [RangingReading::Timeout; SAMPLE_SLOTS];
    };

    let variant = model.variant();
    raw.map(|value| {
        let mm = if model.reports_centimetres() {
            scale_cm_to_mm(value)
        } else {
            Some(value)
        };
        match mm {
            Some(mm) => validate(variant, mm),
            None => RangingReading::OutOfRange,
        }
    })
}

pub fn invalid_count(readings: &[RangingReading; SAMPLE_SLOTS]) -> usize {
    readings.iter().filter(|r| !r.is_valid()).count()
}

/// Run the quorum/retry loop over an arbitrary batch source.
///
/// `read_batch` receives the 1-based attempt number.
pub fn acquire_with(
    model: SensorModel,
    mut read_batch: impl FnMut(u8) -> RawBatch,
) -> RangingOutcome {
    let mut attempts: u8 = 0;
    loop {
        attempts += 1;
        info!("Ranging attempt {}/{}", attempts, MAX_ATTEMPTS);

        let batch = read_batch(attempts);
        let readings = evaluate_batch(model, &batch);
        let invalid = invalid_count(&readings);

        if invalid < REJECT_INVALID_COUNT {
            info!("Ranging OK ({} invalid of {})", invalid, SAMPLE_SLOTS);
            return RangingOutcome {
                readings,
                attempts,
                quorum_met: true,
            };
        }

        warn!("Ranging batch rejected ({} invalid of {})", invalid, SAMPLE_SLOTS);
        if attempts >= MAX_ATTEMPTS {
            warn!("Ranging gave up after {} attempts, keeping last batch", attempts);
            return RangingOutcome {
                readings,
                attempts,
                quorum_met: false,
            };
        }
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// MaxBotix ranger on a switched supply rail and a receive-only UART.
pub struct RangeFinder<U, P, D> {
    uart: U,
    power: P,
    start: P,
    delay: D,
}

impl<U, P, D> RangeFinder<U, P, D>
where
    U: ByteSource,
    P: OutputPin,
    D: DelayNs,
{
    pub fn new(uart: U, power: P, start: P, delay: D) -> Self {
        Self {
            uart,
            power,
            start,
            delay,
        }
    }

    /// Power the ranger, acquire a batch set, and power it down again.
    pub fn acquire(&mut self, model: SensorModel) -> RangingOutcome {
        let Self {
            uart,
            power,
            start,
            delay,
        } = self;

        let _rail = PoweredRanger::on(power, start);
        delay.delay_ms(SETTLE_MS);

        acquire_with(model, |_| read_batch(uart, delay))
        // `_rail` drops here and de-powers the ranger on every path.
    }
}

fn read_batch(uart: &mut impl ByteSource, delay: &mut impl DelayNs) -> RawBatch {
    let mut samples = [0i32; SAMPLE_SLOTS];
    for index in 0..LINES_PER_BATCH {
        let Ok(line) = read_line(uart, delay) else {
            warn!("Ranger line {} timed out, batch void", index);
            return RawBatch::TimedOut;
        };
        debug!("ranger [{:02}] {}", index, line);
        if let Some(slot) = index.checked_sub(FIRST_SAMPLE_LINE) {
            samples[slot] = line.value();
        }
    }
    RawBatch::Complete(samples)
}

/// Holds the ranger supply on; releases it when dropped.
struct PoweredRanger<'a, P: OutputPin> {
    power: &'a mut P,
    start: &'a mut P,
}

impl<'a, P: OutputPin> PoweredRanger<'a, P> {
    fn on(power: &'a mut P, start: &'a mut P) -> Self {
        let powered = power.set_high();
        let started = start.set_high();
        if powered.is_err() || started.is_err() {
            warn!("Ranger power-on pin write failed");
        }
        Self { power, start }
    }
}

impl<P: OutputPin> Drop for PoweredRanger<'_, P> {
    fn drop(&mut self) {
        // Both writes run even if the first fails; the rail must drop.
        let stopped = self.start.set_low();
        let unpowered = self.power.set_low();
        if stopped.is_err() || unpowered.is_err() {
            warn!("Ranger power-off pin write failed");
        }
    }
}
