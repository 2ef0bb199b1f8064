//! Reset-surviving trip tally in RTC no-init memory.
//!
//! ESP-IDF leaves `.rtc_noinit` untouched across software, panic and
//! watchdog resets, but its contents are garbage after power-on.  The tally
//! is therefore paired with a magic word: if the magic does not match, the
//! memory was never written since power-up and the tally reads as 0.
//!
//! Only plain loads and stores are used on these cells so the watchdog ISR
//! hook can touch them without taking a lock.

use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use log::debug;

use crate::app::ports::TripStore;

/// Marks the tally cell as written since power-up ("WLG1").
const TALLY_MAGIC: u32 = 0x574C_4731;

#[cfg_attr(target_os = "espidf", unsafe(link_section = ".rtc_noinit"))]
static TRIP_TALLY: AtomicU8 = AtomicU8::new(0);

#[cfg_attr(target_os = "espidf", unsafe(link_section = ".rtc_noinit"))]
static TRIP_MAGIC: AtomicU32 = AtomicU32::new(0);

fn read_tally() -> u8 {
    if TRIP_MAGIC.load(Ordering::Acquire) == TALLY_MAGIC {
        TRIP_TALLY.load(Ordering::Relaxed)
    } else {
        0
    }
}

fn write_tally(tally: u8) {
    TRIP_TALLY.store(tally, Ordering::Relaxed);
    TRIP_MAGIC.store(TALLY_MAGIC, Ordering::Release);
}

/// Count one watchdog trip.  Called from the task-watchdog ISR right
/// before the panic reset, so it must not log or allocate.
pub fn record_watchdog_trip() {
    write_tally(read_tally().saturating_add(1));
}

/// [`TripStore`] backed by the retained cells above.
///
/// Every instance views the same memory; the binary creates exactly one.
pub struct RetainedTally {
    _private: (),
}

impl RetainedTally {
    pub fn new() -> Self {
        let tally = read_tally();
        debug!("RetainedTally: boot value {}", tally);
        Self { _private: () }
    }
}

impl Default for RetainedTally {
    fn default() -> Self {
        Self::new()
    }
}

impl TripStore for RetainedTally {
    fn load_tally(&self) -> u8 {
        read_tally()
    }

    fn store_tally(&mut self, tally: u8) {
        write_tally(tally);
    }
}
