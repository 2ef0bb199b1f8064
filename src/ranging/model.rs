//! Ranger models, range classes, and the selector truth table.
//!
//! ```text
//!   SW3  SW2 │ model   │ output │ class
//!   ─────────┼─────────┼────────┼───────────────
//!   off  off │ MB7389  │ mm     │ Short5m  (300..=4999)
//!   off  on  │ MB7388  │ mm     │ Long10m  (500..=9998)
//!   on   off │ MB7051  │ cm ×10 │ Long10m
//!   on   on  │ MB7051  │ cm ×10 │ Long10m
//! ```
//!
//! SW3 wins when both are on: the centimetre scaling follows SW3 alone.

use core::ops::RangeInclusive;

use crate::sensors::selector::SelectorSwitches;

/// Range class reported in the wire record (`0` = 5 m, `1` = 10 m).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorVariant {
    Short5m,
    Long10m,
}

impl SensorVariant {
    /// Valid distance band in millimetres.
    pub const fn valid_band(self) -> RangeInclusive<i32> {
        match self {
            Self::Short5m => 300..=4999,
            Self::Long10m => 500..=9998,
        }
    }

    pub const fn wire_flag(self) -> u8 {
        match self {
            Self::Short5m => 0,
            Self::Long10m => 1,
        }
    }
}

/// Physical ranger fitted to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorModel {
    /// 5 m, millimetre output.
    Mb7389,
    /// 10 m short-form, millimetre output.
    Mb7388,
    /// 10 m long-form, centimetre output.
    Mb7051,
}

impl SensorModel {
    pub fn from_switches(sw: &SelectorSwitches) -> Self {
        match (sw.sw3, sw.sw2) {
            (true, _) => Self::Mb7051,
            (false, true) => Self::Mb7388,
            (false, false) => Self::Mb7389,
        }
    }

    pub const fn variant(self) -> SensorVariant {
        match self {
            Self::Mb7389 => SensorVariant::Short5m,
            Self::Mb7388 | Self::Mb7051 => SensorVariant::Long10m,
        }
    }

    /// True if raw readings are centimetres and need scaling to mm.
    pub const fn reports_centimetres(self) -> bool {
        matches!(self, Self::Mb7051)
    }
}
