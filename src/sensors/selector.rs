//! Four-position DIP selector.
//!
//! Switches pull their GPIO to ground when ON, so a low level reads as
//! `true`.  SW0/SW1 pick the carrier, SW2/SW3 the ranger model.  The bank
//! is sampled once at boot; the board must be power-cycled to change it.

use embedded_hal::digital::InputPin;
use log::{info, warn};

/// Logical switch positions (`true` = ON).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectorSwitches {
    pub sw0: bool,
    pub sw1: bool,
    pub sw2: bool,
    pub sw3: bool,
}

impl SelectorSwitches {
    /// From raw pin levels (`true` = high), active-low.
    pub const fn from_levels(levels: [bool; 4]) -> Self {
        Self {
            sw0: !levels[0],
            sw1: !levels[1],
            sw2: !levels[2],
            sw3: !levels[3],
        }
    }
}

/// Bank of four selector inputs, SW0 first.
pub struct DipSwitches<P> {
    pins: [P; 4],
}

impl<P: InputPin> DipSwitches<P> {
    pub fn new(pins: [P; 4]) -> Self {
        Self { pins }
    }

    /// Sample all four switches.  A pin that fails to read counts as OFF.
    pub fn read(&mut self) -> SelectorSwitches {
        let mut levels = [true; 4];
        for (i, pin) in self.pins.iter_mut().enumerate() {
            match pin.is_high() {
                Ok(high) => levels[i] = high,
                Err(_) => warn!("SW{} read failed, treating as OFF", i),
            }
        }
        let sw = SelectorSwitches::from_levels(levels);
        info!(
            "Selectors: SW0={} SW1={} SW2={} SW3={}",
            u8::from(sw.sw0),
            u8::from(sw.sw1),
            u8::from(sw.sw2),
            u8::from(sw.sw3)
        );
        sw
    }
}
