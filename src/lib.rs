//! Water level gauge firmware library.
//!
//! Exposes the cycle logic, ports, and adapters for integration testing
//! and for the binary.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod bounded;
pub mod config;
pub mod error;
pub mod fsm;
pub mod link;
pub mod pins;
pub mod ranging;
pub mod record;
pub mod recovery;
pub mod transmit;

// Hardware-facing modules; host builds get the simulation paths.
pub mod adapters;
pub mod drivers;
pub mod sensors;
