//! Application core: the periodic measure-and-report cycle.
//!
//! The [`service::Supervisor`] walks the [`fsm`](crate::fsm) states,
//! doing each state's work through the **port traits** in [`ports`].
//! Nothing here touches a peripheral, so the whole cycle (including every
//! reset path) runs on the host against mock ports.

pub mod events;
pub mod ports;
pub mod service;
