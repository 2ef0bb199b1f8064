//! Supervisor state machine engine.
//!
//! ```text
//!  ColdStart ─▶ BackoffSleep ─▶ AwaitLink ─▶ Acquire ─▶ Extract ─▶ Encode
//!                                               ▲                    │
//!                                               │                    ▼
//!                                        ScheduledWait ◀─ RearmOrReset ◀─ Transmit
//!
//!  AwaitLink / Transmit / RearmOrReset ──[failure]──▶ Reset (terminal)
//! ```
//!
//! The engine only tracks *where* the supervisor is.  The work for each
//! state is done by [`Supervisor`](crate::app::service::Supervisor), which
//! reports a [`StepEvent`] back; [`states::next_state`] decides where that
//! leads.  Every failure edge is listed there, nowhere else.

pub mod context;
pub mod states;

use log::info;

pub use states::{StepEvent, next_state};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all supervisor states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    ColdStart = 0,
    BackoffSleep = 1,
    AwaitLink = 2,
    Acquire = 3,
    Extract = 4,
    Encode = 5,
    Transmit = 6,
    RearmOrReset = 7,
    ScheduledWait = 8,
    Reset = 9,
}

impl StateId {
    /// Total number of states.
    pub const COUNT: usize = 10;

    /// Convert an index back to `StateId`.  Out-of-range indices map to
    /// `Reset` (debug builds assert).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::ColdStart,
            1 => Self::BackoffSleep,
            2 => Self::AwaitLink,
            3 => Self::Acquire,
            4 => Self::Extract,
            5 => Self::Encode,
            6 => Self::Transmit,
            7 => Self::RearmOrReset,
            8 => Self::ScheduledWait,
            9 => Self::Reset,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Reset
            }
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::ColdStart => "ColdStart",
            Self::BackoffSleep => "BackoffSleep",
            Self::AwaitLink => "AwaitLink",
            Self::Acquire => "Acquire",
            Self::Extract => "Extract",
            Self::Encode => "Encode",
            Self::Transmit => "Transmit",
            Self::RearmOrReset => "RearmOrReset",
            Self::ScheduledWait => "ScheduledWait",
            Self::Reset => "Reset",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Reset)
    }
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// Tracks the current state and applies transitions.
#[derive(Debug)]
pub struct Fsm {
    current: StateId,
    /// Transitions taken since boot.
    transitions: u32,
    /// Times `Acquire` has been entered, i.e. cycles started.
    cycles_started: u32,
}

impl Default for Fsm {
    fn default() -> Self {
        Self::new()
    }
}

impl Fsm {
    pub const fn new() -> Self {
        Self {
            current: StateId::ColdStart,
            transitions: 0,
            cycles_started: 0,
        }
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    pub fn cycles_started(&self) -> u32 {
        self.cycles_started
    }

    /// Apply `event` to the current state; returns `(from, to)`.
    pub fn fire(&mut self, event: StepEvent) -> (StateId, StateId) {
        let from = self.current;
        let to = next_state(from, event);
        if to != from {
            info!("FSM transition: {} -> {} ({:?})", from.name(), to.name(), event);
            self.transitions = self.transitions.wrapping_add(1);
        }
        if to == StateId::Acquire {
            self.cycles_started = self.cycles_started.wrapping_add(1);
        }
        self.current = to;
        (from, to)
    }
}
