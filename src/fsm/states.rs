//! Transition table.
//!
//! Each supervisor step ends in a [`StepEvent`].  `Done` advances along
//! the cycle; every other event names a failure and is only legal in the
//! state that can produce it:
//!
//! | state          | event                   | reset reason          |
//! |----------------|-------------------------|-----------------------|
//! | `AwaitLink`    | `RegistrationTimedOut`  | `RegistrationTimeout` |
//! | `AwaitLink`    | `SocketFailed`          | `TransportSetup`      |
//! | `Transmit`     | `SendLimitReached`      | `SendFailures`        |
//! | `RearmOrReset` | `NotRegistered`         | `LinkLost`            |

use super::StateId;
use crate::recovery::ResetReason;

/// Outcome of running one state's action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    Done,
    RegistrationTimedOut,
    SocketFailed,
    SendLimitReached,
    NotRegistered,
}

impl StepEvent {
    /// The reset this event forces, if any.
    pub const fn reset_reason(self) -> Option<ResetReason> {
        match self {
            Self::Done => None,
            Self::RegistrationTimedOut => Some(ResetReason::RegistrationTimeout),
            Self::SocketFailed => Some(ResetReason::TransportSetup),
            Self::SendLimitReached => Some(ResetReason::SendFailures),
            Self::NotRegistered => Some(ResetReason::LinkLost),
        }
    }
}

/// Where `event` in `state` leads.
pub fn next_state(state: StateId, event: StepEvent) -> StateId {
    use StateId as S;
    use StepEvent as E;

    match (state, event) {
        (S::Reset, _) => S::Reset,

        (S::ColdStart, E::Done) => S::BackoffSleep,
        (S::BackoffSleep, E::Done) => S::AwaitLink,
        (S::AwaitLink, E::Done) => S::Acquire,
        (S::Acquire, E::Done) => S::Extract,
        (S::Extract, E::Done) => S::Encode,
        (S::Encode, E::Done) => S::Transmit,
        (S::Transmit, E::Done) => S::RearmOrReset,
        (S::RearmOrReset, E::Done) => S::ScheduledWait,
        (S::ScheduledWait, E::Done) => S::Acquire,

        (S::AwaitLink, E::RegistrationTimedOut | E::SocketFailed)
        | (S::Transmit, E::SendLimitReached)
        | (S::RearmOrReset, E::NotRegistered) => S::Reset,

        (other, unexpected) => {
            debug_assert!(false, "{unexpected:?} is not produced by {other:?}");
            S::Reset
        }
    }
}
