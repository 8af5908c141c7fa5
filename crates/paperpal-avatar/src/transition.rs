//! Maps avatar triggers to state transitions.
//! Pairs missing from the table are rejected, never coerced.

use serde::{Deserialize, Serialize};

use paperpal_common::AvatarState;

/// Input to [`crate::AvatarStateMachine::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionTrigger {
    Click,
    NewPaper,
    Timeout,
    Dismiss,
}

pub fn next_state(current: AvatarState, trigger: TransitionTrigger) -> Option<AvatarState> {
    use AvatarState::*;
    use TransitionTrigger::*;

    match (current, trigger) {
        (Idle, Click) => Some(Active),
        (Idle, NewPaper) => Some(Alert),
        (Alert, Click) => Some(Active),
        (Alert, Timeout) => Some(Idle),
        (Alert, Dismiss) => Some(Idle),
        (Active, Timeout) => Some(Idle),
        (Active, Dismiss) => Some(Idle),
        (Idle, Timeout | Dismiss) | (Alert, NewPaper) | (Active, Click | NewPaper) => None,
    }
}
