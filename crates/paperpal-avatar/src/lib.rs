//! Avatar interaction core for Paper Pal.
//!
//! - [`transition`]: the static `(state, trigger) -> state` table
//! - [`AvatarStateMachine`]: current mood, idle-reversion timer, listeners
//! - [`BubbleQueue`]: FIFO bubble notifications with auto-dismiss

pub mod bubble;
pub mod machine;
pub mod transition;

pub use bubble::{BubbleListener, BubbleMessage, BubbleQueue, ClickHandler, DEFAULT_AUTO_DISMISS};
pub use machine::{AvatarStateMachine, StateListener, DEFAULT_IDLE_TIMEOUT};
pub use paperpal_common::AvatarState;
pub use transition::{next_state, TransitionTrigger};
