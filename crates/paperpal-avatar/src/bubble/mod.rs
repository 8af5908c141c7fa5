//! Bubble notifications shown next to the avatar.
//!
//! At most one bubble is visible at a time. Later arrivals wait in a FIFO
//! buffer and are shown as the current one is dismissed, clicked or
//! auto-dismissed.

mod message;
mod queue;

pub use message::BubbleMessage;
pub use queue::{BubbleListener, BubbleQueue, ClickHandler, DEFAULT_AUTO_DISMISS};
