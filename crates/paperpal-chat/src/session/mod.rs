//! Chat session lifecycle.
//!
//! A `ChatSession` is either closed or open on exactly one paper. Opening
//! builds a fresh [`crate::ChatContext`]; closing discards it. Replies that
//! arrive after the context was closed or replaced are dropped.

mod chat;
mod manager;
mod pdf;
mod types;

#[cfg(test)]
mod tests;

pub use manager::{
    ChatSession, DEFAULT_PDF_POLL_INTERVAL, FALLBACK_REPLY, QUICK_COMMAND_FALLBACK_PREFIX,
};
pub use types::{SessionEvent, SessionListener};
