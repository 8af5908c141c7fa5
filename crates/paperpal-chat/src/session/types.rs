//! Session events and concurrency guards.

use std::sync::Mutex;

use tracing::debug;

use paperpal_common::sync::lock;

use crate::{ChatMessage, PdfProcessingStatus};

use super::manager::Inner;

/// Observable changes of a [`super::ChatSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Opened { paper_id: String, title: String },
    Closed { paper_id: String },
    MessageAppended { paper_id: String, message: ChatMessage },
    PdfStatusUpdated { paper_id: String, status: PdfProcessingStatus },
}

pub type SessionListener = dyn Fn(&SessionEvent) + Send + Sync;

/// Marks the open context as awaiting a reply until dropped.
///
/// The mark belongs to the context's generation: closing or replacing the
/// context releases it, and a guard outliving its context leaves a newer
/// mark alone.
pub(super) struct BusyGuard<'a> {
    inner: &'a Mutex<Inner>,
    generation: u64,
}

impl<'a> BusyGuard<'a> {
    /// Returns `None` when no context is open or the open one already has a
    /// request in flight.
    pub(super) fn acquire(inner: &'a Mutex<Inner>) -> Option<Self> {
        let mut guarded = lock(inner);
        guarded.context.as_ref()?;
        let generation = guarded.generation;
        if guarded.busy_generation == Some(generation) {
            debug!("chat request already in flight, ignoring input");
            return None;
        }
        guarded.busy_generation = Some(generation);
        Some(Self { inner, generation })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut inner = lock(self.inner);
        if inner.busy_generation == Some(self.generation) {
            inner.busy_generation = None;
        }
    }
}
