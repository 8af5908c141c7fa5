use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tracing::debug;

use paperpal_common::sync::lock;
use paperpal_common::{schedule, ScheduledTask, Subscribers, Subscription};
use paperpal_config::PaperPalConfig;

use super::BubbleMessage;

/// Auto-dismiss delay used when none is configured.
pub const DEFAULT_AUTO_DISMISS: Duration = Duration::from_millis(60_000);

/// Called with the new current bubble after every change of `current`.
pub type BubbleListener = dyn Fn(Option<&BubbleMessage>) + Send + Sync;

/// Called with the paper id of a clicked bubble.
pub type ClickHandler = dyn Fn(&str) + Send + Sync;

struct Inner {
    current: Option<BubbleMessage>,
    pending: VecDeque<BubbleMessage>,
    dismiss_timer: Option<ScheduledTask>,
    timer_generation: u64,
}

impl Inner {
    fn cancel_timer(&mut self) {
        self.timer_generation = self.timer_generation.wrapping_add(1);
        if let Some(mut timer) = self.dismiss_timer.take() {
            timer.cancel();
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    listeners: Subscribers<BubbleListener>,
    click_handlers: Subscribers<ClickHandler>,
    auto_dismiss: Duration,
}

/// FIFO queue of bubble notifications with a single visible slot.
///
/// Invariant: `pending` is non-empty only while `current` is `Some`.
#[derive(Clone)]
pub struct BubbleQueue {
    shared: Arc<Shared>,
}

impl BubbleQueue {
    /// A zero `auto_dismiss` disables automatic dismissal.
    pub fn new(auto_dismiss: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    current: None,
                    pending: VecDeque::new(),
                    dismiss_timer: None,
                    timer_generation: 0,
                }),
                listeners: Subscribers::new(),
                click_handlers: Subscribers::new(),
                auto_dismiss,
            }),
        }
    }

    pub fn from_config(config: &PaperPalConfig) -> Self {
        Self::new(Duration::from_millis(config.notifications.auto_dismiss_ms))
    }

    pub fn current(&self) -> Option<BubbleMessage> {
        lock(&self.shared.inner).current.clone()
    }

    pub fn pending_len(&self) -> usize {
        lock(&self.shared.inner).pending.len()
    }

    pub fn is_auto_dismiss_armed(&self) -> bool {
        lock(&self.shared.inner).dismiss_timer.is_some()
    }

    /// Show `message` now if nothing is visible, otherwise queue it.
    pub fn enqueue(&self, message: BubbleMessage) {
        let shown = {
            let mut inner = lock(&self.shared.inner);
            if inner.current.is_some() {
                debug!(id = message.id(), pending = inner.pending.len() + 1, "bubble queued");
                inner.pending.push_back(message);
                None
            } else {
                self.replace_current(&mut inner, Some(message))
            }
        };
        if let Some(current) = shown {
            self.notify(Some(&current));
        }
    }

    /// Enqueue each message in input order.
    pub fn enqueue_all<I>(&self, messages: I)
    where
        I: IntoIterator<Item = BubbleMessage>,
    {
        for message in messages {
            self.enqueue(message);
        }
    }

    /// Advance to the next pending bubble, or clear the slot.
    ///
    /// Returns the new current bubble.
    pub fn dismiss(&self) -> Option<BubbleMessage> {
        let (changed, current) = {
            let mut inner = lock(&self.shared.inner);
            let changed = inner.current.is_some();
            let next = inner.pending.pop_front();
            (changed, self.replace_current(&mut inner, next))
        };
        if changed || current.is_some() {
            self.notify(current.as_ref());
        }
        current
    }

    /// Drop the visible bubble and everything pending.
    pub fn clear(&self) {
        let had_current = {
            let mut inner = lock(&self.shared.inner);
            inner.pending.clear();
            inner.cancel_timer();
            inner.current.take().is_some()
        };
        if had_current {
            debug!("bubble queue cleared");
            self.notify(None);
        }
    }

    /// Handle a click on the visible bubble.
    ///
    /// Click handlers receive the paper id, then the queue advances.
    /// Returns the clicked bubble, or `None` if nothing was visible.
    pub fn click(&self) -> Option<BubbleMessage> {
        let clicked = {
            let mut inner = lock(&self.shared.inner);
            let clicked = inner.current.clone()?;
            inner.cancel_timer();
            clicked
        };

        debug!(id = clicked.id(), paper_id = clicked.paper_id(), "bubble clicked");
        for handler in self.shared.click_handlers.snapshot() {
            handler(clicked.paper_id());
        }

        // A handler may already have moved the queue on.
        let still_current = lock(&self.shared.inner)
            .current
            .as_ref()
            .is_some_and(|m| m.id() == clicked.id());
        if still_current {
            self.dismiss();
        }
        Some(clicked)
    }

    pub fn on_click<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.shared.click_handlers.add(Arc::new(handler))
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(Option<&BubbleMessage>) + Send + Sync + 'static,
    {
        self.shared.listeners.add(Arc::new(listener))
    }

    /// Cancel the auto-dismiss timer and drop all observers.
    pub fn dispose(&self) {
        lock(&self.shared.inner).cancel_timer();
        self.shared.listeners.clear();
        self.shared.click_handlers.clear();
    }

    /// Swap in a new current bubble and re-arm auto-dismiss for it.
    fn replace_current(
        &self,
        inner: &mut Inner,
        next: Option<BubbleMessage>,
    ) -> Option<BubbleMessage> {
        inner.cancel_timer();
        inner.current = next.clone();
        if let Some(current) = &next {
            debug!(id = current.id(), pending = inner.pending.len(), "bubble shown");
            if !self.shared.auto_dismiss.is_zero() {
                self.arm_timer(inner);
            }
        }
        next
    }

    fn arm_timer(&self, inner: &mut Inner) {
        let generation = inner.timer_generation;
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        inner.dismiss_timer = Some(schedule(self.shared.auto_dismiss, move || {
            if let Some(shared) = weak.upgrade() {
                BubbleQueue { shared }.on_auto_dismiss(generation);
            }
        }));
    }

    fn on_auto_dismiss(&self, generation: u64) {
        if lock(&self.shared.inner).timer_generation != generation {
            return;
        }
        debug!("bubble auto-dismissed");
        self.dismiss();
    }

    fn notify(&self, current: Option<&BubbleMessage>) {
        for listener in self.shared.listeners.snapshot() {
            listener(current);
        }
    }
}

impl Default for BubbleQueue {
    fn default() -> Self {
        Self::new(DEFAULT_AUTO_DISMISS)
    }
}
