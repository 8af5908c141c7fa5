//! Ordered subscriber lists with detachable handles.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::sync::lock;

type Entries<F> = Mutex<Vec<(u64, Arc<F>)>>;

trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<F: ?Sized + Send + Sync> Detach for Entries<F> {
    fn detach(&self, id: u64) {
        lock(self).retain(|(entry_id, _)| *entry_id != id);
    }
}

/// Callbacks kept in registration order.
///
/// `F` is usually a `dyn Fn(..) + Send + Sync` trait object.
pub struct Subscribers<F: ?Sized> {
    entries: Arc<Entries<F>>,
    next_id: AtomicU64,
}

impl<F: ?Sized + Send + Sync + 'static> Subscribers<F> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a callback. The returned handle removes it again.
    pub fn add(&self, callback: Arc<F>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.entries).push((id, callback));
        let entries: Arc<dyn Detach> = self.entries.clone();
        Subscription {
            id,
            registry: Arc::downgrade(&entries),
        }
    }

    /// Clone the current callbacks so they can run without holding the lock.
    pub fn snapshot(&self) -> Vec<Arc<F>> {
        lock(&self.entries)
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<F: ?Sized + Send + Sync + 'static> Default for Subscribers<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`Subscribers::add`].
///
/// Dropping the handle leaves the callback registered; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    id: u64,
    registry: Weak<dyn Detach>,
}

impl Subscription {
    /// Remove the callback. Idempotent, and a no-op once the owner is gone.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.detach(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
