use std::collections::{HashSet, VecDeque};

/// Notification ids already handled, bounded to the most recent `capacity`.
///
/// The backend stops serving acknowledged ids, so only a recent window can
/// come back (an acknowledgement that failed, or two polls overlapping).
pub(super) struct SeenIds {
    order: VecDeque<String>,
    ids: HashSet<String>,
    capacity: usize,
}

impl SeenIds {
    pub(super) fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            ids: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Records `id`. Returns `false` if it was already recorded.
    pub(super) fn insert(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        self.order.push_back(id.to_string());
        self.ids.insert(id.to_string());
        true
    }

    pub(super) fn len(&self) -> usize {
        self.order.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_rejected() {
        let mut seen = SeenIds::new(4);
        assert!(seen.insert("n1"));
        assert!(!seen.insert("n1"));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn oldest_id_is_forgotten_at_capacity() {
        let mut seen = SeenIds::new(2);
        assert!(seen.insert("n1"));
        assert!(seen.insert("n2"));
        assert!(seen.insert("n3"));
        assert_eq!(seen.len(), 2);

        assert!(!seen.insert("n3"));
        assert!(!seen.insert("n2"));
        assert!(seen.insert("n1"));
    }
}
