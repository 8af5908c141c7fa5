//! Bubble notification configuration types.

use serde::{Deserialize, Serialize};

/// Bubble queue and new-paper polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Auto-dismiss delay for the displayed bubble in milliseconds.
    /// `0` keeps bubbles until they are clicked or dismissed.
    pub auto_dismiss_ms: u64,
    /// How often the backend is asked for new paper notifications.
    pub poll_interval_ms: u64,
    /// Notifications scoring below this are dropped (valid range: 0-20).
    pub min_score: f64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            auto_dismiss_ms: 60_000,
            poll_interval_ms: 15_000,
            min_score: 0.0,
        }
    }
}
