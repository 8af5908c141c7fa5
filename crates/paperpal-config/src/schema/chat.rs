//! Chat session configuration types.

use serde::{Deserialize, Serialize};

/// Chat session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Interval between PDF processing status polls, in milliseconds.
    pub pdf_poll_interval_ms: u64,
    /// Most recent messages forwarded to the backend with each question.
    pub history_limit: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            pdf_poll_interval_ms: 2_000,
            history_limit: 20,
        }
    }
}
