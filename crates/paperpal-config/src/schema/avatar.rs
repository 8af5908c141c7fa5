//! Avatar configuration types.

use serde::{Deserialize, Serialize};

/// Avatar state machine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// How long the avatar stays active without interaction, in milliseconds
    /// (valid range: 1000-3600000).
    pub idle_timeout_ms: u64,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 30_000,
        }
    }
}
