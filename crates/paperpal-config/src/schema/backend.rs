//! Backend service configuration types.

use serde::{Deserialize, Serialize};

/// Connection settings for the Paper Pal backend API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub connect_timeout_secs: u32,
    pub request_timeout_secs: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8001".into(),
            connect_timeout_secs: 5,
            request_timeout_secs: 60,
        }
    }
}
