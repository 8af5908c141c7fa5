//! Configuration schema types for Paper Pal.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod avatar;
mod backend;
mod chat;
mod notifications;
mod system;

pub use avatar::*;
pub use backend::*;
pub use chat::*;
pub use notifications::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Paper Pal.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PaperPalConfig {
    pub avatar: AvatarConfig,
    pub notifications: NotificationsConfig,
    pub chat: ChatConfig,
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
}
