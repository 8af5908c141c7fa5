pub mod errors;
pub mod events;
pub mod id;
pub mod observer;
pub mod sync;
pub mod timer;
pub mod types;

pub use errors::{ConfigError, PaperPalError};
pub use events::{Event, EventBus};
pub use id::{new_correlation_id, new_id};
pub use observer::{Subscribers, Subscription};
pub use timer::{schedule, spawn_task, ScheduledTask};
pub use types::{AvatarState, PaperSource};

pub type Result<T> = std::result::Result<T, PaperPalError>;
