use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::AvatarState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    AvatarStateChanged {
        state: AvatarState,
        previous: AvatarState,
    },
    BubbleShown {
        id: String,
        paper_id: String,
        content: String,
        pending: usize,
    },
    BubbleCleared,
    BubbleClicked { paper_id: String },
    ChatOpened { paper_id: String, title: String },
    ChatClosed { paper_id: String },
    ChatMessage {
        paper_id: String,
        role: String,
        content: String,
    },
    PdfStatusUpdated {
        paper_id: String,
        progress: f64,
        complete: bool,
        error: Option<String>,
    },
    Shutdown,
    #[serde(other)]
    Unknown,
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: Event) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}
