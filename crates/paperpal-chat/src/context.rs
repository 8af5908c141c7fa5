//! Conversation state for one open paper.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use paperpal_common::new_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Snapshot reported by the PDF pipeline. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfProcessingStatus {
    pub is_downloading: bool,
    pub is_processing: bool,
    pub is_complete: bool,
    /// Fraction done, 0.0 to 1.0.
    pub progress: f64,
    pub error_message: Option<String>,
    pub total_chunks: u32,
    pub processed_chunks: u32,
}

impl PdfProcessingStatus {
    pub fn has_error(&self) -> bool {
        self.error_message
            .as_deref()
            .is_some_and(|msg| !msg.trim().is_empty())
    }

    /// Polling stops once this is true.
    pub fn is_terminal(&self) -> bool {
        self.is_complete || self.has_error()
    }
}

/// Everything known about the paper under discussion.
///
/// Invariants: `abstract_text` is non-empty and history timestamps never
/// decrease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatContext {
    pub paper_id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub pdf_url: Option<String>,
    history: Vec<ChatMessage>,
    pub pdf_status: PdfProcessingStatus,
}

impl ChatContext {
    pub fn new(
        paper_id: String,
        title: String,
        abstract_text: String,
        pdf_url: Option<String>,
    ) -> Self {
        Self {
            paper_id,
            title,
            abstract_text,
            pdf_url,
            history: Vec::new(),
            pdf_status: PdfProcessingStatus::default(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn is_pdf_processed(&self) -> bool {
        self.pdf_status.is_complete
    }

    /// Append a message stamped now.
    pub fn push(&mut self, role: Role, content: impl Into<String>) -> ChatMessage {
        self.push_at(role, content, Utc::now())
    }

    /// Append a message, clamping `timestamp` so history stays ordered.
    pub fn push_at(
        &mut self,
        role: Role,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> ChatMessage {
        let timestamp = match self.history.last() {
            Some(last) if last.timestamp > timestamp => last.timestamp,
            _ => timestamp,
        };
        let message = ChatMessage {
            id: new_id(),
            role,
            content: content.into(),
            timestamp,
        };
        self.history.push(message.clone());
        message
    }
}
