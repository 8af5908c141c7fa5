//! Paper chat for Paper Pal.
//!
//! Provides the per-paper conversation session with:
//! - Ordered history with a fallback reply for every sent message
//! - Quick commands with offline extraction over the abstract
//! - PDF processing kickoff and status polling
//! - Reliability notes for abstract-only answers
//! - An HTTP client for the Paper Pal backend

pub mod backend;
pub mod context;
pub mod quick_command;
pub mod reliability;
pub mod session;

use async_trait::async_trait;

pub use backend::{BackendClient, NotificationDto, PaperDto};
pub use context::{ChatContext, ChatMessage, PdfProcessingStatus, Role};
pub use quick_command::{match_quick_command, QuickCommand};
pub use session::{ChatSession, SessionEvent, SessionListener, FALLBACK_REPLY};

/// Produces replies to questions about the paper in a [`ChatContext`].
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// Answer `message`. The context's history already ends with it.
    async fn answer(&self, message: &str, context: &ChatContext) -> Result<String, ChatError>;

    async fn quick_command(
        &self,
        command: QuickCommand,
        context: &ChatContext,
    ) -> Result<String, ChatError>;
}

/// Full-text PDF processing for a paper.
#[async_trait]
pub trait PdfService: Send + Sync {
    /// Ask the pipeline to download and index `pdf_url`.
    async fn start_processing(&self, paper_id: &str, pdf_url: &str) -> Result<(), ChatError>;

    async fn fetch_status(&self, paper_id: &str) -> Result<PdfProcessingStatus, ChatError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display_includes_status() {
        let err = ChatError::Http {
            status: 503,
            body: "down".into(),
        };
        assert_eq!(err.to_string(), "HTTP 503: down");
    }

    #[test]
    fn invalid_input_display() {
        let err = ChatError::InvalidInput("abstract is empty".into());
        assert_eq!(err.to_string(), "Invalid input: abstract is empty");
    }
}
