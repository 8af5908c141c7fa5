//! AnswerProvider and PdfService implementations for BackendClient.

use async_trait::async_trait;
use tracing::debug;

use crate::{AnswerProvider, ChatContext, ChatError, PdfProcessingStatus, PdfService, QuickCommand};

use super::client::BackendClient;

#[async_trait]
impl AnswerProvider for BackendClient {
    async fn answer(&self, message: &str, context: &ChatContext) -> Result<String, ChatError> {
        // The backend appends `message` itself.
        let history = context.history();
        let earlier = match history.last() {
            Some(last) if last.content == message => &history[..history.len() - 1],
            _ => history,
        };
        debug!(paper_id = %context.paper_id, turns = earlier.len(), "chat request");
        self.send_chat(&context.paper_id, message, earlier).await
    }

    async fn quick_command(
        &self,
        command: QuickCommand,
        context: &ChatContext,
    ) -> Result<String, ChatError> {
        debug!(paper_id = %context.paper_id, %command, "quick command request");
        self.run_quick_command(&context.paper_id, command).await
    }
}

#[async_trait]
impl PdfService for BackendClient {
    async fn start_processing(&self, paper_id: &str, pdf_url: &str) -> Result<(), ChatError> {
        let response = self.process_pdf(paper_id, pdf_url).await?;
        if response.success {
            debug!(paper_id, chunks = ?response.chunks_count, "PDF processed");
            Ok(())
        } else {
            Err(ChatError::Unavailable(response.message))
        }
    }

    async fn fetch_status(&self, paper_id: &str) -> Result<PdfProcessingStatus, ChatError> {
        self.pdf_status(paper_id).await
    }
}
