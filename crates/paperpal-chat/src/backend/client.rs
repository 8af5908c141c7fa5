//! Backend client struct, request plumbing and endpoint calls.

use std::time::Duration;

use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use paperpal_common::new_correlation_id;
use paperpal_config::PaperPalConfig;

use crate::{ChatError, ChatMessage, PdfProcessingStatus, QuickCommand};

use super::types::{
    ChatReply, ChatRequest, HistoryEntry, NotificationDto, NotificationList, PaperDto,
    PdfProcessRequest, PdfProcessResponse, QuickCommandRequest,
};

const DEFAULT_HISTORY_LIMIT: usize = 20;
/// Error bodies are cut to this many characters.
const ERROR_BODY_LIMIT: usize = 200;

/// Paper Pal backend client.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: reqwest::Client,
    history_limit: usize,
}

impl BackendClient {
    pub fn new(
        base_url: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| ChatError::Network(format!("failed to build HTTP client: {e}")))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            base_url,
            http,
            history_limit: DEFAULT_HISTORY_LIMIT,
        })
    }

    pub fn from_config(config: &PaperPalConfig) -> Result<Self, ChatError> {
        let backend = &config.backend;
        Ok(Self::new(
            backend.base_url.as_str(),
            Duration::from_secs(u64::from(backend.connect_timeout_secs)),
            Duration::from_secs(u64::from(backend.request_timeout_secs)),
        )?
        .with_history_limit(config.chat.history_limit as usize))
    }

    /// Cap on prior messages forwarded with each question.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL for one item under `collection`, with `id` percent-encoded as a
    /// single path segment.
    fn item_url(&self, collection: &[&str], id: &str) -> Result<Url, ChatError> {
        if id.trim().is_empty() {
            return Err(ChatError::InvalidInput("id is empty".into()));
        }
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ChatError::InvalidInput(format!("invalid backend URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| {
                ChatError::InvalidInput(format!("backend URL cannot hold a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(collection)
            .push(id);
        Ok(url)
    }

    /// Send a request and decode a JSON body, mapping failures to
    /// [`ChatError`].
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ChatError> {
        let request_id = new_correlation_id();
        let response = request
            .header("x-request-id", &request_id)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status();
        debug!(request_id = %request_id, url = %response.url(), %status, "backend response");
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = text.chars().take(ERROR_BODY_LIMIT).collect::<String>();
            return Err(ChatError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ChatError::Parse(e.to_string()))
    }

    /// Ask a question. `history` holds the earlier turns, oldest first.
    pub async fn send_chat(
        &self,
        paper_id: &str,
        message: &str,
        history: &[ChatMessage],
    ) -> Result<String, ChatError> {
        let skip = history.len().saturating_sub(self.history_limit);
        let body = ChatRequest {
            paper_id,
            message,
            history: history[skip..]
                .iter()
                .map(|m| HistoryEntry {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
        };
        let reply: ChatReply = self
            .send_json(self.http.post(self.url("/api/chat/message")).json(&body))
            .await?;
        non_empty(reply.content)
    }

    pub async fn run_quick_command(
        &self,
        paper_id: &str,
        command: QuickCommand,
    ) -> Result<String, ChatError> {
        let body = QuickCommandRequest {
            paper_id,
            command: command.as_str(),
        };
        let reply: ChatReply = self
            .send_json(self.http.post(self.url("/api/chat/quick-command")).json(&body))
            .await?;
        non_empty(reply.content)
    }

    pub async fn process_pdf(
        &self,
        paper_id: &str,
        pdf_url: &str,
    ) -> Result<PdfProcessResponse, ChatError> {
        let body = PdfProcessRequest { paper_id, pdf_url };
        self.send_json(self.http.post(self.url("/api/pdf/process")).json(&body))
            .await
    }

    pub async fn pdf_status(&self, paper_id: &str) -> Result<PdfProcessingStatus, ChatError> {
        self.send_json(
            self.http
                .get(self.url("/api/pdf/status"))
                .query(&[("paper_id", paper_id)]),
        )
        .await
    }

    pub async fn notifications(&self) -> Result<Vec<NotificationDto>, ChatError> {
        let list: NotificationList = self
            .send_json(self.http.get(self.url("/api/notifications/")))
            .await?;
        Ok(list.notifications)
    }

    /// Remove a notification once it has been queued locally.
    pub async fn dismiss_notification(&self, id: &str) -> Result<(), ChatError> {
        let url = self.item_url(&["api", "notifications"], id)?;
        let _: serde_json::Value = self.send_json(self.http.delete(url)).await?;
        Ok(())
    }

    pub async fn paper(&self, paper_id: &str) -> Result<PaperDto, ChatError> {
        let url = self.item_url(&["api", "papers"], paper_id)?;
        self.send_json(self.http.get(url)).await
    }
}

fn non_empty(content: String) -> Result<String, ChatError> {
    if content.trim().is_empty() {
        Err(ChatError::Unavailable("backend returned an empty reply".into()))
    } else {
        Ok(content)
    }
}
