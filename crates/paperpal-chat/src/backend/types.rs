//! Request and response bodies of the backend API.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub paper_id: &'a str,
    pub message: &'a str,
    pub history: Vec<HistoryEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HistoryEntry<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuickCommandRequest<'a> {
    pub paper_id: &'a str,
    pub command: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatReply {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PdfProcessRequest<'a> {
    pub paper_id: &'a str,
    pub pdf_url: &'a str,
}

/// Result of a PDF processing request.
#[derive(Debug, Clone, Deserialize)]
pub struct PdfProcessResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub chunks_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotificationList {
    #[serde(default)]
    pub notifications: Vec<NotificationDto>,
}

/// A high-scoring paper waiting to be announced.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NotificationDto {
    pub id: String,
    pub paper_id: String,
    pub title: String,
    /// `arxiv` or `huggingface`; validated by the consumer.
    pub source: String,
    pub score: f64,
    #[serde(default)]
    pub timestamp: String,
}

impl NotificationDto {
    /// Parse `timestamp`, reading zone-less values as UTC.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Paper details as returned by `GET /api/papers/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperDto {
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
    pub total_score: Option<f64>,
    pub one_liner: Option<String>,
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
