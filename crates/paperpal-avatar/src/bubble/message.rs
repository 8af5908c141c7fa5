use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use paperpal_common::{new_id, PaperSource};

/// One paper announcement. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BubbleMessage {
    id: String,
    paper_id: String,
    source: PaperSource,
    title: String,
    score: f64,
    content: String,
    created_at: DateTime<Utc>,
}

impl BubbleMessage {
    /// Build a bubble and render its display text.
    pub fn new(
        paper_id: impl Into<String>,
        source: PaperSource,
        title: impl Into<String>,
        score: f64,
    ) -> Self {
        let title = title.into();
        let content = render_content(source, &title, score);
        Self {
            id: new_id(),
            paper_id: paper_id.into(),
            source,
            title,
            score,
            content,
            created_at: Utc::now(),
        }
    }

    /// Replace the generated id, e.g. with the backend's notification id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn paper_id(&self) -> &str {
        &self.paper_id
    }

    pub fn source(&self) -> PaperSource {
        self.source
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn render_content(source: PaperSource, title: &str, score: f64) -> String {
    format!(
        "🔔 {} 新论文（{:.1} 分）\n{}",
        source.label(),
        score,
        title.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_includes_source_score_and_title() {
        let msg = BubbleMessage::new("2401.00001", PaperSource::Arxiv, "  Attention Again ", 8.0);
        assert_eq!(msg.content(), "🔔 arXiv 新论文（8.0 分）\nAttention Again");
        assert_eq!(msg.title(), "  Attention Again ");
        assert_eq!(msg.paper_id(), "2401.00001");
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = BubbleMessage::new("p", PaperSource::Huggingface, "t", 5.0);
        let b = BubbleMessage::new("p", PaperSource::Huggingface, "t", 5.0);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn with_id_overrides_generated_id() {
        let msg = BubbleMessage::new("p", PaperSource::Arxiv, "t", 1.0).with_id("n-42");
        assert_eq!(msg.id(), "n-42");
    }

    #[test]
    fn deserialize_rejects_unknown_source() {
        let json = r#"{
            "id": "1", "paper_id": "p", "source": "biorxiv", "title": "t",
            "score": 1.0, "content": "c", "created_at": "2024-01-01T00:00:00Z"
        }"#;
        assert!(serde_json::from_str::<BubbleMessage>(json).is_err());
    }

    #[test]
    fn serde_round_trip_keeps_fields() {
        let msg = BubbleMessage::new("p", PaperSource::Huggingface, "Title", 7.0);
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: BubbleMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }
}
