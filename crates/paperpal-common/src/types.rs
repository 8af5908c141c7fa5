use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mood of the on-screen avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarState {
    #[default]
    Idle,
    Alert,
    Active,
}

impl fmt::Display for AvatarState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AvatarState::Idle => "idle",
            AvatarState::Alert => "alert",
            AvatarState::Active => "active",
        };
        f.write_str(name)
    }
}

/// Where a paper was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSource {
    Arxiv,
    Huggingface,
}

impl PaperSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaperSource::Arxiv => "arxiv",
            PaperSource::Huggingface => "huggingface",
        }
    }

    /// Human-readable label used in bubble text.
    pub fn label(&self) -> &'static str {
        match self {
            PaperSource::Arxiv => "arXiv",
            PaperSource::Huggingface => "Hugging Face",
        }
    }
}

impl fmt::Display for PaperSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaperSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arxiv" => Ok(PaperSource::Arxiv),
            "huggingface" | "hf" => Ok(PaperSource::Huggingface),
            other => Err(format!("unknown paper source: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_state_defaults_to_idle() {
        assert_eq!(AvatarState::default(), AvatarState::Idle);
    }

    #[test]
    fn avatar_state_serializes_lowercase() {
        let json = serde_json::to_string(&AvatarState::Alert).unwrap();
        assert_eq!(json, "\"alert\"");
        assert_eq!(AvatarState::Active.to_string(), "active");
    }

    #[test]
    fn paper_source_parses_backend_strings() {
        assert_eq!("arxiv".parse::<PaperSource>(), Ok(PaperSource::Arxiv));
        assert_eq!(
            "HuggingFace".parse::<PaperSource>(),
            Ok(PaperSource::Huggingface)
        );
        assert!("semantic-scholar".parse::<PaperSource>().is_err());
    }

    #[test]
    fn paper_source_rejects_unknown_json() {
        let parsed: Result<PaperSource, _> = serde_json::from_str("\"openreview\"");
        assert!(parsed.is_err());
        let parsed: PaperSource = serde_json::from_str("\"huggingface\"").unwrap();
        assert_eq!(parsed, PaperSource::Huggingface);
    }

    #[test]
    fn paper_source_labels() {
        assert_eq!(PaperSource::Arxiv.label(), "arXiv");
        assert_eq!(PaperSource::Huggingface.label(), "Hugging Face");
    }
}
