//! Chat-side value objects: providers, model descriptors, stream events.

use serde::{Deserialize, Serialize};

/// Completion backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local Ollama-compatible endpoint.
    #[default]
    Ollama,
    /// Hosted OpenRouter endpoint (requires an API key).
    OpenRouter,
}

impl Provider {
    /// Human-readable label used in upstream error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenRouter => "OpenRouter",
        }
    }

    /// Parse the wire value sent by the frontend; unknown values fall back
    /// to the local provider, matching the original default.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "openrouter" => Self::OpenRouter,
            _ => Self::Ollama,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama => f.write_str("ollama"),
            Self::OpenRouter => f.write_str("openrouter"),
        }
    }
}

/// One selectable model in the catalog listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelEntry {
    /// Routing id passed back on chat requests.
    pub id: String,

    /// Display name, org prefix stripped for remote entries.
    pub name: String,

    /// Which backend serves this model.
    pub provider: Provider,

    /// Synthesized "price-in · price-out · context" line for remote entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ModelEntry {
    /// The fixed local entry that always heads the catalog listing.
    #[must_use]
    pub fn local_default() -> Self {
        Self {
            id: "ollama".to_string(),
            name: "Ollama".to_string(),
            provider: Provider::Ollama,
            description: None,
        }
    }
}

/// A prior conversation turn relayed verbatim to the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTurn {
    /// "user" or "assistant".
    pub role: String,

    /// Turn text.
    pub content: String,
}

/// One transcoded stream event, serialized as a single JSON line.
///
/// Events preserve upstream delta order; reasoning and answer channels are
/// never reordered or batched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "delta", rename_all = "lowercase")]
pub enum DeltaEvent {
    /// Reasoning-channel fragment.
    Reasoning(String),
    /// Answer-text fragment.
    Text(String),
}

impl DeltaEvent {
    /// The fragment text regardless of channel.
    #[must_use]
    pub fn delta(&self) -> &str {
        match self {
            Self::Reasoning(s) | Self::Text(s) => s,
        }
    }

    /// Serialize as one newline-terminated JSON line.
    #[must_use]
    pub fn to_line(&self) -> String {
        let mut line =
            serde_json::to_string(self).expect("delta event serialization is infallible");
        line.push('\n');
        line
    }
}
