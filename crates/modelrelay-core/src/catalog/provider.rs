//! Upstream providers reachable through a proxy function

use serde::{Deserialize, Serialize};

/// Upstream AI provider
///
/// Each provider has exactly one serverless proxy function in front of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
    DeepSeek,
    Perplexity,
    OpenRouter,
}

impl ProviderKind {
    /// Every provider, in display order
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
        ProviderKind::DeepSeek,
        ProviderKind::Perplexity,
        ProviderKind::OpenRouter,
    ];

    /// Stable identifier, also used as the config key
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Perplexity => "perplexity",
            ProviderKind::OpenRouter => "openrouter",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Gemini => "Google Gemini",
            ProviderKind::DeepSeek => "DeepSeek",
            ProviderKind::Perplexity => "Perplexity",
            ProviderKind::OpenRouter => "OpenRouter",
        }
    }

    /// Path of the proxy function, relative to the proxy base URL
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "/api/openai-chat",
            ProviderKind::Anthropic => "/api/anthropic-chat",
            ProviderKind::Gemini => "/api/gemini-chat",
            ProviderKind::DeepSeek => "/api/deepseek-chat",
            ProviderKind::Perplexity => "/api/perplexity-chat",
            ProviderKind::OpenRouter => "/api/openrouter-chat",
        }
    }

    /// Parse a provider id (case-insensitive)
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.to_lowercase();
        Self::ALL.into_iter().find(|p| p.id() == id)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id() {
        assert_eq!(ProviderKind::from_id("openai"), Some(ProviderKind::OpenAi));
        assert_eq!(ProviderKind::from_id("DeepSeek"), Some(ProviderKind::DeepSeek));
        assert_eq!(ProviderKind::from_id("stripe"), None);
    }

    #[test]
    fn test_endpoints_are_distinct() {
        let mut paths: Vec<_> = ProviderKind::ALL.iter().map(|p| p.default_endpoint()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), ProviderKind::ALL.len());
    }

    #[test]
    fn test_serde_uses_id() {
        let json = serde_json::to_string(&ProviderKind::OpenRouter).unwrap();
        assert_eq!(json, "\"openrouter\"");
    }
}
