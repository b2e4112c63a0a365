//! Model metadata

use serde::{Deserialize, Serialize};

use super::provider::ProviderKind;

/// One entry of the model table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier as sent to the proxy
    pub id: String,
    /// Display name for the model picker
    pub display_name: String,
    /// Provider whose proxy serves this model
    pub provider: ProviderKind,
    /// Icon asset name used by the UI
    pub icon: String,
    /// Accent color (CSS hex)
    pub color: String,
    /// Maximum context length in tokens
    pub context_length: u32,
    /// Model to try once if this one fails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl ModelInfo {
    /// Create a model entry with the provider's default presentation
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, provider: ProviderKind) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            provider,
            icon: provider.id().to_string(),
            color: default_color(provider).to_string(),
            context_length: 128_000,
            fallback: None,
        }
    }

    /// Set the icon
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Set the accent color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Set the context length
    pub fn with_context_length(mut self, length: u32) -> Self {
        self.context_length = length;
        self
    }

    /// Set the fallback model
    pub fn with_fallback(mut self, model: impl Into<String>) -> Self {
        self.fallback = Some(model.into());
        self
    }
}

fn default_color(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::OpenAi => "#10a37f",
        ProviderKind::Anthropic => "#d97757",
        ProviderKind::Gemini => "#4285f4",
        ProviderKind::DeepSeek => "#4d6bfe",
        ProviderKind::Perplexity => "#20808d",
        ProviderKind::OpenRouter => "#6467f2",
    }
}
