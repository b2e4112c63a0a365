//! JSON bodies exchanged with the proxy functions

use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, StreamRequest};

/// POST body accepted by every chat proxy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyRequestBody {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl From<&StreamRequest> for ProxyRequestBody {
    fn from(request: &StreamRequest) -> Self {
        Self {
            messages: request.messages.clone(),
            model: request.model.clone(),
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
            stream: Some(request.stream),
        }
    }
}

/// Body of a non-2xx proxy response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyErrorBody {
    pub error: String,
}

impl ProxyErrorBody {
    /// Best-effort message from a raw error body
    ///
    /// Falls back to the raw text when the body is not `{ error: string }`.
    pub fn message_from(raw: &str) -> String {
        match serde_json::from_str::<ProxyErrorBody>(raw) {
            Ok(body) => body.error,
            Err(_) if raw.trim().is_empty() => "empty response body".to_string(),
            Err(_) => raw.trim().to_string(),
        }
    }
}

/// Body of a non-streaming proxy response
///
/// Proxies disagree on the field name; both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionBody {
    #[serde(rename = "generatedText", default, skip_serializing_if = "Option::is_none")]
    pub generated_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CompletionBody {
    /// The generated text, preferring `generatedText`
    pub fn into_text(self) -> Option<String> {
        self.generated_text.or(self.text)
    }
}

/// Absolute location of one proxy function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    pub base_url: String,
    pub path: String,
}

impl ProxyEndpoint {
    /// Create an endpoint
    pub fn new(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: path.into(),
        }
    }

    /// Full URL with exactly one slash between base and path
    pub fn url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }
}

impl std::fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}
