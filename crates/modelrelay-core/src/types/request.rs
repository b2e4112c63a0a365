//! Generation request types

use crate::streaming::{StreamError, StreamOutcome};

use super::message::ChatMessage;

/// Sampling parameters forwarded to the proxy
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOptions {
    /// Sampling randomness (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Generation length cap in tokens
    pub max_tokens: Option<u32>,
}

impl GenerationOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set temperature
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Reject values no proxy would accept
    pub fn validate(&self) -> StreamOutcome<()> {
        if let Some(temp) = self.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err(StreamError::InvalidRequest(format!(
                    "temperature {} outside [0, 2]",
                    temp
                )));
            }
        }
        if self.max_tokens == Some(0) {
            return Err(StreamError::InvalidRequest(
                "max_tokens must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// One logical chat-completion call
///
/// Built fresh for every call and never persisted. The proxy endpoint is
/// looked up from the model catalog unless `endpoint` overrides it.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// Model identifier, also the key into the model catalog
    pub model: String,
    /// Ordered message history
    pub messages: Vec<ChatMessage>,
    /// Sampling parameters
    pub options: GenerationOptions,
    /// Incremental delivery (`true`) or a single JSON body (`false`)
    pub stream: bool,
    /// Proxy path to use instead of the catalog's provider endpoint
    pub endpoint: Option<String>,
}

impl StreamRequest {
    /// Create a streaming request for `model`
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: GenerationOptions::default(),
            stream: true,
            endpoint: None,
        }
    }

    /// Set the generation options
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.options.temperature = Some(temp);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.options.max_tokens = Some(tokens);
        self
    }

    /// Toggle incremental delivery
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Pin the proxy path for the primary attempt
    pub fn with_endpoint(mut self, path: impl Into<String>) -> Self {
        self.endpoint = Some(path.into());
        self
    }

    /// Same history and options, aimed at another model
    ///
    /// The endpoint override is dropped: the fallback model always goes
    /// through its own provider's proxy.
    pub fn retarget(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: self.messages.clone(),
            options: self.options,
            stream: self.stream,
            endpoint: None,
        }
    }

    /// Check the request before any network traffic
    pub fn validate(&self) -> StreamOutcome<()> {
        if self.model.trim().is_empty() {
            return Err(StreamError::InvalidRequest("model is required".to_string()));
        }
        if self.messages.is_empty() {
            return Err(StreamError::InvalidRequest(
                "at least one message is required".to_string(),
            ));
        }
        self.options.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_validation() {
        assert!(GenerationOptions::new().validate().is_ok());
        assert!(GenerationOptions::new().with_temperature(2.0).validate().is_ok());
        assert!(GenerationOptions::new().with_temperature(2.5).validate().is_err());
        assert!(GenerationOptions::new().with_temperature(-0.1).validate().is_err());
        assert!(GenerationOptions::new().with_max_tokens(0).validate().is_err());
        assert!(GenerationOptions::new().with_max_tokens(256).validate().is_ok());
    }

    #[test]
    fn test_request_validation() {
        let empty = StreamRequest::new("gpt-4o-mini", vec![]);
        assert!(matches!(empty.validate(), Err(StreamError::InvalidRequest(_))));

        let blank_model = StreamRequest::new("  ", vec![ChatMessage::user("hi")]);
        assert!(blank_model.validate().is_err());

        let ok = StreamRequest::new("gpt-4o-mini", vec![ChatMessage::user("hi")]).with_temperature(0.7);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_retarget_keeps_history() {
        let request = StreamRequest::new("primary-x", vec![ChatMessage::user("Bonjour")])
            .with_temperature(0.3)
            .with_max_tokens(64)
            .with_endpoint("/api/custom");

        let fallback = request.retarget("secondary-y");
        assert_eq!(fallback.model, "secondary-y");
        assert_eq!(fallback.messages, request.messages);
        assert_eq!(fallback.options, request.options);
        assert!(fallback.endpoint.is_none());
    }
}
