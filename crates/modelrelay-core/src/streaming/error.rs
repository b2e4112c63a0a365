//! Streaming error types

use std::time::Duration;

use thiserror::Error;

/// Errors that can end a streaming attempt or a whole generation
#[derive(Error, Debug, Clone)]
pub enum StreamError {
    /// Network failure or non-2xx response from a proxy
    #[error("{}", transport_message(.endpoint, .status, .message))]
    Transport {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    /// Malformed SSE line; logged and skipped, never surfaced
    #[error("Malformed stream event: {0}")]
    Parse(String),

    /// The provider reported an error inside the stream
    #[error("{model} upstream error: {message}")]
    Upstream { model: String, message: String },

    /// No bytes arrived within the idle timeout
    #[error("{model} stream idle for {after:?}")]
    IdleTimeout { model: String, after: Duration },

    /// Both the primary and the fallback attempt failed
    #[error("Primary and fallback both failed: {fallback} (primary: {primary})")]
    ExhaustedFallback {
        primary: Box<StreamError>,
        fallback: Box<StreamError>,
    },

    /// Model id not present in the catalog
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// Request rejected before any network traffic
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Generation was cancelled or superseded by a newer one
    #[error("Request cancelled")]
    Cancelled,
}

fn transport_message(endpoint: &str, status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("{} returned HTTP {}: {}", endpoint, code, message),
        None => format!("{} unreachable: {}", endpoint, message),
    }
}

impl StreamError {
    /// Create a transport error for a non-2xx response
    pub fn status(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create a transport error for a network failure
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Create an upstream error
    pub fn upstream(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Whether this failure on the primary attempt moves on to the fallback
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            StreamError::Transport { .. }
                | StreamError::Upstream { .. }
                | StreamError::IdleTimeout { .. }
        )
    }

    /// HTTP status, if the failure came from a proxy response
    pub fn http_status(&self) -> Option<u16> {
        match self {
            StreamError::Transport { status, .. } => *status,
            StreamError::ExhaustedFallback { fallback, .. } => fallback.http_status(),
            _ => None,
        }
    }

    /// Check if this is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StreamError::Cancelled)
    }
}

pub type StreamOutcome<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_classification() {
        assert!(StreamError::status("/api/openai-chat", 500, "boom").triggers_fallback());
        assert!(StreamError::network("/api/openai-chat", "refused").triggers_fallback());
        assert!(StreamError::upstream("gpt-4o", "overloaded").triggers_fallback());
        assert!(StreamError::IdleTimeout {
            model: "gpt-4o".to_string(),
            after: Duration::from_secs(1)
        }
        .triggers_fallback());

        assert!(!StreamError::Cancelled.triggers_fallback());
        assert!(!StreamError::InvalidRequest("x".to_string()).triggers_fallback());
        assert!(!StreamError::Parse("x".to_string()).triggers_fallback());
    }

    #[test]
    fn test_display() {
        let err = StreamError::status("/api/openai-chat", 500, "Internal error");
        assert_eq!(err.to_string(), "/api/openai-chat returned HTTP 500: Internal error");
        assert_eq!(err.http_status(), Some(500));

        let err = StreamError::network("/api/gemini-chat", "connection refused");
        assert_eq!(err.to_string(), "/api/gemini-chat unreachable: connection refused");

        let exhausted = StreamError::ExhaustedFallback {
            primary: Box::new(StreamError::status("/a", 500, "x")),
            fallback: Box::new(StreamError::status("/b", 503, "y")),
        };
        assert_eq!(exhausted.http_status(), Some(503));
        assert!(exhausted.to_string().contains("/b returned HTTP 503"));
    }
}
