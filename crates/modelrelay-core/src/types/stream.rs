//! Streaming response types

use serde::{Deserialize, Serialize};

/// Which upstream an attempt went to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attempt {
    /// The model the caller asked for
    Primary,
    /// The single fallback hop
    Fallback,
}

impl std::fmt::Display for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attempt::Primary => write!(f, "primary"),
            Attempt::Fallback => write!(f, "fallback"),
        }
    }
}

/// Incremental text fragment, delivered in receipt order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// The new fragment only, never the accumulated text
    pub text: String,
    /// Position within the current attempt, starting at 0
    pub index: usize,
    /// Attempt that produced the fragment
    pub attempt: Attempt,
}

impl StreamChunk {
    /// Create a chunk
    pub fn new(text: impl Into<String>, index: usize, attempt: Attempt) -> Self {
        Self {
            text: text.into(),
            index,
            attempt,
        }
    }

    /// Get the fragment text
    pub fn as_text(&self) -> &str {
        &self.text
    }
}

/// Final outcome of a successful generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamResult {
    /// Concatenation of every chunk of the winning attempt
    pub text: String,
    /// Model that actually produced the text
    pub model: String,
    /// Whether the primary or the fallback produced it
    pub attempt: Attempt,
    /// Number of chunks delivered by the winning attempt
    #[serde(rename = "chunkCount")]
    pub chunk_count: usize,
}

impl StreamResult {
    /// Check if the fallback produced this result
    pub fn used_fallback(&self) -> bool {
        self.attempt == Attempt::Fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_accessors() {
        let chunk = StreamChunk::new("Hello", 0, Attempt::Primary);
        assert_eq!(chunk.as_text(), "Hello");
        assert_eq!(chunk.attempt, Attempt::Primary);
    }

    #[test]
    fn test_result_serialization() {
        let result = StreamResult {
            text: "Bonjour!".to_string(),
            model: "deepseek-chat".to_string(),
            attempt: Attempt::Fallback,
            chunk_count: 2,
        };
        assert!(result.used_fallback());

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"attempt\":\"fallback\""));
        assert!(json.contains("\"chunkCount\":2"));
    }
}
