//! Callbacks through which a generation reports progress

use parking_lot::Mutex;

use crate::types::{StreamChunk, StreamResult};

use super::error::StreamError;

/// Receiver of one generation's events
///
/// For a generation that is not superseded or cancelled, the service calls
/// `on_chunk` zero or more times in receipt order, then exactly one of
/// `on_complete` / `on_error`.
pub trait StreamObserver: Send + Sync {
    /// A new fragment (not the accumulated text)
    fn on_chunk(&self, chunk: &StreamChunk);

    /// The generation finished; called at most once
    fn on_complete(&self, result: &StreamResult);

    /// The generation failed for good; called at most once
    fn on_error(&self, error: &StreamError);

    /// The primary attempt failed and its partial text was discarded
    ///
    /// Chunks delivered before this call belong to the abandoned attempt.
    fn on_fallback(&self, _from_model: &str, _to_model: &str, _cause: &StreamError) {}
}

type ChunkFn = Box<dyn Fn(&StreamChunk) + Send + Sync>;
type CompleteFn = Box<dyn Fn(&StreamResult) + Send + Sync>;
type ErrorFn = Box<dyn Fn(&StreamError) + Send + Sync>;
type FallbackFn = Box<dyn Fn(&str, &str, &StreamError) + Send + Sync>;

/// Observer built from closures
///
/// ```
/// use modelrelay_core::streaming::FnObserver;
///
/// let observer = FnObserver::new(
///     |chunk| print!("{}", chunk.text),
///     |result| println!("\n[{}]", result.model),
///     |error| eprintln!("failed: {}", error),
/// );
/// ```
pub struct FnObserver {
    on_chunk: ChunkFn,
    on_complete: CompleteFn,
    on_error: ErrorFn,
    on_fallback: Option<FallbackFn>,
}

impl FnObserver {
    /// Create an observer from the three required callbacks
    pub fn new(
        on_chunk: impl Fn(&StreamChunk) + Send + Sync + 'static,
        on_complete: impl Fn(&StreamResult) + Send + Sync + 'static,
        on_error: impl Fn(&StreamError) + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_chunk: Box::new(on_chunk),
            on_complete: Box::new(on_complete),
            on_error: Box::new(on_error),
            on_fallback: None,
        }
    }

    /// Also listen for the fallback reset
    pub fn with_fallback(mut self, on_fallback: impl Fn(&str, &str, &StreamError) + Send + Sync + 'static) -> Self {
        self.on_fallback = Some(Box::new(on_fallback));
        self
    }
}

impl StreamObserver for FnObserver {
    fn on_chunk(&self, chunk: &StreamChunk) {
        (self.on_chunk)(chunk)
    }

    fn on_complete(&self, result: &StreamResult) {
        (self.on_complete)(result)
    }

    fn on_error(&self, error: &StreamError) {
        (self.on_error)(error)
    }

    fn on_fallback(&self, from_model: &str, to_model: &str, cause: &StreamError) {
        if let Some(f) = &self.on_fallback {
            f(from_model, to_model, cause)
        }
    }
}

/// One event seen by a `RecordingObserver`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    Chunk(String),
    Fallback { from: String, to: String },
    Complete(StreamResult),
    Error(String),
}

/// Observer that records everything, for tests and diagnostics
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event so far, in delivery order
    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().clone()
    }

    /// Chunk texts, in delivery order
    pub fn chunks(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ObservedEvent::Chunk(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Completion results (more than one would be a bug)
    pub fn completions(&self) -> Vec<StreamResult> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ObservedEvent::Complete(result) => Some(result.clone()),
                _ => None,
            })
            .collect()
    }

    /// Error messages (more than one would be a bug)
    pub fn errors(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ObservedEvent::Error(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of terminal events delivered
    pub fn terminal_count(&self) -> usize {
        self.completions().len() + self.errors().len()
    }
}

impl StreamObserver for RecordingObserver {
    fn on_chunk(&self, chunk: &StreamChunk) {
        self.events.lock().push(ObservedEvent::Chunk(chunk.text.clone()));
    }

    fn on_complete(&self, result: &StreamResult) {
        self.events.lock().push(ObservedEvent::Complete(result.clone()));
    }

    fn on_error(&self, error: &StreamError) {
        self.events.lock().push(ObservedEvent::Error(error.to_string()));
    }

    fn on_fallback(&self, from_model: &str, to_model: &str, _cause: &StreamError) {
        self.events.lock().push(ObservedEvent::Fallback {
            from: from_model.to_string(),
            to: to_model.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attempt;
    use std::sync::Arc;

    #[test]
    fn test_fn_observer_dispatch() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));

        let (a, b, c, d) = (seen.clone(), seen.clone(), seen.clone(), seen.clone());
        let observer = FnObserver::new(
            move |chunk| a.lock().push(format!("chunk:{}", chunk.text)),
            move |result| b.lock().push(format!("complete:{}", result.text)),
            move |error| c.lock().push(format!("error:{}", error)),
        )
        .with_fallback(move |from, to, _| d.lock().push(format!("fallback:{}->{}", from, to)));

        observer.on_chunk(&StreamChunk::new("Hi", 0, Attempt::Primary));
        observer.on_fallback("gpt-4o", "deepseek-chat", &StreamError::Cancelled);
        observer.on_complete(&StreamResult {
            text: "Hi".to_string(),
            model: "deepseek-chat".to_string(),
            attempt: Attempt::Fallback,
            chunk_count: 1,
        });
        observer.on_error(&StreamError::Cancelled);

        assert_eq!(
            *seen.lock(),
            vec![
                "chunk:Hi",
                "fallback:gpt-4o->deepseek-chat",
                "complete:Hi",
                "error:Request cancelled"
            ]
        );
    }

    #[test]
    fn test_fallback_callback_is_optional() {
        let observer = FnObserver::new(|_| {}, |_| {}, |_| {});
        observer.on_fallback("a", "b", &StreamError::Cancelled);
    }
}
