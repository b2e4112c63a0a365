//! Mock transport for testing
//!
//! Replays scripted proxy responses without network dependencies and
//! records every request so tests can assert on what was sent where.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use crate::logging::Logger;
use crate::sse::{encode_data, encode_delta, encode_done};
use crate::streaming::{StreamError, StreamOutcome};
use crate::types::CancellationToken;

use super::traits::{ByteStream, ProxyTransport};
use super::wire::{ProxyEndpoint, ProxyRequestBody};

/// Scripted response for one request
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// 2xx SSE body, delivered as these raw reads in order
    Sse(Vec<String>),
    /// SSE reads followed by a mid-stream network failure
    SseThenError { reads: Vec<String>, message: String },
    /// Non-2xx response with a `{ error }` body
    Status { status: u16, error: String },
    /// Connection failure before any response
    NetworkError(String),
    /// Response headers arrive, then the body never produces a byte
    Stall,
    /// Non-streaming success body
    Completion(String),
}

impl MockResponse {
    /// OpenAI-shape deltas followed by `[DONE]`, one read per event
    pub fn deltas<S: AsRef<str>>(deltas: &[S]) -> Self {
        let mut reads: Vec<String> = deltas.iter().map(|d| encode_delta(d.as_ref())).collect();
        reads.push(encode_done());
        MockResponse::Sse(reads)
    }

    /// A single upstream error event inside a 2xx stream
    pub fn upstream_error(message: &str) -> Self {
        MockResponse::Sse(vec![encode_data(&serde_json::json!({ "error": message }))])
    }

    /// Non-2xx response
    pub fn status(status: u16, error: impl Into<String>) -> Self {
        MockResponse::Status {
            status,
            error: error.into(),
        }
    }
}

/// One request seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub body: ProxyRequestBody,
}

/// Configuration for the mock transport
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Delay between reads in milliseconds (0 = no delay)
    pub read_delay_ms: u64,
}

/// Scripted stand-in for `HttpTransport`
///
/// Responses are queued per endpoint path and consumed in order. A path
/// with an empty queue answers 404.
pub struct MockTransport {
    config: MockConfig,
    scripts: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    calls: Mutex<Vec<RecordedCall>>,
    logger: Arc<dyn Logger>,
}

impl MockTransport {
    /// Create a mock with no scripts
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self::with_config(MockConfig::default(), logger)
    }

    /// Create with specific config
    pub fn with_config(config: MockConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            config,
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Set read delay
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.config.read_delay_ms = delay_ms;
        self
    }

    /// Queue a response for an endpoint path
    pub fn respond(&self, path: impl Into<String>, response: MockResponse) -> &Self {
        self.scripts
            .lock()
            .entry(path.into())
            .or_default()
            .push_back(response);
        self
    }

    /// Every request received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Requests received by one endpoint path
    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.path == path)
            .cloned()
            .collect()
    }

    fn next_response(&self, endpoint: &ProxyEndpoint, body: &ProxyRequestBody) -> MockResponse {
        self.calls.lock().push(RecordedCall {
            path: endpoint.path.clone(),
            body: body.clone(),
        });

        let response = self
            .scripts
            .lock()
            .get_mut(&endpoint.path)
            .and_then(|queue| queue.pop_front());
        response.unwrap_or_else(|| MockResponse::status(404, format!("no script for {}", endpoint.path)))
    }

    fn read_stream(&self, reads: Vec<String>, trailing_error: Option<StreamError>, cancel: CancellationToken) -> ByteStream {
        let delay_ms = self.config.read_delay_ms;
        let logger = Arc::clone(&self.logger);

        let items: Vec<StreamOutcome<Bytes>> = reads
            .into_iter()
            .map(|r| Ok(Bytes::from(r)))
            .chain(trailing_error.map(Err))
            .collect();

        let stream = stream::iter(items.into_iter().enumerate()).then(move |(i, item)| {
            let logger = Arc::clone(&logger);
            let cancel = cancel.clone();
            async move {
                if i > 0 && delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                if cancel.is_cancelled() {
                    return Err(StreamError::Cancelled);
                }
                if let Ok(bytes) = &item {
                    logger.debug(&format!("MockTransport: read {} ({} bytes)", i, bytes.len()));
                }
                item
            }
        });

        Box::pin(stream)
    }
}

#[async_trait]
impl ProxyTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn open_stream(
        &self,
        endpoint: &ProxyEndpoint,
        body: &ProxyRequestBody,
        cancel: CancellationToken,
    ) -> StreamOutcome<ByteStream> {
        let response = self.next_response(endpoint, body);
        self.logger.debug(&format!(
            "MockTransport: open_stream {} -> {:?}",
            endpoint.path, response
        ));

        match response {
            MockResponse::Sse(reads) => Ok(self.read_stream(reads, None, cancel)),
            MockResponse::SseThenError { reads, message } => {
                let error = StreamError::network(endpoint.path.clone(), message);
                Ok(self.read_stream(reads, Some(error), cancel))
            }
            MockResponse::Status { status, error } => {
                Err(StreamError::status(endpoint.path.clone(), status, error))
            }
            MockResponse::NetworkError(message) => {
                Err(StreamError::network(endpoint.path.clone(), message))
            }
            MockResponse::Stall => Ok(Box::pin(stream::pending::<StreamOutcome<Bytes>>())),
            MockResponse::Completion(text) => {
                // A JSON body where SSE was expected: one unterminated line
                let json = serde_json::json!({ "generatedText": text }).to_string();
                Ok(self.read_stream(vec![json], None, cancel))
            }
        }
    }

    async fn complete(
        &self,
        endpoint: &ProxyEndpoint,
        body: &ProxyRequestBody,
        cancel: CancellationToken,
    ) -> StreamOutcome<String> {
        if cancel.is_cancelled() {
            return Err(StreamError::Cancelled);
        }

        match self.next_response(endpoint, body) {
            MockResponse::Completion(text) => Ok(text),
            MockResponse::Status { status, error } => {
                Err(StreamError::status(endpoint.path.clone(), status, error))
            }
            MockResponse::NetworkError(message) | MockResponse::SseThenError { message, .. } => {
                Err(StreamError::network(endpoint.path.clone(), message))
            }
            MockResponse::Stall => {
                cancel.cancelled().await;
                Err(StreamError::Cancelled)
            }
            MockResponse::Sse(_) => Err(StreamError::upstream(
                body.model.clone(),
                "invalid completion body: expected JSON, got an event stream",
            )),
        }
    }
}
