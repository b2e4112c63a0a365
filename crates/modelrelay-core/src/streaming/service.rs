//! Streaming generation with a single fallback hop
//!
//! Each call to the service is a *generation*. A generation streams from the
//! primary model; if that attempt fails at the transport, upstream, or idle
//! level it is abandoned and exactly one attempt is made against the model's
//! configured fallback. Only one generation is current at a time: starting a
//! new one cancels the previous one, and callbacks of a superseded
//! generation are suppressed.

use futures::StreamExt;
use parking_lot::{Mutex, ReentrantMutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::catalog::ModelCatalog;
use crate::config::{ConfigError, ConfigResult, ServiceConfig};
use crate::logging::Logger;
use crate::proxy::{ByteStream, HttpTransport, ProxyEndpoint, ProxyRequestBody, ProxyTransport};
use crate::sse::{SseDecoder, SseEvent};
use crate::types::{Attempt, CancellationToken, StreamChunk, StreamRequest, StreamResult};
use crate::{log_debug, log_error, log_info, log_warn};

use super::error::{StreamError, StreamOutcome};
use super::observer::StreamObserver;

/// Lifecycle of the current generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Nothing started yet, or the request is being checked
    Idle,
    /// Reading from the primary or the fallback
    Streaming(Attempt),
    /// `on_complete` was delivered
    Complete,
    /// `on_error` was delivered
    Failed,
    /// Cancelled before reaching a terminal state
    Cancelled,
}

impl StreamState {
    /// Check if no more callbacks will follow
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamState::Complete | StreamState::Failed | StreamState::Cancelled)
    }
}

#[derive(Debug, Clone)]
struct Generation {
    id: u64,
    cancel: CancellationToken,
}

struct ActiveGeneration {
    id: u64,
    cancel: CancellationToken,
    state: StreamState,
}

/// Streams chat completions through provider proxies with one fallback hop
///
/// # Example
///
/// ```no_run
/// use modelrelay_core::config::ServiceConfig;
/// use modelrelay_core::logging::NoOpLogger;
/// use modelrelay_core::streaming::{FnObserver, StreamingService};
/// use modelrelay_core::types::{ChatMessage, StreamRequest};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let service = StreamingService::from_config(ServiceConfig::default(), NoOpLogger::shared())?;
/// let observer = FnObserver::new(
///     |chunk| print!("{}", chunk.text),
///     |result| println!("\n-- {}", result.model),
///     |error| eprintln!("failed: {}", error),
/// );
///
/// let request = StreamRequest::new("gpt-4o", vec![ChatMessage::user("Hello")]);
/// service.stream_with_fallback(request, &observer).await?;
/// # Ok(())
/// # }
/// ```
pub struct StreamingService {
    transport: Arc<dyn ProxyTransport>,
    catalog: ModelCatalog,
    config: ServiceConfig,
    logger: Arc<dyn Logger>,
    next_generation: AtomicU64,
    active: Mutex<ActiveGeneration>,
    // Held while a callback runs so begin()/cancel() wait for it to return
    delivery: ReentrantMutex<()>,
}

impl StreamingService {
    /// Create a service over an explicit transport and catalog
    pub fn new(
        transport: Arc<dyn ProxyTransport>,
        catalog: ModelCatalog,
        config: ServiceConfig,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            transport,
            catalog,
            config,
            logger,
            next_generation: AtomicU64::new(0),
            active: Mutex::new(ActiveGeneration {
                id: 0,
                cancel: CancellationToken::new(),
                state: StreamState::Idle,
            }),
            delivery: ReentrantMutex::new(()),
        }
    }

    /// Create a service talking HTTP to the configured proxies
    ///
    /// Uses the built-in catalog with the config's fallback overrides.
    pub fn from_config(config: ServiceConfig, logger: Arc<dyn Logger>) -> ConfigResult<Self> {
        config.validate()?;
        let catalog = config.catalog(ModelCatalog::builtin())?;

        let mut transport = HttpTransport::with_connect_timeout(config.connect_timeout(), Arc::clone(&logger))
            .map_err(|e| ConfigError::invalid("connect_timeout_ms", e.to_string()))?;
        if let Some(token) = &config.auth_token {
            transport = transport.with_auth_token(token.clone());
        }

        Ok(Self::new(Arc::new(transport), catalog, config, logger))
    }

    /// The catalog fallbacks are resolved against
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// The settings this service runs with
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Name of the underlying transport
    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// State of the current generation
    pub fn state(&self) -> StreamState {
        self.active.lock().state
    }

    /// Number of the current generation (0 before the first call)
    pub fn current_generation(&self) -> u64 {
        self.active.lock().id
    }

    /// Cancel the current generation
    ///
    /// No further callbacks are delivered for it once this returns.
    pub fn cancel(&self) {
        let _guard = self.delivery.lock();
        let mut active = self.active.lock();
        active.cancel.cancel();
        if active.id != 0 && !active.state.is_terminal() {
            active.state = StreamState::Cancelled;
        }
    }

    /// Stream `request`, falling back once on failure
    ///
    /// Supersedes any generation still in flight. Returns `Err(Cancelled)`
    /// without further callbacks if this generation is itself superseded
    /// or cancelled before it finishes.
    pub async fn stream_with_fallback(
        &self,
        request: StreamRequest,
        observer: &dyn StreamObserver,
    ) -> StreamOutcome<StreamResult> {
        let generation = self.begin();
        self.drive(generation, request.with_stream(true), observer).await
    }

    /// Spawn a generation on the tokio runtime
    ///
    /// The generation is current as soon as this returns, even before the
    /// task is first polled.
    pub fn start(self: &Arc<Self>, request: StreamRequest, observer: Arc<dyn StreamObserver>) -> StreamHandle {
        let generation = self.begin();
        let service = Arc::clone(self);
        let task_generation = generation.clone();

        let task = tokio::spawn(async move {
            service
                .drive(task_generation, request.with_stream(true), observer.as_ref())
                .await
        });

        StreamHandle {
            generation,
            service: Arc::clone(self),
            task,
        }
    }

    /// Non-streaming generation with the same single fallback hop
    ///
    /// Does not take part in single-flight and delivers no callbacks.
    pub async fn complete_with_fallback(&self, request: StreamRequest) -> StreamOutcome<StreamResult> {
        let request = request.with_stream(false);
        request.validate()?;
        let endpoint = self.endpoint_for(&request)?;
        let cancel = CancellationToken::new();

        let primary_error = match self.complete_once(&request, &endpoint, Attempt::Primary, &cancel).await {
            Ok(result) => return Ok(result),
            Err(e) if !e.triggers_fallback() => return Err(e),
            Err(e) => e,
        };

        let Some(fallback) = self.catalog.fallback_for(&request.model) else {
            log_warn!(self.logger, "[StreamingService] {} failed with no fallback: {}", request.model, primary_error);
            return Err(primary_error);
        };
        log_warn!(
            self.logger,
            "[StreamingService] {} failed ({}), completing with {}",
            request.model,
            primary_error,
            fallback.id
        );

        let fallback_request = request.retarget(fallback.id.clone());
        let fallback_endpoint = self.config.endpoint(fallback.provider);
        self.complete_once(&fallback_request, &fallback_endpoint, Attempt::Fallback, &cancel)
            .await
            .map_err(|e| StreamError::ExhaustedFallback {
                primary: Box::new(primary_error),
                fallback: Box::new(e),
            })
    }

    fn begin(&self) -> Generation {
        let _guard = self.delivery.lock();
        let id = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();

        let mut active = self.active.lock();
        if !active.state.is_terminal() && active.id != 0 {
            log_debug!(self.logger, "[StreamingService] generation {} superseded by {}", active.id, id);
        }
        active.cancel.cancel();
        *active = ActiveGeneration {
            id,
            cancel: cancel.clone(),
            state: StreamState::Idle,
        };

        Generation { id, cancel }
    }

    fn is_live(&self, generation: &Generation) -> bool {
        !generation.cancel.is_cancelled() && self.active.lock().id == generation.id
    }

    fn set_state(&self, generation: &Generation, state: StreamState) {
        let mut active = self.active.lock();
        // Terminal states are final; a cancelled generation stays Cancelled
        if active.id == generation.id && !active.state.is_terminal() && !generation.cancel.is_cancelled() {
            active.state = state;
        }
    }

    fn cancel_generation(&self, generation: &Generation) {
        let _guard = self.delivery.lock();
        generation.cancel.cancel();
        let mut active = self.active.lock();
        if active.id == generation.id && !active.state.is_terminal() {
            active.state = StreamState::Cancelled;
        }
    }

    async fn drive(
        &self,
        generation: Generation,
        request: StreamRequest,
        observer: &dyn StreamObserver,
    ) -> StreamOutcome<StreamResult> {
        let delivery = Delivery {
            service: self,
            generation,
            observer,
        };

        match self.run_generation(&request, &delivery).await {
            Ok(result) => {
                let delivered = delivery.deliver(|o| {
                    self.set_state(&delivery.generation, StreamState::Complete);
                    o.on_complete(&result);
                });
                if delivered {
                    log_info!(
                        self.logger,
                        "[StreamingService] generation {} complete: {} chars from {} ({})",
                        delivery.generation.id,
                        result.text.chars().count(),
                        result.model,
                        result.attempt
                    );
                    Ok(result)
                } else {
                    Err(StreamError::Cancelled)
                }
            }
            Err(StreamError::Cancelled) => Err(StreamError::Cancelled),
            Err(error) => {
                let delivered = delivery.deliver(|o| {
                    self.set_state(&delivery.generation, StreamState::Failed);
                    o.on_error(&error);
                });
                if delivered {
                    log_error!(self.logger, "[StreamingService] generation {} failed: {}", delivery.generation.id, error);
                    Err(error)
                } else {
                    Err(StreamError::Cancelled)
                }
            }
        }
    }

    async fn run_generation(&self, request: &StreamRequest, delivery: &Delivery<'_>) -> StreamOutcome<StreamResult> {
        request.validate()?;
        let endpoint = self.endpoint_for(request)?;
        log_info!(
            self.logger,
            "[StreamingService] generation {}: {} via {} ({} messages)",
            delivery.generation.id,
            request.model,
            endpoint,
            request.messages.len()
        );

        let primary_error = match self.attempt(request, &endpoint, Attempt::Primary, delivery).await {
            Ok(result) => return Ok(result),
            Err(e) if !e.triggers_fallback() => return Err(e),
            Err(e) => e,
        };

        let Some(fallback) = self.catalog.fallback_for(&request.model) else {
            log_warn!(self.logger, "[StreamingService] {} failed with no fallback: {}", request.model, primary_error);
            return Err(primary_error);
        };
        log_warn!(
            self.logger,
            "[StreamingService] {} failed ({}), falling back to {}",
            request.model,
            primary_error,
            fallback.id
        );

        // Partial primary text is dropped here; the observer is told so it can reset too
        if !delivery.deliver(|o| o.on_fallback(&request.model, &fallback.id, &primary_error)) {
            return Err(StreamError::Cancelled);
        }

        let fallback_request = request.retarget(fallback.id.clone());
        let fallback_endpoint = self.config.endpoint(fallback.provider);
        match self
            .attempt(&fallback_request, &fallback_endpoint, Attempt::Fallback, delivery)
            .await
        {
            Ok(result) => Ok(result),
            Err(StreamError::Cancelled) => Err(StreamError::Cancelled),
            Err(e) => Err(StreamError::ExhaustedFallback {
                primary: Box::new(primary_error),
                fallback: Box::new(e),
            }),
        }
    }

    fn endpoint_for(&self, request: &StreamRequest) -> StreamOutcome<ProxyEndpoint> {
        if let Some(path) = &request.endpoint {
            return Ok(ProxyEndpoint::new(self.config.proxy_base_url.clone(), path.clone()));
        }
        self.catalog
            .get(&request.model)
            .map(|model| self.config.endpoint(model.provider))
            .ok_or_else(|| StreamError::UnknownModel(request.model.clone()))
    }

    async fn attempt(
        &self,
        request: &StreamRequest,
        endpoint: &ProxyEndpoint,
        attempt: Attempt,
        delivery: &Delivery<'_>,
    ) -> StreamOutcome<StreamResult> {
        delivery.set_state(StreamState::Streaming(attempt));
        let cancel = delivery.generation.cancel.child_token();

        let result = self.read_attempt(request, endpoint, attempt, delivery, &cancel).await;

        // Releases the transport side of an abandoned attempt
        cancel.cancel();
        if let Err(e) = &result {
            log_debug!(self.logger, "[StreamingService] {} attempt on {} ended: {}", attempt, request.model, e);
        }
        result
    }

    async fn read_attempt(
        &self,
        request: &StreamRequest,
        endpoint: &ProxyEndpoint,
        attempt: Attempt,
        delivery: &Delivery<'_>,
        cancel: &CancellationToken,
    ) -> StreamOutcome<StreamResult> {
        let model = request.model.as_str();
        let idle = self.config.idle_timeout();
        let idle_error = || StreamError::IdleTimeout {
            model: model.to_string(),
            after: idle,
        };

        let body = ProxyRequestBody::from(request);
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StreamError::Cancelled),
            opened = tokio::time::timeout(idle, self.transport.open_stream(endpoint, &body, cancel.clone())) => opened,
        };
        let mut reads: ByteStream = match opened {
            Ok(stream) => stream?,
            Err(_) => return Err(idle_error()),
        };

        let mut decoder = SseDecoder::new();
        let mut text = String::new();
        let mut chunk_count = 0usize;
        let mut saw_event = false;

        loop {
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(StreamError::Cancelled),
                read = tokio::time::timeout(idle, reads.next()) => read,
            };

            let (events, ended) = match read {
                Err(_) => return Err(idle_error()),
                Ok(None) => (decoder.finish(), true),
                Ok(Some(Err(e))) => return Err(e),
                Ok(Some(Ok(bytes))) => (decoder.feed(&bytes), false),
            };

            saw_event |= !events.is_empty();
            for event in events {
                match event {
                    SseEvent::Delta(fragment) => {
                        let chunk = StreamChunk::new(fragment, chunk_count, attempt);
                        if !delivery.deliver(|o| o.on_chunk(&chunk)) {
                            return Err(StreamError::Cancelled);
                        }
                        text.push_str(&chunk.text);
                        chunk_count += 1;
                    }
                    SseEvent::Done => {
                        return Ok(finished(text, model, attempt, chunk_count));
                    }
                    SseEvent::UpstreamError(message) => {
                        return Err(StreamError::upstream(model, message));
                    }
                    SseEvent::Malformed { line, reason } => {
                        log_warn!(
                            self.logger,
                            "[StreamingService] skipping malformed line from {}: {} ({})",
                            model,
                            line,
                            reason
                        );
                    }
                    SseEvent::Empty => {}
                }
            }

            if ended && !saw_event {
                // e.g. an HTML page or a plain JSON body where SSE was expected
                return Err(StreamError::upstream(model, "response carried no SSE events"));
            }
            if ended {
                log_debug!(self.logger, "[StreamingService] {} stream ended without [DONE]", model);
                return Ok(finished(text, model, attempt, chunk_count));
            }
        }
    }

    async fn complete_once(
        &self,
        request: &StreamRequest,
        endpoint: &ProxyEndpoint,
        attempt: Attempt,
        cancel: &CancellationToken,
    ) -> StreamOutcome<StreamResult> {
        let idle = self.config.idle_timeout();
        let body = ProxyRequestBody::from(request);

        let text = match tokio::time::timeout(idle, self.transport.complete(endpoint, &body, cancel.clone())).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(StreamError::IdleTimeout {
                    model: request.model.clone(),
                    after: idle,
                })
            }
        };

        // Nothing was streamed, so the chunk count stays at zero
        Ok(finished(text, &request.model, attempt, 0))
    }
}

impl std::fmt::Debug for StreamingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingService")
            .field("transport", &self.transport.name())
            .field("models", &self.catalog.len())
            .field("proxy_base_url", &self.config.proxy_base_url)
            .field("state", &self.state())
            .finish()
    }
}

fn finished(text: String, model: &str, attempt: Attempt, chunk_count: usize) -> StreamResult {
    StreamResult {
        text,
        model: model.to_string(),
        attempt,
        chunk_count,
    }
}

/// Gate between a generation and its observer
struct Delivery<'a> {
    service: &'a StreamingService,
    generation: Generation,
    observer: &'a dyn StreamObserver,
}

impl Delivery<'_> {
    /// Run `f` only while this generation is current; false if it was dropped
    fn deliver(&self, f: impl FnOnce(&dyn StreamObserver)) -> bool {
        let _guard = self.service.delivery.lock();
        if !self.service.is_live(&self.generation) {
            return false;
        }
        f(self.observer);
        true
    }

    fn set_state(&self, state: StreamState) {
        self.service.set_state(&self.generation, state);
    }
}

/// Handle to a generation spawned with `StreamingService::start`
pub struct StreamHandle {
    generation: Generation,
    service: Arc<StreamingService>,
    task: JoinHandle<StreamOutcome<StreamResult>>,
}

impl StreamHandle {
    /// Generation number of this call
    pub fn generation(&self) -> u64 {
        self.generation.id
    }

    /// Cancel this generation; a no-op once it has finished
    pub fn cancel(&self) {
        self.service.cancel_generation(&self.generation);
    }

    /// Check if this generation may still deliver callbacks
    pub fn is_current(&self) -> bool {
        self.service.is_live(&self.generation)
    }

    /// Wait for the generation to finish
    pub async fn join(self) -> StreamOutcome<StreamResult> {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(StreamError::Cancelled),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("generation", &self.generation.id)
            .field("finished", &self.task.is_finished())
            .finish()
    }
}
