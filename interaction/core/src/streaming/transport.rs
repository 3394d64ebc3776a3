//! Stream Transport
//!
//! Issues a streaming chat request and delivers content fragments to a
//! [`StreamHandler`] as they arrive.
//!
//! Each [`StreamTransport::start`] call owns one session: a tokio task with
//! its own [`LineFramer`] and cancellation token. The task races the request
//! against cancellation, so cancelling drops the response body (releasing the
//! connection) at the next suspension point.
//!
//! Every handler callback runs under the session's callback gate, which
//! [`CancelHandle::cancel`] also takes. A cancel from another thread waits
//! for the in-flight callback to return; no callback starts after it.
//!
//! # Terminal notifications
//!
//! A session ends in exactly one of:
//!
//! - `on_done`: the `[DONE]` sentinel arrived, or the body ended without it
//!   (the trailing partial record is processed first)
//! - `on_error`: connection failure, non-success status, or a body read error
//! - nothing: the session was cancelled

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::ReentrantMutex;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use super::error::TransportError;
use super::framer::LineFramer;
use super::protocol::{parse_fragment, parse_record, Record, StreamRequest};
use crate::config::StreamConfig;

// ============================================================================
// Handlers
// ============================================================================

/// Receives the callbacks of one stream session
///
/// Callbacks run on the session task, in wire order. `on_done` and
/// `on_error` are terminal: at most one of them fires, once.
pub trait StreamHandler: Send + 'static {
    /// A non-empty content fragment arrived
    fn on_fragment(&mut self, text: &str);

    /// The stream completed normally
    fn on_done(&mut self);

    /// The stream failed
    fn on_error(&mut self, error: TransportError);
}

/// Callback delivered through a channel
#[derive(Debug)]
pub enum StreamEvent {
    /// Content fragment
    Fragment(String),
    /// Normal completion
    Done,
    /// Failure
    Error(TransportError),
}

impl StreamEvent {
    /// Whether this is a terminal event
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Fragment(_))
    }
}

/// Handler forwarding every callback into an unbounded channel
#[derive(Clone, Debug)]
pub struct ChannelHandler {
    tx: mpsc::UnboundedSender<StreamEvent>,
}

impl ChannelHandler {
    /// Create a handler and the receiving end of its channel
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: StreamEvent) {
        // A dropped receiver just means nobody is listening anymore
        let _ = self.tx.send(event);
    }
}

impl StreamHandler for ChannelHandler {
    fn on_fragment(&mut self, text: &str) {
        self.forward(StreamEvent::Fragment(text.to_string()));
    }

    fn on_done(&mut self) {
        self.forward(StreamEvent::Done);
    }

    fn on_error(&mut self, error: TransportError) {
        self.forward(StreamEvent::Error(error));
    }
}

// ============================================================================
// Cancellation
// ============================================================================

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
    // Reentrant so a handler can cancel its own session
    gate: ReentrantMutex<()>,
}

/// Cloneable cancellation token for a stream session
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    state: Arc<CancelState>,
}

impl CancelHandle {
    /// Cancel the session
    ///
    /// Idempotent; returns `true` only for the call that actually cancelled.
    /// Safe to call from inside a handler callback. Called from elsewhere
    /// while a callback is running, it blocks until that callback returns.
    pub fn cancel(&self) -> bool {
        let _gate = self.state.gate.lock();
        let first = !self.state.cancelled.swap(true, Ordering::SeqCst);
        if first {
            // notify_one stores a permit if the task is not waiting yet
            self.state.notify.notify_one();
        }
        first
    }

    /// Whether [`CancelHandle::cancel`] has been called
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Run `callback` unless the session is cancelled
    ///
    /// The check and the call happen under the gate, so a concurrent
    /// `cancel` either lands before the check or after `callback` returns.
    fn unless_cancelled<R>(&self, callback: impl FnOnce() -> R) -> Option<R> {
        let _gate = self.state.gate.lock();
        if self.is_cancelled() {
            return None;
        }
        Some(callback())
    }

    async fn cancelled(&self) {
        while !self.is_cancelled() {
            self.state.notify.notified().await;
        }
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// How a session ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// `on_done` fired
    Done,
    /// `on_error` fired (or the handler panicked)
    Failed,
    /// Cancelled; no terminal callback fired
    Cancelled,
}

/// Per-call state owned by the session task
#[derive(Debug)]
struct StreamSession {
    request: StreamRequest,
    cancel: CancelHandle,
    framer: LineFramer,
}

/// Handle to a running stream session
///
/// Dropping the handle detaches the session; it keeps running to completion.
#[derive(Debug)]
pub struct StreamHandle {
    id: Uuid,
    cancel: CancelHandle,
    task: JoinHandle<SessionOutcome>,
}

impl StreamHandle {
    /// Session identifier (also recorded on the session's tracing span)
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Cancel the session; see [`CancelHandle::cancel`]
    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }

    /// Whether the session has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A token that can cancel the session from elsewhere
    #[must_use]
    pub fn canceller(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Wait for the session task to finish
    pub async fn wait(self) -> SessionOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "stream session task failed");
                SessionOutcome::Failed
            }
        }
    }
}

/// Client for a chat completions endpoint
#[derive(Clone, Debug)]
pub struct StreamTransport {
    client: reqwest::Client,
    request_timeout: Option<Duration>,
}

impl Default for StreamTransport {
    fn default() -> Self {
        Self::with_client(reqwest::Client::new())
    }
}

impl StreamTransport {
    /// Wrap an existing HTTP client
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            request_timeout: None,
        }
    }

    /// Build a transport honoring the configured timeouts
    ///
    /// The connect timeout applies to every request. The request timeout
    /// bounds non-streaming calls only; a streaming body may legitimately stay
    /// open for as long as the model keeps producing tokens.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] if the HTTP client cannot be built.
    pub fn from_config(config: &StreamConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        Ok(Self {
            client,
            request_timeout: Some(Duration::from_millis(config.request_timeout_ms)),
        })
    }

    /// Start a streaming session
    ///
    /// Must be called within a tokio runtime.
    pub fn start<H: StreamHandler>(&self, request: StreamRequest, handler: H) -> StreamHandle {
        let id = Uuid::new_v4();
        let cancel = CancelHandle::default();
        let span = tracing::debug_span!("stream_session", id = %id, endpoint = %request.url);

        let session = StreamSession {
            request,
            cancel: cancel.clone(),
            framer: LineFramer::new(),
        };
        let task = tokio::spawn(run_session(self.client.clone(), session, handler).instrument(span));

        StreamHandle { id, cancel, task }
    }

    pub(super) async fn send(
        &self,
        request: &StreamRequest,
    ) -> Result<reqwest::Response, TransportError> {
        let mut builder = self.client.post(&request.url).json(&request.body);
        if let Some(timeout) = self.request_timeout.filter(|_| !request.body.stream) {
            builder = builder.timeout(timeout);
        }
        post(builder, request).await
    }
}

async fn post(
    mut builder: reqwest::RequestBuilder,
    request: &StreamRequest,
) -> Result<reqwest::Response, TransportError> {
    if let Some(key) = &request.api_key {
        builder = builder.bearer_auth(key);
    }

    let response = builder
        .send()
        .await
        .map_err(|e| TransportError::Connect(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

async fn run_session<H: StreamHandler>(
    client: reqwest::Client,
    mut session: StreamSession,
    mut handler: H,
) -> SessionOutcome {
    tracing::debug!("stream session started");
    let cancel = session.cancel.clone();

    let outcome = tokio::select! {
        biased;
        () = cancel.cancelled() => SessionOutcome::Cancelled,
        outcome = drive(&client, &mut session, &mut handler) => outcome,
    };

    tracing::debug!(?outcome, "stream session finished");
    outcome
}

async fn drive<H: StreamHandler>(
    client: &reqwest::Client,
    session: &mut StreamSession,
    handler: &mut H,
) -> SessionOutcome {
    let builder = client.post(&session.request.url).json(&session.request.body);
    let response = match post(builder, &session.request).await {
        Ok(response) => response,
        Err(e) => return fail(&session.cancel, handler, e),
    };

    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => return fail(&session.cancel, handler, TransportError::Body(e.to_string())),
        };

        for record in session.framer.feed(&chunk) {
            if let Some(outcome) = process_record(&record, &session.cancel, handler) {
                return outcome;
            }
        }
    }

    if let Some(record) = session.framer.finish() {
        if let Some(outcome) = process_record(&record, &session.cancel, handler) {
            return outcome;
        }
    }

    tracing::debug!("body ended without done sentinel");
    finish(&session.cancel, handler)
}

fn finish<H: StreamHandler>(cancel: &CancelHandle, handler: &mut H) -> SessionOutcome {
    cancel
        .unless_cancelled(|| handler.on_done())
        .map_or(SessionOutcome::Cancelled, |()| SessionOutcome::Done)
}

/// Handle one framed record; `Some` ends the session
fn process_record<H: StreamHandler>(
    line: &str,
    cancel: &CancelHandle,
    handler: &mut H,
) -> Option<SessionOutcome> {
    if cancel.is_cancelled() {
        return Some(SessionOutcome::Cancelled);
    }

    match parse_record(line) {
        Record::Ignored => None,
        Record::Done => Some(finish(cancel, handler)),
        Record::Data(payload) => match parse_fragment(payload) {
            Ok(Some(text)) => cancel
                .unless_cancelled(|| handler.on_fragment(&text))
                .map_or(Some(SessionOutcome::Cancelled), |()| None),
            Ok(None) => None,
            Err(e) => {
                tracing::trace!(error = %e, "skipping unparseable record");
                None
            }
        },
    }
}

fn fail<H: StreamHandler>(
    cancel: &CancelHandle,
    handler: &mut H,
    error: TransportError,
) -> SessionOutcome {
    cancel
        .unless_cancelled(|| {
            tracing::warn!(error = %error, "stream session failed");
            handler.on_error(error);
        })
        .map_or(SessionOutcome::Cancelled, |()| SessionOutcome::Failed)
}
