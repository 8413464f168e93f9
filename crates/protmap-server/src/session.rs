//! Stream session: the per-connection protocol loop.
//!
//! A session waits for a client message, serves it, and goes back to
//! waiting until the transport closes:
//!
//! ```text
//! AwaitingMessage ──init──►  Serving ──► AwaitingMessage
//!        │         ──query─►  Serving ──► AwaitingMessage
//!        └── transport closed ──► Closed
//! ```
//!
//! Query results go out in batches of `batch_size`. After each batch except
//! the last the session yields to the runtime, so one large result cannot
//! starve other sessions on the same worker. A failed send means the client
//! is gone: the session stops quietly without sending the rest.
//!
//! A bad request produces one `error` event and the loop continues. That
//! covers frames the transport could not decode, malformed payloads,
//! unreadable term files and even a panic while evaluating.

use crate::protocol::{ClientMessage, ServerMessage};
use futures::FutureExt;
use protmap_core::config::StreamConfig;
use protmap_core::{PointRecord, Query, QueryEngine, QueryError, ResultSet, TermError};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Transport seam
// ---------------------------------------------------------------------------

/// The peer went away; nothing more can be sent on this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("client disconnected")]
pub struct Disconnected;

/// A bidirectional message channel to one client.
///
/// The WebSocket adapter lives in [`crate::ws`]; tests drive sessions over
/// in-memory channels.
pub trait Transport: Send {
    /// Next text message from the client, or `None` once the connection is
    /// closed. A frame that arrived but cannot be read as text is an `Err`;
    /// the session reports it and keeps going.
    fn recv(&mut self) -> impl Future<Output = Option<Result<String, QueryError>>> + Send;

    fn send(&mut self, message: ServerMessage) -> impl Future<Output = Result<(), Disconnected>> + Send;
}

// ---------------------------------------------------------------------------
// Shared context
// ---------------------------------------------------------------------------

/// State shared by every session: the engine, the bootstrap sample and the
/// streaming parameters.
#[derive(Debug)]
pub struct SessionContext {
    engine: QueryEngine,
    bootstrap: Vec<PointRecord>,
    batch_size: usize,
    batch_pause: Duration,
}

impl SessionContext {
    /// Draw the bootstrap sample once and apply the stream settings.
    pub fn new(engine: QueryEngine, config: &StreamConfig) -> Self {
        let bootstrap = engine
            .table()
            .sample(config.bootstrap_size, config.bootstrap_seed);
        Self {
            engine: engine.with_result_limit(config.result_limit),
            bootstrap,
            batch_size: config.batch_size.max(1),
            batch_pause: Duration::from_millis(config.batch_pause_ms),
        }
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    pub fn bootstrap(&self) -> &[PointRecord] {
        &self.bootstrap
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingMessage,
    Serving,
    Closed,
}

/// What happened over a session's lifetime, returned by [`StreamSession::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub messages: usize,
    pub errors: usize,
    pub batches: usize,
    /// The client went away while a result was still streaming.
    pub interrupted: bool,
}

/// Protocol loop for one connection. See the module docs.
pub struct StreamSession<T> {
    id: u64,
    transport: T,
    context: Arc<SessionContext>,
    state: SessionState,
    summary: SessionSummary,
}

impl<T: Transport> StreamSession<T> {
    pub fn new(id: u64, transport: T, context: Arc<SessionContext>) -> Self {
        Self {
            id,
            transport,
            context,
            state: SessionState::AwaitingMessage,
            summary: SessionSummary::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Serve messages until the client disconnects.
    pub async fn run(mut self) -> SessionSummary {
        tracing::debug!(session = self.id, "session opened");
        while let Some(incoming) = self.transport.recv().await {
            self.summary.messages += 1;
            self.state = SessionState::Serving;
            let served = match incoming {
                Ok(text) => self.handle(&text).await,
                Err(e) => self.report(e.to_string()).await,
            };
            if served.is_err() {
                break;
            }
            self.state = SessionState::AwaitingMessage;
        }
        self.state = SessionState::Closed;
        tracing::debug!(
            session = self.id,
            messages = self.summary.messages,
            errors = self.summary.errors,
            interrupted = self.summary.interrupted,
            "session closed"
        );
        self.summary
    }

    async fn handle(&mut self, text: &str) -> Result<(), Disconnected> {
        match ClientMessage::parse(text) {
            Ok(ClientMessage::Init) => {
                let points = self.context.bootstrap.clone();
                self.transport.send(ServerMessage::Init { points }).await
            }
            Ok(ClientMessage::Query(query)) => self.serve_query(&query).await,
            Err(e) => self.report(e.to_string()).await,
        }
    }

    async fn serve_query(&mut self, query: &Query) -> Result<(), Disconnected> {
        match contained(self.context.engine.evaluate(query)).await {
            Ok(result) => {
                tracing::debug!(session = self.id, matches = result.len(), "query evaluated");
                self.stream(result.into_records()).await
            }
            Err(message) => self.report(message).await,
        }
    }

    async fn report(&mut self, message: String) -> Result<(), Disconnected> {
        tracing::warn!(session = self.id, error = %message, "request failed");
        self.summary.errors += 1;
        self.transport.send(ServerMessage::Error { message }).await
    }

    /// Send `records` in batches, yielding between them.
    async fn stream(&mut self, records: Vec<PointRecord>) -> Result<(), Disconnected> {
        if records.is_empty() {
            return self
                .transport
                .send(ServerMessage::Update {
                    points: Vec::new(),
                    is_last: true,
                })
                .await;
        }

        let mut rest = records;
        while !rest.is_empty() {
            let tail = rest.split_off(rest.len().min(self.context.batch_size));
            let points = std::mem::replace(&mut rest, tail);
            let is_last = rest.is_empty();

            if let Err(e) = self.transport.send(ServerMessage::Update { points, is_last }).await {
                self.summary.interrupted = true;
                return Err(e);
            }
            self.summary.batches += 1;

            if !is_last {
                tokio::task::yield_now().await;
                if !self.context.batch_pause.is_zero() {
                    tokio::time::sleep(self.context.batch_pause).await;
                }
            }
        }
        Ok(())
    }
}

/// Reported when evaluation panics; the panic payload is not sent.
pub const INTERNAL_ERROR: &str = "internal error while evaluating query";

/// Await a query evaluation, turning a failure or a panic into the message
/// the client receives.
async fn contained<F>(evaluation: F) -> Result<ResultSet, String>
where
    F: Future<Output = Result<ResultSet, TermError>>,
{
    match AssertUnwindSafe(evaluation).catch_unwind().await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(INTERNAL_ERROR.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
