// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use span_stream_proto::v1::{Span, SpanBatch};

use crate::buffer::{BufferCell, SpanBuffer, SpanReceiver};
use crate::config::Config;
use crate::connection::{ConnectFailure, ConnectionManager, ReconnectPolicy};
use crate::grpc::GrpcTransport;
use crate::identity::AgentIdentity;
use crate::metrics::{response_error_name, MetricsSink, RESPONSE_ERROR, SPANS_SEEN, SPANS_SENT};
use crate::response::{classify_status, ResponseOutcome};
use crate::transport::{CollectorTransport, ExportItem, ResponseStream, SpanStream, SubmissionMode};

/// Export lifecycle of the client. Only the worker's read path writes this;
/// there is no way out of `Suspended` short of a process restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClientState {
    /// Created, not yet streaming.
    Idle = 0,
    /// Live stream, spans flowing.
    Streaming = 1,
    /// Transient fault; the stream is being rebuilt.
    Restarting = 2,
    /// The collector permanently rejected the protocol.
    Suspended = 3,
}

struct StateCell(AtomicU8);

impl StateCell {
    fn new(state: ClientState) -> StateCell {
        StateCell(AtomicU8::new(state as u8))
    }

    fn set(&self, state: ClientState) {
        self.0.store(state as u8, Ordering::Release);
    }

    fn get(&self) -> ClientState {
        match self.0.load(Ordering::Acquire) {
            0 => ClientState::Idle,
            1 => ClientState::Streaming,
            2 => ClientState::Restarting,
            _ => ClientState::Suspended,
        }
    }
}

/// Knobs for one streaming client instance.
pub struct SpanStreamerConfig {
    pub queue_capacity: usize,
    pub submission: SubmissionMode,
    pub batch_size_limit: usize,
    pub reconnect: ReconnectPolicy,
}

impl From<&Config> for SpanStreamerConfig {
    fn from(config: &Config) -> SpanStreamerConfig {
        SpanStreamerConfig {
            queue_capacity: config.queue_capacity,
            submission: config.submission,
            batch_size_limit: config.batch_size_limit,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

struct StreamerInner {
    buffer: BufferCell,
    connection: ConnectionManager,
    metrics: Arc<dyn MetricsSink>,
    state: StateCell,
    submission: SubmissionMode,
    batch_size_limit: usize,
    shutdown: CancellationToken,
    /// Token covering the current connect-plus-stream session; `restart`
    /// cancels it to force a rebuild.
    session: Mutex<CancellationToken>,
}

impl StreamerInner {
    fn begin_session(&self) -> CancellationToken {
        let token = self.shutdown.child_token();
        #[allow(clippy::expect_used)]
        let mut session = self.session.lock().expect("lock poisoned");
        *session = token.clone();
        token
    }

    fn record_response_error(&self, status: &tonic::Status) {
        self.metrics.increment(RESPONSE_ERROR, 1);
        self.metrics
            .increment(&response_error_name(status.code()), 1);
    }

    fn suspend(&self) {
        error!(
            "Collector does not support span streaming; suspending span export for this process"
        );
        self.buffer.suspend();
        self.state.set(ClientState::Suspended);
    }
}

/// Streaming export client. Accepts spans from any thread, ships them over
/// one live stream, and absorbs every transport failure without surfacing
/// it to the instrumented application.
pub struct SpanStreamer {
    inner: Arc<StreamerInner>,
    receiver: Mutex<Option<SpanReceiver>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SpanStreamer {
    pub fn new(
        config: SpanStreamerConfig,
        transport: Arc<dyn CollectorTransport>,
        identity: Arc<dyn AgentIdentity>,
        metrics: Arc<dyn MetricsSink>,
    ) -> SpanStreamer {
        let shutdown = CancellationToken::new();
        let (buffer, receiver) =
            SpanBuffer::new(config.queue_capacity.max(1), Arc::clone(&metrics));
        let connection =
            ConnectionManager::new(transport, identity, config.reconnect, shutdown.clone());
        let inner = StreamerInner {
            buffer: BufferCell::new(buffer),
            connection,
            metrics,
            state: StateCell::new(ClientState::Idle),
            submission: config.submission,
            batch_size_limit: config.batch_size_limit.max(1),
            session: Mutex::new(shutdown.child_token()),
            shutdown,
        };
        SpanStreamer {
            inner: Arc::new(inner),
            receiver: Mutex::new(Some(receiver)),
            worker: Mutex::new(None),
        }
    }

    /// Client wired to the gRPC transport from configuration.
    pub fn from_config(
        config: &Config,
        identity: Arc<dyn AgentIdentity>,
        metrics: Arc<dyn MetricsSink>,
    ) -> SpanStreamer {
        let transport = Arc::new(GrpcTransport::new(config.observer_url.clone()));
        SpanStreamer::new(SpanStreamerConfig::from(config), transport, identity, metrics)
    }

    /// Spawns the worker that owns the stream. Spans enqueued before this
    /// wait in the buffer.
    pub fn start(&self) {
        let receiver = {
            #[allow(clippy::expect_used)]
            let mut receiver = self.receiver.lock().expect("lock poisoned");
            receiver.take()
        };
        let Some(receiver) = receiver else {
            warn!("Span streamer already started");
            return;
        };
        let handle = tokio::spawn(run(Arc::clone(&self.inner), receiver));
        #[allow(clippy::expect_used)]
        let mut worker = self.worker.lock().expect("lock poisoned");
        *worker = Some(handle);
    }

    /// Hands a span to the export pipeline. Never blocks and never fails;
    /// at worst the span is dropped and counted.
    pub fn enqueue(&self, span: Span) {
        self.inner.metrics.increment(SPANS_SEEN, 1);
        self.inner.buffer.push(span);
    }

    /// Tears the current stream down and rebuilds it with fresh metadata.
    /// Buffered spans survive; an in-flight write is abandoned.
    pub fn restart(&self) {
        debug!("Restarting span stream");
        #[allow(clippy::expect_used)]
        let session = self.inner.session.lock().expect("lock poisoned");
        session.cancel();
    }

    /// Closes the buffer and stops the worker. Spans still queued are
    /// dropped; export is best-effort by design.
    pub async fn shutdown(&self) {
        self.inner.buffer.suspend();
        self.inner.shutdown.cancel();
        let handle = {
            #[allow(clippy::expect_used)]
            let mut worker = self.worker.lock().expect("lock poisoned");
            worker.take()
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Span stream worker ended abnormally: {e}");
            }
        }
    }

    pub fn state(&self) -> ClientState {
        self.inner.state.get()
    }

    /// True once the collector has permanently rejected the stream and the
    /// no-op buffer is installed.
    pub fn is_suspended(&self) -> bool {
        self.state() == ClientState::Suspended
    }
}

/// How one stream session ended.
enum SessionEnd {
    /// Rebuild the stream and keep going.
    Reconnect,
    /// Permanent rejection; swap in the suspended buffer and stop.
    Suspend,
    /// Process shutdown.
    Shutdown,
}

async fn run(inner: Arc<StreamerInner>, mut receiver: SpanReceiver) {
    loop {
        if inner.shutdown.is_cancelled() {
            break;
        }
        let session = inner.begin_session();

        let stream = tokio::select! {
            // restart() during connect: loop around and rebuild with fresh
            // metadata. Shutdown lands here too via the child token.
            _ = session.cancelled() => continue,
            result = inner.connection.establish_stream(inner.submission) => match result {
                Ok(stream) => stream,
                Err(ConnectFailure::Shutdown) => break,
                Err(ConnectFailure::PermanentlyRejected(status)) => {
                    inner.record_response_error(&status);
                    inner.suspend();
                    break;
                }
            },
        };

        inner.state.set(ClientState::Streaming);
        debug!("Span stream established");

        let SpanStream { sink, responses } = stream;
        let writer = tokio::spawn(write_loop(
            receiver,
            sink,
            session.clone(),
            inner.submission,
            inner.batch_size_limit,
            Arc::clone(&inner.metrics),
        ));

        let end = read_loop(responses, &session, &inner).await;

        // Invalidate the stream; an in-flight write is abandoned without
        // requeuing its span.
        session.cancel();
        receiver = match writer.await {
            Ok(receiver) => receiver,
            Err(e) => {
                error!("Span writer task failed: {e}");
                return;
            }
        };

        match end {
            SessionEnd::Reconnect => inner.state.set(ClientState::Restarting),
            SessionEnd::Suspend => {
                inner.suspend();
                // Dropping the receiver discards whatever was still queued.
                break;
            }
            SessionEnd::Shutdown => break,
        }
    }
    debug!("Span stream worker stopped");
}

/// Read path: consumes server responses and decides how the session ends.
/// This is the only place Client State transitions are decided.
async fn read_loop(
    mut responses: ResponseStream,
    session: &CancellationToken,
    inner: &StreamerInner,
) -> SessionEnd {
    loop {
        let event = tokio::select! {
            _ = session.cancelled() => {
                return if inner.shutdown.is_cancelled() {
                    SessionEnd::Shutdown
                } else {
                    SessionEnd::Reconnect
                };
            }
            event = responses.next() => event,
        };
        match event {
            Some(Ok(ack)) => {
                debug!("Collector acknowledged {} records", ack.messages_seen);
            }
            Some(Err(status)) => {
                let outcome = classify_status(&status);
                if outcome != ResponseOutcome::GracefulClose {
                    inner.record_response_error(&status);
                }
                return match outcome {
                    ResponseOutcome::PermanentReject => {
                        error!("Span stream rejected by collector: {status}");
                        SessionEnd::Suspend
                    }
                    ResponseOutcome::GracefulClose => {
                        debug!("Span stream closed by collector: {status}");
                        SessionEnd::Reconnect
                    }
                    ResponseOutcome::Recoverable => {
                        warn!("Span stream error, reconnecting: {status}");
                        SessionEnd::Reconnect
                    }
                };
            }
            None => {
                debug!("Span stream closed by collector, reconnecting");
                return SessionEnd::Reconnect;
            }
        }
    }
}

/// Writer: the single consumer of the span buffer. Pops in FIFO order and
/// feeds the stream sink until the session is invalidated or the buffer
/// closes. Returns the receiver so the next session can keep draining.
async fn write_loop(
    mut receiver: SpanReceiver,
    sink: mpsc::Sender<ExportItem>,
    session: CancellationToken,
    submission: SubmissionMode,
    batch_size_limit: usize,
    metrics: Arc<dyn MetricsSink>,
) -> SpanReceiver {
    loop {
        let first = tokio::select! {
            _ = session.cancelled() => break,
            span = receiver.pop() => match span {
                Some(span) => span,
                // Buffer closed; nothing more will ever arrive.
                None => break,
            },
        };
        let item = match submission {
            SubmissionMode::Single => ExportItem::Span(first),
            SubmissionMode::Batched => {
                let mut spans = vec![first];
                while spans.len() < batch_size_limit {
                    match receiver.pop_now() {
                        Some(span) => spans.push(span),
                        None => break,
                    }
                }
                ExportItem::Batch(SpanBatch { spans })
            }
        };
        let count = item.span_count() as u64;
        tokio::select! {
            // Stream invalidated mid-write: the item is abandoned, not
            // requeued (at-most-once).
            _ = session.cancelled() => break,
            sent = sink.send(item) => match sent {
                Ok(()) => metrics.increment(SPANS_SENT, count),
                Err(_) => {
                    // Transport side went away; the read path will see why.
                    debug!("Span stream sink closed mid-write");
                    break;
                }
            },
        }
    }
    receiver
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_cell_round_trips() {
        let cell = StateCell::new(ClientState::Idle);
        assert_eq!(cell.get(), ClientState::Idle);
        cell.set(ClientState::Streaming);
        assert_eq!(cell.get(), ClientState::Streaming);
        cell.set(ClientState::Restarting);
        assert_eq!(cell.get(), ClientState::Restarting);
        cell.set(ClientState::Suspended);
        assert_eq!(cell.get(), ClientState::Suspended);
    }

    #[test]
    fn test_streamer_config_from_config() {
        let config = Config {
            observer_url: "https://collector.invalid:443".to_string(),
            queue_capacity: 64,
            submission: SubmissionMode::Batched,
            batch_size_limit: 16,
        };
        let streamer_config = SpanStreamerConfig::from(&config);
        assert_eq!(streamer_config.queue_capacity, 64);
        assert_eq!(streamer_config.submission, SubmissionMode::Batched);
        assert_eq!(streamer_config.batch_size_limit, 16);
    }
}
