// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::error::TransportError;
use crate::identity::AgentIdentity;
use crate::metadata::build_stream_metadata;
use crate::transport::{CollectorTransport, SpanStream, SubmissionMode};

/// Wait periods between failed connect attempts: the base period repeats
/// once, then doubles until the cap, which is held forever.
const RECONNECT_PERIOD_SECS: [u64; 6] = [15, 15, 30, 60, 120, 300];

/// Schedule of wait periods applied between failed connect attempts.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    periods: Vec<Duration>,
}

impl Default for ReconnectPolicy {
    fn default() -> ReconnectPolicy {
        ReconnectPolicy {
            periods: RECONNECT_PERIOD_SECS
                .iter()
                .map(|secs| Duration::from_secs(*secs))
                .collect(),
        }
    }
}

impl ReconnectPolicy {
    /// Custom schedule; the last period repeats once the table runs out.
    pub fn from_periods(periods: Vec<Duration>) -> ReconnectPolicy {
        assert!(!periods.is_empty(), "reconnect schedule cannot be empty");
        ReconnectPolicy { periods }
    }

    /// Wait period preceding the given retry attempt (0-indexed).
    pub fn period_for_attempt(&self, attempt: u32) -> Duration {
        let index = (attempt as usize).min(self.periods.len() - 1);
        self.periods[index]
    }
}

/// Runs `action` until it succeeds, sleeping the scheduled period after
/// each failure the classifier marks retryable. A non-retryable failure
/// propagates unchanged. The attempt counter advances per failure and
/// resets to zero on success.
pub async fn with_reconnection_backoff<T, E, Fut>(
    policy: &ReconnectPolicy,
    attempts: &AtomicU32,
    is_retryable: impl Fn(&E) -> bool,
    mut action: impl FnMut() -> Fut,
) -> Result<T, E>
where
    E: std::fmt::Display,
    Fut: Future<Output = Result<T, E>>,
{
    loop {
        match action().await {
            Ok(value) => {
                attempts.store(0, Ordering::Relaxed);
                return Ok(value);
            }
            Err(err) if is_retryable(&err) => {
                let attempt = attempts.fetch_add(1, Ordering::Relaxed);
                let wait = policy.period_for_attempt(attempt);
                warn!(
                    "Connect attempt {} failed, retrying in {:?}: {err}",
                    attempt + 1,
                    wait
                );
                tokio::time::sleep(wait).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Terminal reasons `establish_stream` can give up.
#[derive(Debug)]
pub enum ConnectFailure {
    /// The process is shutting down.
    Shutdown,
    /// The collector rejected the stream outright; exporting must suspend.
    PermanentlyRejected(tonic::Status),
}

/// Owns the transport seam and the reconnect schedule. One instance per
/// process, injected rather than global so tests can swap the transport.
pub struct ConnectionManager {
    transport: Arc<dyn CollectorTransport>,
    identity: Arc<dyn AgentIdentity>,
    policy: ReconnectPolicy,
    attempts: AtomicU32,
    shutdown: CancellationToken,
}

impl ConnectionManager {
    pub fn new(
        transport: Arc<dyn CollectorTransport>,
        identity: Arc<dyn AgentIdentity>,
        policy: ReconnectPolicy,
        shutdown: CancellationToken,
    ) -> ConnectionManager {
        ConnectionManager {
            transport,
            identity,
            policy,
            attempts: AtomicU32::new(0),
            shutdown,
        }
    }

    /// Failed connect attempts since the last success.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Opens a live stream, retrying connectivity and metadata failures
    /// with backoff for as long as it takes. Metadata is rebuilt on every
    /// attempt so a rotated run token is always picked up.
    pub async fn establish_stream(
        &self,
        mode: SubmissionMode,
    ) -> Result<SpanStream, ConnectFailure> {
        let connect = || {
            // Rebuilt synchronously per attempt so a rotated run token is
            // always picked up.
            let metadata = build_stream_metadata(self.identity.as_ref());
            let transport = Arc::clone(&self.transport);
            async move { transport.open_stream(metadata, mode).await }
        };
        tokio::select! {
            _ = self.shutdown.cancelled() => Err(ConnectFailure::Shutdown),
            result = with_reconnection_backoff(
                &self.policy,
                &self.attempts,
                TransportError::is_retryable,
                connect,
            ) => {
                match result {
                    Ok(stream) => Ok(stream),
                    Err(err) => {
                        // `is_retryable` keeps connectivity and metadata
                        // failures inside the loop, so only rejection
                        // reaches this arm.
                        error!("Collector rejected the span stream: {err}");
                        let status = match err {
                            TransportError::Rejected(status) => status,
                            other => tonic::Status::unknown(other.to_string()),
                        };
                        Err(ConnectFailure::PermanentlyRejected(status))
                    }
                }
            }
        }
    }
}
