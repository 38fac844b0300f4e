// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use tonic::Status;

/// Errors surfaced by the collector transport while establishing a span
/// stream.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The channel could not be established or dropped during the handshake.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Connection metadata could not be encoded onto the outbound request.
    #[error("invalid stream metadata: {0}")]
    Metadata(String),

    /// The collector rejected the stream outright at open time.
    #[error("stream rejected by collector: {0}")]
    Rejected(Status),
}

impl TransportError {
    /// Whether reconnect-with-backoff should swallow this error and retry.
    ///
    /// Connectivity and metadata failures retry indefinitely and are never
    /// seen by the application; an outright rejection is handed back to the
    /// state machine so it can suspend.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Connection(_) | TransportError::Metadata(_) => true,
            TransportError::Rejected(_) => false,
        }
    }
}
