// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Streaming span export client.
//!
//! Ships locally-collected trace spans to a remote collector over one
//! long-lived bidirectional gRPC stream. The pipeline is a bounded span
//! buffer feeding a single stream writer, a response read path that
//! classifies collector statuses into reconnect or suspend decisions, and a
//! connection manager that retries with a fixed backoff schedule. Failures
//! never surface into the instrumented application: at worst spans are
//! dropped and counted.

pub mod buffer;
pub mod config;
pub mod connection;
pub mod error;
pub mod grpc;
pub mod identity;
pub mod metadata;
pub mod metrics;
pub mod response;
pub mod streamer;
pub mod transport;

pub use buffer::{SpanBuffer, SpanReceiver, SuspendedBuffer};
pub use config::Config;
pub use connection::{with_reconnection_backoff, ConnectFailure, ConnectionManager, ReconnectPolicy};
pub use error::TransportError;
pub use grpc::GrpcTransport;
pub use identity::{AgentCredentials, AgentIdentity, Compression};
pub use metadata::{build_stream_metadata, StreamMetadata};
pub use metrics::{MetricsSink, NoopMetricsSink};
pub use response::{classify_status, ResponseOutcome};
pub use streamer::{ClientState, SpanStreamer, SpanStreamerConfig};
pub use transport::{CollectorTransport, ExportItem, ResponseStream, SpanStream, SubmissionMode};

pub use span_stream_proto::v1::{AttributeValue, RecordStatus, Span, SpanBatch};
