// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use tokio::sync::mpsc;
use tonic::Status;

use span_stream_proto::v1::{RecordStatus, Span, SpanBatch};

use crate::error::TransportError;
use crate::metadata::StreamMetadata;

/// Write strategy, fixed for the life of a client instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionMode {
    /// One span per stream write.
    Single,
    /// Immediately-available spans grouped into one batch per write.
    Batched,
}

/// One unit handed to the stream sink.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportItem {
    Span(Span),
    Batch(SpanBatch),
}

impl ExportItem {
    /// Number of spans the item carries.
    pub fn span_count(&self) -> usize {
        match self {
            ExportItem::Span(_) => 1,
            ExportItem::Batch(batch) => batch.spans.len(),
        }
    }

    /// Flattens the item for single-span submission.
    pub fn into_spans(self) -> Vec<Span> {
        match self {
            ExportItem::Span(span) => vec![span],
            ExportItem::Batch(batch) => batch.spans,
        }
    }

    /// Widens the item for batched submission.
    pub fn into_batch(self) -> SpanBatch {
        match self {
            ExportItem::Span(span) => SpanBatch { spans: vec![span] },
            ExportItem::Batch(batch) => batch,
        }
    }
}

/// Inbound half of an open stream: acknowledgements until the server closes
/// it (graceful end) or fails it with a status.
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<RecordStatus, Status>> + Send>>;

/// A live bidirectional stream to the collector: the sink the writer feeds
/// and the server's response stream. Dropping the sink ends the outbound
/// side.
pub struct SpanStream {
    pub sink: mpsc::Sender<ExportItem>,
    pub responses: ResponseStream,
}

/// Narrow seam over the wire so tests can substitute a scripted fake for
/// the gRPC transport.
#[async_trait]
pub trait CollectorTransport: Send + Sync + 'static {
    /// Opens a stream in the given mode with this connection's metadata
    /// attached. Implementations establish whatever channel state they
    /// need; ordinary connectivity failures come back as retryable errors.
    async fn open_stream(
        &self,
        metadata: StreamMetadata,
        mode: SubmissionMode,
    ) -> Result<SpanStream, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(id: u32) -> Span {
        Span::new(format!("trace-{id}"), format!("span-{id}"), i64::from(id))
    }

    #[test]
    fn test_span_count() {
        assert_eq!(ExportItem::Span(span(1)).span_count(), 1);
        let batch = ExportItem::Batch(SpanBatch {
            spans: vec![span(1), span(2), span(3)],
        });
        assert_eq!(batch.span_count(), 3);
    }

    #[test]
    fn test_into_spans_flattens_batches() {
        let batch = ExportItem::Batch(SpanBatch {
            spans: vec![span(1), span(2)],
        });
        assert_eq!(batch.into_spans().len(), 2);
        assert_eq!(ExportItem::Span(span(1)).into_spans().len(), 1);
    }

    #[test]
    fn test_into_batch_widens_single_spans() {
        let single = ExportItem::Span(span(1)).into_batch();
        assert_eq!(single.spans.len(), 1);
        assert_eq!(single.spans[0].span_id, "span-1");
    }
}
