// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tracing::debug;

use span_stream_proto::v1::Span;

use crate::metrics::{MetricsSink, QUEUE_DUMPED};

/// Bounded FIFO queue between the application's producer threads and the
/// single stream consumer. `push` never blocks and never fails: when the
/// queue is at capacity the incoming span is dropped and counted.
pub struct SpanBuffer {
    tx: mpsc::Sender<Span>,
    dumped: AtomicU64,
    metrics: Arc<dyn MetricsSink>,
}

impl SpanBuffer {
    /// Creates the buffer and its single consumer handle.
    pub fn new(capacity: usize, metrics: Arc<dyn MetricsSink>) -> (SpanBuffer, SpanReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            SpanBuffer {
                tx,
                dumped: AtomicU64::new(0),
                metrics,
            },
            SpanReceiver { rx },
        )
    }

    /// Enqueues a span, or drops it and bumps the dumped counter when the
    /// queue is full. The buffer holds no knowledge of export outcome.
    pub fn push(&self, span: Span) {
        match self.tx.try_send(span) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dumped.fetch_add(1, Ordering::Relaxed);
                self.metrics.increment(QUEUE_DUMPED, 1);
                debug!("Span queue full, dropping span");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                // Consumer is gone; nothing left to deliver to.
                debug!("Span queue closed, dropping span");
            }
        }
    }

    /// Spans currently queued.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spans dropped due to overflow since creation.
    pub fn dumped(&self) -> u64 {
        self.dumped.load(Ordering::Relaxed)
    }
}

/// Consumer half of the span buffer, owned by the stream writer.
pub struct SpanReceiver {
    rx: mpsc::Receiver<Span>,
}

impl SpanReceiver {
    /// Waits for the next span; `None` once the buffer is closed and drained.
    pub async fn pop(&mut self) -> Option<Span> {
        self.rx.recv().await
    }

    /// Takes a span only if one is immediately available.
    pub fn pop_now(&mut self) -> Option<Span> {
        self.rx.try_recv().ok()
    }
}

/// Buffer variant installed once the collector has permanently rejected the
/// stream: accepts nothing, holds nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SuspendedBuffer;

impl SuspendedBuffer {
    /// Discards the span. Suspension is an expected terminal state, not an
    /// overflow condition, so the dumped counter is left alone.
    pub fn push(&self, _span: Span) {}

    /// The suspended buffer never holds anything.
    pub fn pop(&self) -> Option<Span> {
        None
    }
}

enum Slot {
    Open(SpanBuffer),
    Suspended(SuspendedBuffer),
}

/// Producer-facing cell holding the active buffer. Producers read the
/// reference on every push, so reassignment goes through the lock.
pub(crate) struct BufferCell {
    slot: RwLock<Slot>,
}

impl BufferCell {
    pub(crate) fn new(buffer: SpanBuffer) -> BufferCell {
        BufferCell {
            slot: RwLock::new(Slot::Open(buffer)),
        }
    }

    pub(crate) fn push(&self, span: Span) {
        #[allow(clippy::expect_used)]
        let slot = self.slot.read().expect("lock poisoned");
        match &*slot {
            Slot::Open(buffer) => buffer.push(span),
            Slot::Suspended(buffer) => buffer.push(span),
        }
    }

    /// Swaps in the no-op buffer, dropping the open buffer's sender. Used
    /// when the collector permanently rejects the stream, and at shutdown so
    /// the consumer drains out and terminates instead of waiting forever.
    pub(crate) fn suspend(&self) {
        #[allow(clippy::expect_used)]
        let mut slot = self.slot.write().expect("lock poisoned");
        *slot = Slot::Suspended(SuspendedBuffer);
    }

    pub(crate) fn is_suspended(&self) -> bool {
        #[allow(clippy::expect_used)]
        let slot = self.slot.read().expect("lock poisoned");
        matches!(&*slot, Slot::Suspended(_))
    }

    pub(crate) fn dumped(&self) -> u64 {
        #[allow(clippy::expect_used)]
        let slot = self.slot.read().expect("lock poisoned");
        match &*slot {
            Slot::Open(buffer) => buffer.dumped(),
            Slot::Suspended(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::metrics::NoopMetricsSink;

    use super::*;

    fn test_span(id: usize) -> Span {
        Span::new(format!("trace-{id}"), format!("span-{id}"), id as i64)
    }

    #[tokio::test]
    async fn test_push_and_pop_preserve_fifo_order() {
        let (buffer, mut rx) = SpanBuffer::new(8, Arc::new(NoopMetricsSink));
        for i in 0..5 {
            buffer.push(test_span(i));
        }
        assert_eq!(buffer.len(), 5);

        for i in 0..5 {
            let span = rx.pop().await.unwrap();
            assert_eq!(span.span_id, format!("span-{i}"));
        }
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_full_buffer_drops_and_counts() {
        let (buffer, _rx) = SpanBuffer::new(5, Arc::new(NoopMetricsSink));
        for i in 0..5 {
            buffer.push(test_span(i));
        }
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.dumped(), 0);

        buffer.push(test_span(5));
        buffer.push(test_span(6));
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.dumped(), 2);
    }

    #[test]
    fn test_pop_now_on_empty_buffer() {
        let (_buffer, mut rx) = SpanBuffer::new(4, Arc::new(NoopMetricsSink));
        assert!(rx.pop_now().is_none());
    }

    #[tokio::test]
    async fn test_pop_reports_closed_after_buffer_dropped() {
        let (buffer, mut rx) = SpanBuffer::new(4, Arc::new(NoopMetricsSink));
        buffer.push(test_span(0));
        drop(buffer);

        assert!(rx.pop().await.is_some());
        assert!(rx.pop().await.is_none());
    }

    #[test]
    fn test_suspended_buffer_discards_without_counting() {
        let suspended = SuspendedBuffer;
        suspended.push(test_span(0));
        assert!(suspended.pop().is_none());
    }

    #[test]
    fn test_cell_swap_is_observable_and_silences_pushes() {
        let (buffer, mut rx) = SpanBuffer::new(4, Arc::new(NoopMetricsSink));
        let cell = BufferCell::new(buffer);
        cell.push(test_span(0));
        assert!(!cell.is_suspended());

        cell.suspend();
        assert!(cell.is_suspended());

        // Accepted without error, silently discarded, never counted.
        cell.push(test_span(1));
        assert_eq!(cell.dumped(), 0);

        // The open buffer's sender was dropped with the swap; the consumer
        // drains what was already resident and then observes closure.
        assert!(rx.pop_now().is_some());
        assert!(rx.pop_now().is_none());
    }

    proptest! {
        #[test]
        fn prop_len_never_exceeds_capacity(capacity in 1usize..32, pushes in 0usize..128) {
            let (buffer, _rx) = SpanBuffer::new(capacity, Arc::new(NoopMetricsSink));
            for i in 0..pushes {
                buffer.push(test_span(i));
            }
            prop_assert!(buffer.len() <= capacity);
            prop_assert_eq!(buffer.dumped(), pushes.saturating_sub(capacity) as u64);
        }
    }
}
