// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use tonic::Code;

use crate::response::status_label;

/// Spans handed to `enqueue`, whether or not they fit in the queue.
pub const SPANS_SEEN: &str = "Span/Seen";
/// Spans written into a live stream.
pub const SPANS_SENT: &str = "Span/Sent";
/// Spans dropped because the queue was at capacity.
pub const QUEUE_DUMPED: &str = "Span/AgentQueueDumped";
/// Error responses received on the stream, regardless of status code.
pub const RESPONSE_ERROR: &str = "Span/Response/Error";

/// Facility the client reports counters through. The embedding agent wires
/// this into its metrics pipeline; the client only ever increments counters
/// and never reads them back.
pub trait MetricsSink: Send + Sync {
    fn increment(&self, name: &str, value: u64);
}

/// Sink that discards every counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn increment(&self, _name: &str, _value: u64) {}
}

/// Per-status error counter name, e.g. `Span/Response/Error/UNIMPLEMENTED`.
pub fn response_error_name(code: Code) -> String {
    format!("{}/{}", RESPONSE_ERROR, status_label(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_error_names() {
        assert_eq!(
            response_error_name(Code::Unimplemented),
            "Span/Response/Error/UNIMPLEMENTED"
        );
        assert_eq!(
            response_error_name(Code::FailedPrecondition),
            "Span/Response/Error/FAILED_PRECONDITION"
        );
    }

    #[test]
    fn test_noop_sink_accepts_anything() {
        let sink = NoopMetricsSink;
        sink.increment(SPANS_SEEN, 1);
        sink.increment(QUEUE_DUMPED, u64::MAX);
    }
}
