// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use tonic::{Code, Status};

/// What the state machine should do with a server status. Classification
/// happens at this single boundary so status codes never leak into the
/// write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Tear the stream down and reconnect; buffered spans are kept.
    Recoverable,
    /// The server closed the stream cleanly; reconnect without noise.
    GracefulClose,
    /// The collector does not speak this protocol; stop exporting for the
    /// rest of the process lifetime.
    PermanentReject,
}

pub fn classify_status(status: &Status) -> ResponseOutcome {
    match status.code() {
        Code::Unimplemented => ResponseOutcome::PermanentReject,
        Code::Ok => ResponseOutcome::GracefulClose,
        // FAILED_PRECONDITION reconnects and retries like any transient code.
        _ => ResponseOutcome::Recoverable,
    }
}

/// Canonical uppercase label for a status code, used to name per-status
/// counters.
pub fn status_label(code: Code) -> &'static str {
    match code {
        Code::Ok => "OK",
        Code::Cancelled => "CANCELLED",
        Code::Unknown => "UNKNOWN",
        Code::InvalidArgument => "INVALID_ARGUMENT",
        Code::DeadlineExceeded => "DEADLINE_EXCEEDED",
        Code::NotFound => "NOT_FOUND",
        Code::AlreadyExists => "ALREADY_EXISTS",
        Code::PermissionDenied => "PERMISSION_DENIED",
        Code::ResourceExhausted => "RESOURCE_EXHAUSTED",
        Code::FailedPrecondition => "FAILED_PRECONDITION",
        Code::Aborted => "ABORTED",
        Code::OutOfRange => "OUT_OF_RANGE",
        Code::Unimplemented => "UNIMPLEMENTED",
        Code::Internal => "INTERNAL",
        Code::Unavailable => "UNAVAILABLE",
        Code::DataLoss => "DATA_LOSS",
        Code::Unauthenticated => "UNAUTHENTICATED",
    }
}

#[cfg(test)]
mod tests {
    use duplicate::duplicate_item;

    use super::*;

    #[duplicate_item(
        test_name                           code                        expected;
        [classify_unavailable]              [Code::Unavailable]         [ResponseOutcome::Recoverable];
        [classify_internal]                 [Code::Internal]            [ResponseOutcome::Recoverable];
        [classify_unknown]                  [Code::Unknown]             [ResponseOutcome::Recoverable];
        [classify_resource_exhausted]       [Code::ResourceExhausted]   [ResponseOutcome::Recoverable];
        [classify_failed_precondition]      [Code::FailedPrecondition]  [ResponseOutcome::Recoverable];
        [classify_ok]                       [Code::Ok]                  [ResponseOutcome::GracefulClose];
        [classify_unimplemented]            [Code::Unimplemented]       [ResponseOutcome::PermanentReject];
    )]
    #[test]
    fn test_name() {
        let status = Status::new(code, "scripted status");
        assert_eq!(classify_status(&status), expected);
    }

    #[test]
    fn test_status_labels_are_canonical() {
        assert_eq!(status_label(Code::Unimplemented), "UNIMPLEMENTED");
        assert_eq!(status_label(Code::FailedPrecondition), "FAILED_PRECONDITION");
        assert_eq!(status_label(Code::Ok), "OK");
    }
}
