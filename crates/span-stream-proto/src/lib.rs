// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Generated protobuf models for the `spanstream.v1` span ingest service.
//!
//! The generated code under `src/gen/` is checked in so building the
//! workspace does not require `protoc`; regenerate it with `prost-build` and
//! `tonic-build` from `proto/spanstream/v1/spanstream.proto` when the wire
//! format changes. Hand-written conveniences for constructing spans and
//! attribute values live in this file.

/// Messages and client for the `spanstream.v1` protobuf package.
pub mod v1 {
    include!("gen/spanstream.v1.rs");
}

use v1::attribute_value;
use v1::{AttributeValue, Span};

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue {
            value: Some(attribute_value::Value::StringValue(value)),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        value.to_string().into()
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue {
            value: Some(attribute_value::Value::BoolValue(value)),
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue {
            value: Some(attribute_value::Value::IntValue(value)),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue {
            value: Some(attribute_value::Value::DoubleValue(value)),
        }
    }
}

impl Span {
    /// Creates a span carrying the identifiers and timestamp every record
    /// must have. Attribute groups start empty.
    pub fn new(
        trace_id: impl Into<String>,
        span_id: impl Into<String>,
        timestamp: i64,
    ) -> Span {
        Span {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
            timestamp,
            ..Default::default()
        }
    }

    pub fn with_intrinsic(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Span {
        self.intrinsics.insert(key.into(), value.into());
        self
    }

    pub fn with_user_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Span {
        self.user_attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_agent_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Span {
        self.agent_attributes.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::v1::attribute_value::Value;
    use super::*;

    #[test]
    fn test_attribute_value_conversions() {
        let string: AttributeValue = "service".into();
        assert_eq!(string.value, Some(Value::StringValue("service".to_string())));

        let flag: AttributeValue = true.into();
        assert_eq!(flag.value, Some(Value::BoolValue(true)));

        let count: AttributeValue = 42i64.into();
        assert_eq!(count.value, Some(Value::IntValue(42)));

        let duration: AttributeValue = 0.25f64.into();
        assert_eq!(duration.value, Some(Value::DoubleValue(0.25)));
    }

    #[test]
    fn test_span_builder() {
        let span = Span::new("trace-1", "span-1", 1_700_000_000_000)
            .with_intrinsic("name", "GET /status")
            .with_user_attribute("customer", "acme")
            .with_agent_attribute("host", "web-1");

        assert_eq!(span.trace_id, "trace-1");
        assert_eq!(span.span_id, "span-1");
        assert_eq!(span.timestamp, 1_700_000_000_000);
        assert_eq!(span.intrinsics.len(), 1);
        assert_eq!(span.user_attributes.len(), 1);
        assert_eq!(span.agent_attributes.len(), 1);
    }
}
