// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use crate::identity::AgentIdentity;

/// Metadata key carrying the account license key.
pub const LICENSE_KEY: &str = "license_key";
/// Metadata key carrying the per-connection agent run token.
pub const RUN_TOKEN: &str = "agent_run_token";

/// Headers advertising compressed-stream support, attached only when the
/// identity enables compression.
pub const COMPRESSION_HEADERS: &[(&str, &str)] = &[("grpc-accept-encoding", "gzip")];

/// Flat, ordered view of the metadata attached to one stream. Rebuilt for
/// every connection, never cached, because identity values rotate between
/// connects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamMetadata {
    entries: BTreeMap<String, String>,
}

impl StreamMetadata {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds the outbound metadata for one connection from the current
/// identity values. Request header keys are lower-cased; the run token is
/// read fresh since it can change between connects.
pub fn build_stream_metadata(identity: &dyn AgentIdentity) -> StreamMetadata {
    let mut metadata = StreamMetadata::default();
    metadata.insert(LICENSE_KEY, identity.license_key());
    if let Some(token) = identity.run_token() {
        metadata.insert(RUN_TOKEN, token);
    }
    for (key, value) in identity.request_headers() {
        metadata.insert(key.to_ascii_lowercase(), value);
    }
    if identity.compression().is_enabled() {
        for (key, value) in COMPRESSION_HEADERS {
            metadata.insert(*key, *value);
        }
    }
    metadata
}
