// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::env;
use std::sync::RwLock;

/// Compression negotiation setting supplied by the agent. The literal
/// `none` disables the negotiation headers; any other value enables them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
}

impl Compression {
    pub fn from_setting(setting: &str) -> Compression {
        if setting.trim().eq_ignore_ascii_case("none") {
            Compression::None
        } else {
            Compression::Gzip
        }
    }

    pub fn is_enabled(self) -> bool {
        self != Compression::None
    }
}

/// Source of the per-connection identity values. Read fresh on every
/// (re)connect because the run token rotates whenever the agent reconnects
/// to the collector.
pub trait AgentIdentity: Send + Sync {
    fn license_key(&self) -> String;
    fn run_token(&self) -> Option<String>;
    fn request_headers(&self) -> BTreeMap<String, String>;
    fn compression(&self) -> Compression;
}

/// Identity backed by in-process state. The embedding agent rotates the run
/// token after each collector handshake; readers always see the latest
/// values.
pub struct AgentCredentials {
    license_key: String,
    run_token: RwLock<Option<String>>,
    request_headers: RwLock<BTreeMap<String, String>>,
    compression: Compression,
}

impl AgentCredentials {
    pub fn new(license_key: impl Into<String>) -> AgentCredentials {
        AgentCredentials {
            license_key: license_key.into(),
            run_token: RwLock::new(None),
            request_headers: RwLock::new(BTreeMap::new()),
            compression: Compression::Gzip,
        }
    }

    pub fn with_compression(mut self, compression: Compression) -> AgentCredentials {
        self.compression = compression;
        self
    }

    /// Builds credentials from `SPAN_STREAM_LICENSE_KEY`,
    /// `SPAN_STREAM_COMPRESSION` and the optional
    /// `SPAN_STREAM_REQUEST_HEADERS` JSON object.
    pub fn from_env() -> Result<AgentCredentials, Box<dyn std::error::Error>> {
        let license_key = env::var("SPAN_STREAM_LICENSE_KEY").map_err(|_| {
            anyhow::anyhow!("SPAN_STREAM_LICENSE_KEY environment variable is not set")
        })?;

        let compression = env::var("SPAN_STREAM_COMPRESSION")
            .map(|setting| Compression::from_setting(&setting))
            .unwrap_or(Compression::Gzip);

        let request_headers = match env::var("SPAN_STREAM_REQUEST_HEADERS") {
            Ok(raw) => serde_json::from_str::<BTreeMap<String, String>>(&raw).map_err(|e| {
                anyhow::anyhow!("SPAN_STREAM_REQUEST_HEADERS is not a JSON object: {e}")
            })?,
            Err(_) => BTreeMap::new(),
        };

        let credentials = AgentCredentials::new(license_key).with_compression(compression);
        credentials.set_request_headers(request_headers);
        Ok(credentials)
    }

    pub fn set_run_token(&self, token: impl Into<String>) {
        #[allow(clippy::expect_used)]
        let mut run_token = self.run_token.write().expect("lock poisoned");
        *run_token = Some(token.into());
    }

    pub fn clear_run_token(&self) {
        #[allow(clippy::expect_used)]
        let mut run_token = self.run_token.write().expect("lock poisoned");
        *run_token = None;
    }

    pub fn set_request_headers(&self, headers: BTreeMap<String, String>) {
        #[allow(clippy::expect_used)]
        let mut request_headers = self.request_headers.write().expect("lock poisoned");
        *request_headers = headers;
    }
}

impl AgentIdentity for AgentCredentials {
    fn license_key(&self) -> String {
        self.license_key.clone()
    }

    fn run_token(&self) -> Option<String> {
        #[allow(clippy::expect_used)]
        let run_token = self.run_token.read().expect("lock poisoned");
        run_token.clone()
    }

    fn request_headers(&self) -> BTreeMap<String, String> {
        #[allow(clippy::expect_used)]
        let request_headers = self.request_headers.read().expect("lock poisoned");
        request_headers.clone()
    }

    fn compression(&self) -> Compression {
        self.compression
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn test_compression_setting() {
        assert_eq!(Compression::from_setting("none"), Compression::None);
        assert_eq!(Compression::from_setting("None"), Compression::None);
        assert_eq!(Compression::from_setting(" none "), Compression::None);
        assert_eq!(Compression::from_setting("gzip"), Compression::Gzip);
        assert_eq!(Compression::from_setting("deflate"), Compression::Gzip);
        assert!(!Compression::None.is_enabled());
        assert!(Compression::Gzip.is_enabled());
    }

    #[test]
    fn test_run_token_rotation() {
        let credentials = AgentCredentials::new("license");
        assert_eq!(credentials.run_token(), None);

        credentials.set_run_token("run-1");
        assert_eq!(credentials.run_token(), Some("run-1".to_string()));

        credentials.set_run_token("run-2");
        assert_eq!(credentials.run_token(), Some("run-2".to_string()));
        assert_eq!(credentials.license_key(), "license");

        credentials.clear_run_token();
        assert_eq!(credentials.run_token(), None);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        env::set_var("SPAN_STREAM_LICENSE_KEY", "_not_a_real_key_");
        env::set_var("SPAN_STREAM_COMPRESSION", "none");
        env::set_var("SPAN_STREAM_REQUEST_HEADERS", r#"{"X-Extra": "1"}"#);

        let credentials = AgentCredentials::from_env().unwrap();
        assert_eq!(credentials.license_key(), "_not_a_real_key_");
        assert_eq!(credentials.compression(), Compression::None);
        assert_eq!(
            credentials.request_headers().get("X-Extra"),
            Some(&"1".to_string())
        );

        env::remove_var("SPAN_STREAM_LICENSE_KEY");
        env::remove_var("SPAN_STREAM_COMPRESSION");
        env::remove_var("SPAN_STREAM_REQUEST_HEADERS");
    }

    #[test]
    #[serial]
    fn test_from_env_requires_license_key() {
        env::remove_var("SPAN_STREAM_LICENSE_KEY");
        let result = AgentCredentials::from_env();
        assert!(result.is_err());
        assert_eq!(
            result.err().unwrap().to_string(),
            "SPAN_STREAM_LICENSE_KEY environment variable is not set"
        );
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_malformed_headers() {
        env::set_var("SPAN_STREAM_LICENSE_KEY", "_not_a_real_key_");
        env::set_var("SPAN_STREAM_REQUEST_HEADERS", "not-json");

        let result = AgentCredentials::from_env();
        assert!(result.is_err());

        env::remove_var("SPAN_STREAM_LICENSE_KEY");
        env::remove_var("SPAN_STREAM_REQUEST_HEADERS");
    }
}
