// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;

use crate::transport::SubmissionMode;

const DEFAULT_QUEUE_SIZE: usize = 10_000;
const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug)]
pub struct Config {
    /// Collector endpoint the span stream connects to.
    pub observer_url: String,
    /// Span buffer capacity; pushes beyond it are dropped and counted.
    pub queue_capacity: usize,
    /// Whether spans go out one per write or grouped into batches.
    pub submission: SubmissionMode,
    /// Upper bound on spans per batch when batching is enabled.
    pub batch_size_limit: usize,
}

impl Config {
    pub fn new() -> Result<Config, Box<dyn std::error::Error>> {
        let observer_url = env::var("SPAN_STREAM_OBSERVER_URL").map_err(|_| {
            anyhow::anyhow!("SPAN_STREAM_OBSERVER_URL environment variable is not set")
        })?;

        let queue_capacity = env::var("SPAN_STREAM_QUEUE_SIZE")
            .ok()
            .and_then(|size| size.parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_QUEUE_SIZE);

        let batching = env::var("SPAN_STREAM_BATCHING")
            .map(|flag| matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let batch_size_limit = env::var("SPAN_STREAM_BATCH_SIZE")
            .ok()
            .and_then(|size| size.parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_BATCH_SIZE);

        Ok(Config {
            observer_url,
            queue_capacity,
            submission: if batching {
                SubmissionMode::Batched
            } else {
                SubmissionMode::Single
            },
            batch_size_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use std::env;

    use crate::config;
    use crate::transport::SubmissionMode;

    #[test]
    #[serial]
    fn test_error_if_no_observer_url() {
        env::remove_var("SPAN_STREAM_OBSERVER_URL");
        let config = config::Config::new();
        assert!(config.is_err());
        assert_eq!(
            config.unwrap_err().to_string(),
            "SPAN_STREAM_OBSERVER_URL environment variable is not set"
        );
    }

    #[test]
    #[serial]
    fn test_defaults() {
        env::set_var("SPAN_STREAM_OBSERVER_URL", "https://collector.invalid:443");
        let config = config::Config::new().unwrap();
        assert_eq!(config.observer_url, "https://collector.invalid:443");
        assert_eq!(config.queue_capacity, 10_000);
        assert_eq!(config.submission, SubmissionMode::Single);
        assert_eq!(config.batch_size_limit, 100);
        env::remove_var("SPAN_STREAM_OBSERVER_URL");
    }

    #[test]
    #[serial]
    fn test_custom_queue_and_batching() {
        env::set_var("SPAN_STREAM_OBSERVER_URL", "https://collector.invalid:443");
        env::set_var("SPAN_STREAM_QUEUE_SIZE", "500");
        env::set_var("SPAN_STREAM_BATCHING", "true");
        env::set_var("SPAN_STREAM_BATCH_SIZE", "25");

        let config = config::Config::new().unwrap();
        assert_eq!(config.queue_capacity, 500);
        assert_eq!(config.submission, SubmissionMode::Batched);
        assert_eq!(config.batch_size_limit, 25);

        env::remove_var("SPAN_STREAM_OBSERVER_URL");
        env::remove_var("SPAN_STREAM_QUEUE_SIZE");
        env::remove_var("SPAN_STREAM_BATCHING");
        env::remove_var("SPAN_STREAM_BATCH_SIZE");
    }

    #[test]
    #[serial]
    fn test_invalid_sizes_fall_back_to_defaults() {
        env::set_var("SPAN_STREAM_OBSERVER_URL", "https://collector.invalid:443");
        env::set_var("SPAN_STREAM_QUEUE_SIZE", "0");
        env::set_var("SPAN_STREAM_BATCH_SIZE", "not-a-number");

        let config = config::Config::new().unwrap();
        assert_eq!(config.queue_capacity, 10_000);
        assert_eq!(config.batch_size_limit, 100);

        env::remove_var("SPAN_STREAM_OBSERVER_URL");
        env::remove_var("SPAN_STREAM_QUEUE_SIZE");
        env::remove_var("SPAN_STREAM_BATCH_SIZE");
    }
}
