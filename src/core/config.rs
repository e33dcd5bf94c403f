//! Client configuration
//!
//! A [`ClientConfig`] is fixed when the client is constructed. It can be
//! built in code with the `with_*` setters or deserialized from JSON, where
//! durations are given in milliseconds (`batch_wait_ms`, ...).

use super::error::{ClientError, Result};
use super::labels::LabelSet;
use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default capacity of the queue between producers and the dispatcher
pub const DEFAULT_QUEUE_CAPACITY: usize = 5000;

/// How entries are grouped into streams within one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamGrouping {
    /// Entries with identical label sets share one stream
    #[default]
    ByLabels,
    /// Every submitted entry becomes its own stream
    PerEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// E.g. `http://localhost:3100/api/prom/push`
    pub push_url: String,

    /// Maximum time an entry waits in a batch before it is pushed
    #[serde(rename = "batch_wait_ms", with = "duration_ms")]
    pub batch_wait: Duration,

    /// A batch is pushed as soon as it holds this many entries
    pub batch_entries_number: usize,

    /// Entries are pushed if their level is >= `send_level`
    pub send_level: LogLevel,

    /// Entries are written to the local sink if their level is >= `print_level`
    pub print_level: LogLevel,

    /// Retries after the first attempt; 0 disables retrying
    pub max_retry: u32,

    #[serde(rename = "retry_min_wait_ms", with = "duration_ms")]
    pub retry_min_wait: Duration,

    #[serde(rename = "retry_max_wait_ms", with = "duration_ms")]
    pub retry_max_wait: Duration,

    /// Capacity of the submission queue; producers block when it is full
    pub queue_capacity: usize,

    /// Timeout applied to each HTTP attempt
    #[serde(rename = "request_timeout_ms", with = "duration_ms")]
    pub request_timeout: Duration,

    /// Compress request bodies with gzip
    pub gzip: bool,

    /// Labels added to every entry; submitted labels take precedence
    pub external_labels: LabelSet,

    pub stream_grouping: StreamGrouping,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            push_url: "http://localhost:3100/api/prom/push".to_string(),
            batch_wait: Duration::from_secs(1),
            batch_entries_number: 100,
            send_level: LogLevel::Info,
            print_level: LogLevel::Error,
            max_retry: 0,
            retry_min_wait: Duration::from_secs(1),
            retry_max_wait: Duration::from_secs(30),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            request_timeout: Duration::from_secs(10),
            gzip: false,
            external_labels: LabelSet::new(),
            stream_grouping: StreamGrouping::ByLabels,
        }
    }
}

impl ClientConfig {
    pub fn new(push_url: impl Into<String>) -> Self {
        Self {
            push_url: push_url.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ClientConfig = serde_json::from_str(json)
            .map_err(|e| ClientError::config("configuration", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_batch_wait(mut self, wait: Duration) -> Self {
        self.batch_wait = wait;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_batch_entries_number(mut self, entries: usize) -> Self {
        self.batch_entries_number = entries;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_send_level(mut self, level: LogLevel) -> Self {
        self.send_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_print_level(mut self, level: LogLevel) -> Self {
        self.print_level = level;
        self
    }

    /// Set retry count and backoff bounds in one go
    #[must_use = "builder methods return a new value"]
    pub fn with_retry(mut self, max_retry: u32, min_wait: Duration, max_wait: Duration) -> Self {
        self.max_retry = max_retry;
        self.retry_min_wait = min_wait;
        self.retry_max_wait = max_wait;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_gzip(mut self, enabled: bool) -> Self {
        self.gzip = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_external_labels(mut self, labels: LabelSet) -> Self {
        self.external_labels = labels;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_stream_grouping(mut self, grouping: StreamGrouping) -> Self {
        self.stream_grouping = grouping;
        self
    }

    /// Check thresholds and the push URL
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.push_url)
            .map_err(|e| ClientError::config("push_url", format!("'{}': {}", self.push_url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::config(
                "push_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.batch_wait.is_zero() {
            return Err(ClientError::config("batch_wait", "must be greater than zero"));
        }
        if self.batch_entries_number == 0 {
            return Err(ClientError::config(
                "batch_entries_number",
                "must be greater than zero",
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ClientError::config("queue_capacity", "must be greater than zero"));
        }
        if self.retry_min_wait > self.retry_max_wait {
            return Err(ClientError::config(
                "retry_min_wait",
                format!(
                    "{:?} exceeds retry_max_wait {:?}",
                    self.retry_min_wait, self.retry_max_wait
                ),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ClientError::config("request_timeout", "must be greater than zero"));
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis().min(u128::from(u64::MAX)) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
