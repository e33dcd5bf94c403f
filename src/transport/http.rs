//! HTTP push transport
//!
//! One POST per batch with `Content-Type: application/json`. Network errors,
//! 5xx (except 501) and 429 responses are retried under the configured
//! [`RetryPolicy`]; only `204 No Content` counts as success.

use super::retry::{Attempt, RetryPolicy, Sleeper, ThreadSleeper};
use super::Transport;
use crate::core::{ClientConfig, ClientError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_ENCODING, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{StatusCode, Url};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("rust-promtail-client/", env!("CARGO_PKG_VERSION"));

pub struct HttpTransport {
    /// Built on first delivery so that it is created on the dispatcher thread
    client: Option<Client>,
    push_url: Url,
    request_timeout: Duration,
    headers: HeaderMap,
    retry: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
    gzip: bool,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let push_url = Url::parse(&config.push_url)
            .map_err(|e| ClientError::config("push_url", format!("'{}': {}", config.push_url, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if config.gzip {
            headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        }

        Ok(Self {
            client: None,
            push_url,
            request_timeout: config.request_timeout,
            headers,
            retry: RetryPolicy::from_config(config),
            sleeper: Box::new(ThreadSleeper),
            gzip: config.gzip,
        })
    }

    /// Replace the sleeper used between retries
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn push_url(&self) -> &Url {
        &self.push_url
    }

    fn client(&mut self) -> Result<Client> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let client = Client::builder()
            .timeout(self.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        self.client = Some(client.clone());
        Ok(client)
    }

    fn prepare_body(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if !self.gzip {
            return Ok(payload.to_vec());
        }
        let mut encoder = GzEncoder::new(Vec::with_capacity(payload.len() / 4), Compression::default());
        encoder
            .write_all(payload)
            .and_then(|()| encoder.finish())
            .map_err(|e| ClientError::io_operation("compressing push payload", "gzip failed", e))
    }

    fn send_once(&self, client: &Client, body: &[u8], attempt: u32) -> Attempt<()> {
        debug!(attempt, bytes = body.len(), url = %self.push_url, "PROMTAIL | Sending push request");
        let result = client
            .post(self.push_url.clone())
            .headers(self.headers.clone())
            .body(body.to_vec())
            .send();

        match result {
            Ok(response) => classify(response),
            Err(e) if e.is_builder() => Attempt::Fail(e.into()),
            Err(e) => Attempt::Retry {
                error: e.into(),
                retry_after: None,
            },
        }
    }
}

/// Map a response onto retry semantics
fn classify(response: Response) -> Attempt<()> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return Attempt::Done(());
    }

    let retry_after = if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::SERVICE_UNAVAILABLE
    {
        parse_retry_after(response.headers())
    } else {
        None
    };
    let body = response.text().unwrap_or_default();
    let error = ClientError::unexpected_status(status.as_u16(), body);

    let retryable = status == StatusCode::TOO_MANY_REQUESTS
        || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED);
    if retryable {
        return Attempt::Retry { error, retry_after };
    }

    if status.is_success() {
        warn!(status = status.as_u16(), "PROMTAIL | Push accepted with unexpected success status");
    }
    Attempt::Fail(error)
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

impl Transport for HttpTransport {
    fn deliver(&mut self, payload: &[u8]) -> Result<()> {
        let body = self.prepare_body(payload)?;
        let client = self.client()?;
        self.retry
            .execute(self.sleeper.as_ref(), |attempt| self.send_once(&client, &body, attempt))
    }

    fn name(&self) -> &str {
        "http"
    }
}
