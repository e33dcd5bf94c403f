//! Client facade
//!
//! Producers call [`Client::submit`] from any thread. Entries are pushed onto
//! a bounded queue that a single [`Dispatcher`] thread consumes; a full queue
//! makes the producer wait rather than lose the entry.

use super::{
    appender::Appender,
    config::ClientConfig,
    dispatcher::Dispatcher,
    error::{ClientError, Result},
    labels::LabelSet,
    log_entry::{LogEntry, Stream},
    log_level::LogLevel,
    metrics::ClientMetrics,
};
use crate::transport::{HttpTransport, Sleeper, Transport};
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, warn};

/// Default shutdown timeout for client cleanup (5 seconds)
///
/// Used when the client is dropped without an explicit shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Client {
    /// `None` once shutdown has begun
    sender: RwLock<Option<Sender<Stream>>>,
    /// Dropping this sender is the shutdown signal
    shutdown_signal: Mutex<Option<Sender<()>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    metrics: Arc<ClientMetrics>,
    external_labels: LabelSet,
}

impl Client {
    /// Start a client with the HTTP transport and the default appender
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Create a builder for Client
    ///
    /// # Example
    /// ```no_run
    /// use rust_promtail_client::prelude::*;
    /// use std::time::Duration;
    ///
    /// let config = ClientConfig::new("http://localhost:3100/api/prom/push")
    ///     .with_batch_wait(Duration::from_millis(500))
    ///     .with_batch_entries_number(200);
    ///
    /// let client = Client::builder(config)
    ///     .appender(ConsoleAppender::new())
    ///     .build()
    ///     .unwrap();
    /// ```
    #[must_use]
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    /// Queue one entry for delivery.
    ///
    /// Blocks only while the queue is full. Fails with
    /// [`ClientError::ClientStopped`] once shutdown has begun.
    pub fn submit(
        &self,
        labels: &LabelSet,
        level: LogLevel,
        line: impl Into<String>,
    ) -> Result<()> {
        let labels = if self.external_labels.is_empty() {
            Cow::Borrowed(labels)
        } else {
            Cow::Owned(labels.merged_over(&self.external_labels))
        };
        let stream = Stream::new(&labels, LogEntry::new(level, line));

        let guard = self.sender.read();
        let sender = guard.as_ref().ok_or(ClientError::ClientStopped)?;
        match sender.try_send(stream) {
            Ok(()) => {}
            Err(TrySendError::Full(stream)) => {
                self.metrics.record_queue_full();
                sender
                    .send(stream)
                    .map_err(|_| ClientError::ClientStopped)?;
            }
            Err(TrySendError::Disconnected(_)) => return Err(ClientError::ClientStopped),
        }
        self.metrics.record_submitted();
        Ok(())
    }

    /// Submit with labels given as a plain map
    pub fn log_with_labels(
        &self,
        labels: &HashMap<String, String>,
        level: LogLevel,
        line: impl Into<String>,
    ) -> Result<()> {
        self.submit(&LabelSet::from(labels), level, line)
    }

    #[inline]
    pub fn debug(&self, labels: &LabelSet, line: impl Into<String>) -> Result<()> {
        self.submit(labels, LogLevel::Debug, line)
    }

    #[inline]
    pub fn info(&self, labels: &LabelSet, line: impl Into<String>) -> Result<()> {
        self.submit(labels, LogLevel::Info, line)
    }

    #[inline]
    pub fn warn(&self, labels: &LabelSet, line: impl Into<String>) -> Result<()> {
        self.submit(labels, LogLevel::Warn, line)
    }

    #[inline]
    pub fn error(&self, labels: &LabelSet, line: impl Into<String>) -> Result<()> {
        self.submit(labels, LogLevel::Error, line)
    }

    /// Get the client metrics
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_promtail_client::{Client, ClientConfig};
    ///
    /// let client = Client::new(ClientConfig::default()).unwrap();
    /// let metrics = client.metrics();
    /// println!("Sent: {}", metrics.entries_sent());
    /// println!("Drop rate: {:.2}%", metrics.drop_rate());
    /// ```
    pub fn metrics(&self) -> &ClientMetrics {
        &self.metrics
    }

    /// Whether the client still accepts submissions
    pub fn is_running(&self) -> bool {
        self.sender.read().is_some()
    }

    /// Stop accepting entries and wait until the dispatcher has flushed
    /// everything already queued and exited.
    ///
    /// Calling it again, or from several threads, is harmless: later
    /// callers wait for the same completion.
    pub fn shutdown(&self) {
        self.close();
        let mut worker = self.worker.lock();
        if let Some(handle) = worker.take() {
            if handle.join().is_err() {
                error!("PROMTAIL | Dispatcher thread panicked during shutdown");
            }
        }
    }

    /// Like [`shutdown`](Self::shutdown) but gives up after `timeout`.
    ///
    /// Returns `true` if the dispatcher finished within the timeout. On
    /// `false` the dispatcher keeps draining in the background and a later
    /// `shutdown()` still waits for it.
    pub fn shutdown_timeout(&self, timeout: Duration) -> bool {
        self.close();
        let mut worker = self.worker.lock();
        let Some(handle) = worker.take() else {
            return true;
        };

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if handle.join().is_err() {
                    error!("PROMTAIL | Dispatcher thread panicked during shutdown");
                    return false;
                }
                return true;
            }

            if start.elapsed() >= timeout {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "PROMTAIL | Dispatcher did not finish within timeout"
                );
                *worker = Some(handle);
                return false;
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Close the queue, then signal the dispatcher.
    ///
    /// Taking the write lock waits for producers blocked in `send`, so every
    /// accepted entry is in the queue before the dispatcher starts draining.
    fn close(&self) {
        drop(self.sender.write().take());
        drop(self.shutdown_signal.lock().take());
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if !self.shutdown_timeout(DEFAULT_SHUTDOWN_TIMEOUT) {
            warn!("PROMTAIL | Client dropped before dispatcher finished, pending entries may be lost");
        }

        let dropped = self.metrics.entries_dropped();
        if dropped > 0 {
            warn!(
                dropped,
                drop_rate = self.metrics.drop_rate(),
                "PROMTAIL | Client shut down with dropped entries"
            );
        }
    }
}

/// Builder for constructing Client with a fluent API
///
/// Without a custom transport the client pushes over HTTP to
/// `config.push_url`. Without any appender, entries passing the print
/// threshold go to a [`ConsoleAppender`](crate::appenders::ConsoleAppender)
/// when the `console` feature is enabled.
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Box<dyn Transport>>,
    appenders: Vec<Box<dyn Appender>>,
    sleeper: Option<Box<dyn Sleeper>>,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            appenders: Vec::new(),
            sleeper: None,
        }
    }

    /// Replace the HTTP transport
    #[must_use = "builder methods return a new value"]
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Add a local sink for entries passing the print threshold
    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Box::new(appender));
        self
    }

    /// Sleeper used by the HTTP transport between retries
    ///
    /// Ignored when a custom transport is set.
    #[must_use = "builder methods return a new value"]
    pub fn sleeper<S: Sleeper + 'static>(mut self, sleeper: S) -> Self {
        self.sleeper = Some(Box::new(sleeper));
        self
    }

    /// Validate the configuration and start the dispatcher thread
    pub fn build(self) -> Result<Client> {
        let ClientBuilder {
            config,
            transport,
            mut appenders,
            sleeper,
        } = self;
        config.validate()?;

        let transport: Box<dyn Transport> = match transport {
            Some(transport) => transport,
            None => {
                let mut http = HttpTransport::new(&config)?;
                if let Some(sleeper) = sleeper {
                    http = http.with_sleeper(sleeper);
                }
                Box::new(http)
            }
        };

        #[cfg(feature = "console")]
        if appenders.is_empty() {
            appenders.push(Box::new(crate::appenders::ConsoleAppender::new()));
        }

        let (sender, receiver) = bounded(config.queue_capacity);
        let (signal, shutdown) = bounded(1);
        let metrics = Arc::new(ClientMetrics::new());
        let dispatcher = Dispatcher::new(
            &config,
            receiver,
            shutdown,
            transport,
            appenders,
            Arc::clone(&metrics),
        );

        let handle = thread::Builder::new()
            .name("promtail-dispatcher".to_string())
            .spawn(move || dispatcher.run())
            .map_err(|e| {
                ClientError::io_operation("starting dispatcher", "failed to spawn thread", e)
            })?;

        Ok(Client {
            sender: RwLock::new(Some(sender)),
            shutdown_signal: Mutex::new(Some(signal)),
            worker: Mutex::new(Some(handle)),
            metrics,
            external_labels: config.external_labels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::WriterAppender;
    use crate::core::encoder::{self, PushRequest};

    #[derive(Clone, Default)]
    struct Recorder {
        payloads: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl Recorder {
        fn requests(&self) -> Vec<PushRequest> {
            self.payloads
                .lock()
                .iter()
                .map(|p| encoder::decode(p).unwrap())
                .collect()
        }
    }

    impl Transport for Recorder {
        fn deliver(&mut self, payload: &[u8]) -> Result<()> {
            self.payloads.lock().push(payload.to_vec());
            Ok(())
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    /// Blocks every delivery until the gate is opened
    struct Gated {
        gate: Arc<(parking_lot::Mutex<bool>, parking_lot::Condvar)>,
        inner: Recorder,
    }

    impl Transport for Gated {
        fn deliver(&mut self, payload: &[u8]) -> Result<()> {
            let (lock, cvar) = &*self.gate;
            let mut open = lock.lock();
            while !*open {
                cvar.wait(&mut open);
            }
            self.inner.deliver(payload)
        }

        fn name(&self) -> &str {
            "gated"
        }
    }

    fn config() -> ClientConfig {
        ClientConfig::default()
            .with_batch_wait(Duration::from_secs(60))
            .with_batch_entries_number(1000)
    }

    fn client(config: ClientConfig, transport: impl Transport + 'static) -> Client {
        Client::builder(config)
            .transport(transport)
            .appender(WriterAppender::new(std::io::sink()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_submit_then_shutdown_delivers_everything() {
        let recorder = Recorder::default();
        let client = client(config(), recorder.clone());
        let labels = LabelSet::new().with("job", "api");

        for i in 0..10 {
            client.info(&labels, format!("request {i}")).unwrap();
        }
        client.shutdown();

        let requests = recorder.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].entry_count(), 10);
        assert_eq!(requests[0].streams[0].labels, r#"{job="api"}"#);
        assert_eq!(client.metrics().entries_submitted(), 10);
        assert_eq!(client.metrics().entries_sent(), 10);
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let client = client(config(), Recorder::default());
        client.shutdown();

        assert!(!client.is_running());
        let result = client.info(&LabelSet::new(), "late");
        assert!(matches!(result, Err(ClientError::ClientStopped)));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let recorder = Recorder::default();
        let client = client(config(), recorder.clone());
        client.warn(&LabelSet::new(), "once").unwrap();

        client.shutdown();
        client.shutdown();
        assert!(client.shutdown_timeout(Duration::from_millis(10)));
        assert_eq!(recorder.payloads.lock().len(), 1);
    }

    #[test]
    fn test_external_labels_merged() {
        let recorder = Recorder::default();
        let config = config().with_external_labels(
            LabelSet::new().with("host", "node-1").with("env", "prod"),
        );
        let client = client(config, recorder.clone());

        client
            .error(&LabelSet::new().with("env", "staging"), "boom")
            .unwrap();
        client.shutdown();

        let requests = recorder.requests();
        assert_eq!(
            requests[0].streams[0].labels,
            r#"{env="staging",host="node-1"}"#
        );
    }

    #[test]
    fn test_log_with_labels_sanitizes_keys() {
        let recorder = Recorder::default();
        let client = client(config(), recorder.clone());

        let mut labels = HashMap::new();
        labels.insert("app.name".to_string(), "web".to_string());
        client
            .log_with_labels(&labels, LogLevel::Info, "hello")
            .unwrap();
        client.shutdown();

        assert_eq!(
            recorder.requests()[0].streams[0].labels,
            r#"{app_name="web"}"#
        );
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let result = Client::builder(config().with_batch_entries_number(0))
            .transport(Recorder::default())
            .build();
        assert!(matches!(
            result,
            Err(ClientError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_shutdown_timeout_expires_on_stuck_transport() {
        let gate = Arc::new((parking_lot::Mutex::new(false), parking_lot::Condvar::new()));
        let recorder = Recorder::default();
        let client = client(
            config(),
            Gated {
                gate: Arc::clone(&gate),
                inner: recorder.clone(),
            },
        );
        client.info(&LabelSet::new(), "held").unwrap();

        assert!(!client.shutdown_timeout(Duration::from_millis(50)));

        {
            let (lock, cvar) = &*gate;
            *lock.lock() = true;
            cvar.notify_all();
        }
        client.shutdown();
        assert_eq!(recorder.payloads.lock().len(), 1);
    }

    #[test]
    fn test_full_queue_blocks_instead_of_dropping() {
        let gate = Arc::new((parking_lot::Mutex::new(false), parking_lot::Condvar::new()));
        let recorder = Recorder::default();
        let client = Arc::new(client(
            config()
                .with_queue_capacity(2)
                .with_batch_entries_number(1),
            Gated {
                gate: Arc::clone(&gate),
                inner: recorder.clone(),
            },
        ));

        let producer = {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                for i in 0..6 {
                    client.info(&LabelSet::new(), i.to_string()).unwrap();
                }
            })
        };

        let start = Instant::now();
        while client.metrics().queue_full_events() == 0 && start.elapsed() < Duration::from_secs(2) {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(client.metrics().queue_full_events() > 0);

        {
            let (lock, cvar) = &*gate;
            *lock.lock() = true;
            cvar.notify_all();
        }
        producer.join().unwrap();
        client.shutdown();

        let total: usize = recorder.requests().iter().map(PushRequest::entry_count).sum();
        assert_eq!(total, 6);
        assert_eq!(client.metrics().entries_dropped(), 0);
    }
}
