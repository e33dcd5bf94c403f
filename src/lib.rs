//! # Rust Promtail Client
//!
//! A batching log-shipping client: entries tagged with a severity and a label
//! set are queued, grouped into batches and pushed to a Loki-compatible HTTP
//! endpoint by a single background dispatcher.
//!
//! ## Features
//!
//! - **Non-blocking submission**: bounded queue, producers wait only under backlog
//! - **Dual flush triggers**: batch size and batch wait, plus a final flush on shutdown
//! - **Bounded retry**: exponential backoff on network errors, 5xx and 429
//! - **Local sink**: entries above the print threshold go to pluggable appenders
//!
//! ```no_run
//! use rust_promtail_client::prelude::*;
//!
//! let client = Client::new(ClientConfig::new("http://localhost:3100/api/prom/push")).unwrap();
//! let labels = LabelSet::new().with("job", "api");
//! client.info(&labels, "service started").unwrap();
//! client.shutdown();
//! ```

pub mod appenders;
pub mod core;
pub mod macros;
pub mod transport;

pub mod prelude {
    pub use crate::appenders::WriterAppender;
    #[cfg(feature = "console")]
    pub use crate::appenders::ConsoleAppender;
    pub use crate::core::{
        Appender, Client, ClientBuilder, ClientConfig, ClientError, ClientMetrics, LabelSet,
        LogEntry, LogLevel, OutputFormat, Result, StreamGrouping, TimestampFormat,
        DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::transport::{HttpTransport, RetryPolicy, Sleeper, Transport};
}

pub use appenders::WriterAppender;
#[cfg(feature = "console")]
pub use appenders::ConsoleAppender;
pub use core::{
    canonicalize, sanitize_key, Appender, Batch, BatchAccumulator, Client, ClientBuilder,
    ClientConfig, ClientError, ClientMetrics, LabelSet, LogEntry, LogLevel, OutputFormat,
    PushRequest, Result, Stream, StreamGrouping, TimestampFormat, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use transport::{HttpTransport, RetryPolicy, Sleeper, ThreadSleeper, Transport};
