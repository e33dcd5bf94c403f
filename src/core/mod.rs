//! Core client types and traits

pub mod appender;
pub mod batch;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod encoder;
pub mod error;
pub mod labels;
pub mod log_entry;
pub mod log_level;
pub mod metrics;
pub mod output_format;
pub mod timestamp;

pub use appender::Appender;
pub use batch::{Batch, BatchAccumulator};
pub use client::{Client, ClientBuilder, DEFAULT_SHUTDOWN_TIMEOUT};
pub use config::{ClientConfig, StreamGrouping, DEFAULT_QUEUE_CAPACITY};
pub use dispatcher::{Dispatcher, DispatcherState};
pub use encoder::{PushEntry, PushRequest, PushStream};
pub use error::{ClientError, Result};
pub use labels::{canonicalize, sanitize_key, LabelSet};
pub use log_entry::{LogEntry, Stream};
pub use log_level::LogLevel;
pub use metrics::ClientMetrics;
pub use output_format::OutputFormat;
pub use timestamp::TimestampFormat;
