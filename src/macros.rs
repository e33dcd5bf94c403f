//! Submission macros with `format!`-style lines.
//!
//! Each macro evaluates to the `Result` of [`Client::submit`](crate::Client::submit).
//!
//! # Examples
//!
//! ```no_run
//! use rust_promtail_client::prelude::*;
//! use rust_promtail_client::info;
//!
//! let client = Client::new(ClientConfig::default()).unwrap();
//! let labels = LabelSet::new().with("job", "api");
//!
//! info!(client, labels, "Server started").unwrap();
//!
//! let port = 8080;
//! info!(client, labels, "Server listening on port {}", port).unwrap();
//! ```

/// Submit a formatted line at an explicit level.
///
/// ```no_run
/// # use rust_promtail_client::prelude::*;
/// # let client = Client::new(ClientConfig::default()).unwrap();
/// # let labels = LabelSet::new();
/// use rust_promtail_client::log;
/// log!(client, labels, LogLevel::Error, "Error code: {}", 500).unwrap();
/// ```
#[macro_export]
macro_rules! log {
    ($client:expr, $labels:expr, $level:expr, $($arg:tt)+) => {
        $client.submit(&$labels, $level, format!($($arg)+))
    };
}

#[macro_export]
macro_rules! debug {
    ($client:expr, $labels:expr, $($arg:tt)+) => {
        $crate::log!($client, $labels, $crate::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($client:expr, $labels:expr, $($arg:tt)+) => {
        $crate::log!($client, $labels, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Submit a formatted line at WARN.
///
/// ```no_run
/// # use rust_promtail_client::prelude::*;
/// # let client = Client::new(ClientConfig::default()).unwrap();
/// # let labels = LabelSet::new();
/// use rust_promtail_client::warn;
/// warn!(client, labels, "Retry attempt {} of {}", 3, 5).unwrap();
/// ```
#[macro_export]
macro_rules! warn {
    ($client:expr, $labels:expr, $($arg:tt)+) => {
        $crate::log!($client, $labels, $crate::LogLevel::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($client:expr, $labels:expr, $($arg:tt)+) => {
        $crate::log!($client, $labels, $crate::LogLevel::Error, $($arg)+)
    };
}
