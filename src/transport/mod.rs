//! Delivery of encoded push payloads
//!
//! The dispatcher hands every encoded batch to a [`Transport`]. The default
//! [`HttpTransport`] POSTs it to the configured push URL with bounded retry;
//! tests and embedders can plug in their own implementation.

pub mod http;
pub mod retry;

pub use http::HttpTransport;
pub use retry::{Attempt, RetryPolicy, Sleeper, ThreadSleeper};

use crate::core::Result;

pub trait Transport: Send {
    /// Deliver one payload, retrying internally as the implementation sees fit.
    ///
    /// Must return in bounded time: the dispatcher waits on it.
    fn deliver(&mut self, payload: &[u8]) -> Result<()>;

    fn name(&self) -> &str;
}
