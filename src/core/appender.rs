//! Appender trait for the local log sink
//!
//! Entries whose level passes the print threshold are handed to an appender
//! by the dispatcher thread, together with their canonical label string.

use super::{error::Result, log_entry::LogEntry};

pub trait Appender: Send {
    fn append(&mut self, entry: &LogEntry, labels: &str) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
