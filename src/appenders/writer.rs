//! Appender over any line-oriented writer
//!
//! Lets callers inject their own sink (a file, a socket, an in-memory buffer)
//! for entries that pass the print threshold.

use crate::core::{Appender, LogEntry, OutputFormat, Result, TimestampFormat};
use std::io::Write;

/// Writes one formatted line per entry to `W`
///
/// # Example
///
/// ```
/// use rust_promtail_client::appenders::WriterAppender;
/// use rust_promtail_client::{Appender, LogEntry, LogLevel, OutputFormat};
///
/// let mut appender = WriterAppender::new(Vec::new()).with_output_format(OutputFormat::Plain);
/// appender.append(&LogEntry::new(LogLevel::Warn, "low disk"), "{}").unwrap();
/// assert_eq!(appender.get_ref(), b"low disk\n");
/// ```
pub struct WriterAppender<W: Write + Send> {
    writer: W,
    output_format: OutputFormat,
    timestamp_format: TimestampFormat,
}

impl<W: Write + Send> WriterAppender<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            output_format: OutputFormat::Plain,
            timestamp_format: TimestampFormat::default(),
        }
    }

    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Appender for WriterAppender<W> {
    fn append(&mut self, entry: &LogEntry, labels: &str) -> Result<()> {
        let line = self
            .output_format
            .format(entry, labels, &self.timestamp_format);
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "writer"
    }
}
