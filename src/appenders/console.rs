//! Console appender implementation

use crate::core::{Appender, LogEntry, LogLevel, OutputFormat, Result, TimestampFormat};
use colored::Colorize;

pub struct ConsoleAppender {
    use_colors: bool,
    timestamp_format: TimestampFormat,
    output_format: OutputFormat,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            timestamp_format: TimestampFormat::default(),
            output_format: OutputFormat::default(),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            ..Self::new()
        }
    }

    /// Set the output format for this appender
    ///
    /// # Example
    ///
    /// ```
    /// use rust_promtail_client::appenders::ConsoleAppender;
    /// use rust_promtail_client::OutputFormat;
    ///
    /// let appender = ConsoleAppender::new()
    ///     .with_output_format(OutputFormat::Json);
    /// ```
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

    fn format_text(&self, entry: &LogEntry, labels: &str) -> String {
        let level_str = if self.use_colors {
            format!("{:5}", entry.level.to_str())
                .color(entry.level.color_code())
                .to_string()
        } else {
            format!("{:5}", entry.level.to_str())
        };

        let base = format!(
            "[{}] [{}] {}",
            self.timestamp_format.format(&entry.timestamp),
            level_str,
            entry.line
        );

        if labels == "{}" {
            base
        } else {
            format!("{} {}", base, labels)
        }
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, entry: &LogEntry, labels: &str) -> Result<()> {
        let output = match self.output_format {
            OutputFormat::Text => self.format_text(entry, labels),
            _ => self.output_format.format(entry, labels, &self.timestamp_format),
        };

        // Route Error level to stderr, others to stdout
        match entry.level {
            LogLevel::Error | LogLevel::Disable => eprintln!("{}", output),
            _ => println!("{}", output),
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        use std::io::Write;
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
