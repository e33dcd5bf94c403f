//! Line formats for the local log sink
//!
//! - Plain: the bare log line
//! - Text: human-readable line with timestamp, level and labels
//! - Json: one JSON object per line
//! - Logfmt: key=value pairs

use super::log_entry::LogEntry;
use super::timestamp::TimestampFormat;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Example: `Request processed`
    Plain,

    /// Example: `[2025-01-08T10:30:45.000Z] [INFO ] Request processed {job="api"}`
    #[default]
    Text,

    /// Example: `{"timestamp":"2025-01-08T10:30:45.000Z","level":"INFO","line":"Request processed","labels":"{job=\"api\"}"}`
    Json,

    /// Example: `timestamp=2025-01-08T10:30:45.000Z level=INFO line="Request processed" labels="{job=\"api\"}"`
    Logfmt,
}

impl OutputFormat {
    /// Render an entry and its canonical labels as a single line
    pub fn format(&self, entry: &LogEntry, labels: &str, timestamp_format: &TimestampFormat) -> String {
        match self {
            OutputFormat::Plain => entry.line.clone(),
            OutputFormat::Text => {
                let base = format!(
                    "[{}] [{:5}] {}",
                    timestamp_format.format(&entry.timestamp),
                    entry.level.to_str(),
                    entry.line
                );
                if labels.is_empty() || labels == "{}" {
                    base
                } else {
                    format!("{} {}", base, labels)
                }
            }
            OutputFormat::Json => Self::format_json(entry, labels, timestamp_format),
            OutputFormat::Logfmt => format!(
                "timestamp={} level={} line={} labels={}",
                timestamp_format.format(&entry.timestamp),
                entry.level.to_str(),
                Self::quote_logfmt_value(&entry.line),
                Self::quote_logfmt_value(labels)
            ),
        }
    }

    fn format_json(entry: &LogEntry, labels: &str, timestamp_format: &TimestampFormat) -> String {
        let mut json_obj = serde_json::Map::new();

        let timestamp = if timestamp_format.is_numeric() {
            match timestamp_format {
                TimestampFormat::Unix => serde_json::Value::from(entry.timestamp.timestamp()),
                _ => serde_json::Value::from(entry.timestamp.timestamp_millis()),
            }
        } else {
            serde_json::Value::String(timestamp_format.format(&entry.timestamp))
        };
        json_obj.insert("timestamp".to_string(), timestamp);
        json_obj.insert(
            "level".to_string(),
            serde_json::Value::String(entry.level.to_str().to_string()),
        );
        json_obj.insert(
            "line".to_string(),
            serde_json::Value::String(entry.line.clone()),
        );
        json_obj.insert(
            "labels".to_string(),
            serde_json::Value::String(labels.to_string()),
        );

        serde_json::Value::Object(json_obj).to_string()
    }

    /// Quote a logfmt value, escaping quotes, backslashes and newlines
    fn quote_logfmt_value(value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('"');
        for c in value.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                _ => out.push(c),
            }
        }
        out.push('"');
        out
    }
}
