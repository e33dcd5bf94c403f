//! Log entry and stream structures

use super::labels::LabelSet;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub line: String,
    pub level: LogLevel,
}

impl LogEntry {
    pub fn new(level: LogLevel, line: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            line: line.into(),
            level,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Entries sharing one canonical label string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    pub labels: String,
    pub entries: Vec<LogEntry>,
}

impl Stream {
    pub fn new(labels: &LabelSet, entry: LogEntry) -> Self {
        Self {
            labels: labels.canonical(),
            entries: vec![entry],
        }
    }

    /// Build a stream from an already canonical label string
    pub fn from_canonical(labels: String, entries: Vec<LogEntry>) -> Self {
        Self { labels, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
