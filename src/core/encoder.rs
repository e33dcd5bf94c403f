//! Push payload encoding
//!
//! Wire format accepted by the Promtail/Loki JSON push endpoint:
//!
//! ```text
//! {"streams":[{"labels":"{job=\"api\"}","entries":[{"ts":"2025-01-08T10:30:45Z","line":"..."}]}]}
//! ```

use super::batch::Batch;
use super::error::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct WireEntry<'a> {
    ts: String,
    line: &'a str,
}

#[derive(Serialize)]
struct WireStream<'a> {
    labels: &'a str,
    entries: Vec<WireEntry<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    streams: Vec<WireStream<'a>>,
}

/// Decoded form of a push payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushRequest {
    pub streams: Vec<PushStream>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushStream {
    pub labels: String,
    pub entries: Vec<PushEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushEntry {
    pub ts: String,
    pub line: String,
}

impl PushRequest {
    pub fn entry_count(&self) -> usize {
        self.streams.iter().map(|s| s.entries.len()).sum()
    }
}

/// RFC 3339 in UTC with a `Z` suffix; sub-second digits only when present
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Serialize a batch into a push payload
pub fn encode(batch: &Batch) -> Result<Vec<u8>> {
    let message = WireMessage {
        streams: batch
            .streams()
            .iter()
            .map(|stream| WireStream {
                labels: &stream.labels,
                entries: stream
                    .entries
                    .iter()
                    .map(|entry| WireEntry {
                        ts: format_timestamp(&entry.timestamp),
                        line: &entry.line,
                    })
                    .collect(),
            })
            .collect(),
    };
    Ok(serde_json::to_vec(&message)?)
}

/// Parse a push payload produced by [`encode`]
pub fn decode(payload: &[u8]) -> Result<PushRequest> {
    Ok(serde_json::from_slice(payload)?)
}
