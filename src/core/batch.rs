//! In-progress batch bookkeeping
//!
//! The accumulator is owned by the dispatcher thread and never shared, so it
//! carries no synchronization of its own.

use super::config::StreamGrouping;
use super::log_entry::Stream;
use std::collections::HashMap;

/// Streams collected between two flushes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    streams: Vec<Stream>,
    entry_count: usize,
}

impl Batch {
    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    pub fn into_streams(self) -> Vec<Stream> {
        self.streams
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }
}

#[derive(Debug, Default)]
pub struct BatchAccumulator {
    batch: Batch,
    grouping: StreamGrouping,
    /// canonical labels -> position in `batch.streams`
    index: HashMap<String, usize>,
}

impl BatchAccumulator {
    pub fn new(grouping: StreamGrouping) -> Self {
        Self {
            batch: Batch::default(),
            grouping,
            index: HashMap::new(),
        }
    }

    /// Add a stream's entries to the batch.
    ///
    /// With [`StreamGrouping::ByLabels`] the entries are appended to an
    /// existing stream with the same labels, keeping arrival order.
    pub fn append(&mut self, stream: Stream) {
        if stream.is_empty() {
            return;
        }
        self.batch.entry_count += stream.len();

        match self.grouping {
            StreamGrouping::PerEntry => self.batch.streams.push(stream),
            StreamGrouping::ByLabels => match self.index.get(&stream.labels) {
                Some(&pos) => self.batch.streams[pos].entries.extend(stream.entries),
                None => {
                    self.index.insert(stream.labels.clone(), self.batch.streams.len());
                    self.batch.streams.push(stream);
                }
            },
        }
    }

    /// Number of entries in the current batch
    pub fn size(&self) -> usize {
        self.batch.entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Take the current batch, leaving an empty one behind
    pub fn drain(&mut self) -> Batch {
        self.index.clear();
        std::mem::take(&mut self.batch)
    }
}
