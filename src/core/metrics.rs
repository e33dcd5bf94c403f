//! Client metrics for observability
//!
//! Counters for the submission queue and the delivery pipeline. All updates
//! use relaxed atomics; values are advisory.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for client observability
///
/// # Example
///
/// ```
/// use rust_promtail_client::ClientMetrics;
///
/// let metrics = ClientMetrics::new();
///
/// metrics.record_sent(3);
/// metrics.record_dropped(1);
///
/// assert_eq!(metrics.entries_sent(), 3);
/// assert_eq!(metrics.batches_sent(), 1);
/// assert_eq!(metrics.entries_dropped(), 1);
/// ```
#[derive(Debug)]
pub struct ClientMetrics {
    /// Entries accepted into the submission queue
    entries_submitted: AtomicU64,

    /// Entries written to the local sink
    entries_printed: AtomicU64,

    /// Entries below both thresholds
    entries_discarded: AtomicU64,

    /// Entries in batches the endpoint acknowledged
    entries_sent: AtomicU64,

    /// Entries in batches that could not be encoded or delivered
    entries_dropped: AtomicU64,

    batches_sent: AtomicU64,

    batches_failed: AtomicU64,

    /// Number of times a producer found the queue full and had to wait
    queue_full_events: AtomicU64,
}

impl ClientMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            entries_submitted: AtomicU64::new(0),
            entries_printed: AtomicU64::new(0),
            entries_discarded: AtomicU64::new(0),
            entries_sent: AtomicU64::new(0),
            entries_dropped: AtomicU64::new(0),
            batches_sent: AtomicU64::new(0),
            batches_failed: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn entries_submitted(&self) -> u64 {
        self.entries_submitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn entries_printed(&self) -> u64 {
        self.entries_printed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn entries_discarded(&self) -> u64 {
        self.entries_discarded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn entries_sent(&self) -> u64 {
        self.entries_sent.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn entries_dropped(&self) -> u64 {
        self.entries_dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batches_sent(&self) -> u64 {
        self.batches_sent.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batches_failed(&self) -> u64 {
        self.batches_failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_submitted(&self) -> u64 {
        self.entries_submitted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_printed(&self) -> u64 {
        self.entries_printed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_discarded(&self) -> u64 {
        self.entries_discarded.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a delivered batch of `entries` entries
    #[inline]
    pub fn record_sent(&self, entries: usize) {
        self.entries_sent.fetch_add(entries as u64, Ordering::Relaxed);
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch of `entries` entries that was given up on
    #[inline]
    pub fn record_dropped(&self, entries: usize) {
        self.entries_dropped.fetch_add(entries as u64, Ordering::Relaxed);
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    /// Percentage (0.0 - 100.0) of finished entries that were dropped
    ///
    /// Returns 0.0 if no batch has finished yet.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.entries_dropped() as f64;
        let total = self.entries_sent() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.entries_submitted.store(0, Ordering::Relaxed);
        self.entries_printed.store(0, Ordering::Relaxed);
        self.entries_discarded.store(0, Ordering::Relaxed);
        self.entries_sent.store(0, Ordering::Relaxed);
        self.entries_dropped.store(0, Ordering::Relaxed);
        self.batches_sent.store(0, Ordering::Relaxed);
        self.batches_failed.store(0, Ordering::Relaxed);
        self.queue_full_events.store(0, Ordering::Relaxed);
    }
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ClientMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            entries_submitted: AtomicU64::new(self.entries_submitted()),
            entries_printed: AtomicU64::new(self.entries_printed()),
            entries_discarded: AtomicU64::new(self.entries_discarded()),
            entries_sent: AtomicU64::new(self.entries_sent()),
            entries_dropped: AtomicU64::new(self.entries_dropped()),
            batches_sent: AtomicU64::new(self.batches_sent()),
            batches_failed: AtomicU64::new(self.batches_failed()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
        }
    }
}
