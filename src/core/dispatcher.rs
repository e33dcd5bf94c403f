//! Batching dispatcher
//!
//! A single worker owns the [`BatchAccumulator`] and waits on one select point
//! over the shutdown signal, the submission queue and the flush deadline.
//! Entries passing the print threshold go to the appenders; entries passing
//! the send threshold are batched and pushed through the [`Transport`].

use super::{
    appender::Appender,
    batch::BatchAccumulator,
    config::ClientConfig,
    encoder,
    log_entry::{LogEntry, Stream},
    log_level::LogLevel,
    metrics::ClientMetrics,
};
use crate::transport::Transport;
use crossbeam_channel::{select, Receiver};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Running,
    Draining,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushReason {
    Size,
    Timer,
    Shutdown,
}

impl FlushReason {
    fn as_str(self) -> &'static str {
        match self {
            FlushReason::Size => "size",
            FlushReason::Timer => "timer",
            FlushReason::Shutdown => "shutdown",
        }
    }
}

enum Event {
    Shutdown,
    Entry(Stream),
    Tick,
}

pub struct Dispatcher {
    entries: Receiver<Stream>,
    shutdown: Receiver<()>,
    accumulator: BatchAccumulator,
    transport: Box<dyn Transport>,
    appenders: Vec<Box<dyn Appender>>,
    metrics: Arc<ClientMetrics>,
    batch_wait: Duration,
    batch_entries_number: usize,
    send_level: LogLevel,
    print_level: LogLevel,
    deadline: Instant,
    state: DispatcherState,
}

impl Dispatcher {
    /// The dispatcher stops once `shutdown` fires or disconnects, or once
    /// every sender of `entries` is gone.
    pub fn new(
        config: &ClientConfig,
        entries: Receiver<Stream>,
        shutdown: Receiver<()>,
        transport: Box<dyn Transport>,
        appenders: Vec<Box<dyn Appender>>,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        Self {
            entries,
            shutdown,
            accumulator: BatchAccumulator::new(config.stream_grouping),
            transport,
            appenders,
            metrics,
            batch_wait: config.batch_wait,
            batch_entries_number: config.batch_entries_number,
            send_level: config.send_level,
            print_level: config.print_level,
            deadline: Instant::now(),
            state: DispatcherState::Running,
        }
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    /// Drive the state machine until it reaches [`DispatcherState::Stopped`]
    pub fn run(mut self) {
        debug!(
            transport = self.transport.name(),
            batch_entries_number = self.batch_entries_number,
            batch_wait_ms = self.batch_wait.as_millis() as u64,
            "PROMTAIL | Dispatcher started"
        );
        self.reset_timer();

        loop {
            self.state = match self.state {
                DispatcherState::Running => self.wait(),
                DispatcherState::Draining => {
                    self.drain();
                    DispatcherState::Stopped
                }
                DispatcherState::Stopped => break,
            };
        }

        self.flush_appenders();
        debug!("PROMTAIL | Dispatcher stopped");
    }

    fn wait(&mut self) -> DispatcherState {
        let timer = crossbeam_channel::at(self.deadline);
        let event = select! {
            recv(self.shutdown) -> _ => Event::Shutdown,
            recv(self.entries) -> msg => match msg {
                Ok(stream) => Event::Entry(stream),
                Err(_) => Event::Shutdown,
            },
            recv(timer) -> _ => Event::Tick,
        };

        match event {
            Event::Shutdown => DispatcherState::Draining,
            Event::Entry(stream) => {
                self.handle(stream);
                DispatcherState::Running
            }
            Event::Tick => {
                self.flush(FlushReason::Timer);
                self.reset_timer();
                DispatcherState::Running
            }
        }
    }

    /// Take whatever is still queued, then flush once
    fn drain(&mut self) {
        let mut drained = 0usize;
        while let Ok(stream) = self.entries.try_recv() {
            drained += 1;
            self.handle(stream);
        }
        debug!(drained, pending = self.accumulator.size(), "PROMTAIL | Draining");
        self.flush(FlushReason::Shutdown);
    }

    fn handle(&mut self, stream: Stream) {
        let Stream { labels, entries } = stream;
        let mut outgoing = Vec::with_capacity(entries.len());

        for entry in entries {
            let print = entry.level.passes(self.print_level);
            let send = entry.level.passes(self.send_level);

            if print {
                self.print(&entry, &labels);
            }
            if send {
                outgoing.push(entry);
            } else if !print {
                self.metrics.record_discarded();
            }
        }

        if outgoing.is_empty() {
            return;
        }
        self.accumulator
            .append(Stream::from_canonical(labels, outgoing));

        if self.accumulator.size() >= self.batch_entries_number {
            self.flush(FlushReason::Size);
            self.reset_timer();
        }
    }

    fn print(&mut self, entry: &LogEntry, labels: &str) {
        for appender in self.appenders.iter_mut() {
            let result = catch_unwind(AssertUnwindSafe(|| appender.append(entry, labels)));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(appender = appender.name(), error = %e, "PROMTAIL | Appender failed");
                }
                Err(panic) => {
                    error!(
                        appender = appender.name(),
                        panic = %panic_message(&*panic),
                        "PROMTAIL | Appender panicked"
                    );
                }
            }
        }
        self.metrics.record_printed();
    }

    fn flush(&mut self, reason: FlushReason) {
        if self.accumulator.is_empty() {
            return;
        }
        let batch = self.accumulator.drain();
        let entries = batch.entry_count();
        let streams = batch.stream_count();
        debug!(entries, streams, reason = reason.as_str(), "PROMTAIL | Flushing batch");

        let payload = match encoder::encode(&batch) {
            Ok(payload) => payload,
            Err(e) => {
                self.metrics.record_dropped(entries);
                error!(entries, error = %e, "PROMTAIL | Failed to encode batch, dropping it");
                return;
            }
        };

        let transport = &mut self.transport;
        let result = catch_unwind(AssertUnwindSafe(|| transport.deliver(&payload)));
        match result {
            Ok(Ok(())) => {
                self.metrics.record_sent(entries);
                info!(entries, streams, "PROMTAIL | Push done");
            }
            Ok(Err(e)) => {
                self.metrics.record_dropped(entries);
                error!(
                    entries,
                    status = e.status(),
                    error = %e,
                    "PROMTAIL | Push failed, dropping batch"
                );
            }
            Err(panic) => {
                self.metrics.record_dropped(entries);
                error!(
                    entries,
                    transport = self.transport.name(),
                    panic = %panic_message(&*panic),
                    "PROMTAIL | Transport panicked, dropping batch"
                );
            }
        }
    }

    fn flush_appenders(&mut self) {
        for appender in self.appenders.iter_mut() {
            match catch_unwind(AssertUnwindSafe(|| appender.flush())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(appender = appender.name(), error = %e, "PROMTAIL | Appender flush failed");
                }
                Err(panic) => {
                    error!(
                        appender = appender.name(),
                        panic = %panic_message(&*panic),
                        "PROMTAIL | Appender panicked during flush"
                    );
                }
            }
        }
    }

    fn reset_timer(&mut self) {
        let now = Instant::now();
        // Saturate waits too large for Instant
        self.deadline = now
            .checked_add(self.batch_wait)
            .unwrap_or(now + Duration::from_secs(86_400 * 365));
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
