//! Criterion benchmarks for rust_promtail_client

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use rust_promtail_client::core::encoder;
use rust_promtail_client::prelude::*;
use rust_promtail_client::{sanitize_key, BatchAccumulator, Stream};
use std::sync::Arc;
use std::time::Duration;

/// Accepts every payload without I/O
struct NullTransport;

impl Transport for NullTransport {
    fn deliver(&mut self, payload: &[u8]) -> rust_promtail_client::Result<()> {
        black_box(payload);
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

fn client() -> Client {
    let config = ClientConfig::default()
        .with_batch_entries_number(500)
        .with_batch_wait(Duration::from_millis(50))
        .with_queue_capacity(10_000);
    Client::builder(config)
        .transport(NullTransport)
        .appender(WriterAppender::new(std::io::sink()))
        .build()
        .expect("client should start")
}

fn entry(i: usize) -> LogEntry {
    LogEntry::new(LogLevel::Info, format!("GET /api/items/{i} 200 12ms"))
        .with_timestamp(Utc.timestamp_opt(1_736_332_245, (i as u32 % 1000) * 1_000_000).unwrap())
}

// ============================================================================
// Label Benchmarks
// ============================================================================

fn bench_labels(c: &mut Criterion) {
    let mut group = c.benchmark_group("labels");
    group.throughput(Throughput::Elements(1));

    group.bench_function("sanitize_key", |b| {
        b.iter(|| sanitize_key(black_box("k8s.pod-name/app")));
    });

    let labels = LabelSet::new()
        .with("job", "api")
        .with("env", "prod")
        .with("host", "node-17")
        .with("region", "eu-west-1");
    group.bench_function("canonical", |b| {
        b.iter(|| black_box(&labels).canonical());
    });

    let canonical = labels.canonical();
    group.bench_function("parse", |b| {
        b.iter(|| LabelSet::parse(black_box(&canonical)).unwrap());
    });

    group.finish();
}

// ============================================================================
// Batching and Encoding Benchmarks
// ============================================================================

fn bench_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoding");

    for &size in &[10usize, 100, 1000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("accumulate_{size}"), |b| {
            let labels = LabelSet::new().with("job", "bench");
            b.iter_batched(
                || (0..size).map(entry).collect::<Vec<_>>(),
                |entries| {
                    let mut acc = BatchAccumulator::new(StreamGrouping::ByLabels);
                    for e in entries {
                        acc.append(Stream::new(&labels, e));
                    }
                    black_box(acc.drain())
                },
                BatchSize::SmallInput,
            );
        });

        let mut acc = BatchAccumulator::new(StreamGrouping::ByLabels);
        for i in 0..size {
            let labels = LabelSet::new().with("job", format!("job-{}", i % 4));
            acc.append(Stream::new(&labels, entry(i)));
        }
        let batch = acc.drain();
        group.bench_function(format!("encode_{size}"), |b| {
            b.iter(|| encoder::encode(black_box(&batch)).unwrap());
        });
    }

    group.finish();
}

// ============================================================================
// Submission Benchmarks
// ============================================================================

fn bench_submit(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit");
    group.throughput(Throughput::Elements(1));

    let client = client();
    let labels = LabelSet::new().with("job", "bench");
    group.bench_function("single_thread", |b| {
        b.iter(|| client.info(&labels, black_box("request handled")).unwrap());
    });

    group.bench_function("with_format", |b| {
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            rust_promtail_client::info!(client, labels, "request {} handled", n).unwrap()
        });
    });
    client.shutdown();

    group.bench_function("concurrent_4_threads", |b| {
        let client = Arc::new(self::client());
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let client = Arc::clone(&client);
                    std::thread::spawn(move || {
                        let labels = LabelSet::new().with("thread", t.to_string());
                        for _ in 0..100 {
                            client.info(&labels, "concurrent").unwrap();
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });
        client.shutdown();
    });

    group.finish();
}

criterion_group!(benches, bench_labels, bench_encoding, bench_submit);
criterion_main!(benches);
