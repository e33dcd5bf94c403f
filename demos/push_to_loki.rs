//! Push a few labelled entries to a local Loki
//!
//! Run with: RUST_LOG=rust_promtail_client=debug cargo run --example push_to_loki [PUSH_URL]

use rust_promtail_client::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let push_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:3100/api/prom/push".to_string());

    let config = ClientConfig::new(push_url)
        .with_batch_wait(Duration::from_millis(500))
        .with_batch_entries_number(50)
        .with_send_level(LogLevel::Debug)
        .with_print_level(LogLevel::Warn)
        .with_retry(3, Duration::from_millis(200), Duration::from_secs(2))
        .with_external_labels(LabelSet::new().with("source", "push_to_loki"));

    let client = Arc::new(Client::builder(config).appender(ConsoleAppender::new()).build()?);

    let labels = LabelSet::new().with("job", "demo").with("env", "local");
    client.info(&labels, "demo started")?;
    rust_promtail_client::warn!(client, labels, "disk usage at {}%", 91)?;

    let handles: Vec<_> = (0..3)
        .map(|worker| {
            let client = Arc::clone(&client);
            thread::spawn(move || -> Result<()> {
                let labels = LabelSet::new()
                    .with("job", "demo")
                    .with("worker", worker.to_string());
                for i in 0..20 {
                    client.debug(&labels, format!("worker {worker} step {i}"))?;
                    thread::sleep(Duration::from_millis(25));
                }
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle
            .join()
            .map_err(|_| ClientError::other("worker thread panicked"))??;
    }

    client.error(&labels, "demo finished")?;
    client.shutdown();

    let metrics = client.metrics();
    println!(
        "sent {} entries in {} batches, dropped {}",
        metrics.entries_sent(),
        metrics.batches_sent(),
        metrics.entries_dropped()
    );
    Ok(())
}
