//! Multi-producer example
//!
//! Several threads log concurrently into one aggregator. Lines from one
//! producer keep their order; lines from different producers interleave.
//!
//! Run with: cargo run --example multi_producer

use log_aggregator::prelude::*;
use log_aggregator::{info, warning};
use std::thread;
use std::time::Duration;

const WORKERS: usize = 4;

fn main() -> Result<()> {
    println!("=== Log Aggregator - Multi Producer Example ===\n");

    let config = AggregatorConfig::new()
        .format_console("{timestamp} {level:<8} [{source}] ({thread}) {message}");
    let aggregator = Aggregator::new(config);
    aggregator.start()?;

    let handles: Vec<_> = (0..WORKERS)
        .map(|id| {
            let producer = Producer::new(aggregator.queue_handle());
            thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || {
                    let logger = producer.logger(format!("job-{}", id));
                    for step in 0..3 {
                        info!(logger, "step {}", step);
                        thread::sleep(Duration::from_millis(5 * (id as u64 + 1)));
                    }
                    warning!(logger, "finished");
                })
        })
        .collect::<std::io::Result<_>>()?;

    for handle in handles {
        if handle.join().is_err() {
            eprintln!("a worker panicked");
        }
    }
    aggregator.join()?;

    let metrics = aggregator.metrics();
    println!(
        "\nRecords received: {}, dispatched: {}, failed: {}",
        metrics.received(),
        metrics.dispatched(),
        metrics.failed()
    );
    println!("\n=== Example completed successfully! ===");
    Ok(())
}
