//! Single producer example
//!
//! Demonstrates one worker thread logging at every level, plus a helper that
//! prints progress text being captured into records, first under a bound
//! call site and then attributed by walking the stack.
//!
//! Run with: cargo run --example single_producer

use log_aggregator::prelude::*;
use log_aggregator::{call_site, critical, debug, error, info, warning};
use std::thread;

/// Stands in for a third-party routine that only knows how to print
fn report_progress(out: &mut impl std::fmt::Write, step: usize, total: usize) -> std::fmt::Result {
    write!(out, "step {}/{} ", step, total)?;
    writeln!(out, "({}%)", step * 100 / total)
}

fn main() -> Result<()> {
    println!("=== Log Aggregator - Single Producer Example ===\n");

    let config = AggregatorConfig::new().level_console(LogLevel::Debug);
    let aggregator = Aggregator::new(config);
    aggregator.start()?;

    let queue = aggregator.queue_handle();
    let worker = thread::spawn(move || {
        let logger = Producer::new(queue).logger("worker");

        println!("1. Logging at every level:");
        debug!(logger, "m");
        info!(logger, "m");
        warning!(logger, "m");
        error!(logger, "m");
        critical!(logger, "m");

        println!("2. Capturing printed progress:");
        let mut adapter = LineBufferedAdapter::new(logger, LogLevel::Info);
        {
            let mut scope = adapter.scope(call_site!());
            for step in 1..=3 {
                if report_progress(&mut *scope, step, 4).is_err() {
                    break;
                }
            }
        }

        println!("3. Attributing output to the function that printed it:");
        let mut adapter = adapter.with_stack_resolver(0);
        if report_progress(&mut adapter, 4, 4).is_err() {
            eprintln!("progress report failed");
        }
    });

    if worker.join().is_err() {
        eprintln!("worker thread panicked");
    }
    aggregator.join()?;

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
