//! File rotation example
//!
//! Writes to a log file that rotates every two seconds, keeping the three
//! most recent rotated files.
//!
//! Run with: cargo run --example file_rotation

use log_aggregator::prelude::*;
use log_aggregator::info;
use std::fs;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Log Aggregator - File Rotation Example ===\n");

    let dir = std::env::temp_dir().join("log_aggregator_rotation_demo");
    let config = AggregatorConfig::new()
        .file_path(&dir)
        .base_log_name("demo.log")
        .suffix_log_name("%Y-%m-%d_%H-%M-%S")
        .rotate_period(RotationPeriod::new(RotationUnit::Seconds, 2))
        .backup_count(3)
        .level_console(LogLevel::Warning);
    let aggregator = Aggregator::new(config);
    aggregator.start()?;

    let queue = aggregator.queue_handle();
    let worker = thread::spawn(move || {
        let logger = Producer::new(queue).logger("rotation");
        for tick in 0..20 {
            info!(logger, "tick {}", tick);
            thread::sleep(Duration::from_millis(500));
        }
    });
    if worker.join().is_err() {
        eprintln!("worker thread panicked");
    }
    aggregator.join()?;

    println!("Files in {}:", dir.display());
    let mut names: Vec<String> = fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    for name in names {
        println!("  {}", name);
    }

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
