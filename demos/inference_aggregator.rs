//! Inference aggregator example
//!
//! Four simulated inference workers share one request queue. Requests
//! arrive every 20ms and take 100ms each; stopping drains whatever is
//! still queued.
//!
//! Run with: RUST_LOG=info cargo run --example inference_aggregator

use std::thread;
use std::time::Duration;
use work_dispatcher::prelude::*;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Work Dispatcher - Inference Aggregator Example ===\n");

    let config = DispatcherConfig::new(4)
        .with_thread_name_prefix("inference")
        .with_record_capture(true);
    let dispatcher =
        Dispatcher::with_config(config, SimulatedProcessor::fixed(Duration::from_millis(100)))?;

    println!("1. Started {} workers", dispatcher.worker_count());

    println!("\n2. Simulating incoming traffic:");
    for i in 0..20 {
        dispatcher.submit(WorkItem::new(i, "data".to_string()));
        thread::sleep(Duration::from_millis(20));
    }
    println!("   Submitted {} requests", dispatcher.total_submitted());
    println!("   Still queued: {}", dispatcher.queue_len());

    println!("\n3. Shutting down (draining queue)...");
    dispatcher.stop();

    println!("\n4. Processing records:");
    if let Some(records) = dispatcher.records() {
        for record in records.iter() {
            println!(
                "   [Worker {}] Request {} in {:?}",
                record.worker_id, record.item_id, record.elapsed
            );
        }
    }

    println!("\n5. Per-worker statistics:");
    for (id, stats) in dispatcher.worker_stats().iter().enumerate() {
        println!(
            "   Worker {}: {} processed, avg time: {:.2}μs",
            id,
            stats.get_items_processed(),
            stats.get_average_processing_time_us()
        );
    }

    println!("\n=== Shutdown complete ===");
    Ok(())
}
