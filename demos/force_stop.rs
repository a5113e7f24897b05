//! Force-stop example
//!
//! Compares the default drain-on-stop shutdown with `stop_now`, which hands
//! queued requests back to the caller instead of processing them.
//!
//! Run with: cargo run --example force_stop

use std::time::Duration;
use work_dispatcher::prelude::*;

fn fill(dispatcher: &Dispatcher<&'static str>) {
    for i in 0..12 {
        dispatcher.submit(WorkItem::new(i, "prompt"));
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let latency = Duration::from_millis(50);

    println!("1. Drain-on-stop:");
    let dispatcher = Dispatcher::new(2, SimulatedProcessor::fixed(latency))?;
    fill(&dispatcher);
    dispatcher.stop();
    println!("   processed: {}", dispatcher.total_processed());

    println!("\n2. Force stop:");
    let dispatcher = Dispatcher::new(2, SimulatedProcessor::fixed(latency))?;
    fill(&dispatcher);
    let discarded = dispatcher.stop_now();
    println!("   processed: {}", dispatcher.total_processed());
    println!(
        "   returned unprocessed: {:?}",
        discarded.iter().map(|item| item.id().get()).collect::<Vec<_>>()
    );

    println!("\n3. Submitting after stop is a silent drop:");
    match dispatcher.try_submit(WorkItem::new(99, "late")) {
        Ok(id) => println!("   accepted {}", id),
        Err(e) => println!("   {}", e),
    }

    Ok(())
}
