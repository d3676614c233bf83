//! Run a two-hour shift on the sample city and print the handled cases.
//!
//! Run with: cargo run -p dispatch_core --example scenario_run

use dispatch_core::priority::Disease;
use dispatch_core::scenario::{CityConfig, DispatchParams};
use dispatch_core::telemetry::ActivityKind;
use dispatch_core::DispatchSimulation;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    const SHIFT_MINUTES: u64 = 120;
    const CALL_EVERY: u64 = 7;

    let mut sim = DispatchSimulation::new(
        CityConfig::sample(),
        DispatchParams::default()
            .with_seed(123)
            .with_activity_log_capacity(500),
    )?;

    let mut rejected = 0;
    let mut call = 0usize;
    for minute in 0..SHIFT_MINUTES {
        if minute % CALL_EVERY == 0 {
            let disease = Disease::ALL[call % Disease::ALL.len()];
            let age = 8 + (call as u32 * 13) % 80;
            if sim
                .report_emergency(format!("caller-{call}"), (call * 3) % 10, disease, age)
                .is_err()
            {
                rejected += 1;
            }
            call += 1;
        }
        sim.advance_time(1);
    }

    let stats = sim.statistics();
    println!("--- Sample city shift ({SHIFT_MINUTES} min, one call every {CALL_EVERY} min, seed 123) ---");
    println!("Calls: {call} ({rejected} rejected)");
    println!(
        "Handled: {}  dispatches: {}  reassignments: {}",
        stats.handled, stats.dispatches, stats.reassignments
    );
    match stats.average_response_minutes {
        Some(average) => println!("Average response: {average:.1} min"),
        None => println!("Average response: n/a"),
    }
    println!("Still pending: {}  still active: {}", stats.pending, stats.active);

    let deliveries: Vec<_> = sim
        .activity_log()
        .filter(|entry| matches!(entry.kind, ActivityKind::Delivered { .. }))
        .collect();
    if deliveries.is_empty() {
        println!("\nNo patients delivered.");
    } else {
        println!("\nDeliveries (most recent first):");
        for entry in deliveries.iter().take(20) {
            println!("  {entry}");
        }
    }
    Ok(())
}
