//! Example: Compare every preset on a 12x12x12 problem
//!
//! Shows how many steps and cycles each dataflow needs and how many MACs
//! it keeps busy per cycle.
//!
//! Run with: cargo run --example compare_strategies

use matmul_dataflow::{simulate, RunStats, Shape, Strategy, PRESETS};

fn main() {
    println!("=== Strategy Comparison (12x12x12) ===\n");

    let shape = Shape::new(12, 12, 12).unwrap();
    println!(
        "{:<18} {:<20} {:>8} {:>8} {:>10} {:>8}",
        "preset", "strategy", "steps", "cycles", "avg MACs", "peak"
    );

    let mut strategies: Vec<(String, Strategy)> = PRESETS
        .iter()
        .filter_map(|name| Strategy::preset(name).map(|s| (name.to_string(), s)))
        .collect();
    strategies.push(("-".to_string(), Strategy::Wavefront));

    for (name, strategy) in strategies {
        let stats = RunStats::collect(simulate(shape, &strategy).unwrap());
        println!(
            "{:<18} {:<20} {:>8} {:>8} {:>10.2} {:>8}",
            name,
            strategy.to_string(),
            stats.steps,
            stats.cycles,
            stats.avg_macs_per_cycle(),
            stats.peak_macs
        );
    }

    // A run config can also be written out and loaded back as JSON
    let preset = Strategy::preset("tensor-systolic").unwrap();
    let config = matmul_dataflow::RunConfig::new(shape, preset);
    println!("\nRun config JSON:\n{}", config.to_json().unwrap());
}
