//! Example: Wavefront schedule of a 2x2x2 matmul
//!
//! Prints every diagonal wavefront of the unbounded systolic schedule
//! and the one-step completion lag.
//!
//! Run with: cargo run --example wavefront_2x2

use matmul_dataflow::{Schedule, Shape, WavefrontSchedule};

fn main() {
    println!("=== 2x2x2 Wavefront Schedule ===\n");

    let shape = Shape::new(2, 2, 2).unwrap();
    let schedule = WavefrontSchedule::new(shape);
    println!("Wavefronts: {}", schedule.wavefronts());
    println!("Expected steps: {}\n", schedule.expected_steps());

    for (idx, step) in schedule.run().enumerate() {
        let active: Vec<String> = step.active.iter().map(|c| c.to_string()).collect();
        let done: Vec<String> = step.completed.iter().map(|c| c.to_string()).collect();
        println!("step {} [{}]", idx, step.description);
        println!("  active:    {}", active.join(" "));
        println!("  completed: {}", done.join(" "));
    }
}
