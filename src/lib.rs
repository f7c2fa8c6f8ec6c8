//! Matrix Multiplication Dataflow Scheduler
//!
//! This library simulates, step by step, how different hardware dataflows
//! schedule the multiply-accumulate operations of `C = A @ B`. Each strategy
//! produces a lazy stream of [`TimelineStep`]s saying which `(i, j, k)` MACs
//! are active and which have just completed.
//!
//! # Example
//!
//! ```rust
//! use matmul_dataflow::{simulate, Shape, Strategy};
//!
//! let shape = Shape::new(2, 2, 2).unwrap();
//! let steps: Vec<_> = simulate(shape, &Strategy::Wavefront).unwrap().collect();
//! assert_eq!(steps[1].active.len(), 3);
//! ```

pub mod step;
pub mod pipeline;
pub mod schedule;
pub mod naive;
pub mod tiling;
pub mod wavefront;
pub mod hardware;
pub mod blocked;
pub mod tensor;
pub mod lexer;
pub mod parser;
pub mod strategy;
pub mod stats;
pub mod error;

pub use step::{Coord, Shape, TimelineStep};
pub use schedule::Schedule;
pub use naive::{LoopOrder, NaiveSchedule};
pub use tiling::TiledSchedule;
pub use wavefront::WavefrontSchedule;
pub use hardware::{BlockPlan, MicroShape};
pub use blocked::BlockedSystolicSchedule;
pub use tensor::TensorSystolicSchedule;
pub use parser::parse_strategy;
pub use strategy::{RunConfig, Scheduler, Strategy, Timeline, PRESETS};
pub use stats::RunStats;
pub use error::{ScheduleError, ScheduleResult};

/// Build the scheduler for `strategy` and start its timeline
pub fn simulate(shape: Shape, strategy: &Strategy) -> ScheduleResult<Timeline> {
    Ok(strategy.build(shape)?.run())
}

/// Parse a selector such as `"tensor(2, 2x2x4)"` and start its timeline
pub fn simulate_selector(m: usize, n: usize, k: usize, selector: &str) -> ScheduleResult<Timeline> {
    let shape = Shape::new(m, n, k)?;
    let strategy = parse_strategy(selector)?;
    simulate(shape, &strategy)
}
