//! The contract every dataflow strategy implements

use crate::step::{Shape, TimelineStep};

/// A MAC schedule for one problem shape.
///
/// Construction validates everything; [`Schedule::run`] consumes the
/// scheduler and yields a finite, single-pass stream of steps. A second run
/// needs a new scheduler.
pub trait Schedule {
    type Steps: Iterator<Item = TimelineStep>;

    /// Problem shape this schedule covers
    fn shape(&self) -> Shape;

    /// Exact number of steps `run` will emit
    fn expected_steps(&self) -> usize;

    /// Start producing steps
    fn run(self) -> Self::Steps;
}
