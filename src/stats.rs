//! Utilisation statistics gathered while consuming a timeline

use serde::{Deserialize, Serialize};

use crate::step::TimelineStep;

/// Running counters over the steps seen so far.
///
/// A "cycle" is a step with at least one active MAC; draining and flush
/// steps are counted as steps but not as cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub steps: usize,
    pub cycles: usize,
    pub total_macs: usize,
    pub completed: usize,
    pub peak_macs: usize,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, step: &TimelineStep) {
        self.steps += 1;
        self.completed += step.completed.len();
        if !step.active.is_empty() {
            self.cycles += 1;
            self.total_macs += step.active.len();
            self.peak_macs = self.peak_macs.max(step.active.len());
        }
    }

    /// Drain a timeline and return its statistics
    pub fn collect<I>(steps: I) -> Self
    where
        I: IntoIterator<Item = TimelineStep>,
    {
        let mut stats = Self::new();
        for step in steps {
            stats.observe(&step);
        }
        stats
    }

    pub fn avg_macs_per_cycle(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.total_macs as f64 / self.cycles as f64
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Steps: {}\nCycles: {}\nTotal MACs: {}\nPeak MACs/cycle: {}\nAvg MACs/cycle: {:.2}",
            self.steps,
            self.cycles,
            self.total_macs,
            self.peak_macs,
            self.avg_macs_per_cycle()
        )
    }
}
