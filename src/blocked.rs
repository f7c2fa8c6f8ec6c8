//! Blocked systolic schedule
//!
//! The output plane is split into SxS blocks that share one physical array.
//! Each block runs its own wavefront over the full K extent, offset by its
//! start time, so consecutive blocks overlap in a pipeline.

use crate::error::ScheduleResult;
use crate::hardware::BlockPlan;
use crate::pipeline::{IssueGroup, Lagged};
use crate::schedule::Schedule;
use crate::step::Shape;

/// Blocked systolic schedule on an SxS array
#[derive(Debug, Clone)]
pub struct BlockedSystolicSchedule {
    shape: Shape,
    plan: BlockPlan,
}

impl BlockedSystolicSchedule {
    pub fn new(shape: Shape, array_size: usize) -> ScheduleResult<Self> {
        let plan = BlockPlan::new(shape, array_size)?;
        tracing::debug!(
            %shape,
            array_size,
            blocks = plan.blocks().len(),
            horizon = plan.horizon(),
            "blocked systolic schedule"
        );
        Ok(Self { shape, plan })
    }

    pub fn plan(&self) -> &BlockPlan {
        &self.plan
    }

    /// Raw per-cycle issue groups, before completion bookkeeping
    pub(crate) fn into_cycles(self) -> BlockCursor {
        BlockCursor {
            plan: self.plan,
            t: 0,
        }
    }
}

impl Schedule for BlockedSystolicSchedule {
    type Steps = Lagged<BlockCursor>;

    fn shape(&self) -> Shape {
        self.shape
    }

    fn expected_steps(&self) -> usize {
        // block windows tile [0, horizon] without gaps, then one drain
        self.plan.horizon() + 2
    }

    fn run(self) -> Lagged<BlockCursor> {
        Lagged::new(self.into_cycles())
    }
}

/// Walks global cycles `0..=horizon + 1`, merging every live block's wavefront
#[derive(Debug)]
pub struct BlockCursor {
    plan: BlockPlan,
    t: usize,
}

impl Iterator for BlockCursor {
    type Item = IssueGroup;

    fn next(&mut self) -> Option<IssueGroup> {
        if self.t > self.plan.horizon() + 1 {
            return None;
        }
        let t = self.t;
        self.t += 1;

        let mut active = Vec::new();
        let mut live = 0;
        for block in self.plan.live_at(t) {
            block.region.push_wavefront(t - block.start_time, &mut active);
            live += 1;
        }

        Some(IssueGroup::new(
            active,
            format!(
                "Cycle {}: {} block(s) on {}x{} array",
                t,
                live,
                self.plan.array_size(),
                self.plan.array_size()
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Coord;
    use pretty_assertions::assert_eq;

    fn shape(m: usize, n: usize, k: usize) -> Shape {
        Shape::new(m, n, k).unwrap()
    }

    #[test]
    fn test_second_block_waits_for_start_time() {
        let schedule = BlockedSystolicSchedule::new(shape(4, 4, 2), 2).unwrap();
        let steps: Vec<_> = schedule.run().collect();

        // block 1 covers rows 0..2, cols 2..4
        let in_block_1 = |c: &Coord| c.i < 2 && c.j >= 2;
        let first = steps.iter().position(|s| s.active.iter().any(in_block_1)).unwrap();
        assert_eq!(first, 2);
        assert_eq!(steps[2].active.iter().filter(|c| in_block_1(c)).count(), 1);
        assert!(steps[2].active.contains(&Coord::new(0, 2, 0)));
    }

    #[test]
    fn test_step_count_and_drain() {
        let schedule = BlockedSystolicSchedule::new(shape(4, 4, 2), 2).unwrap();
        assert_eq!(schedule.expected_steps(), 11);

        let steps: Vec<_> = schedule.run().collect();
        assert_eq!(steps.len(), 11);
        assert!(steps[..10].iter().all(|s| !s.active.is_empty()));

        let last = steps.last().unwrap();
        assert!(last.active.is_empty());
        assert_eq!(last.completed, steps[9].active);
        assert_eq!(steps[9].active, vec![Coord::new(3, 3, 1)]);
    }

    #[test]
    fn test_single_block_matches_wavefront() {
        use crate::wavefront::WavefrontSchedule;

        let s = shape(3, 2, 4);
        let blocked: Vec<_> = BlockedSystolicSchedule::new(s, 4).unwrap().run().collect();
        let wave: Vec<_> = WavefrontSchedule::new(s).run().collect();

        assert_eq!(blocked.len(), wave.len());
        for (b, w) in blocked.iter().zip(&wave) {
            assert_eq!(b.active, w.active);
            assert_eq!(b.completed, w.completed);
        }
    }

    #[test]
    fn test_overlapping_blocks_merge() {
        let schedule = BlockedSystolicSchedule::new(shape(2, 4, 3), 2).unwrap();
        let steps: Vec<_> = schedule.run().collect();
        // block 0 at local t=3 and block 1 at local t=0 share global cycle 3
        assert_eq!(
            steps[3].active,
            vec![
                Coord::new(0, 1, 2),
                Coord::new(1, 0, 2),
                Coord::new(1, 1, 1),
                Coord::new(0, 2, 0),
            ]
        );
    }
}
