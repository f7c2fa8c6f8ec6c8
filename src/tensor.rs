//! Tensor-core systolic schedule
//!
//! Each PE performs a fused M2xN2xK2 micro-tile MAC per cycle. The problem
//! is coarsened to a lattice of micro tiles, the blocked systolic schedule
//! runs on that lattice, and every active lattice cell is expanded back to
//! the fine MACs it stands for.

use crate::blocked::{BlockCursor, BlockedSystolicSchedule};
use crate::error::ScheduleResult;
use crate::hardware::MicroShape;
use crate::pipeline::{IssueGroup, Lagged};
use crate::schedule::Schedule;
use crate::step::Shape;

/// Blocked systolic schedule over fused micro tiles
#[derive(Debug, Clone)]
pub struct TensorSystolicSchedule {
    shape: Shape,
    micro: MicroShape,
    macro_schedule: BlockedSystolicSchedule,
}

impl TensorSystolicSchedule {
    pub fn new(shape: Shape, array_size: usize, micro: MicroShape) -> ScheduleResult<Self> {
        micro.validate()?;
        let lattice = micro.lattice(shape)?;
        let macro_schedule = BlockedSystolicSchedule::new(lattice, array_size)?;
        tracing::debug!(%shape, %micro, %lattice, array_size, "tensor systolic schedule");
        Ok(Self {
            shape,
            micro,
            macro_schedule,
        })
    }

    pub fn micro(&self) -> MicroShape {
        self.micro
    }

    /// Shape of the micro-tile lattice the macro schedule runs on
    pub fn lattice(&self) -> Shape {
        self.macro_schedule.shape()
    }
}

impl Schedule for TensorSystolicSchedule {
    type Steps = Lagged<MicroExpansion>;

    fn shape(&self) -> Shape {
        self.shape
    }

    fn expected_steps(&self) -> usize {
        // every lattice cell expands to at least one MAC
        self.macro_schedule.expected_steps()
    }

    fn run(self) -> Lagged<MicroExpansion> {
        Lagged::new(MicroExpansion {
            shape: self.shape,
            micro: self.micro,
            cycles: self.macro_schedule.into_cycles(),
        })
    }
}

/// Expands each macro issue group into fine coordinates
#[derive(Debug)]
pub struct MicroExpansion {
    shape: Shape,
    micro: MicroShape,
    cycles: BlockCursor,
}

impl Iterator for MicroExpansion {
    type Item = IssueGroup;

    fn next(&mut self) -> Option<IssueGroup> {
        let group = self.cycles.next()?;

        let cells = group.active.len();
        let mut active = Vec::new();
        for cell in group.active {
            self.micro.expand(cell, self.shape, &mut active);
        }

        Some(IssueGroup::new(
            active,
            format!("{} ({} micro tile(s) of {})", group.description, cells, self.micro),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocked::BlockedSystolicSchedule;
    use crate::step::Coord;
    use pretty_assertions::assert_eq;

    fn shape(m: usize, n: usize, k: usize) -> Shape {
        Shape::new(m, n, k).unwrap()
    }

    #[test]
    fn test_unit_micro_matches_blocked() {
        let s = shape(4, 3, 2);
        let tensor: Vec<_> = TensorSystolicSchedule::new(s, 2, MicroShape::new(1, 1, 1).unwrap())
            .unwrap()
            .run()
            .collect();
        let blocked: Vec<_> = BlockedSystolicSchedule::new(s, 2).unwrap().run().collect();

        assert_eq!(tensor.len(), blocked.len());
        for (t, b) in tensor.iter().zip(&blocked) {
            assert_eq!(t.active, b.active);
            assert_eq!(t.completed, b.completed);
        }
    }

    #[test]
    fn test_first_cycle_is_whole_micro_tile() {
        let micro = MicroShape::new(2, 2, 4).unwrap();
        let schedule = TensorSystolicSchedule::new(shape(4, 4, 8), 2, micro).unwrap();
        assert_eq!(schedule.lattice(), shape(2, 2, 2));

        let steps: Vec<_> = schedule.run().collect();
        assert_eq!(steps[0].active.len(), 16);
        assert!(steps[0].active.iter().all(|c| c.i < 2 && c.j < 2 && c.k < 4));
        assert!(steps[0].completed.is_empty());
    }

    #[test]
    fn test_edge_tiles_truncate() {
        let s = shape(3, 3, 3);
        let steps: Vec<_> = TensorSystolicSchedule::new(s, 2, MicroShape::new(2, 2, 2).unwrap())
            .unwrap()
            .run()
            .collect();

        let total: usize = steps.iter().map(|st| st.active.len()).sum();
        assert_eq!(total, s.volume());
        assert!(steps.iter().flat_map(|st| &st.active).all(|c| s.contains(c)));

        // lattice is 2x2x2 on one 2x2 block: last cycle holds only the corner cell
        let last_active = &steps[steps.len() - 2].active;
        assert_eq!(last_active, &vec![Coord::new(2, 2, 2)]);
    }

    #[test]
    fn test_micro_tile_larger_than_shape() {
        let s = shape(2, 2, 2);
        let micro = MicroShape::new(100_000, 100_000, 100_000).unwrap();
        let schedule = TensorSystolicSchedule::new(s, 2, micro).unwrap();
        assert_eq!(schedule.lattice(), shape(1, 1, 1));

        let steps: Vec<_> = schedule.run().collect();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].active, s.coords().collect::<Vec<_>>());
        assert_eq!(steps[1].completed, steps[0].active);
    }

    #[test]
    fn test_expected_steps() {
        let micro = MicroShape::new(2, 2, 4).unwrap();
        let schedule = TensorSystolicSchedule::new(shape(12, 12, 12), 2, micro).unwrap();
        let expected = schedule.expected_steps();
        assert_eq!(schedule.run().count(), expected);
    }

    #[test]
    fn test_invalid_micro() {
        let micro = MicroShape { m: 2, n: 2, k: 0 };
        assert!(TensorSystolicSchedule::new(shape(4, 4, 4), 2, micro).is_err());
        let micro = MicroShape::new(2, 2, 2).unwrap();
        assert!(TensorSystolicSchedule::new(shape(4, 4, 4), 0, micro).is_err());
    }
}
