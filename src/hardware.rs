//! Physical array parameters and the block pipelining plan
//!
//! A fixed SxS systolic array is reused across output blocks. Block `b`
//! (row-major over the output plane) may start once the array has drained
//! K cycles of the previous block, so its start time is `b * K`.

use serde::{Deserialize, Serialize};

use crate::error::{ScheduleError, ScheduleResult};
use crate::step::{Coord, Shape};
use crate::wavefront::Region;

/// Shape of the fused MAC each tensor-core PE performs per cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MicroShape {
    pub m: usize,
    pub n: usize,
    pub k: usize,
}

impl MicroShape {
    pub fn new(m: usize, n: usize, k: usize) -> ScheduleResult<Self> {
        let micro = Self { m, n, k };
        micro.validate()?;
        Ok(micro)
    }

    pub fn validate(&self) -> ScheduleResult<()> {
        if self.m == 0 || self.n == 0 || self.k == 0 {
            return Err(ScheduleError::invalid_config(format!(
                "micro tile dimensions must be at least 1, got {}",
                self
            )));
        }
        Ok(())
    }

    /// Lattice of micro tiles covering `shape`, rounding up at the edges
    pub fn lattice(&self, shape: Shape) -> ScheduleResult<Shape> {
        Shape::new(
            shape.m().div_ceil(self.m),
            shape.n().div_ceil(self.n),
            shape.k().div_ceil(self.k),
        )
    }

    /// Fine MACs represented by lattice cell `cell`, clipped to `shape`
    pub fn expand(&self, cell: Coord, shape: Shape, out: &mut Vec<Coord>) {
        let rows = cell.i * self.m..((cell.i + 1) * self.m).min(shape.m());
        let cols = cell.j * self.n..((cell.j + 1) * self.n).min(shape.n());
        let depth = cell.k * self.k..((cell.k + 1) * self.k).min(shape.k());
        for i in rows {
            for j in cols.clone() {
                for k in depth.clone() {
                    out.push(Coord::new(i, j, k));
                }
            }
        }
    }
}

impl std::fmt::Display for MicroShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.m, self.n, self.k)
    }
}

/// One output block mapped onto the array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub index: usize,
    pub region: Region,
    pub start_time: usize,
}

impl Block {
    /// Last global cycle this block is computing
    pub fn end_time(&self) -> usize {
        self.start_time + self.region.duration()
    }

    pub fn is_live(&self, t: usize) -> bool {
        self.start_time <= t && t <= self.end_time()
    }
}

/// Partition of the output plane into SxS blocks with their start times
#[derive(Debug, Clone)]
pub struct BlockPlan {
    array_size: usize,
    blocks: Vec<Block>,
}

impl BlockPlan {
    pub fn new(shape: Shape, array_size: usize) -> ScheduleResult<Self> {
        ScheduleError::require_positive("array_size", array_size)?;

        let mut blocks = Vec::new();
        for i0 in (0..shape.m()).step_by(array_size) {
            for j0 in (0..shape.n()).step_by(array_size) {
                let index = blocks.len();
                blocks.push(Block {
                    index,
                    region: Region {
                        origin: Coord::new(i0, j0, 0),
                        rows: array_size.min(shape.m() - i0),
                        cols: array_size.min(shape.n() - j0),
                        depth: shape.k(),
                    },
                    start_time: index * shape.k(),
                });
            }
        }

        Ok(Self { array_size, blocks })
    }

    pub fn array_size(&self) -> usize {
        self.array_size
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Latest cycle any block is computing.
    ///
    /// The last block is not always the last to finish: a clipped edge
    /// block can end before a full block enumerated earlier.
    pub fn horizon(&self) -> usize {
        self.blocks.iter().map(Block::end_time).max().unwrap_or(0)
    }

    /// Blocks computing at global cycle `t`
    pub fn live_at(&self, t: usize) -> impl Iterator<Item = &Block> + '_ {
        self.blocks
            .iter()
            .take_while(move |b| b.start_time <= t)
            .filter(move |b| b.is_live(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_block_start_times() {
        let plan = BlockPlan::new(Shape::new(4, 4, 2).unwrap(), 2).unwrap();
        let starts: Vec<_> = plan.blocks().iter().map(|b| b.start_time).collect();
        assert_eq!(starts, vec![0, 2, 4, 6]);
        assert_eq!(plan.blocks()[1].region.origin, Coord::new(0, 2, 0));
        assert_eq!(plan.blocks()[2].region.origin, Coord::new(2, 0, 0));
        assert_eq!(plan.horizon(), 6 + 3);
    }

    #[test]
    fn test_clipped_blocks() {
        let plan = BlockPlan::new(Shape::new(5, 3, 1).unwrap(), 4).unwrap();
        assert_eq!(plan.blocks().len(), 2);
        let edge = plan.blocks()[1].region;
        assert_eq!((edge.rows, edge.cols, edge.depth), (1, 3, 1));
    }

    #[test]
    fn test_horizon_uses_latest_block() {
        // 3x3 full block ends at 4, the 1x1 corner block ends at 3
        let plan = BlockPlan::new(Shape::new(4, 4, 1).unwrap(), 3).unwrap();
        let last = plan.blocks().last().unwrap();
        assert_eq!(last.end_time(), 3);
        assert_eq!(plan.horizon(), 4);
    }

    #[test]
    fn test_live_blocks_overlap() {
        let plan = BlockPlan::new(Shape::new(4, 4, 2).unwrap(), 2).unwrap();
        let live: Vec<_> = plan.live_at(3).map(|b| b.index).collect();
        assert_eq!(live, vec![0, 1]);
    }

    #[test]
    fn test_micro_expand_clips() {
        let micro = MicroShape::new(2, 2, 4).unwrap();
        let shape = Shape::new(3, 2, 5).unwrap();
        assert_eq!(micro.lattice(shape).unwrap(), Shape::new(2, 1, 2).unwrap());

        let mut out = Vec::new();
        micro.expand(Coord::new(1, 0, 1), shape, &mut out);
        assert_eq!(out, vec![Coord::new(2, 0, 4), Coord::new(2, 1, 4)]);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(MicroShape::new(2, 0, 2).is_err());
        assert!(matches!(
            BlockPlan::new(Shape::new(2, 2, 2).unwrap(), 0),
            Err(ScheduleError::InvalidConfiguration { .. })
        ));
    }
}
