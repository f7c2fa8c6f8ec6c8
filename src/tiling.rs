//! Tiled schedule
//!
//! The MAC space is cut into output tiles of `tile_size x tile_size` and
//! reduction slices of `tile_k`. Each tile issues all of its MACs in one
//! step; completion is reported one tile later to model write-back.
//!
//! For C = A @ B where A is MxK and B is KxN:
//! - tiles walk i-tile outer, j-tile middle, k-tile inner
//! - edge tiles are clipped at M, N and K

use crate::error::{ScheduleError, ScheduleResult};
use crate::pipeline::{IssueGroup, Lagged};
use crate::schedule::Schedule;
use crate::step::{Coord, Shape};

/// Tiled schedule with a one-tile completion lag
#[derive(Debug, Clone)]
pub struct TiledSchedule {
    shape: Shape,
    tile_size: usize,
    tile_k: usize,
}

impl TiledSchedule {
    pub fn new(shape: Shape, tile_size: usize, tile_k: usize) -> ScheduleResult<Self> {
        ScheduleError::require_positive("tile_size", tile_size)?;
        ScheduleError::require_positive("tile_k", tile_k)?;
        tracing::debug!(%shape, tile_size, tile_k, "tiled schedule");
        Ok(Self {
            shape,
            tile_size,
            tile_k,
        })
    }

    /// Number of tiles along (M, N, K)
    pub fn tile_counts(&self) -> (usize, usize, usize) {
        (
            self.shape.m().div_ceil(self.tile_size),
            self.shape.n().div_ceil(self.tile_size),
            self.shape.k().div_ceil(self.tile_k),
        )
    }
}

impl Schedule for TiledSchedule {
    type Steps = Lagged<TileCursor>;

    fn shape(&self) -> Shape {
        self.shape
    }

    fn expected_steps(&self) -> usize {
        let (m_tiles, n_tiles, k_tiles) = self.tile_counts();
        // every tile is non-empty, plus the final flush
        m_tiles * n_tiles * k_tiles + 1
    }

    fn run(self) -> Lagged<TileCursor> {
        let counts = self.tile_counts();
        Lagged::new(TileCursor {
            schedule: self,
            counts,
            next: Some((0, 0, 0)),
        })
    }
}

/// A clipped tile of the MAC space, half-open ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatMulTile {
    pub rows: (usize, usize),
    pub cols: (usize, usize),
    pub depth: (usize, usize),
}

impl MatMulTile {
    pub fn coords(&self) -> Vec<Coord> {
        let rows = self.rows.1 - self.rows.0;
        let cols = self.cols.1 - self.cols.0;
        let depth = self.depth.1 - self.depth.0;
        let mut coords = Vec::with_capacity(rows * cols * depth);
        for i in self.rows.0..self.rows.1 {
            for j in self.cols.0..self.cols.1 {
                for k in self.depth.0..self.depth.1 {
                    coords.push(Coord::new(i, j, k));
                }
            }
        }
        coords
    }
}

/// Walks tile origins, yielding one issue group per tile
#[derive(Debug)]
pub struct TileCursor {
    schedule: TiledSchedule,
    counts: (usize, usize, usize),
    /// Next (i-tile, j-tile, k-tile) index
    next: Option<(usize, usize, usize)>,
}

impl TileCursor {
    fn tile(&self, (ti, tj, tk): (usize, usize, usize)) -> MatMulTile {
        let s = &self.schedule;
        let span = |idx: usize, len: usize, bound: usize| (idx * len, ((idx + 1) * len).min(bound));
        MatMulTile {
            rows: span(ti, s.tile_size, s.shape.m()),
            cols: span(tj, s.tile_size, s.shape.n()),
            depth: span(tk, s.tile_k, s.shape.k()),
        }
    }

    fn successor(&self, (ti, tj, tk): (usize, usize, usize)) -> Option<(usize, usize, usize)> {
        let (m_tiles, n_tiles, k_tiles) = self.counts;
        if tk + 1 < k_tiles {
            Some((ti, tj, tk + 1))
        } else if tj + 1 < n_tiles {
            Some((ti, tj + 1, 0))
        } else if ti + 1 < m_tiles {
            Some((ti + 1, 0, 0))
        } else {
            None
        }
    }
}

impl Iterator for TileCursor {
    type Item = IssueGroup;

    fn next(&mut self) -> Option<IssueGroup> {
        let idx = self.next?;
        self.next = self.successor(idx);

        let tile = self.tile(idx);
        Some(IssueGroup::new(
            tile.coords(),
            format!(
                "Processing Tile [{}:{}, {}:{}, {}:{}]",
                tile.rows.0, tile.rows.1, tile.cols.0, tile.cols.1, tile.depth.0, tile.depth.1
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shape(m: usize, n: usize, k: usize) -> Shape {
        Shape::new(m, n, k).unwrap()
    }

    #[test]
    fn test_single_tile_covers_everything() {
        let steps: Vec<_> = TiledSchedule::new(shape(2, 2, 2), 2, 2).unwrap().run().collect();

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].active.len(), 8);
        assert!(steps[0].completed.is_empty());
        assert!(steps[1].active.is_empty());
        assert_eq!(steps[1].completed, steps[0].active);
    }

    #[test]
    fn test_large_tiling() {
        // 6x6x6 with 3x3 output tiles and k slices of 3: 2 * 2 * 2 tiles
        let schedule = TiledSchedule::new(shape(6, 6, 6), 3, 3).unwrap();
        assert_eq!(schedule.tile_counts(), (2, 2, 2));
        assert_eq!(schedule.expected_steps(), 9);

        let steps: Vec<_> = schedule.run().collect();
        assert_eq!(steps.len(), 9);
        assert!(steps[..8].iter().all(|s| s.active.len() == 27));
        for w in steps.windows(2) {
            assert_eq!(w[1].completed, w[0].active);
        }
    }

    #[test]
    fn test_traversal_order_and_clipping() {
        let steps: Vec<_> = TiledSchedule::new(shape(3, 3, 3), 2, 2).unwrap().run().collect();

        // k-tile is innermost
        assert_eq!(steps[0].description, "Processing Tile [0:2, 0:2, 0:2]");
        assert_eq!(steps[1].description, "Processing Tile [0:2, 0:2, 2:3]");
        assert_eq!(steps[2].description, "Processing Tile [0:2, 2:3, 0:2]");
        assert_eq!(steps[1].active.len(), 4);
        assert_eq!(steps[7].active, vec![Coord::new(2, 2, 2)]);
        assert_eq!(steps.len(), 9);
    }

    #[test]
    fn test_tile_larger_than_shape() {
        let steps: Vec<_> = TiledSchedule::new(shape(2, 3, 1), 8, 8).unwrap().run().collect();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].active.len(), 6);
    }

    #[test]
    fn test_zero_tile_rejected() {
        assert!(matches!(
            TiledSchedule::new(shape(2, 2, 2), 0, 2),
            Err(ScheduleError::InvalidConfiguration { .. })
        ));
        assert!(TiledSchedule::new(shape(2, 2, 2), 2, 0).is_err());
    }
}
