//! Unbounded output-stationary systolic schedule
//!
//! At cycle `t` every MAC with `i + j + k == t` fires. The diagonal plane
//! sweeps from `t = 0` to `t = (M-1) + (N-1) + (K-1)`.

use crate::pipeline::{IssueGroup, Lagged};
use crate::schedule::Schedule;
use crate::step::{Coord, Shape};

/// Extent of a region running its own wavefront, with its global origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub origin: Coord,
    pub rows: usize,
    pub cols: usize,
    pub depth: usize,
}

impl Region {
    pub fn whole(shape: Shape) -> Self {
        Self {
            origin: Coord::new(0, 0, 0),
            rows: shape.m(),
            cols: shape.n(),
            depth: shape.k(),
        }
    }

    /// Last local cycle with any MAC firing
    pub fn duration(&self) -> usize {
        (self.rows - 1) + (self.cols - 1) + (self.depth - 1)
    }

    /// Append the MACs firing at local cycle `t`, in global coordinates.
    ///
    /// Fixes i and j and solves `k = t - i - j`.
    pub fn push_wavefront(&self, t: usize, out: &mut Vec<Coord>) {
        for i in 0..self.rows.min(t + 1) {
            for j in 0..self.cols.min(t - i + 1) {
                let k = t - i - j;
                if k < self.depth {
                    out.push(Coord::new(
                        self.origin.i + i,
                        self.origin.j + j,
                        self.origin.k + k,
                    ));
                }
            }
        }
    }
}

/// Wavefront schedule over the whole problem
#[derive(Debug, Clone)]
pub struct WavefrontSchedule {
    shape: Shape,
}

impl WavefrontSchedule {
    pub fn new(shape: Shape) -> Self {
        tracing::debug!(%shape, "wavefront schedule");
        Self { shape }
    }

    /// Number of wavefronts, `(M-1) + (N-1) + (K-1) + 1`
    pub fn wavefronts(&self) -> usize {
        Region::whole(self.shape).duration() + 1
    }
}

impl Schedule for WavefrontSchedule {
    type Steps = Lagged<WavefrontCursor>;

    fn shape(&self) -> Shape {
        self.shape
    }

    fn expected_steps(&self) -> usize {
        self.wavefronts() + 1
    }

    fn run(self) -> Lagged<WavefrontCursor> {
        let region = Region::whole(self.shape);
        Lagged::new(WavefrontCursor { region, t: 0 })
    }
}

/// Sweeps `t` upward, one issue group per wavefront
#[derive(Debug)]
pub struct WavefrontCursor {
    region: Region,
    t: usize,
}

impl Iterator for WavefrontCursor {
    type Item = IssueGroup;

    fn next(&mut self) -> Option<IssueGroup> {
        if self.t > self.region.duration() {
            return None;
        }
        let t = self.t;
        self.t += 1;

        let mut active = Vec::new();
        self.region.push_wavefront(t, &mut active);
        Some(IssueGroup::new(active, format!("Wavefront t={}", t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn coords(list: &[(usize, usize, usize)]) -> Vec<Coord> {
        list.iter().copied().map(Coord::from).collect()
    }

    #[test]
    fn test_wavefronts_2x2x2() {
        let steps: Vec<_> = WavefrontSchedule::new(Shape::new(2, 2, 2).unwrap()).run().collect();

        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0].active, coords(&[(0, 0, 0)]));
        assert_eq!(steps[1].active, coords(&[(0, 0, 1), (0, 1, 0), (1, 0, 0)]));
        assert_eq!(steps[2].active, coords(&[(0, 1, 1), (1, 0, 1), (1, 1, 0)]));
        assert_eq!(steps[3].active, coords(&[(1, 1, 1)]));

        assert!(steps[0].completed.is_empty());
        assert_eq!(steps[1].completed, steps[0].active);
        assert!(steps[4].active.is_empty());
        assert_eq!(steps[4].completed, coords(&[(1, 1, 1)]));
    }

    #[test]
    fn test_wavefront_sums_match_time() {
        let shape = Shape::new(3, 4, 5).unwrap();
        let schedule = WavefrontSchedule::new(shape);
        assert_eq!(schedule.wavefronts(), 10);
        assert_eq!(schedule.expected_steps(), 11);

        let steps: Vec<_> = schedule.run().collect();
        assert_eq!(steps.len(), 11);
        for (t, step) in steps[..10].iter().enumerate() {
            assert!(!step.active.is_empty());
            assert!(step.active.iter().all(|c| c.i + c.j + c.k == t));
        }
    }

    #[test]
    fn test_region_offset() {
        let region = Region {
            origin: Coord::new(4, 2, 0),
            rows: 2,
            cols: 1,
            depth: 3,
        };
        assert_eq!(region.duration(), 3);

        let mut out = Vec::new();
        region.push_wavefront(1, &mut out);
        assert_eq!(out, coords(&[(4, 2, 1), (5, 2, 0)]));

        out.clear();
        region.push_wavefront(4, &mut out);
        assert!(out.is_empty());
    }
}
