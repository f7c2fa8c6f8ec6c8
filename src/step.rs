//! Core value types: problem shape, MAC coordinates and timeline steps

use serde::{Deserialize, Serialize};

use crate::error::{ScheduleError, ScheduleResult};

/// One multiply-accumulate `C[i,j] += A[i,k] * B[k,j]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// Output row, in `[0, M)`
    pub i: usize,
    /// Output column, in `[0, N)`
    pub j: usize,
    /// Reduction index, in `[0, K)`
    pub k: usize,
}

impl Coord {
    pub const fn new(i: usize, j: usize, k: usize) -> Self {
        Self { i, j, k }
    }
}

impl From<(usize, usize, usize)> for Coord {
    fn from((i, j, k): (usize, usize, usize)) -> Self {
        Self { i, j, k }
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.i, self.j, self.k)
    }
}

/// Problem shape of `C = A @ B` with A: MxK and B: KxN.
///
/// Every dimension is at least 1 and `2 * M * N * K` fits in `usize`. The
/// only way to obtain a `Shape` is through [`Shape::new`] (or
/// deserialization, which goes through it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawShape")]
pub struct Shape {
    m: usize,
    n: usize,
    k: usize,
}

#[derive(Deserialize)]
struct RawShape {
    m: usize,
    n: usize,
    k: usize,
}

impl TryFrom<RawShape> for Shape {
    type Error = ScheduleError;

    fn try_from(raw: RawShape) -> ScheduleResult<Self> {
        Shape::new(raw.m, raw.n, raw.k)
    }
}

impl Shape {
    pub fn new(m: usize, n: usize, k: usize) -> ScheduleResult<Self> {
        // naive runs emit two steps per MAC, so 2*M*N*K must fit in usize
        let volume = m
            .checked_mul(n)
            .and_then(|v| v.checked_mul(k))
            .and_then(|v| v.checked_mul(2));
        if m == 0 || n == 0 || k == 0 || volume.is_none() {
            return Err(ScheduleError::InvalidShape { m, n, k });
        }
        Ok(Self { m, n, k })
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of MACs in the coordinate space
    pub fn volume(&self) -> usize {
        self.m * self.n * self.k
    }

    pub fn contains(&self, coord: &Coord) -> bool {
        coord.i < self.m && coord.j < self.n && coord.k < self.k
    }

    /// Every coordinate in `[0,M) x [0,N) x [0,K)`, row-major
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.m).flat_map(move |i| {
            (0..self.n).flat_map(move |j| (0..self.k).map(move |k| Coord::new(i, j, k)))
        })
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.m, self.n, self.k)
    }
}

/// One emitted step of a timeline
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimelineStep {
    /// MACs computing during this step
    pub active: Vec<Coord>,
    /// MACs reported finished as of this step
    pub completed: Vec<Coord>,
    /// Diagnostic label
    pub description: String,
}

impl TimelineStep {
    pub fn new(active: Vec<Coord>, completed: Vec<Coord>, description: impl Into<String>) -> Self {
        Self {
            active,
            completed,
            description: description.into(),
        }
    }

    pub fn activate(active: Vec<Coord>, description: impl Into<String>) -> Self {
        Self::new(active, Vec::new(), description)
    }

    pub fn complete(completed: Vec<Coord>, description: impl Into<String>) -> Self {
        Self::new(Vec::new(), completed, description)
    }

    /// True when the step neither activates nor completes anything
    pub fn is_idle(&self) -> bool {
        self.active.is_empty() && self.completed.is_empty()
    }
}
