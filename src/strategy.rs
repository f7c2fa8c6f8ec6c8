//! Strategy selection: the closed family of schedulers behind one contract

use serde::{Deserialize, Serialize};

use crate::blocked::{BlockCursor, BlockedSystolicSchedule};
use crate::error::ScheduleResult;
use crate::hardware::MicroShape;
use crate::naive::{NaiveSchedule, NaiveSteps};
use crate::pipeline::Lagged;
use crate::schedule::Schedule;
use crate::step::{Shape, TimelineStep};
use crate::tensor::{MicroExpansion, TensorSystolicSchedule};
use crate::tiling::{TileCursor, TiledSchedule};
use crate::wavefront::{WavefrontCursor, WavefrontSchedule};

/// Strategy selector plus its parameters, unvalidated until [`Strategy::build`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    Naive { order: String },
    Tiled { tile_size: usize, tile_k: usize },
    Wavefront,
    BlockedSystolic { array_size: usize },
    TensorSystolic { array_size: usize, micro: MicroShape },
}

/// Named presets and the strategies they select
pub const PRESETS: &[&str] = &[
    "naive-ijk",
    "naive-ikj",
    "naive-jki",
    "tensor-core",
    "blocked-systolic",
    "tensor-systolic",
];

impl Strategy {
    pub fn preset(name: &str) -> Option<Strategy> {
        let strategy = match name {
            "naive-ijk" | "naive-ikj" | "naive-jki" => Strategy::Naive {
                order: name["naive-".len()..].to_string(),
            },
            "tensor-core" => Strategy::Tiled { tile_size: 4, tile_k: 4 },
            "blocked-systolic" => Strategy::BlockedSystolic { array_size: 8 },
            "tensor-systolic" => Strategy::TensorSystolic {
                array_size: 2,
                micro: MicroShape { m: 2, n: 2, k: 4 },
            },
            _ => return None,
        };
        Some(strategy)
    }

    /// Validate parameters and construct the scheduler for `shape`
    pub fn build(&self, shape: Shape) -> ScheduleResult<Scheduler> {
        Ok(match self {
            Strategy::Naive { order } => Scheduler::Naive(NaiveSchedule::new(shape, order)?),
            Strategy::Tiled { tile_size, tile_k } => {
                Scheduler::Tiled(TiledSchedule::new(shape, *tile_size, *tile_k)?)
            }
            Strategy::Wavefront => Scheduler::Wavefront(WavefrontSchedule::new(shape)),
            Strategy::BlockedSystolic { array_size } => {
                Scheduler::Blocked(BlockedSystolicSchedule::new(shape, *array_size)?)
            }
            Strategy::TensorSystolic { array_size, micro } => {
                Scheduler::Tensor(TensorSystolicSchedule::new(shape, *array_size, *micro)?)
            }
        })
    }
}

impl std::str::FromStr for Strategy {
    type Err = crate::error::ScheduleError;

    fn from_str(s: &str) -> ScheduleResult<Self> {
        crate::parser::parse_strategy(s)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Naive { order } => write!(f, "naive({})", order),
            Strategy::Tiled { tile_size, tile_k } => write!(f, "tiled({}, {})", tile_size, tile_k),
            Strategy::Wavefront => write!(f, "wavefront"),
            Strategy::BlockedSystolic { array_size } => write!(f, "blocked({})", array_size),
            Strategy::TensorSystolic { array_size, micro } => {
                write!(f, "tensor({}, {})", array_size, micro)
            }
        }
    }
}

/// A constructed scheduler of any strategy
#[derive(Debug, Clone)]
pub enum Scheduler {
    Naive(NaiveSchedule),
    Tiled(TiledSchedule),
    Wavefront(WavefrontSchedule),
    Blocked(BlockedSystolicSchedule),
    Tensor(TensorSystolicSchedule),
}

impl Schedule for Scheduler {
    type Steps = Timeline;

    fn shape(&self) -> Shape {
        match self {
            Scheduler::Naive(s) => s.shape(),
            Scheduler::Tiled(s) => s.shape(),
            Scheduler::Wavefront(s) => s.shape(),
            Scheduler::Blocked(s) => s.shape(),
            Scheduler::Tensor(s) => s.shape(),
        }
    }

    fn expected_steps(&self) -> usize {
        match self {
            Scheduler::Naive(s) => s.expected_steps(),
            Scheduler::Tiled(s) => s.expected_steps(),
            Scheduler::Wavefront(s) => s.expected_steps(),
            Scheduler::Blocked(s) => s.expected_steps(),
            Scheduler::Tensor(s) => s.expected_steps(),
        }
    }

    fn run(self) -> Timeline {
        match self {
            Scheduler::Naive(s) => Timeline::Naive(s.run()),
            Scheduler::Tiled(s) => Timeline::Tiled(s.run()),
            Scheduler::Wavefront(s) => Timeline::Wavefront(s.run()),
            Scheduler::Blocked(s) => Timeline::Blocked(s.run()),
            Scheduler::Tensor(s) => Timeline::Tensor(s.run()),
        }
    }
}

/// Step stream of any strategy
#[derive(Debug)]
pub enum Timeline {
    Naive(NaiveSteps),
    Tiled(Lagged<TileCursor>),
    Wavefront(Lagged<WavefrontCursor>),
    Blocked(Lagged<BlockCursor>),
    Tensor(Lagged<MicroExpansion>),
}

impl Iterator for Timeline {
    type Item = TimelineStep;

    fn next(&mut self) -> Option<TimelineStep> {
        match self {
            Timeline::Naive(it) => it.next(),
            Timeline::Tiled(it) => it.next(),
            Timeline::Wavefront(it) => it.next(),
            Timeline::Blocked(it) => it.next(),
            Timeline::Tensor(it) => it.next(),
        }
    }
}

/// A complete run description, loadable from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub shape: Shape,
    pub strategy: Strategy,
}

impl RunConfig {
    pub fn new(shape: Shape, strategy: Strategy) -> Self {
        Self { shape, strategy }
    }

    pub fn from_json_str(json: &str) -> ScheduleResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn build(&self) -> ScheduleResult<Scheduler> {
        self.strategy.build(self.shape)
    }
}
