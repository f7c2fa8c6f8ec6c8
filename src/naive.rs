//! Naive nested-loop schedule: one MAC at a time

use serde::{Deserialize, Serialize};

use crate::error::{ScheduleError, ScheduleResult};
use crate::schedule::Schedule;
use crate::step::{Coord, Shape, TimelineStep};

/// Loop axis of the triple nest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    I,
    J,
    K,
}

impl Axis {
    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'i' => Some(Axis::I),
            'j' => Some(Axis::J),
            'k' => Some(Axis::K),
            _ => None,
        }
    }

    fn symbol(self) -> char {
        match self {
            Axis::I => 'i',
            Axis::J => 'j',
            Axis::K => 'k',
        }
    }

    fn extent(self, shape: &Shape) -> usize {
        match self {
            Axis::I => shape.m(),
            Axis::J => shape.n(),
            Axis::K => shape.k(),
        }
    }
}

/// Loop nesting order, outermost first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LoopOrder([Axis; 3]);

impl LoopOrder {
    pub const IJK: LoopOrder = LoopOrder([Axis::I, Axis::J, Axis::K]);

    /// Parse a permutation of `ijk`, case-insensitive
    pub fn parse(order: &str) -> ScheduleResult<Self> {
        let invalid = || {
            ScheduleError::invalid_config(format!(
                "loop order must be a permutation of 'ijk', got '{}'",
                order
            ))
        };

        let axes: Vec<Axis> = order
            .chars()
            .map(Axis::from_char)
            .collect::<Option<_>>()
            .ok_or_else(invalid)?;
        let [a, b, c]: [Axis; 3] = axes.try_into().map_err(|_| invalid())?;
        if a == b || b == c || a == c {
            return Err(invalid());
        }

        Ok(LoopOrder([a, b, c]))
    }

    pub fn axes(&self) -> [Axis; 3] {
        self.0
    }
}

impl Default for LoopOrder {
    fn default() -> Self {
        Self::IJK
    }
}

impl std::fmt::Display for LoopOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for axis in self.0 {
            write!(f, "{}", axis.symbol())?;
        }
        Ok(())
    }
}

impl TryFrom<String> for LoopOrder {
    type Error = ScheduleError;

    fn try_from(s: String) -> ScheduleResult<Self> {
        LoopOrder::parse(&s)
    }
}

impl From<LoopOrder> for String {
    fn from(order: LoopOrder) -> Self {
        order.to_string()
    }
}

/// Non-pipelined schedule: each MAC gets an active step then a done step
#[derive(Debug, Clone)]
pub struct NaiveSchedule {
    shape: Shape,
    order: LoopOrder,
}

impl NaiveSchedule {
    pub fn new(shape: Shape, order: &str) -> ScheduleResult<Self> {
        Ok(Self::with_order(shape, LoopOrder::parse(order)?))
    }

    pub fn with_order(shape: Shape, order: LoopOrder) -> Self {
        tracing::debug!(%shape, %order, "naive schedule");
        Self { shape, order }
    }

    pub fn order(&self) -> LoopOrder {
        self.order
    }
}

impl Schedule for NaiveSchedule {
    type Steps = NaiveSteps;

    fn shape(&self) -> Shape {
        self.shape
    }

    fn expected_steps(&self) -> usize {
        2 * self.shape.volume()
    }

    fn run(self) -> NaiveSteps {
        let axes = self.order.axes();
        NaiveSteps {
            axes,
            extents: axes.map(|a| a.extent(&self.shape)),
            counter: [0; 3],
            done: None,
            exhausted: false,
        }
    }
}

/// Cursor over the loop nest
#[derive(Debug)]
pub struct NaiveSteps {
    axes: [Axis; 3],
    extents: [usize; 3],
    /// Loop indices, outermost first
    counter: [usize; 3],
    /// MAC shown active last step, due its done step
    done: Option<Coord>,
    exhausted: bool,
}

impl NaiveSteps {
    fn current(&self) -> Coord {
        let mut coord = Coord::new(0, 0, 0);
        for (axis, &idx) in self.axes.iter().zip(&self.counter) {
            match axis {
                Axis::I => coord.i = idx,
                Axis::J => coord.j = idx,
                Axis::K => coord.k = idx,
            }
        }
        coord
    }

    /// Odometer increment, innermost loop fastest
    fn advance(&mut self) {
        for level in (0..3).rev() {
            self.counter[level] += 1;
            if self.counter[level] < self.extents[level] {
                return;
            }
            self.counter[level] = 0;
        }
        self.exhausted = true;
    }
}

impl Iterator for NaiveSteps {
    type Item = TimelineStep;

    fn next(&mut self) -> Option<TimelineStep> {
        if let Some(coord) = self.done.take() {
            return Some(TimelineStep::complete(vec![coord], "Done"));
        }
        if self.exhausted {
            return None;
        }

        let c = self.current();
        self.advance();
        self.done = Some(c);
        Some(TimelineStep::activate(
            vec![c],
            format!("Calc C[{},{}] += A[{},{}]*B[{},{}]", c.i, c.j, c.i, c.k, c.k, c.j),
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
    fn test_ijk_order_2x2x2() {
        let steps: Vec<_> = NaiveSchedule::new(shape(2, 2, 2), "ijk").unwrap().run().collect();
        assert_eq!(steps.len(), 16);

        let activated: Vec<Coord> = steps.iter().step_by(2).map(|s| s.active[0]).collect();
        let expected: Vec<Coord> = [
            (0, 0, 0),
            (0, 0, 1),
            (0, 1, 0),
            (0, 1, 1),
            (1, 0, 0),
            (1, 0, 1),
            (1, 1, 0),
            (1, 1, 1),
        ]
        .into_iter()
        .map(Coord::from)
        .collect();
        assert_eq!(activated, expected);

        assert_eq!(steps[0].active, vec![Coord::new(0, 0, 0)]);
        assert!(steps[0].completed.is_empty());
        assert_eq!(steps[0].description, "Calc C[0,0] += A[0,0]*B[0,0]");
        assert!(steps[1].active.is_empty());
        assert_eq!(steps[1].completed, vec![Coord::new(0, 0, 0)]);
    }

    #[test]
    fn test_kji_order() {
        let steps: Vec<_> = NaiveSchedule::new(shape(2, 3, 2), "kji").unwrap().run().collect();
        let activated: Vec<Coord> = steps.iter().step_by(2).map(|s| s.active[0]).collect();

        // i varies fastest, k slowest
        assert_eq!(activated[0], Coord::new(0, 0, 0));
        assert_eq!(activated[1], Coord::new(1, 0, 0));
        assert_eq!(activated[2], Coord::new(0, 1, 0));
        assert_eq!(activated[6], Coord::new(0, 0, 1));
        assert_eq!(activated.len(), 12);
    }

    #[test]
    fn test_completion_follows_activation() {
        let steps: Vec<_> = NaiveSchedule::new(shape(3, 2, 4), "jki").unwrap().run().collect();
        for pair in steps.chunks(2) {
            assert_eq!(pair[0].active, pair[1].completed);
            assert!(pair[0].completed.is_empty());
            assert!(pair[1].active.is_empty());
        }
    }

    #[test]
    fn test_single_mac() {
        let schedule = NaiveSchedule::new(shape(1, 1, 1), "ijk").unwrap();
        assert_eq!(schedule.expected_steps(), 2);
        assert_eq!(schedule.run().count(), 2);
    }

    #[test]
    fn test_invalid_orders() {
        for order in ["iij", "ij", "ijkk", "abc", "", "ijx"] {
            let err = NaiveSchedule::new(shape(2, 2, 2), order).unwrap_err();
            assert!(
                matches!(err, ScheduleError::InvalidConfiguration { .. }),
                "order {:?} should be rejected",
                order
            );
        }
    }

    #[test]
    fn test_order_case_insensitive() {
        assert_eq!(LoopOrder::parse("IKJ").unwrap().to_string(), "ikj");
    }
}
