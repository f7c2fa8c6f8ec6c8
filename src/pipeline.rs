//! One-step completion lag shared by the pipelined schedules
//!
//! Tiled, wavefront, blocked and tensor-core schedules all report a set of
//! MACs as completed one emitted step after it was active. [`Lagged`] wraps a
//! raw stream of issue groups and adds that bookkeeping:
//!
//! - a non-empty group is emitted as `active`, with the pending backlog as
//!   `completed`, and becomes the new backlog
//! - an empty group with a backlog emits a draining step
//! - an empty group with no backlog emits nothing
//! - when the stream ends, any remaining backlog is flushed

use crate::step::{Coord, TimelineStep};

/// A set of MACs issued together, as produced by a raw schedule
#[derive(Debug, Clone, Default)]
pub struct IssueGroup {
    pub active: Vec<Coord>,
    pub description: String,
}

impl IssueGroup {
    pub fn new(active: Vec<Coord>, description: impl Into<String>) -> Self {
        Self {
            active,
            description: description.into(),
        }
    }
}

/// Adapter turning issue groups into lagged timeline steps
#[derive(Debug)]
pub struct Lagged<I> {
    groups: I,
    pending: Vec<Coord>,
    finished: bool,
}

impl<I> Lagged<I>
where
    I: Iterator<Item = IssueGroup>,
{
    pub fn new(groups: I) -> Self {
        Self {
            groups,
            pending: Vec::new(),
            finished: false,
        }
    }
}

impl<I> Iterator for Lagged<I>
where
    I: Iterator<Item = IssueGroup>,
{
    type Item = TimelineStep;

    fn next(&mut self) -> Option<TimelineStep> {
        if self.finished {
            return None;
        }

        for group in self.groups.by_ref() {
            if !group.active.is_empty() {
                let completed = std::mem::replace(&mut self.pending, group.active.clone());
                return Some(TimelineStep::new(group.active, completed, group.description));
            }
            if !self.pending.is_empty() {
                tracing::trace!(count = self.pending.len(), "draining backlog");
                let completed = std::mem::take(&mut self.pending);
                return Some(TimelineStep::complete(completed, "Draining"));
            }
        }

        self.finished = true;
        if self.pending.is_empty() {
            None
        } else {
            tracing::trace!(count = self.pending.len(), "final flush");
            let completed = std::mem::take(&mut self.pending);
            Some(TimelineStep::complete(completed, "Flush"))
        }
    }
}
