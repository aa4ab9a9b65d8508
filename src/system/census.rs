use serde::Serialize;

use super::entity::TaskState;
use super::smoothing::{CensusConfig, CensusSmoother};

/// Number of processes in each scheduler state bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub running: u32,
    pub sleeping: u32,
    pub stopped: u32,
    pub zombie: u32,
}

impl TaskCounts {
    pub fn new(running: u32, sleeping: u32, stopped: u32, zombie: u32) -> Self {
        Self {
            running,
            sleeping,
            stopped,
            zombie,
        }
    }

    /// Classifies and counts a set of single-character state codes.
    pub fn from_codes<I>(codes: I) -> Self
    where
        I: IntoIterator<Item = char>,
    {
        let mut counts = TaskCounts::default();
        for code in codes {
            counts.add(TaskState::from_code(code));
        }
        counts
    }

    pub fn add(&mut self, state: TaskState) {
        match state {
            TaskState::Running => self.running += 1,
            TaskState::Sleeping => self.sleeping += 1,
            TaskState::Stopped => self.stopped += 1,
            TaskState::Zombie => self.zombie += 1,
        }
    }

    /// `[running, sleeping, stopped, zombie]`
    pub fn buckets(&self) -> [u32; 4] {
        [self.running, self.sleeping, self.stopped, self.zombie]
    }

    pub fn from_buckets(b: [u32; 4]) -> Self {
        Self::new(b[0], b[1], b[2], b[3])
    }

    pub fn total(&self) -> u32 {
        self.buckets().iter().sum()
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }
}

/// Raw census of the current tick plus its smoothed, displayable form.
#[derive(Debug, Default)]
pub struct TaskCensus {
    smoother: CensusSmoother,
    raw: TaskCounts,
    displayed: TaskCounts,
}

impl TaskCensus {
    pub fn new(config: CensusConfig) -> Self {
        Self {
            smoother: CensusSmoother::new(config),
            raw: TaskCounts::default(),
            displayed: TaskCounts::default(),
        }
    }

    /// Counts one tick's worth of state codes and runs them through the filter.
    pub fn record<I>(&mut self, codes: I) -> TaskCounts
    where
        I: IntoIterator<Item = char>,
    {
        self.raw = TaskCounts::from_codes(codes);
        self.displayed = self.smoother.update(self.raw);
        self.displayed
    }

    /// The process list could not be read at all: report zeros, leave the
    /// filter state untouched.
    pub fn record_unavailable(&mut self) -> TaskCounts {
        self.raw = TaskCounts::default();
        self.displayed = TaskCounts::default();
        self.displayed
    }

    pub fn raw(&self) -> TaskCounts {
        self.raw
    }

    pub fn displayed(&self) -> TaskCounts {
        self.displayed
    }

    pub fn reset(&mut self) {
        self.smoother.reset();
        self.raw = TaskCounts::default();
        self.displayed = TaskCounts::default();
    }
}
