// Tunables for the process table and the scheduler
use crate::process::table::NPROC;

/// Total time handed out across all processes per round (ms)
pub const SCHED_LATENCY: u32 = 100;
/// Floor on any single timeslice (ms)
pub const MIN_GRANULARITY: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedConfig {
    pub capacity: usize,
    pub sched_latency: u32,
    pub min_granularity: u32,
}

impl SchedConfig {
    pub const fn new() -> Self {
        Self {
            capacity: NPROC,
            sched_latency: SCHED_LATENCY,
            min_granularity: MIN_GRANULARITY,
        }
    }

    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub const fn with_sched_latency(mut self, sched_latency: u32) -> Self {
        self.sched_latency = sched_latency;
        self
    }

    pub const fn with_min_granularity(mut self, min_granularity: u32) -> Self {
        self.min_granularity = min_granularity;
        self
    }
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self::new()
    }
}
