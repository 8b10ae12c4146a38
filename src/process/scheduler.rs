// Weighted-fair process scheduler for LCFS
use log::debug;

use crate::config::SchedConfig;
use crate::process::nice::{weight, NICE_0_WEIGHT};
use crate::process::pcb::{Pid, ProcessError, ProcessState, VRuntime};
use crate::process::table::ProcessTable;

/// Picks the runnable process with the least virtual runtime.
///
/// The scheduler is the only writer of `weight`, `timeslice` and
/// `vruntime`. Each call to [`ProcessScheduler::pick`] is one scheduling
/// decision; looping is up to the dispatch layer, which must run
/// `assign_timeslice` then `pick` after every yield, block or exit.
#[derive(Debug)]
pub struct ProcessScheduler {
    config: SchedConfig,
    current_process: Option<Pid>,
    total_switches: u64,
}

impl ProcessScheduler {
    pub fn new(config: SchedConfig) -> Self {
        Self {
            config,
            current_process: None,
            total_switches: 0,
        }
    }

    pub fn config(&self) -> &SchedConfig {
        &self.config
    }

    /// Sum of the stored weights of every live record
    pub fn total_weight(&self, table: &ProcessTable) -> u64 {
        table.live().map(|pcb| u64::from(pcb.weight)).sum()
    }

    /// Split `sched_latency` across live records in proportion to weight.
    ///
    /// Division truncates, so the slices of one round may sum to slightly
    /// less than `sched_latency`. No slice drops below `min_granularity`.
    pub fn assign_timeslice(&self, table: &mut ProcessTable) {
        let total = self.total_weight(table);
        let latency = u64::from(self.config.sched_latency);
        let floor = self.config.min_granularity;

        for pcb in table.live_mut() {
            if total == 0 {
                pcb.timeslice = floor;
                continue;
            }
            let share = latency * u64::from(pcb.weight) / total;
            pcb.timeslice = u32::try_from(share).unwrap_or(u32::MAX).max(floor);
        }
    }

    /// Dispatch the first RUNNABLE record, in slot order, holding the
    /// minimum vruntime among all live records.
    ///
    /// A still-RUNNING current process is preempted back to RUNNABLE
    /// first. Returns `None` when the minimum is held only by records that
    /// cannot run. A SLEEPING or ZOMBIE record at the minimum keeps every
    /// pick returning `None` until it is woken or reaped, so the dispatch
    /// layer must reap zombies and wake sleepers to make progress.
    pub fn pick(&mut self, table: &mut ProcessTable) -> Option<Pid> {
        if let Some(pid) = self.current_process {
            if let Ok(pcb) = table.find_mut(pid) {
                if pcb.state == ProcessState::Running {
                    pcb.state = ProcessState::Runnable;
                }
            }
        }

        let lowest = table.live().map(|pcb| pcb.vruntime).min()?;
        let pcb = table
            .live_mut()
            .find(|pcb| pcb.state == ProcessState::Runnable && pcb.vruntime == lowest)?;

        if pcb.weight == 0 {
            pcb.weight = NICE_0_WEIGHT;
        }
        pcb.state = ProcessState::Running;
        pcb.vruntime = pcb
            .vruntime
            .saturating_add(VRuntime::delta(pcb.weight, pcb.timeslice));

        let pid = pcb.pid;
        debug!(
            "Picked PID {} (timeslice {}, vruntime now {})",
            pid, pcb.timeslice, pcb.vruntime
        );
        self.current_process = Some(pid);
        self.total_switches += 1;
        Some(pid)
    }

    /// One full round of the dispatch contract
    pub fn schedule(&mut self, table: &mut ProcessTable) -> Option<Pid> {
        self.assign_timeslice(table);
        self.pick(table)
    }

    /// Set niceness and derive the weight from it. An unknown pid is
    /// reported before a bad `nice`.
    pub fn set_nice(&self, table: &mut ProcessTable, pid: Pid, nice: i32) -> Result<(), ProcessError> {
        let pcb = table.find_mut(pid)?;
        let w = weight(nice)?;
        pcb.nice = nice;
        pcb.weight = w;
        Ok(())
    }

    pub fn get_current_process(&self) -> Option<Pid> {
        self.current_process
    }

    pub fn set_current_process(&mut self, pid: Option<Pid>) {
        self.current_process = pid;
    }

    pub fn get_total_switches(&self) -> u64 {
        self.total_switches
    }

    pub fn get_stats(&self) -> SchedulerStats {
        SchedulerStats {
            current_process: self.current_process,
            total_switches: self.total_switches,
            sched_latency: self.config.sched_latency,
            min_granularity: self.config.min_granularity,
        }
    }
}

impl Default for ProcessScheduler {
    fn default() -> Self {
        Self::new(SchedConfig::default())
    }
}

/// Scheduler statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStats {
    pub current_process: Option<Pid>,
    pub total_switches: u64,
    pub sched_latency: u32,
    pub min_granularity: u32,
}
