// Process Control Block (PCB) for the LCFS process table
use alloc::string::String;
use core::fmt;

use crate::process::context::ResumeContext;
use crate::process::nice::NICE_0_WEIGHT;

/// Process ID type. `0` marks an empty slot.
pub type Pid = u32;

/// Opaque tag a sleeping process is blocked on
pub type Channel = usize;

/// Size of one page; the init process starts with exactly one
pub const PGSIZE: usize = 4096;

/// Bounds on the strings copied into a record
pub const MAX_NAME_LEN: usize = 16;
pub const MAX_CWD_LEN: usize = 64;

/// Process state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessState {
    #[default]
    Unused,   // Free slot
    Embryo,   // Allocated, not yet runnable
    Sleeping, // Blocked on a channel
    Runnable, // Ready to run, waiting for CPU
    Running,  // Currently selected
    Zombie,   // Exited, waiting to be reaped by its parent
}

impl ProcessState {
    pub fn name(self) -> &'static str {
        match self {
            ProcessState::Unused => "UNUSED",
            ProcessState::Embryo => "EMBRYO",
            ProcessState::Sleeping => "SLEEPING",
            ProcessState::Runnable => "RUNNABLE",
            ProcessState::Running => "RUNNING",
            ProcessState::Zombie => "ZOMBIE",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Virtual runtime in fixed point, `VRUNTIME_SCALE` raw units per whole unit.
///
/// Fractional accrual matters: a weight-2048 process running a 5ms slice
/// advances by exactly 2.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct VRuntime(u64);

pub const VRUNTIME_SCALE: u64 = 1024;

impl VRuntime {
    pub const ZERO: VRuntime = VRuntime(0);

    pub const fn from_raw(raw: u64) -> Self {
        VRuntime(raw)
    }

    pub const fn from_whole(units: u64) -> Self {
        VRuntime(units * VRUNTIME_SCALE)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Whole part, truncated
    pub const fn whole(self) -> u64 {
        self.0 / VRUNTIME_SCALE
    }

    /// `(NICE_0_WEIGHT / weight) * timeslice`, without losing the fraction
    /// before the multiply.
    pub fn delta(weight: u32, timeslice: u32) -> Self {
        let weight = if weight == 0 { NICE_0_WEIGHT } else { weight };
        let raw = u64::from(NICE_0_WEIGHT) * VRUNTIME_SCALE * u64::from(timeslice)
            / u64::from(weight);
        VRuntime(raw)
    }

    pub fn saturating_add(self, other: VRuntime) -> Self {
        VRuntime(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for VRuntime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.whole())
    }
}

/// Process Control Block - one per table slot
#[derive(Debug, Default)]
pub struct ProcessControlBlock {
    pub pid: Pid,
    pub state: ProcessState,
    pub parent_pid: Option<Pid>,
    pub name: String,
    pub working_directory: String,
    pub size: usize,
    pub killed: bool,
    pub channel: Channel,
    pub nice: i32,
    pub weight: u32,
    pub vruntime: VRuntime,
    pub timeslice: u32,
    pub context: Option<ResumeContext>,
}

impl ProcessControlBlock {
    pub fn is_live(&self) -> bool {
        self.pid > 0
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = bounded(name, MAX_NAME_LEN);
    }

    pub fn set_working_directory(&mut self, cwd: &str) {
        self.working_directory = bounded(cwd, MAX_CWD_LEN);
    }

    /// Return the slot to its pristine UNUSED state, dropping the resume
    /// context.
    pub fn clear(&mut self) {
        *self = ProcessControlBlock::default();
    }
}

/// Copy at most `max` bytes of `s`, cut back to a char boundary
fn bounded(s: &str, max: usize) -> String {
    if s.len() <= max {
        return String::from(s);
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    String::from(&s[..end])
}

/// Process management errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessError {
    NotFound,
    Full,
    Refused,
    WouldBlock,
    NoChildren,
    OutOfRange,
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProcessError::NotFound => write!(f, "Process not found"),
            ProcessError::Full => write!(f, "Process table full"),
            ProcessError::Refused => write!(f, "Operation refused on init process"),
            ProcessError::WouldBlock => write!(f, "Children still running, retry"),
            ProcessError::NoChildren => write!(f, "No children to wait for"),
            ProcessError::OutOfRange => write!(f, "Nice value out of range"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_keeps_fraction() {
        let d = VRuntime::delta(2048, 5);
        assert_eq!(d.raw(), 2 * VRUNTIME_SCALE + VRUNTIME_SCALE / 2);
        assert_eq!(d.whole(), 2);
    }

    #[test]
    fn delta_for_default_weight_is_timeslice() {
        assert_eq!(VRuntime::delta(1024, 33), VRuntime::from_whole(33));
        assert_eq!(VRuntime::delta(0, 33), VRuntime::from_whole(33));
    }

    #[test]
    fn names_are_truncated_on_char_boundary() {
        let mut pcb = ProcessControlBlock::default();
        pcb.set_name("a-rather-long-process-name");
        assert_eq!(pcb.name, "a-rather-long-pr");

        pcb.set_name("ééééééééé");
        assert!(pcb.name.len() <= MAX_NAME_LEN);
        assert_eq!(pcb.name, "éééééééé");
    }

    #[test]
    fn clear_resets_everything() {
        let mut pcb = ProcessControlBlock {
            pid: 7,
            state: ProcessState::Zombie,
            parent_pid: Some(1),
            killed: true,
            weight: 1024,
            vruntime: VRuntime::from_whole(9),
            context: Some(ResumeContext::new()),
            ..Default::default()
        };
        pcb.set_name("sh");
        pcb.clear();
        assert!(!pcb.is_live());
        assert_eq!(pcb.state, ProcessState::Unused);
        assert_eq!(pcb.parent_pid, None);
        assert!(pcb.name.is_empty());
        assert!(!pcb.killed);
        assert_eq!(pcb.vruntime, VRuntime::ZERO);
        assert!(pcb.context.is_none());
    }

    #[test]
    fn state_names_match_dump_format() {
        assert_eq!(ProcessState::Embryo.to_string(), "EMBRYO");
        assert_eq!(ProcessState::Zombie.name(), "ZOMBIE");
    }
}
