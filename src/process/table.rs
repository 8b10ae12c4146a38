// Fixed-capacity process table
use alloc::vec::Vec;

use crate::process::context::ResumeContext;
use crate::process::pcb::{Pid, ProcessControlBlock, ProcessError, ProcessState};

/// Default number of slots
pub const NPROC: usize = 64;

/// Slot registry. Owns every record; callers resolve by pid per operation.
#[derive(Debug)]
pub struct ProcessTable {
    slots: Vec<ProcessControlBlock>,
    next_pid: Pid,
}

impl ProcessTable {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, ProcessControlBlock::default);
        Self { slots, next_pid: 1 }
    }

    /// Claim the first UNUSED slot as an EMBRYO with a fresh pid.
    ///
    /// Pids are never reused, so once the pid space runs out every
    /// allocation fails with `Full`.
    pub fn allocate(&mut self) -> Result<&mut ProcessControlBlock, ProcessError> {
        let pid = self.next_pid;
        let next_pid = pid.checked_add(1).ok_or(ProcessError::Full)?;
        let pcb = self
            .slots
            .iter_mut()
            .find(|pcb| pcb.state == ProcessState::Unused)
            .ok_or(ProcessError::Full)?;

        pcb.clear();
        pcb.pid = pid;
        pcb.state = ProcessState::Embryo;
        pcb.context = Some(ResumeContext::new());
        self.next_pid = next_pid;
        Ok(pcb)
    }

    pub fn find(&self, pid: Pid) -> Result<&ProcessControlBlock, ProcessError> {
        if pid == 0 {
            return Err(ProcessError::NotFound);
        }
        self.slots
            .iter()
            .find(|pcb| pcb.pid == pid)
            .ok_or(ProcessError::NotFound)
    }

    pub fn find_mut(&mut self, pid: Pid) -> Result<&mut ProcessControlBlock, ProcessError> {
        if pid == 0 {
            return Err(ProcessError::NotFound);
        }
        self.slots
            .iter_mut()
            .find(|pcb| pcb.pid == pid)
            .ok_or(ProcessError::NotFound)
    }

    /// Reset a live slot to UNUSED so `allocate` can hand it out again
    pub fn release(&mut self, pid: Pid) -> Result<(), ProcessError> {
        self.find_mut(pid)?.clear();
        Ok(())
    }

    /// Every slot in slot order, empty ones included
    pub fn iter(&self) -> impl Iterator<Item = &ProcessControlBlock> {
        self.slots.iter()
    }

    /// Live records in slot order
    pub fn live(&self) -> impl Iterator<Item = &ProcessControlBlock> {
        self.slots.iter().filter(|pcb| pcb.is_live())
    }

    pub fn live_mut(&mut self) -> impl Iterator<Item = &mut ProcessControlBlock> {
        self.slots.iter_mut().filter(|pcb| pcb.is_live())
    }

    pub fn len(&self) -> usize {
        self.live().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|pcb| pcb.state != ProcessState::Unused)
    }

    /// The pid the next allocation will receive
    pub fn next_pid(&self) -> Pid {
        self.next_pid
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new(NPROC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_hands_out_increasing_pids() {
        let mut table = ProcessTable::new(3);
        let a = table.allocate().unwrap().pid;
        let b = table.allocate().unwrap().pid;
        assert_eq!((a, b), (1, 2));
        assert_eq!(table.find(b).unwrap().state, ProcessState::Embryo);
        assert!(table.find(a).unwrap().context.is_some());
    }

    #[test]
    fn allocate_fails_when_full() {
        let mut table = ProcessTable::new(2);
        table.allocate().unwrap();
        table.allocate().unwrap();
        assert!(table.is_full());
        assert_eq!(table.allocate().err(), Some(ProcessError::Full));
        assert_eq!(table.next_pid(), 3);
    }

    #[test]
    fn released_slot_is_reused_with_new_pid() {
        let mut table = ProcessTable::new(2);
        let a = table.allocate().unwrap().pid;
        table.allocate().unwrap();
        table.release(a).unwrap();

        let c = table.allocate().unwrap().pid;
        assert_eq!(c, 3);
        assert_eq!(table.iter().next().unwrap().pid, c);
        assert_eq!(table.find(a).err(), Some(ProcessError::NotFound));
    }

    #[test]
    fn pid_zero_is_never_found() {
        let table = ProcessTable::new(4);
        assert_eq!(table.find(0).err(), Some(ProcessError::NotFound));
        assert!(table.is_empty());
        assert_eq!(table.capacity(), 4);
    }

    #[test]
    fn exhausted_pid_space_fails_allocation() {
        let mut table = ProcessTable::new(4);
        table.next_pid = Pid::MAX - 1;
        assert_eq!(table.allocate().unwrap().pid, Pid::MAX - 1);
        assert_eq!(table.allocate().err(), Some(ProcessError::Full));
        assert_eq!(table.next_pid(), Pid::MAX);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn zero_capacity_table_is_always_full() {
        let mut table = ProcessTable::new(0);
        assert_eq!(table.allocate().err(), Some(ProcessError::Full));
    }
}
