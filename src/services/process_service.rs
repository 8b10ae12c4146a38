// Process Management Service for LCFS
use alloc::sync::Arc;
use core::fmt;
use log::{debug, info, warn};
use spin::Mutex;

use crate::config::SchedConfig;
use crate::process::pcb::{
    Channel, Pid, ProcessControlBlock, ProcessError, ProcessState, PGSIZE,
};
use crate::process::scheduler::{ProcessScheduler, SchedulerStats};
use crate::process::table::ProcessTable;

/// Name and working directory of the bootstrap process
const INIT_NAME: &str = "userinit";
const INIT_CWD: &str = "/";

/// Process Management Service - owns the table and coordinates the
/// lifecycle operations with the scheduler.
///
/// Every method runs to completion over the whole table; share it between
/// threads through [`SharedProcessService`].
#[derive(Debug)]
pub struct ProcessService {
    table: ProcessTable,
    scheduler: ProcessScheduler,
    init_process: Option<Pid>,
}

impl ProcessService {
    pub fn new(config: SchedConfig) -> Self {
        Self {
            table: ProcessTable::new(config.capacity),
            scheduler: ProcessScheduler::new(config),
            init_process: None,
        }
    }

    /// Create the init process, the ancestor of every other process.
    /// It starts RUNNING and is the current process.
    pub fn init(&mut self) -> Result<Pid, ProcessError> {
        if self.init_process.is_some() {
            warn!("Init process already exists");
            return Err(ProcessError::Refused);
        }

        let pcb = self.table.allocate()?;
        pcb.size = PGSIZE;
        pcb.set_working_directory(INIT_CWD);
        pcb.set_name(INIT_NAME);
        pcb.state = ProcessState::Running;
        let pid = pcb.pid;

        self.init_process = Some(pid);
        self.scheduler.set_current_process(Some(pid));
        info!("Process service initialized with init process (PID {})", pid);
        Ok(pid)
    }

    /// Create a RUNNABLE child of `parent_pid`
    pub fn fork(&mut self, parent_pid: Pid) -> Result<Pid, ProcessError> {
        let (size, cwd, name) = {
            let parent = self.table.find(parent_pid)?;
            (parent.size, parent.working_directory.clone(), parent.name.clone())
        };

        let child = self.table.allocate()?;
        child.size = size;
        child.parent_pid = Some(parent_pid);
        child.set_working_directory(&cwd);
        child.set_name(&name);
        child.state = ProcessState::Runnable;

        info!("Forked process '{}' with PID {} from PID {}", name, child.pid, parent_pid);
        Ok(child.pid)
    }

    /// Terminate a process. It stays ZOMBIE until its parent reaps it.
    ///
    /// Children are handed to init and are marked ZOMBIE whatever state
    /// they were in.
    pub fn exit(&mut self, pid: Pid) -> Result<(), ProcessError> {
        let parent = self.table.find(pid)?.parent_pid;

        if self.init_process == Some(pid) {
            warn!("Init process (PID {}) may not exit", pid);
            return Err(ProcessError::Refused);
        }

        if let Some(ppid) = parent {
            self.wakeup(ppid as Channel);
        }

        let init = self.init_process;
        for pcb in self.table.live_mut() {
            if pcb.parent_pid == Some(pid) {
                pcb.parent_pid = init;
                pcb.state = ProcessState::Zombie;
                debug!("Reparented PID {} to init", pcb.pid);
            }
        }

        self.table.find_mut(pid)?.state = ProcessState::Zombie;
        info!("Process PID {} exited", pid);
        Ok(())
    }

    /// Reap one ZOMBIE child of `pid` and return its pid.
    ///
    /// With children but no zombie among them, `pid` is put to sleep on its
    /// own pid and `WouldBlock` tells the caller to retry.
    pub fn wait(&mut self, pid: Pid) -> Result<Pid, ProcessError> {
        let killed = self.table.find(pid)?.killed;

        let mut have_kids = false;
        let mut zombie = None;
        for pcb in self.table.live() {
            if pcb.parent_pid != Some(pid) {
                continue;
            }
            have_kids = true;
            if pcb.state == ProcessState::Zombie {
                zombie = Some(pcb.pid);
                break;
            }
        }

        if let Some(child) = zombie {
            self.table.release(child)?;
            info!("PID {} reaped child PID {}", pid, child);
            return Ok(child);
        }

        if !have_kids || killed {
            return Err(ProcessError::NoChildren);
        }

        self.sleep(pid, pid as Channel)?;
        Err(ProcessError::WouldBlock)
    }

    /// Block `pid` on `channel`
    pub fn sleep(&mut self, pid: Pid, channel: Channel) -> Result<Pid, ProcessError> {
        let pcb = self.table.find_mut(pid)?;
        pcb.channel = channel;
        pcb.state = ProcessState::Sleeping;
        debug!("PID {} sleeping on channel {}", pid, channel);
        Ok(pid)
    }

    /// Make every process sleeping on `channel` RUNNABLE. Returns how many
    /// were woken.
    pub fn wakeup(&mut self, channel: Channel) -> usize {
        let mut woken = 0;
        for pcb in self.table.live_mut() {
            if pcb.state == ProcessState::Sleeping && pcb.channel == channel {
                pcb.state = ProcessState::Runnable;
                woken += 1;
            }
        }
        if woken > 0 {
            debug!("Woke {} process(es) on channel {}", woken, channel);
        }
        woken
    }

    /// Flag `pid` for termination. A sleeping process is made RUNNABLE so
    /// it can notice the flag.
    pub fn kill(&mut self, pid: Pid) -> Result<(), ProcessError> {
        let pcb = self.table.find_mut(pid)?;
        pcb.killed = true;
        if pcb.state == ProcessState::Sleeping {
            pcb.state = ProcessState::Runnable;
        }
        info!("Killed process PID {}", pid);
        Ok(())
    }

    pub fn total_weight(&self) -> u64 {
        self.scheduler.total_weight(&self.table)
    }

    pub fn assign_timeslice(&mut self) {
        self.scheduler.assign_timeslice(&mut self.table);
    }

    pub fn pick(&mut self) -> Option<Pid> {
        self.scheduler.pick(&mut self.table)
    }

    /// Assign timeslices, then pick
    pub fn schedule(&mut self) -> Option<Pid> {
        self.scheduler.schedule(&mut self.table)
    }

    pub fn set_nice(&mut self, pid: Pid, nice: i32) -> Result<(), ProcessError> {
        self.scheduler.set_nice(&mut self.table, pid, nice)?;
        info!("Set nice for PID {} to {}", pid, nice);
        Ok(())
    }

    pub fn get_process(&self, pid: Pid) -> Option<&ProcessControlBlock> {
        self.table.find(pid).ok()
    }

    pub fn get_current_process(&self) -> Option<Pid> {
        self.scheduler.get_current_process()
    }

    pub fn init_pid(&self) -> Option<Pid> {
        self.init_process
    }

    pub fn table(&self) -> &ProcessTable {
        &self.table
    }

    pub fn config(&self) -> &SchedConfig {
        self.scheduler.config()
    }

    pub fn get_process_count(&self) -> usize {
        self.table.len()
    }

    pub fn get_scheduler_stats(&self) -> SchedulerStats {
        self.scheduler.get_stats()
    }

    pub fn get_system_stats(&self) -> SystemStats {
        let mut stats = SystemStats {
            current_process: self.get_current_process(),
            ..SystemStats::default()
        };
        for pcb in self.table.live() {
            stats.total_processes += 1;
            match pcb.state {
                ProcessState::Embryo => stats.embryo_processes += 1,
                ProcessState::Sleeping => stats.sleeping_processes += 1,
                ProcessState::Runnable => stats.runnable_processes += 1,
                ProcessState::Running => stats.running_processes += 1,
                ProcessState::Zombie => stats.zombie_processes += 1,
                ProcessState::Unused => {}
            }
        }
        stats
    }

    /// Process listing, one line per live record
    pub fn dump(&self) -> ProcDump<'_> {
        ProcDump { table: &self.table }
    }

    /// Emit the process listing through the log
    pub fn procdump(&self) {
        for pcb in self.table.live() {
            info!("{}", DumpLine(pcb));
        }
    }
}

impl Default for ProcessService {
    fn default() -> Self {
        Self::new(SchedConfig::default())
    }
}

/// System statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemStats {
    pub total_processes: usize,
    pub embryo_processes: usize,
    pub sleeping_processes: usize,
    pub runnable_processes: usize,
    pub running_processes: usize,
    pub zombie_processes: usize,
    pub current_process: Option<Pid>,
}

/// Printable process listing. Inspection only, the format may change.
pub struct ProcDump<'a> {
    table: &'a ProcessTable,
}

struct DumpLine<'a>(&'a ProcessControlBlock);

impl fmt::Display for DumpLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let pcb = self.0;
        write!(
            f,
            "pid: {}, parent: {}, state: {}, nice: {}, weight: {}, timeslice: {}, vruntime: {}",
            pcb.pid,
            pcb.parent_pid.unwrap_or(0),
            pcb.state,
            pcb.nice,
            pcb.weight,
            pcb.timeslice,
            pcb.vruntime
        )
    }
}

impl fmt::Display for ProcDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for pcb in self.table.live() {
            writeln!(f, "{}", DumpLine(pcb))?;
        }
        Ok(())
    }
}

/// Clonable handle that serializes every operation behind one lock
#[derive(Debug, Clone)]
pub struct SharedProcessService {
    inner: Arc<Mutex<ProcessService>>,
}

impl SharedProcessService {
    pub fn new(config: SchedConfig) -> Self {
        Self::from_service(ProcessService::new(config))
    }

    pub fn from_service(service: ProcessService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    /// Run `f` with exclusive access to the whole service.
    ///
    /// The lock is not re-entrant: calling any method of this handle from
    /// inside `f` spins forever. Use the `&mut ProcessService` instead.
    pub fn with<R>(&self, f: impl FnOnce(&mut ProcessService) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn init(&self) -> Result<Pid, ProcessError> {
        self.inner.lock().init()
    }

    pub fn fork(&self, parent_pid: Pid) -> Result<Pid, ProcessError> {
        self.inner.lock().fork(parent_pid)
    }

    pub fn exit(&self, pid: Pid) -> Result<(), ProcessError> {
        self.inner.lock().exit(pid)
    }

    pub fn wait(&self, pid: Pid) -> Result<Pid, ProcessError> {
        self.inner.lock().wait(pid)
    }

    pub fn sleep(&self, pid: Pid, channel: Channel) -> Result<Pid, ProcessError> {
        self.inner.lock().sleep(pid, channel)
    }

    pub fn wakeup(&self, channel: Channel) -> usize {
        self.inner.lock().wakeup(channel)
    }

    pub fn kill(&self, pid: Pid) -> Result<(), ProcessError> {
        self.inner.lock().kill(pid)
    }

    pub fn assign_timeslice(&self) {
        self.inner.lock().assign_timeslice()
    }

    pub fn pick(&self) -> Option<Pid> {
        self.inner.lock().pick()
    }

    pub fn schedule(&self) -> Option<Pid> {
        self.inner.lock().schedule()
    }

    pub fn set_nice(&self, pid: Pid, nice: i32) -> Result<(), ProcessError> {
        self.inner.lock().set_nice(pid, nice)
    }

    pub fn get_system_stats(&self) -> SystemStats {
        self.inner.lock().get_system_stats()
    }

    pub fn procdump(&self) {
        self.inner.lock().procdump()
    }
}
