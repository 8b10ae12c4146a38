// Process management for LCFS
pub mod context;
pub mod nice;
pub mod pcb;
pub mod scheduler;
pub mod table;

pub use context::ResumeContext;
pub use nice::{weight, MAX_NICE, MIN_NICE, NICE_0_WEIGHT};
pub use pcb::{
    Channel, Pid, ProcessControlBlock, ProcessError, ProcessState, VRuntime, PGSIZE,
    VRUNTIME_SCALE,
};
pub use scheduler::{ProcessScheduler, SchedulerStats};
pub use table::{ProcessTable, NPROC};
