// System call surface for LCFS
//
// Each call returns the sentinel codes the dispatch layer expects:
// non-negative on success, a small negative number per failure kind.
use core::fmt;
use log::debug;

use crate::process::pcb::{Channel, Pid, ProcessError};
use crate::services::process_service::ProcessService;

/// System call numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum SyscallNumber {
    Init = 0,
    Fork = 1,
    Exit = 2,
    Wait = 3,
    Sleep = 4,
    Wakeup = 5,
    Kill = 6,
    SetNice = 7,
    Schedule = 8,
    Dump = 9,
}

impl TryFrom<u64> for SyscallNumber {
    type Error = SyscallError;

    fn try_from(num: u64) -> Result<Self, Self::Error> {
        Ok(match num {
            0 => SyscallNumber::Init,
            1 => SyscallNumber::Fork,
            2 => SyscallNumber::Exit,
            3 => SyscallNumber::Wait,
            4 => SyscallNumber::Sleep,
            5 => SyscallNumber::Wakeup,
            6 => SyscallNumber::Kill,
            7 => SyscallNumber::SetNice,
            8 => SyscallNumber::Schedule,
            9 => SyscallNumber::Dump,
            _ => return Err(SyscallError::InvalidSyscall),
        })
    }
}

/// System call arguments
#[derive(Debug, Clone, Copy, Default)]
pub struct SyscallArgs {
    pub arg0: u64,
    pub arg1: u64,
}

impl SyscallArgs {
    pub fn new(arg0: u64, arg1: u64) -> Self {
        Self { arg0, arg1 }
    }
}

/// Dispatch-level errors, raised before any process operation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallError {
    InvalidSyscall,
    InvalidArgument,
}

impl fmt::Display for SyscallError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SyscallError::InvalidSyscall => write!(f, "Invalid syscall number"),
            SyscallError::InvalidArgument => write!(f, "Invalid argument"),
        }
    }
}

/// Decode `syscall_num` and run it against `svc`
pub fn handle_syscall(
    svc: &mut ProcessService,
    syscall_num: u64,
    args: SyscallArgs,
) -> Result<i64, SyscallError> {
    let call = SyscallNumber::try_from(syscall_num)?;
    debug!("[SYSCALL] {:?} called with args: {:?}", call, args);

    let code = match call {
        SyscallNumber::Init => sys_init(svc),
        SyscallNumber::Fork => sys_fork(svc, pid_arg(args.arg0)?),
        SyscallNumber::Exit => sys_exit(svc, pid_arg(args.arg0)?),
        SyscallNumber::Wait => sys_wait(svc, pid_arg(args.arg0)?),
        SyscallNumber::Sleep => sys_sleep(svc, pid_arg(args.arg0)?, channel_arg(args.arg1)?),
        SyscallNumber::Wakeup => sys_wakeup(svc, channel_arg(args.arg0)?),
        SyscallNumber::Kill => sys_kill(svc, pid_arg(args.arg0)?),
        SyscallNumber::SetNice => sys_setnice(svc, pid_arg(args.arg0)?, nice_arg(args.arg1)?),
        SyscallNumber::Schedule => sys_schedule(svc),
        SyscallNumber::Dump => sys_dump(svc),
    };
    Ok(code)
}

fn pid_arg(raw: u64) -> Result<Pid, SyscallError> {
    Pid::try_from(raw).map_err(|_| SyscallError::InvalidArgument)
}

fn channel_arg(raw: u64) -> Result<Channel, SyscallError> {
    Channel::try_from(raw).map_err(|_| SyscallError::InvalidArgument)
}

/// Nice travels as the two's-complement bits of an i64
fn nice_arg(raw: u64) -> Result<i32, SyscallError> {
    i32::try_from(raw as i64).map_err(|_| SyscallError::InvalidArgument)
}

/// pid of the new init process, -1 if one already exists
pub fn sys_init(svc: &mut ProcessService) -> i64 {
    match svc.init() {
        Ok(pid) => i64::from(pid),
        Err(_) => -1,
    }
}

/// Child pid, -1 if the parent is missing or the table is full
pub fn sys_fork(svc: &mut ProcessService, parent_pid: Pid) -> i64 {
    match svc.fork(parent_pid) {
        Ok(pid) => i64::from(pid),
        Err(_) => -1,
    }
}

/// 0, -1 if `pid` is init, -2 if not found
pub fn sys_exit(svc: &mut ProcessService, pid: Pid) -> i64 {
    match svc.exit(pid) {
        Ok(()) => 0,
        Err(ProcessError::Refused) => -1,
        Err(_) => -2,
    }
}

/// Reaped pid, -1 no children, -2 retry later, -3 not found
pub fn sys_wait(svc: &mut ProcessService, pid: Pid) -> i64 {
    match svc.wait(pid) {
        Ok(child) => i64::from(child),
        Err(ProcessError::NoChildren) => -1,
        Err(ProcessError::WouldBlock) => -2,
        Err(_) => -3,
    }
}

/// `pid`, -3 if not found
pub fn sys_sleep(svc: &mut ProcessService, pid: Pid, channel: Channel) -> i64 {
    match svc.sleep(pid, channel) {
        Ok(pid) => i64::from(pid),
        Err(_) => -3,
    }
}

pub fn sys_wakeup(svc: &mut ProcessService, channel: Channel) -> i64 {
    svc.wakeup(channel);
    0
}

/// 0, -1 if not found
pub fn sys_kill(svc: &mut ProcessService, pid: Pid) -> i64 {
    match svc.kill(pid) {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

/// 0, -1 if not found, -2 if `nice` is outside [-20, 19]
pub fn sys_setnice(svc: &mut ProcessService, pid: Pid, nice: i32) -> i64 {
    match svc.set_nice(pid, nice) {
        Ok(()) => 0,
        Err(ProcessError::OutOfRange) => -2,
        Err(_) => -1,
    }
}

/// Dispatched pid, 0 if nothing could run
pub fn sys_schedule(svc: &mut ProcessService) -> i64 {
    svc.schedule().map_or(0, i64::from)
}

pub fn sys_dump(svc: &mut ProcessService) -> i64 {
    svc.procdump();
    0
}
