//! LCFS: a single-CPU process table with a weighted-fair scheduler.
//!
//! Every process carries a virtual runtime that grows inversely to its
//! nice-derived weight; the scheduler always dispatches the runnable
//! process with the least of it. The crate is `no_std` + `alloc` so the
//! table can live inside a kernel; all state sits in one
//! [`ProcessService`] value, shareable through [`SharedProcessService`].
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod process;
pub mod services;
pub mod syscalls;

pub use config::SchedConfig;
pub use process::{Channel, Pid, ProcessError, ProcessState};
pub use services::{ProcessService, SharedProcessService};
