// Services for LCFS
pub mod process_service;

pub use process_service::{ProcDump, ProcessService, SharedProcessService, SystemStats};
