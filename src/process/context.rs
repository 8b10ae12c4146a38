// Resume context for LCFS process slots
//
// The real register save/restore belongs to the dispatch layer. A record
// only carries the opaque handle it will be resumed through.

/// Entry tokens standing in for the `forkret`/`trapret` return addresses
pub const FORKRET: usize = 0x1;
pub const TRAPRET: usize = 0x2;

/// Opaque resume handle, created at allocation and dropped at reap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeContext {
    pub pc: usize, // Where the process resumes
    pub lr: usize, // Where it returns to afterwards
}

impl ResumeContext {
    /// A freshly allocated process resumes in `forkret` and returns
    /// through `trapret`.
    pub fn new() -> Self {
        Self {
            pc: FORKRET,
            lr: TRAPRET,
        }
    }
}

impl Default for ResumeContext {
    fn default() -> Self {
        Self::new()
    }
}
