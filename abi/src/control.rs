use crate::JobId;

/// What the scheduler is telling a job's runtime thread to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Command {
    /// Sit idle; no owner is dispatched.
    #[default]
    None,
    /// Run for `granted_slice` ticks (or until preempted).
    Run,
    /// Stop at the next tick boundary; the job's remaining work survives.
    Pause,
    /// Stop permanently, regardless of remaining work (cancellation).
    Finish,
}

/// The single shared slot through which the scheduler dispatches a job.
///
/// Single-writer (scheduler), single-reader (the owning job's thread) per
/// slot. Cloning snapshots the current command; there is no shared mutable
/// state beyond what the owning `Mutex`/`Condvar` pair in the runtime
/// serializes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlRecord {
    pub owner_id: JobId,
    pub granted_slice: u64,
    pub command: Command,
}

impl ControlRecord {
    pub const fn new() -> Self {
        Self {
            owner_id: 0,
            granted_slice: 0,
            command: Command::None,
        }
    }
}
