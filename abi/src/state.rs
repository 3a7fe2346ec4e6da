/// Status of an admitted job's state record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JobStatus {
    /// Ready but not currently on the CPU.
    #[default]
    Idle,
    /// Currently holding the CPU.
    Running,
    /// Runtime exhausted; awaiting reclamation.
    Finished,
}

impl JobStatus {
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished)
    }
}
