//! Error taxonomy for the simulator.
//!
//! Only [`SimError::Fatal`] and [`SimError::Signal`] are meant to reach
//! `main`; [`SimError::Input`] is raised and handled entirely within the
//! CLI front-end before the scheduler starts. `AdmissionDeferred` and
//! `TransientJobError` from the design taxonomy are not distinct error
//! types here: the former is simply the `None` case of `allocate`, and the
//! latter is folded into [`FatalReason::JobUnresponsive`] once its retry
//! budget is exhausted.

use std::path::PathBuf;

/// Top-level error returned by `main`. Each variant maps to a distinct
/// process exit code (see [`SimError::exit_code`]).
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("{0}")]
    Input(#[from] InputError),

    #[error("fatal invariant violation: {0}")]
    Fatal(#[from] FatalReason),

    #[error("interrupted by signal")]
    Signal,
}

impl SimError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Input(_) => 1,
            Self::Fatal(_) => 2,
            Self::Signal => 3,
        }
    }
}

/// Malformed CLI invocation or input file. Recovered by printing usage and
/// exiting non-zero; never leaves partial report files behind.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("missing required flag: {0}")]
    MissingFlag(&'static str),

    #[error("-q/--quantum is required when -s rr is selected")]
    MissingQuantum,

    #[error("-q/--quantum is only meaningful with -s rr")]
    UnexpectedQuantum,

    #[error("invalid scheduling policy: {0}")]
    InvalidPolicy(String),

    #[error("could not read process file {path}: {source}")]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A violation of a core invariant. Once raised, the scheduler stops
/// admitting new work, runs its cleanup path, and the process exits
/// non-zero.
#[derive(Debug, thiserror::Error)]
pub enum FatalReason {
    #[error("clock regression observed: read {observed} after {last_seen}")]
    ClockRegression { last_seen: u64, observed: u64 },

    #[error("buddy allocator corruption: owner {owner} freed a block of size {recorded} but held size {actual}")]
    BuddyCorruption {
        owner: u32,
        recorded: u64,
        actual: u64,
    },

    #[error("duplicate admission: job {0} is already admitted and pending")]
    DuplicateAdmission(u32),

    #[error("job {0} did not acknowledge its command within the retry budget")]
    JobUnresponsive(u32),
}
