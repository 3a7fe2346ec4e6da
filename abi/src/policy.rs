use std::fmt;
use std::str::FromStr;

/// The scheduling discipline selected for a run, chosen once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Policy {
    /// Highest-Priority First, non-preemptive.
    Hpf,
    /// Shortest Remaining Time Next, preemptive on admission and tick boundary.
    Srtn,
    /// Round Robin with a fixed quantum.
    Rr { quantum: u64 },
}

impl Policy {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hpf => "hpf",
            Self::Srtn => "srtn",
            Self::Rr { .. } => "rr",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parses the bare policy token (`rr`, `hpf`, `srtn`) without a quantum.
/// The CLI front-end is responsible for combining this with `-q` for `rr`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyKind {
    Hpf,
    Srtn,
    Rr,
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hpf" => Ok(Self::Hpf),
            "srtn" => Ok(Self::Srtn),
            "rr" => Ok(Self::Rr),
            other => Err(format!("unknown scheduling policy `{other}` (expected rr, hpf, or srtn)")),
        }
    }
}
