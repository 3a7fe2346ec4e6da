//! CLI Front-End (§4.6): argument parsing and the usage-level validation
//! that must happen before any report file is created or truncated.

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use vosim_abi::{Policy, PolicyKind};
use vosim_lib::InputError;

const DEFAULT_TOTAL_MEMORY: u64 = 1024;
const DEFAULT_MIN_BLOCK: u64 = 32;

#[derive(Parser, Debug)]
#[command(name = "vosim", about = "Virtual-clock process scheduler simulator")]
pub struct Args {
    /// Scheduling policy: rr, hpf, or srtn.
    #[arg(short = 's', long = "policy")]
    pub policy: String,

    /// Path to the tab-separated process file.
    #[arg(short = 'f', long = "file")]
    pub file: PathBuf,

    /// Quantum, in ticks. Required for `rr`, rejected otherwise.
    #[arg(short = 'q', long = "quantum")]
    pub quantum: Option<u64>,

    /// Arena size in bytes for the buddy allocator.
    #[arg(short = 'm', long = "total-memory", default_value_t = DEFAULT_TOTAL_MEMORY)]
    pub total_memory: u64,

    /// Minimum allocation grain in bytes.
    #[arg(short = 'b', long = "min-block", default_value_t = DEFAULT_MIN_BLOCK)]
    pub min_block: u64,

    /// Increase console verbosity; repeatable.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// A fully validated invocation, ready to drive a run.
pub struct Config {
    pub policy: Policy,
    pub file: PathBuf,
    pub total_memory: u64,
    pub min_block: u64,
    pub verbose: u8,
}

impl Args {
    pub fn into_config(self) -> Result<Config, InputError> {
        let kind = PolicyKind::from_str(&self.policy).map_err(InputError::InvalidPolicy)?;

        let policy = match kind {
            PolicyKind::Hpf => {
                if self.quantum.is_some() {
                    return Err(InputError::UnexpectedQuantum);
                }
                Policy::Hpf
            }
            PolicyKind::Srtn => {
                if self.quantum.is_some() {
                    return Err(InputError::UnexpectedQuantum);
                }
                Policy::Srtn
            }
            PolicyKind::Rr => {
                let quantum = self.quantum.ok_or(InputError::MissingQuantum)?;
                Policy::Rr { quantum }
            }
        };

        if !self.total_memory.is_power_of_two() {
            return Err(InputError::InvalidPolicy(format!(
                "-m/--total-memory must be a power of two, got {}",
                self.total_memory
            )));
        }
        if !self.min_block.is_power_of_two() || self.min_block > self.total_memory {
            return Err(InputError::InvalidPolicy(format!(
                "-b/--min-block must be a power of two no greater than total memory, got {}",
                self.min_block
            )));
        }

        Ok(Config {
            policy,
            file: self.file,
            total_memory: self.total_memory,
            min_block: self.min_block,
            verbose: self.verbose,
        })
    }
}
