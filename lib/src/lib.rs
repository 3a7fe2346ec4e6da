//! Ambient support shared across the simulator: the virtual clock, the
//! error taxonomy, and console diagnostics. Subsystem-specific logic
//! (the buddy allocator, the scheduler core) lives in its own crate.

pub mod clock;
pub mod error;
pub mod logging;

pub use clock::{Tick, VirtualClock};
pub use error::{FatalReason, InputError, SimError};
