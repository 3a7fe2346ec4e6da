//! Console diagnostics subsystem.
//!
//! All operational diagnostics (admission decisions, policy selection,
//! warnings, fatal conditions) funnel through `tracing`. This is distinct
//! from the `scheduler.log`/`memory.log`/`scheduler.perf` report files,
//! which are exact-format data products written by `vosim-cli`'s report
//! writers, not log lines.
//!
//! Verbosity defaults to `info` and is controlled by `RUST_LOG`, or raised
//! by repeating the CLI's `-v` flag.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// `extra_verbosity` is the number of `-v` flags passed on the command
/// line; each one lowers the default filter by one level. `RUST_LOG`, if
/// set, takes precedence over both.
pub fn init(extra_verbosity: u8) {
    let default_level = match extra_verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}
