//! Input Loader (§4.7): reads the tab-separated process file into an
//! ordered stream of [`JobDescriptor`]s and feeds the scheduler's arrival
//! channel as the clock reaches each one's arrival tick.

use std::path::Path;
use std::sync::Arc;

use crossbeam_channel::Sender;
use vosim_abi::JobDescriptor;
use vosim_lib::{InputError, VirtualClock};

/// Parses the process file, dropping comment/blank/short lines silently
/// (counted and logged at `debug`, matching the original's behavior), and
/// returns descriptors sorted by arrival tick with file order preserved
/// among ties.
pub fn load_jobs(path: &Path) -> Result<Vec<JobDescriptor>, InputError> {
    let text = std::fs::read_to_string(path).map_err(|source| InputError::UnreadableFile {
        path: path.to_path_buf(),
        source,
    })?;

    let mut jobs = Vec::new();
    let mut skipped = 0usize;
    for (line_no, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match JobDescriptor::parse_line(line) {
            Some(job) => jobs.push(job),
            None => {
                skipped += 1;
                tracing::debug!(line = line_no + 1, "skipping malformed process line");
            }
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "process file lines skipped");
    }

    jobs.sort_by_key(|job| job.arrival_tick);
    Ok(jobs)
}

/// Spawns the thread that paces delivery of `jobs` onto `tx` as the clock
/// reaches each descriptor's `arrival_tick`, then closes the channel.
/// Descriptors sharing an arrival tick are sent in the order `jobs` is
/// already in (file order, after the stable sort in [`load_jobs`]).
pub fn spawn_feeder(
    jobs: Vec<JobDescriptor>,
    clock: Arc<VirtualClock>,
    tx: Sender<JobDescriptor>,
) -> std::thread::JoinHandle<()> {
    std::thread::Builder::new()
        .name("input-loader".to_string())
        .spawn(move || {
            for job in jobs {
                clock.wait_for_tick(job.arrival_tick);
                if tx.send(job).is_err() {
                    return;
                }
            }
        })
        .expect("failed to spawn input loader thread")
}
