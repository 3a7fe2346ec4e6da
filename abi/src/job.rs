use crate::Tick;

/// Unique identifier for a job within a single run.
pub type JobId = u32;

/// A job as it appears in the input file, immutable once admitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobDescriptor {
    pub id: JobId,
    pub arrival_tick: Tick,
    pub service_ticks: u64,
    pub priority: i32,
    pub mem_bytes: u64,
}

impl JobDescriptor {
    /// Parses a single tab-separated data line: `id arrival runtime priority memsize`.
    ///
    /// Returns `None` if the line has fewer than five fields or any field
    /// fails to parse; callers treat that as "skip silently" per the input
    /// format contract, not as an error.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.split('\t');
        let id = fields.next()?.trim().parse().ok()?;
        let arrival_tick = fields.next()?.trim().parse().ok()?;
        let service_ticks = fields.next()?.trim().parse().ok()?;
        let priority = fields.next()?.trim().parse().ok()?;
        let mem_bytes = fields.next()?.trim().parse().ok()?;

        if service_ticks == 0 || mem_bytes == 0 {
            return None;
        }

        Some(Self {
            id,
            arrival_tick,
            service_ticks,
            priority,
            mem_bytes,
        })
    }
}
