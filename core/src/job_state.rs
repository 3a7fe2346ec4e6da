//! The mutable record the scheduler keeps per admitted job, and the
//! transitions it can publish about itself.

use vosim_abi::{JobDescriptor, JobId, JobStatus, Tick};

/// Everything the scheduler tracks for one admitted job, from admission to
/// retirement. Immutable fields live in the [`JobDescriptor`]; this is the
/// part that changes tick to tick.
#[derive(Clone, Debug)]
pub struct JobStateRecord {
    pub descriptor: JobDescriptor,
    pub remaining_ticks: u64,
    pub waiting_ticks: u64,
    pub start_tick: Option<Tick>,
    pub last_stop_tick: Option<Tick>,
    pub status: JobStatus,
    pub mem_base: u64,
}

impl JobStateRecord {
    pub fn new(descriptor: JobDescriptor, mem_base: u64) -> Self {
        Self {
            remaining_ticks: descriptor.service_ticks,
            waiting_ticks: 0,
            start_tick: None,
            last_stop_tick: None,
            status: JobStatus::Idle,
            mem_base,
            descriptor,
        }
    }

    pub fn id(&self) -> JobId {
        self.descriptor.id
    }

    /// `remaining_ticks` as of `now`, given the job was dispatched at
    /// `dispatch_tick` and has been running ever since. Used by SRTN to
    /// compare a live running job against a newly admitted contender
    /// without needing the running job to publish intermediate state.
    pub fn actual_remaining(&self, dispatch_tick: Tick, now: Tick) -> u64 {
        self.remaining_ticks.saturating_sub(now.saturating_sub(dispatch_tick))
    }

    /// Turnaround time, valid once the job has finished.
    pub fn turnaround(&self, finish_tick: Tick) -> u64 {
        finish_tick - self.descriptor.arrival_tick
    }

    /// Weighted turnaround, valid once the job has finished.
    pub fn weighted_turnaround(&self, finish_tick: Tick) -> f64 {
        self.turnaround(finish_tick) as f64 / self.descriptor.service_ticks as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: JobId, arrival: Tick, service: u64) -> JobDescriptor {
        JobDescriptor {
            id,
            arrival_tick: arrival,
            service_ticks: service,
            priority: 1,
            mem_bytes: 64,
        }
    }

    #[test]
    fn actual_remaining_accounts_for_elapsed_run_time() {
        let record = JobStateRecord::new(descriptor(1, 0, 5), 0);
        assert_eq!(record.actual_remaining(2, 4), 3);
    }

    #[test]
    fn turnaround_and_wta_match_scenario_s1() {
        let record = JobStateRecord::new(descriptor(1, 0, 5), 0);
        assert_eq!(record.turnaround(5), 5);
        assert!((record.weighted_turnaround(5) - 1.0).abs() < f64::EPSILON);
    }
}
