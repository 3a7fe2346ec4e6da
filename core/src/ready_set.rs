//! The three ready-queue disciplines, behind one trait so the scheduler
//! loop (`scheduler.rs`) is written once and is generic over policy.

use std::collections::{BinaryHeap, VecDeque};

use crate::job_state::JobStateRecord;

/// Jobs eligible to run, ordered per policy. The scheduler only ever
/// inserts, pops, and peeks the head — it never iterates the rest.
pub trait ReadySet: Send {
    fn insert(&mut self, job: JobStateRecord);
    fn pop_head(&mut self) -> Option<JobStateRecord>;
    fn peek_head(&self) -> Option<&JobStateRecord>;
    fn is_empty(&self) -> bool;
    fn len(&self) -> usize;

    /// Ticks to grant a job on dispatch, per §4.5's per-policy slice rule.
    fn granted_slice(&self, job: &JobStateRecord) -> u64;

    /// Whether a running job can be preempted by a newly-ready contender
    /// (true only for SRTN).
    fn is_preemptive(&self) -> bool {
        false
    }
}

/// A heap entry ordered only by `(key, tie)`, smallest first. The payload
/// rides along but never participates in comparison — two jobs with equal
/// keys are arbitrarily ordered relative to each other by `BinaryHeap`,
/// which is fine since the key alone is what the policies specify.
struct Entry {
    key: i64,
    tie: u64,
    job: JobStateRecord,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        (self.key, self.tie) == (other.key, other.tie)
    }
}
impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let natural = (self.key, self.tie).cmp(&(other.key, other.tie));
        // `BinaryHeap` is a max-heap; flipping the comparison here makes
        // the smallest (key, tie) pair the one `pop()` returns.
        natural.reverse()
    }
}

/// HPF: ordered by `(priority ASC, arrival_tick ASC)`, non-preemptive.
pub struct HpfReadySet {
    heap: BinaryHeap<Entry>,
}

impl HpfReadySet {
    pub fn new() -> Self {
        Self { heap: BinaryHeap::new() }
    }
}

impl Default for HpfReadySet {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadySet for HpfReadySet {
    fn insert(&mut self, job: JobStateRecord) {
        let key = job.descriptor.priority as i64;
        let tie = job.descriptor.arrival_tick;
        self.heap.push(Entry { key, tie, job });
    }

    fn pop_head(&mut self) -> Option<JobStateRecord> {
        self.heap.pop().map(|e| e.job)
    }

    fn peek_head(&self) -> Option<&JobStateRecord> {
        self.heap.peek().map(|e| &e.job)
    }

    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn granted_slice(&self, job: &JobStateRecord) -> u64 {
        job.remaining_ticks
    }
}

/// SRTN: ordered by `(remaining_ticks ASC, arrival_tick ASC)`. Preemption
/// itself is the scheduler's job (§4.5 step 3); this container only
/// orders the queue.
pub struct SrtnReadySet {
    heap: BinaryHeap<Entry>,
}

impl SrtnReadySet {
    pub fn new() -> Self {
        Self { heap: BinaryHeap::new() }
    }
}

impl Default for SrtnReadySet {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadySet for SrtnReadySet {
    fn insert(&mut self, job: JobStateRecord) {
        let key = job.remaining_ticks as i64;
        let tie = job.descriptor.arrival_tick;
        self.heap.push(Entry { key, tie, job });
    }

    fn pop_head(&mut self) -> Option<JobStateRecord> {
        self.heap.pop().map(|e| e.job)
    }

    fn peek_head(&self) -> Option<&JobStateRecord> {
        self.heap.peek().map(|e| &e.job)
    }

    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn granted_slice(&self, job: &JobStateRecord) -> u64 {
        job.remaining_ticks
    }

    fn is_preemptive(&self) -> bool {
        true
    }
}

/// RR: strict FIFO of admission/re-admission order, fixed quantum.
pub struct RrReadySet {
    queue: VecDeque<JobStateRecord>,
    quantum: u64,
}

impl RrReadySet {
    pub fn new(quantum: u64) -> Self {
        Self { queue: VecDeque::new(), quantum }
    }
}

impl ReadySet for RrReadySet {
    fn insert(&mut self, job: JobStateRecord) {
        self.queue.push_back(job);
    }

    fn pop_head(&mut self) -> Option<JobStateRecord> {
        self.queue.pop_front()
    }

    fn peek_head(&self) -> Option<&JobStateRecord> {
        self.queue.front()
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn granted_slice(&self, job: &JobStateRecord) -> u64 {
        self.quantum.min(job.remaining_ticks)
    }
}
