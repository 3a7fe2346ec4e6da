//! The Scheduler Core's view of the three report files: it only knows
//! about these events and the [`ReportSink`] trait, never file paths or
//! formatting. The CLI front-end supplies the real writers; tests
//! substitute an in-memory one.

use vosim_abi::{JobId, Tick};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Started,
    Resumed,
    Stopped,
    Finished,
}

/// One `scheduler.log` line's worth of data.
#[derive(Clone, Copy, Debug)]
pub struct SchedulerEvent {
    pub time: Tick,
    pub process: JobId,
    pub transition: Transition,
    pub arrival: Tick,
    pub total: u64,
    pub remaining: u64,
    pub waiting: u64,
    /// `Some` only on `Finished` events.
    pub turnaround_and_wta: Option<(u64, f64)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryTransition {
    Allocated,
    Freed,
}

/// One `memory.log` line's worth of data.
#[derive(Clone, Copy, Debug)]
pub struct MemoryEvent {
    pub time: Tick,
    pub transition: MemoryTransition,
    pub bytes: u64,
    pub process: JobId,
    pub lo: u64,
    pub hi: u64,
}

/// The `scheduler.perf` summary, computed once at termination.
#[derive(Clone, Copy, Debug)]
pub struct RunSummary {
    pub cpu_utilization_pct: f64,
    pub avg_wta: f64,
    pub avg_waiting: f64,
    pub std_wta: f64,
}

/// Where the Scheduler Core sends report data. Pure formatting/IO lives on
/// the other side of this trait so the scheduling loop can be unit tested
/// against an in-memory sink.
pub trait ReportSink {
    fn scheduler_event(&mut self, event: SchedulerEvent);
    fn memory_event(&mut self, event: MemoryEvent);
    fn run_summary(&mut self, summary: RunSummary);
}

/// A sink that only records events, for scheduler-loop unit tests.
#[derive(Default)]
pub struct RecordingSink {
    pub scheduler_events: Vec<SchedulerEvent>,
    pub memory_events: Vec<MemoryEvent>,
    pub summary: Option<RunSummary>,
}

impl ReportSink for RecordingSink {
    fn scheduler_event(&mut self, event: SchedulerEvent) {
        self.scheduler_events.push(event);
    }

    fn memory_event(&mut self, event: MemoryEvent) {
        self.memory_events.push(event);
    }

    fn run_summary(&mut self, summary: RunSummary) {
        self.summary = Some(summary);
    }
}
