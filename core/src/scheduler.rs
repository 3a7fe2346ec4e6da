//! Scheduler Core: the main loop, admission, dispatch, preemption and
//! termination, per §4.5. Owns the clock, the Ready-Set, the buddy
//! allocator and every live job thread; `Drop` performs the same
//! idempotent cleanup used by both normal termination and cancellation
//! (§5).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, TryRecvError};
use tracing::{debug, info, warn};

use vosim_abi::{JobDescriptor, JobId, JobStatus, Tick};
use vosim_lib::{FatalReason, SimError, VirtualClock};
use vosim_mm::BuddyAllocator;

use crate::job_state::JobStateRecord;
use crate::ready_set::ReadySet;
use crate::report::{MemoryEvent, MemoryTransition, ReportSink, SchedulerEvent, Transition};
use crate::runtime::{self, JobControl};
use crate::stats::{self, FinishedJob};

/// How long the scheduler waits for a job thread to acknowledge a command
/// before retrying, and then escalating to a fatal error. Generous enough
/// that normal OS scheduling jitter never trips it under test.
const ACK_TIMEOUT: Duration = Duration::from_secs(2);

struct LiveJob {
    control: Arc<JobControl>,
    handle: Option<JoinHandle<()>>,
}

struct Dispatched {
    record: JobStateRecord,
    dispatch_tick: Tick,
    granted_slice: u64,
}

/// Summary of a completed run, returned by [`Scheduler::run`].
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    pub final_tick: Tick,
    pub finished_count: usize,
}

pub struct Scheduler<RS: ReadySet> {
    ready_set: RS,
    allocator: BuddyAllocator,
    clock: Arc<VirtualClock>,
    live: HashMap<JobId, LiveJob>,
    running: Option<Dispatched>,
    finished: Vec<FinishedJob>,
}

impl<RS: ReadySet> Scheduler<RS> {
    pub fn new(ready_set: RS, allocator: BuddyAllocator, clock: Arc<VirtualClock>) -> Self {
        Self {
            ready_set,
            allocator,
            clock,
            live: HashMap::new(),
            running: None,
            finished: Vec::new(),
        }
    }

    /// Drives the main loop to termination, writing every transition into
    /// `sink`. `arrivals` is drained non-blockingly each tick; the loader
    /// on the other end closes it once every descriptor has been sent.
    /// `cancel` is polled once per tick; when set (by a signal handler),
    /// `run` returns `Err(SimError::Signal)` immediately, leaving every
    /// live job for `Drop` to tear down — the same cleanup path normal
    /// termination already leaves nothing for.
    pub fn run(
        &mut self,
        arrivals: Receiver<JobDescriptor>,
        sink: &mut dyn ReportSink,
        cancel: &AtomicBool,
    ) -> Result<RunReport, SimError> {
        let mut pending: Vec<JobDescriptor> = Vec::new();
        let mut admitted_ids: std::collections::HashSet<JobId> = std::collections::HashSet::new();
        let mut channel_open = true;

        loop {
            if cancel.load(AtomicOrdering::SeqCst) {
                return Err(SimError::Signal);
            }

            let now = self.clock.read();

            if channel_open {
                loop {
                    match arrivals.try_recv() {
                        Ok(descriptor) => {
                            if admitted_ids.contains(&descriptor.id) {
                                warn!(job = descriptor.id, "duplicate arrival id ignored");
                            } else if pending.iter().any(|d| d.id == descriptor.id) {
                                return Err(SimError::Fatal(FatalReason::DuplicateAdmission(descriptor.id)));
                            } else {
                                pending.push(descriptor);
                            }
                        }
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            channel_open = false;
                            break;
                        }
                    }
                }
            }

            self.admit_pending(&mut pending, &mut admitted_ids, now, sink)?;

            // Dispatch and (SRTN) preempt until stable for this tick.
            loop {
                if self.running.is_none() {
                    self.dispatch_head(now, sink);
                }
                if !self.maybe_preempt(now, sink)? {
                    break;
                }
            }

            self.reap_if_slice_elapsed(now, sink)?;

            let idle = pending.is_empty()
                && !channel_open
                && self.ready_set.is_empty()
                && self.running.is_none();
            if idle {
                let report = RunReport {
                    final_tick: now,
                    finished_count: self.finished.len(),
                };
                sink.run_summary(stats::summarize(&self.finished, now.max(1)));
                return Ok(report);
            }

            let last_observed = self.clock.read();
            if last_observed < now {
                return Err(SimError::Fatal(FatalReason::ClockRegression {
                    last_seen: now,
                    observed: last_observed,
                }));
            }
            self.clock.advance();
        }
    }

    fn admit_pending(
        &mut self,
        pending: &mut Vec<JobDescriptor>,
        admitted_ids: &mut std::collections::HashSet<JobId>,
        now: Tick,
        sink: &mut dyn ReportSink,
    ) -> Result<(), SimError> {
        let mut still_pending = Vec::with_capacity(pending.len());
        for descriptor in pending.drain(..) {
            if admitted_ids.contains(&descriptor.id) {
                warn!(job = descriptor.id, "duplicate arrival id ignored");
                continue;
            }
            match self.allocator.allocate(descriptor.id, descriptor.mem_bytes) {
                Some(offset) => {
                    admitted_ids.insert(descriptor.id);
                    let size = self
                        .allocator
                        .block_size_of(descriptor.id)
                        .expect("just allocated");
                    sink.memory_event(MemoryEvent {
                        time: now,
                        transition: MemoryTransition::Allocated,
                        bytes: size,
                        process: descriptor.id,
                        lo: offset,
                        hi: offset + size - 1,
                    });

                    let control = JobControl::new(descriptor.id, Arc::clone(&self.clock));
                    let handle = runtime::spawn(
                        descriptor.id,
                        descriptor.service_ticks,
                        Arc::clone(&self.clock),
                        Arc::clone(&control),
                    );
                    self.live.insert(descriptor.id, LiveJob { control, handle: Some(handle) });

                    debug!(job = descriptor.id, mem = size, "admitted");
                    self.ready_set.insert(JobStateRecord::new(descriptor, offset));
                }
                None => {
                    debug!(job = descriptor.id, "admission deferred: insufficient memory");
                    still_pending.push(descriptor);
                }
            }
        }
        *pending = still_pending;
        Ok(())
    }

    /// Waits for `control`'s published status to leave `Running`, allowing
    /// exactly one retry: if the job hasn't acknowledged within
    /// `ACK_TIMEOUT`, `reissue` re-sends the outstanding command and a
    /// second `ACK_TIMEOUT` is given before escalating to
    /// `FatalReason::JobUnresponsive`. A single stray scheduling delay
    /// should never kill the run; two in a row means the job is stuck.
    fn await_transition(
        id: JobId,
        control: &JobControl,
        reissue: impl FnOnce(),
    ) -> Result<JobStatus, SimError> {
        if let Some(status) = control.wait_while_running(ACK_TIMEOUT) {
            return Ok(status);
        }
        warn!(job = id, "job did not acknowledge command within timeout, retrying");
        reissue();
        control
            .wait_while_running(ACK_TIMEOUT)
            .ok_or(SimError::Fatal(FatalReason::JobUnresponsive(id)))
    }

    fn dispatch_head(&mut self, now: Tick, sink: &mut dyn ReportSink) {
        if self.ready_set.is_empty() {
            return;
        }
        let granted_slice = {
            let head = self.ready_set.peek_head().expect("checked non-empty");
            self.ready_set.granted_slice(head)
        };
        let mut record = self.ready_set.pop_head().expect("checked non-empty");

        let first_dispatch = record.start_tick.is_none();
        if first_dispatch {
            record.start_tick = Some(now);
            record.waiting_ticks += now - record.descriptor.arrival_tick;
        } else {
            let last_stop = record.last_stop_tick.expect("resumed job has a last stop");
            record.waiting_ticks += now - last_stop;
        }
        record.status = JobStatus::Running;

        let live = self.live.get(&record.id()).expect("admitted job has a live thread");
        live.control.issue_run(granted_slice);

        sink.scheduler_event(SchedulerEvent {
            time: now,
            process: record.id(),
            transition: if first_dispatch { Transition::Started } else { Transition::Resumed },
            arrival: record.descriptor.arrival_tick,
            total: record.descriptor.service_ticks,
            remaining: record.remaining_ticks,
            waiting: record.waiting_ticks,
            turnaround_and_wta: None,
        });

        self.running = Some(Dispatched { record, dispatch_tick: now, granted_slice });
    }

    /// SRTN only: preempts the running job if the Ready-Set's head would
    /// finish sooner. Returns `true` if a preemption happened (the caller
    /// loops to try dispatching the preempted-out contender immediately).
    fn maybe_preempt(&mut self, now: Tick, sink: &mut dyn ReportSink) -> Result<bool, SimError> {
        if !self.ready_set.is_preemptive() {
            return Ok(false);
        }
        let Some(running) = &self.running else { return Ok(false) };
        let Some(contender) = self.ready_set.peek_head() else { return Ok(false) };

        let running_actual = running.record.actual_remaining(running.dispatch_tick, now);
        if contender.remaining_ticks >= running_actual {
            return Ok(false);
        }

        let Dispatched { mut record, dispatch_tick, .. } = self.running.take().expect("checked Some");
        let control = Arc::clone(&self.live.get(&record.id()).expect("running job has a live thread").control);
        control.issue_pause();

        let status = Self::await_transition(record.id(), &control, || control.issue_pause())?;

        let consumed = control.ticks_consumed();
        record.remaining_ticks = record.remaining_ticks.saturating_sub(consumed);
        record.last_stop_tick = Some(now);
        let _ = dispatch_tick;

        match status {
            JobStatus::Finished => self.retire(record, now, sink),
            _ => {
                record.status = JobStatus::Idle;
                sink.scheduler_event(SchedulerEvent {
                    time: now,
                    process: record.id(),
                    transition: Transition::Stopped,
                    arrival: record.descriptor.arrival_tick,
                    total: record.descriptor.service_ticks,
                    remaining: record.remaining_ticks,
                    waiting: record.waiting_ticks,
                    turnaround_and_wta: None,
                });
                self.ready_set.insert(record);
            }
        }

        Ok(true)
    }

    fn reap_if_slice_elapsed(&mut self, now: Tick, sink: &mut dyn ReportSink) -> Result<(), SimError> {
        let Some(dispatched) = &self.running else { return Ok(()) };
        if now < dispatched.dispatch_tick + dispatched.granted_slice {
            return Ok(());
        }

        let Dispatched { mut record, granted_slice, .. } = self.running.take().expect("checked Some");
        let control = Arc::clone(&self.live.get(&record.id()).expect("running job has a live thread").control);

        let status =
            Self::await_transition(record.id(), &control, || control.issue_run(granted_slice))?;

        let consumed = control.ticks_consumed();
        record.remaining_ticks = record.remaining_ticks.saturating_sub(consumed);

        match status {
            JobStatus::Finished => self.retire(record, now, sink),
            _ => {
                record.last_stop_tick = Some(now);
                record.status = JobStatus::Idle;
                sink.scheduler_event(SchedulerEvent {
                    time: now,
                    process: record.id(),
                    transition: Transition::Stopped,
                    arrival: record.descriptor.arrival_tick,
                    total: record.descriptor.service_ticks,
                    remaining: record.remaining_ticks,
                    waiting: record.waiting_ticks,
                    turnaround_and_wta: None,
                });
                self.ready_set.insert(record);
            }
        }

        Ok(())
    }

    fn retire(&mut self, record: JobStateRecord, now: Tick, sink: &mut dyn ReportSink) {
        let id = record.id();
        let turnaround = record.turnaround(now);
        let wta = record.weighted_turnaround(now);

        sink.scheduler_event(SchedulerEvent {
            time: now,
            process: id,
            transition: Transition::Finished,
            arrival: record.descriptor.arrival_tick,
            total: record.descriptor.service_ticks,
            remaining: 0,
            waiting: record.waiting_ticks,
            turnaround_and_wta: Some((turnaround, wta)),
        });

        let size = self.allocator.block_size_of(id).unwrap_or(record.descriptor.mem_bytes);
        self.allocator.free(id);
        sink.memory_event(MemoryEvent {
            time: now,
            transition: MemoryTransition::Freed,
            bytes: size,
            process: id,
            lo: record.mem_base,
            hi: record.mem_base + size - 1,
        });

        if let Some(mut live) = self.live.remove(&id) {
            if let Some(handle) = live.handle.take() {
                let _ = handle.join();
            }
        }

        info!(job = id, turnaround, wta, "finished");
        self.finished.push(FinishedJob {
            service_ticks: record.descriptor.service_ticks,
            turnaround,
            wta,
            waiting: record.waiting_ticks,
        });
    }
}

impl<RS: ReadySet> Drop for Scheduler<RS> {
    /// Idempotent: cancels every still-live job (running or merely
    /// admitted-but-not-dispatched), releases its memory, and joins its
    /// thread. This is the same path normal termination already leaves
    /// nothing for, and the one external cancellation (§5) invokes.
    fn drop(&mut self) {
        if let Some(dispatched) = self.running.take() {
            self.allocator.free(dispatched.record.id());
        }
        while let Some(record) = self.ready_set.pop_head() {
            self.allocator.free(record.id());
        }
        for live in self.live.values() {
            live.control.issue_finish();
        }
        // Must happen before any join below: a job parked in
        // `wait_for_tick_or` only re-checks `issue_finish` when the clock
        // itself wakes it (via `nudge`, `advance`, or `destroy`), and this
        // scheduler will never call `advance` again.
        self.clock.destroy();
        for (_, mut live) in self.live.drain() {
            if let Some(handle) = live.handle.take() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod scheduler_tests;
