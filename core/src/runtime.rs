//! Job Runtime: the per-job thread and the Control Record it shares with
//! the scheduler, per §4.4.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use vosim_abi::{Command, ControlRecord, JobId, JobStatus};
use vosim_lib::VirtualClock;

fn command_tag(command: Command) -> u8 {
    match command {
        Command::None => 0,
        Command::Run => 1,
        Command::Pause => 2,
        Command::Finish => 3,
    }
}

fn tag_command(tag: u8) -> Command {
    match tag {
        0 => Command::None,
        1 => Command::Run,
        2 => Command::Pause,
        3 => Command::Finish,
        _ => unreachable!("invalid command tag"),
    }
}

/// The shared slot a job's runtime thread and the scheduler communicate
/// through: a [`ControlRecord`] (scheduler writes, job reads) and a
/// published [`JobStatus`] (job writes, scheduler reads), each guarded by
/// its own condvar since the two travel in opposite directions.
///
/// `command_tag` mirrors `record.command` in a lock-free cell so a job
/// thread parked in [`VirtualClock::wait_for_tick_or`] can poll it from
/// inside that wait without taking `record`'s lock — doing so would risk
/// a lock-order inversion against `issue_pause`/`issue_finish`, which
/// must in turn [`VirtualClock::nudge`] the clock to wake that wait.
pub struct JobControl {
    clock: Arc<VirtualClock>,
    record: Mutex<ControlRecord>,
    record_changed: Condvar,
    command_tag: AtomicU8,
    status: Mutex<JobStatus>,
    status_changed: Condvar,
    ticks_consumed: AtomicU64,
}

impl JobControl {
    pub fn new(owner_id: JobId, clock: Arc<VirtualClock>) -> Arc<Self> {
        Arc::new(Self {
            clock,
            record: Mutex::new(ControlRecord { owner_id, ..ControlRecord::new() }),
            record_changed: Condvar::new(),
            command_tag: AtomicU8::new(command_tag(Command::None)),
            status: Mutex::new(JobStatus::Idle),
            status_changed: Condvar::new(),
            ticks_consumed: AtomicU64::new(0),
        })
    }

    pub fn issue_run(&self, granted_slice: u64) {
        {
            let mut record = self.record.lock();
            record.command = Command::Run;
            record.granted_slice = granted_slice;
        }
        self.command_tag.store(command_tag(Command::Run), Ordering::SeqCst);
        self.record_changed.notify_all();
        self.clock.nudge();
    }

    pub fn issue_pause(&self) {
        {
            let mut record = self.record.lock();
            record.command = Command::Pause;
        }
        self.command_tag.store(command_tag(Command::Pause), Ordering::SeqCst);
        self.record_changed.notify_all();
        self.clock.nudge();
    }

    pub fn issue_finish(&self) {
        {
            let mut record = self.record.lock();
            record.command = Command::Finish;
        }
        self.command_tag.store(command_tag(Command::Finish), Ordering::SeqCst);
        self.record_changed.notify_all();
        self.clock.nudge();
    }

    /// Lock-free snapshot of the outstanding command. Safe to call while
    /// holding the clock's internal lock (i.e. from inside a
    /// `should_wake` predicate passed to `wait_for_tick_or`).
    fn command(&self) -> Command {
        tag_command(self.command_tag.load(Ordering::SeqCst))
    }

    /// Blocks until the scheduler issues `Run` or `Finish`, returning
    /// whichever arrived. `Pause` (and the initial `None`) keep waiting —
    /// a paused job has nothing to do until it is re-dispatched.
    fn wait_for_run_or_finish(&self) -> (Command, u64) {
        let mut record = self.record.lock();
        while matches!(record.command, Command::None | Command::Pause) {
            self.record_changed.wait(&mut record);
        }
        (record.command, record.granted_slice)
    }

    fn publish(&self, status: JobStatus) {
        *self.status.lock() = status;
        self.status_changed.notify_all();
    }

    pub fn status(&self) -> JobStatus {
        *self.status.lock()
    }

    /// Blocks until the published status leaves `Running`, or `timeout`
    /// elapses first. The scheduler uses this to bound its wait for a
    /// state transition per §5; a timeout signals `TransientJobError`.
    pub fn wait_while_running(&self, timeout: Duration) -> Option<JobStatus> {
        let mut status = self.status.lock();
        let deadline = Instant::now() + timeout;
        while *status == JobStatus::Running {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let result = self.status_changed.wait_for(&mut status, remaining);
            if result.timed_out() && *status == JobStatus::Running {
                return None;
            }
        }
        Some(*status)
    }

    /// Ticks the job actually ran for in its most recently completed
    /// dispatch — may be less than the granted slice if preempted.
    pub fn ticks_consumed(&self) -> u64 {
        self.ticks_consumed.load(Ordering::SeqCst)
    }
}

/// Spawns the job's runtime thread. The thread owns nothing but its
/// [`JobControl`] handle and the shared clock; `service_ticks` seeds its
/// private countdown, which is never shared back except via
/// [`JobControl::ticks_consumed`].
pub fn spawn(
    id: JobId,
    service_ticks: u64,
    clock: Arc<VirtualClock>,
    control: Arc<JobControl>,
) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name(format!("job-{id}"))
        .spawn(move || run_loop(service_ticks, &clock, &control))
        .expect("failed to spawn job runtime thread")
}

fn run_loop(mut remaining: u64, clock: &VirtualClock, control: &JobControl) {
    loop {
        let (command, granted_slice) = control.wait_for_run_or_finish();
        if command == Command::Finish {
            control.publish(JobStatus::Finished);
            return;
        }

        let dispatch_tick = clock.read();
        control.publish(JobStatus::Running);

        let mut ran = 0u64;
        while ran < granted_slice && remaining > 0 {
            // A combined wait: wakes on the real tick boundary, same as
            // before, but also wakes the moment `issue_pause`/`issue_finish`
            // nudges the clock, so a command change is never stuck behind
            // a tick that the scheduler itself cannot advance.
            let tick_reached =
                clock.wait_for_tick_or(dispatch_tick + ran + 1, || control.command() != Command::Run);
            if !tick_reached {
                break;
            }
            ran += 1;
            remaining -= 1;
            if control.command() != Command::Run {
                break;
            }
        }
        control.ticks_consumed.store(ran, Ordering::SeqCst);

        if remaining == 0 || control.command() == Command::Finish {
            control.publish(JobStatus::Finished);
            return;
        }
        control.publish(JobStatus::Idle);
    }
}
