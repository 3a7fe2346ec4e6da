//! Virtual tick clock.
//!
//! A single monotone integer tick counter, advanced by exactly one
//! participant (the scheduler core) and read by everyone else (job
//! runtime threads). Readers that need to block until a specific tick
//! arrives use [`VirtualClock::wait_for_tick`] rather than polling
//! [`VirtualClock::read`] in a spin loop.

use std::sync::{Condvar, Mutex};

/// A tick of the virtual clock.
pub type Tick = u64;

struct ClockState {
    tick: Tick,
    destroyed: bool,
}

/// The shared tick source. Cheap to wrap in an `Arc` at the call sites
/// that need it; the clock itself owns no thread.
pub struct VirtualClock {
    state: Mutex<ClockState>,
    advanced: Condvar,
}

impl VirtualClock {
    /// Creates a clock with `T = 0`.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ClockState {
                tick: 0,
                destroyed: false,
            }),
            advanced: Condvar::new(),
        }
    }

    /// Returns the current tick. Panics if called after [`Self::destroy`];
    /// per the clock's ordering contract, reads after destruction are
    /// errors, and in a single-process simulator a panic is the only way
    /// to surface that without threading an `Err` path through every
    /// reader.
    pub fn read(&self) -> Tick {
        let state = self.state.lock().unwrap();
        assert!(!state.destroyed, "read() after clock destroy()");
        state.tick
    }

    /// Advances the clock by one tick and wakes every thread blocked in
    /// [`Self::wait_for_tick`]. Only the scheduler core calls this.
    pub fn advance(&self) {
        let mut state = self.state.lock().unwrap();
        assert!(!state.destroyed, "advance() after clock destroy()");
        state.tick += 1;
        self.advanced.notify_all();
    }

    /// Blocks the caller until `read() >= target`, waking promptly on each
    /// `advance()` instead of busy-waiting. Returns immediately if the
    /// target has already passed, and immediately (without panicking) if
    /// the clock is destroyed in the interim.
    pub fn wait_for_tick(&self, target: Tick) {
        let mut state = self.state.lock().unwrap();
        while !state.destroyed && state.tick < target {
            state = self.advanced.wait(state).unwrap();
        }
    }

    /// Blocks until `read() >= target` or `should_wake()` returns `true`,
    /// whichever comes first, re-evaluating `should_wake` every time the
    /// clock is [`Self::nudge`]d, [`Self::advance`]d, or [`Self::destroy`]ed.
    /// Returns `true` only if the target tick was actually reached;
    /// `false` means the caller was woken early by `should_wake` or by
    /// destruction, and the target tick may still be in the future.
    ///
    /// This is the primitive that lets a job's runtime thread notice a
    /// `Pause`/`Finish` command without waiting for another tick to
    /// elapse — a plain [`Self::wait_for_tick`] can only be woken by the
    /// scheduler's own `advance()`, which the scheduler may never call
    /// again if it is itself blocked waiting for this job to stop.
    pub fn wait_for_tick_or<F>(&self, target: Tick, mut should_wake: F) -> bool
    where
        F: FnMut() -> bool,
    {
        let mut state = self.state.lock().unwrap();
        while !state.destroyed && state.tick < target && !should_wake() {
            state = self.advanced.wait(state).unwrap();
        }
        state.tick >= target
    }

    /// Wakes every thread parked in [`Self::wait_for_tick`] or
    /// [`Self::wait_for_tick_or`] without advancing the tick or
    /// destroying the clock. Callers that change some condition a
    /// `should_wake` predicate depends on (e.g. publishing a `Pause`
    /// command into a job's control record) must call this afterward so
    /// a thread already parked re-evaluates that predicate promptly
    /// instead of waiting for the next real `advance()`.
    pub fn nudge(&self) {
        let _state = self.state.lock().unwrap();
        self.advanced.notify_all();
    }

    /// Idempotent teardown. Wakes any waiters so they observe destruction
    /// rather than blocking forever.
    pub fn destroy(&self) {
        let mut state = self.state.lock().unwrap();
        state.destroyed = true;
        self.advanced.notify_all();
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}
