//! Deadline-bounded read/write lock primitive.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// "Try now, don't queue". Five milliseconds stand in for the concept of
/// immediate; a zero budget can never acquire the lock.
pub const TIMEOUT_IMMEDIATE: Duration = Duration::from_millis(5);

/// Wait until the lock is granted, however long that takes.
pub const TIMEOUT_INFINITE: Duration = Duration::MAX;

/// An absolute acquisition deadline.
///
/// Computed once per request and passed down every step, so multi-step
/// acquisitions share a single budget and each step waits only for what is
/// left of it.
#[derive(Clone, Copy, Debug)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// Deadline `timeout` from now. Budgets too large to represent are
    /// unbounded.
    pub fn after(timeout: Duration) -> Self {
        Deadline(Instant::now().checked_add(timeout))
    }

    /// An unbounded deadline.
    pub fn infinite() -> Self {
        Deadline(None)
    }

    /// Remaining budget; `None` means unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.0.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Returns `true` once the budget is spent.
    pub fn expired(&self) -> bool {
        matches!(self.remaining(), Some(left) if left.is_zero())
    }
}

#[derive(Default)]
struct LockState {
    readers: usize,
    writer: bool,
    waiting_writers: usize,
}

impl LockState {
    fn can_read(&self) -> bool {
        !self.writer && self.waiting_writers == 0
    }

    fn can_write(&self) -> bool {
        !self.writer && self.readers == 0
    }
}

/// A write-preferring read/write lock with deadline-bounded acquisition.
///
/// Acquire and release are explicit and must be paired correctly, exactly
/// like the underlying mutex protocol; the hierarchical layer wraps this in
/// RAII guards. The grant/timeout race of a bounded wait is resolved under
/// the internal mutex: a waiter that wakes past its deadline re-validates the
/// state once and either takes the lock or leaves it untouched — exactly one
/// outcome, never a granted-but-abandoned lock.
#[derive(Default)]
pub struct RawRwLock {
    state: Mutex<LockState>,
    cond: Condvar,
}

impl RawRwLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire in read mode before `deadline`. Returns `false` on timeout or
    /// when the budget is already spent.
    pub fn read(&self, deadline: Deadline) -> bool {
        let mut state = self.state.lock().expect("lock poisoned");
        if deadline.expired() {
            return false;
        }
        loop {
            if state.can_read() {
                state.readers += 1;
                return true;
            }
            match deadline.remaining() {
                None => state = self.cond.wait(state).expect("lock poisoned"),
                Some(left) => {
                    let (guard, result) = self
                        .cond
                        .wait_timeout(state, left)
                        .expect("lock poisoned");
                    state = guard;
                    if result.timed_out() {
                        if state.can_read() {
                            state.readers += 1;
                            return true;
                        }
                        return false;
                    }
                }
            }
        }
    }

    /// Acquire in write mode before `deadline`. Returns `false` on timeout or
    /// when the budget is already spent.
    pub fn write(&self, deadline: Deadline) -> bool {
        let mut state = self.state.lock().expect("lock poisoned");
        if deadline.expired() {
            return false;
        }
        state.waiting_writers += 1;
        loop {
            if state.can_write() {
                state.waiting_writers -= 1;
                state.writer = true;
                return true;
            }
            match deadline.remaining() {
                None => state = self.cond.wait(state).expect("lock poisoned"),
                Some(left) => {
                    let (guard, result) = self
                        .cond
                        .wait_timeout(state, left)
                        .expect("lock poisoned");
                    state = guard;
                    if result.timed_out() {
                        state.waiting_writers -= 1;
                        if state.can_write() {
                            state.writer = true;
                            return true;
                        }
                        // Readers may be parked behind this waiter; let them go.
                        self.cond.notify_all();
                        return false;
                    }
                }
            }
        }
    }

    /// Release one read acquisition.
    pub fn unlock_read(&self) {
        let mut state = self.state.lock().expect("lock poisoned");
        debug_assert!(state.readers > 0, "unlock_read without a reader");
        state.readers = state.readers.saturating_sub(1);
        if state.readers == 0 {
            self.cond.notify_all();
        }
    }

    /// Release the write acquisition.
    pub fn unlock_write(&self) {
        let mut state = self.state.lock().expect("lock poisoned");
        debug_assert!(state.writer, "unlock_write without a writer");
        state.writer = false;
        self.cond.notify_all();
    }
}

impl std::fmt::Debug for RawRwLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().expect("lock poisoned");
        f.debug_struct("RawRwLock")
            .field("readers", &state.readers)
            .field("writer", &state.writer)
            .field("waiting_writers", &state.waiting_writers)
            .finish()
    }
}
