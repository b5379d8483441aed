//! Engine access guard
//!
//! The legacy engine is one shared mutable resource with no internal
//! synchronization, so every mutating call passes through a single
//! exclusive lock here, not a per-name lock. Admission is FIFO (ticket
//! order), so no caller starves under sustained contention, and the lock is
//! reentrant: a thread already holding it may call back in.
//!
//! parking_lot offers fairness and reentrancy only as separate primitives,
//! so the guard builds both over its `Mutex` + `Condvar`: a ticket counter
//! orders waiters, a holder thread id and depth counter carry reentry.
//! Release happens through an RAII permit, so the lock is freed on every
//! exit path, panics included, before an operation's error reaches the
//! caller. The guard never inspects or swallows what the operation returns.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

#[derive(Debug, Default)]
struct GuardState {
    next_ticket: u64,
    now_serving: u64,
    holder: Option<ThreadId>,
    depth: usize,
}

/// Fair, reentrant exclusive lock serializing all engine access.
#[derive(Debug, Default)]
pub struct AccessGuard {
    state: Mutex<GuardState>,
    admitted: Condvar,
    next_op_id: AtomicU64,
}

impl AccessGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `op` while holding the engine-wide exclusive lock.
    ///
    /// Blocks the calling thread until admitted in FIFO order. The
    /// operation's result, value or error, passes through unchanged; the
    /// lock is released first on every exit path.
    pub fn run_exclusive<T>(&self, label: &str, op: impl FnOnce() -> T) -> T {
        let op_id = self.next_op_id.fetch_add(1, Ordering::Relaxed);
        let permit = self.admit(label, op_id);
        let result = op();
        drop(permit);
        result
    }

    /// Whether any thread currently holds the guard. Diagnostics only:
    /// checking-then-acting on this is racy by design.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state.lock().holder.is_some()
    }

    /// Number of threads waiting for admission. Diagnostics only.
    #[must_use]
    pub fn queue_length(&self) -> usize {
        let state = self.state.lock();
        let outstanding = state.next_ticket - state.now_serving;
        outstanding.saturating_sub(u64::from(state.holder.is_some())) as usize
    }

    /// Whether the calling thread is the current holder.
    #[must_use]
    pub fn is_held_by_calling_thread(&self) -> bool {
        self.state.lock().holder == Some(thread::current().id())
    }

    fn admit(&self, label: &str, op_id: u64) -> Permit<'_> {
        let me = thread::current().id();
        let mut state = self.state.lock();

        if state.holder == Some(me) {
            state.depth += 1;
            tracing::trace!(op_id, op = label, depth = state.depth, "reentrant engine access");
            return Permit { guard: self };
        }

        let ticket = state.next_ticket;
        state.next_ticket += 1;
        if state.holder.is_some() {
            let queued = (ticket - state.now_serving).saturating_sub(1);
            tracing::debug!(op_id, op = label, queued, "waiting for engine lock");
        } else {
            tracing::trace!(op_id, op = label, "acquiring engine lock");
        }

        while state.now_serving != ticket || state.holder.is_some() {
            self.admitted.wait(&mut state);
        }
        state.holder = Some(me);
        state.depth = 1;
        tracing::trace!(op_id, op = label, "engine lock acquired");
        Permit { guard: self }
    }

    fn release(&self) {
        let mut state = self.state.lock();
        state.depth -= 1;
        if state.depth == 0 {
            state.holder = None;
            state.now_serving += 1;
            tracing::trace!("engine lock released");
            drop(state);
            self.admitted.notify_all();
        }
    }
}

/// RAII admission token; releasing on drop covers panic unwinding too.
struct Permit<'a> {
    guard: &'a AccessGuard,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.guard.release();
    }
}
