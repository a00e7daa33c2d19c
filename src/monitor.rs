//! Condition-variable primitive bound to an externally held mutex.
//!
//! A [`Monitor`] carries no mutex of its own — the caller always supplies
//! the guard of whatever mutex it is protecting a predicate for. This lets a
//! [`crate::queue::BoundedQueue`] share a single mutex across its three
//! monitors (`not_full`, `not_empty`, `finished_event`) so that predicates
//! over `(count, finished)` are evaluated atomically, instead of nesting a
//! lock per condition variable.

use std::sync::{Condvar, MutexGuard};

use crate::error::MonitorError;

/// Wraps a single [`Condvar`]. Always used together with a mutex the caller
/// already holds.
#[derive(Debug, Default)]
pub struct Monitor {
    condvar: Condvar,
}

impl Monitor {
    /// Creates a new monitor. Infallible: unlike `pthread_cond_init`, `Condvar`
    /// construction in Rust cannot fail, so there is no construction-failure
    /// path to report here. [`MonitorError`] survives on [`Monitor::wait`]
    /// instead, where a poisoned mutex is the one fatal condition this
    /// primitive can still observe.
    pub fn new() -> Self {
        Self {
            condvar: Condvar::new(),
        }
    }

    /// Atomically releases `guard`'s mutex and blocks until signalled, then
    /// reacquires it before returning. Spurious wakeups are possible; callers
    /// must recheck their predicate in a loop.
    pub fn wait<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
    ) -> Result<MutexGuard<'a, T>, MonitorError> {
        self.condvar.wait(guard).map_err(|_| MonitorError::Poisoned)
    }

    /// Wakes exactly one waiter, if any. The caller must hold the associated
    /// mutex so no predicate change can race past a waiter that hasn't yet
    /// parked. A no-op when nobody is waiting.
    pub fn signal(&self) {
        self.condvar.notify_one();
    }

    /// Wakes every waiter. Used by [`crate::queue::BoundedQueue::mark_finished`]
    /// so that multiple blocked takers can all re-check the finished flag.
    pub fn broadcast(&self) {
        self.condvar.notify_all();
    }

    /// No-op, present for API symmetry with the monitor's init/wait/signal/reset
    /// shape; there is no per-monitor state left to clear once `Condvar`
    /// construction can't fail.
    pub fn reset(&self) {}
}
