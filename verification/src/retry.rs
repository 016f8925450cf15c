//! Bounded retry scheduling.
//!
//! The scheduler owns one [`RetryState`] per entry with an armed or spent
//! budget. Arming a timer replaces (and aborts) any earlier one for the same
//! entry. Every arm bumps the entry's generation; a timer task must
//! [`claim`](RetryScheduler::claim) its generation before acting, so a
//! canceled timer never runs its callback even if it already woke up.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use bgv_types::{EntryId, Timestamp};
use tokio::task::JoinHandle;

/// Retry bookkeeping for one entry.
#[derive(Debug, Default)]
pub struct RetryState {
    /// Provider attempts spent in the current budget.
    pub attempt_count: u32,
    /// When the armed timer fires, if one is armed.
    pub scheduled_at: Option<Timestamp>,
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl RetryState {
    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}

pub struct RetryScheduler {
    max_attempts: u32,
    backoff: Duration,
    states: Mutex<HashMap<EntryId, RetryState>>,
}

impl RetryScheduler {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    fn states(&self) -> MutexGuard<'_, HashMap<EntryId, RetryState>> {
        self.states
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Spend one provider attempt from `entry`'s budget.
    ///
    /// Returns the 1-based attempt number, or `None` once the budget is spent.
    pub fn begin_attempt(&self, entry: &EntryId) -> Option<u32> {
        let mut states = self.states();
        let state = states.entry(entry.clone()).or_default();
        if state.attempt_count >= self.max_attempts {
            return None;
        }
        state.attempt_count += 1;
        Some(state.attempt_count)
    }

    /// Whether `attempt` was the last one the budget allows.
    pub fn is_final(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }

    /// Attempts spent in `entry`'s current budget.
    pub fn attempts(&self, entry: &EntryId) -> u32 {
        self.states().get(entry).map_or(0, |s| s.attempt_count)
    }

    /// Arm a timer for `entry` that runs the future built by `make` after the
    /// backoff. `make` receives the generation the future must claim.
    ///
    /// Returns the generation armed.
    pub fn arm<F, Fut>(&self, entry: &EntryId, now: Timestamp, make: F) -> u64
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut states = self.states();
        let state = states.entry(entry.clone()).or_default();
        if let Some(previous) = state.handle.take() {
            previous.abort();
        }
        state.generation = state.generation.wrapping_add(1);
        state.scheduled_at = Some(now.plus_secs(self.backoff.as_secs()));

        let generation = state.generation;
        let callback = make(generation);
        let backoff = self.backoff;
        state.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(backoff).await;
            callback.await;
        }));
        tracing::debug!(entry = %entry, generation, attempts = state.attempt_count, "retry armed");
        generation
    }

    /// Called by a fired timer. Returns `true` when `generation` is still the
    /// live one, disarming it; `false` when the timer was canceled or replaced.
    pub fn claim(&self, entry: &EntryId, generation: u64) -> bool {
        let mut states = self.states();
        match states.get_mut(entry) {
            Some(state) if state.generation == generation && state.handle.is_some() => {
                // The running task is this handle; dropping it detaches.
                state.handle = None;
                state.scheduled_at = None;
                true
            }
            _ => false,
        }
    }

    /// Cancel any armed timer and forget the budget for `entry`.
    ///
    /// The next attempt for `entry` starts a fresh budget.
    pub fn clear(&self, entry: &EntryId) -> bool {
        match self.states().remove(entry) {
            Some(state) => {
                if let Some(handle) = state.handle {
                    handle.abort();
                    tracing::debug!(entry = %entry, "retry canceled");
                }
                true
            }
            None => false,
        }
    }

    /// Cancel every armed timer. Used on engine teardown.
    pub fn clear_all(&self) -> usize {
        let drained: Vec<_> = self.states().drain().collect();
        let mut canceled = 0;
        for (_, state) in drained {
            if let Some(handle) = state.handle {
                handle.abort();
                canceled += 1;
            }
        }
        canceled
    }

    pub fn is_armed(&self, entry: &EntryId) -> bool {
        self.states().get(entry).is_some_and(RetryState::is_armed)
    }

    pub fn scheduled_at(&self, entry: &EntryId) -> Option<Timestamp> {
        self.states().get(entry).and_then(|s| s.scheduled_at)
    }

    /// Number of armed timers.
    pub fn armed(&self) -> usize {
        self.states().values().filter(|s| s.is_armed()).count()
    }
}

impl Drop for RetryScheduler {
    fn drop(&mut self) {
        self.clear_all();
    }
}
