// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingCommit<T> {
    value: T,
    deadline: Instant,
}

/// Trailing debounce over a value. `immediate` follows every edit; `settled`
/// only moves once `delay` has passed without another edit.
///
/// Time is passed in by the caller, so the holder never owns a thread or a
/// callback: dropping it or calling [`Debounced::cancel`] discards the pending
/// commit and nothing can fire afterwards.
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    immediate: T,
    settled: T,
    delay: Duration,
    pending: Option<PendingCommit<T>>,
}

impl<T: Clone + PartialEq> Debounced<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            immediate: initial.clone(),
            settled: initial,
            delay,
            pending: None,
        }
    }

    pub fn immediate(&self) -> &T {
        &self.immediate
    }

    pub fn settled(&self) -> &T {
        &self.settled
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    /// Updates the immediate value and restarts the quiet period.
    pub fn set_value(&mut self, value: T, now: Instant) {
        self.immediate = value.clone();
        self.pending = Some(PendingCommit {
            value,
            deadline: now + self.delay,
        });
    }

    /// Commits the pending value once its deadline has passed. Returns the new
    /// settled value the one time it changes.
    pub fn poll(&mut self, now: Instant) -> Option<&T> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| now >= pending.deadline);
        if !due {
            return None;
        }
        let pending = self.pending.take()?;
        self.commit(pending.value)
    }

    /// Commits the pending value right away, skipping the rest of the delay.
    pub fn flush(&mut self) -> Option<&T> {
        let pending = self.pending.take()?;
        self.commit(pending.value)
    }

    /// Drops the pending commit. The immediate value is kept as typed.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Sets both values at once, for example when a view is reset.
    pub fn reset(&mut self, value: T) {
        self.pending = None;
        self.immediate = value.clone();
        self.settled = value;
    }

    fn commit(&mut self, value: T) -> Option<&T> {
        if value == self.settled {
            return None;
        }
        self.settled = value;
        Some(&self.settled)
    }
}
