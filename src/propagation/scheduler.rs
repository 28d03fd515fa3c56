//! Virtual-time timer queue
//!
//! Timers are ordered by due time, then by the order they were scheduled.
//! Time only moves when the owner pops a due timer or advances the clock, so
//! a cancelled timer can never fire late.

use std::collections::BTreeMap;
use std::time::Duration;

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId {
    due: Duration,
    seq: u64,
}

impl TimerId {
    /// Time the timer fires at
    pub fn due(&self) -> Duration {
        self.due
    }
}

/// Timer queue holding tasks of type `T`
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_seq: u64,
    queue: BTreeMap<TimerId, T>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Create an empty scheduler at time zero
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            queue: BTreeMap::new(),
        }
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `task` to fire `delay` after the current time
    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerId {
        self.schedule_at(self.now + delay, task)
    }

    /// Schedule `task` at an absolute time; past times fire on the next pop
    pub fn schedule_at(&mut self, due: Duration, task: T) -> TimerId {
        let id = TimerId { due, seq: self.next_seq };
        self.next_seq += 1;
        self.queue.insert(id, task);
        id
    }

    /// Cancel one timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.queue.remove(&id).is_some()
    }

    /// Cancel every pending timer, returning how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }

    /// Number of pending timers
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Due time of the earliest pending timer
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.keys().next().map(TimerId::due)
    }

    /// Remove the earliest timer due at or before `until`.
    ///
    /// The clock moves forward to the timer's due time (never backwards).
    pub fn pop_due(&mut self, until: Duration) -> Option<(Duration, T)> {
        let id = *self.queue.keys().next()?;
        if id.due > until {
            return None;
        }
        let task = self.queue.remove(&id)?;
        self.now = self.now.max(id.due);
        Some((self.now, task))
    }

    /// Move the clock forward to `to`
    pub fn advance_to(&mut self, to: Duration) {
        self.now = self.now.max(to);
    }
}
