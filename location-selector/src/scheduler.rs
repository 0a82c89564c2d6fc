//! Cooperative task scheduling for deferred UI steps.
//!
//! Nothing here runs on its own: the owner calls [`Scheduler::take_due`]
//! once per frame and executes whatever comes back. Tasks scheduled while
//! handling a frame run on the following one.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Due {
    NextTick,
    At(Instant),
}

#[derive(Debug)]
struct ScheduledTask<T> {
    due: Due,
    seq: u64,
    task: T,
}

/// A queue of tasks waiting for the next tick or for a deadline.
#[derive(Debug)]
pub struct Scheduler<T> {
    tasks: Vec<ScheduledTask<T>>,
    next_seq: u64,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_seq: 0,
        }
    }

    /// Run `task` on the next call to `take_due`.
    pub fn next_tick(&mut self, task: T) {
        self.push(Due::NextTick, task);
    }

    /// Run `task` once `delay` has elapsed since `now`.
    pub fn after(&mut self, now: Instant, delay: Duration, task: T) {
        self.push(Due::At(now + delay), task);
    }

    fn push(&mut self, due: Due, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.push(ScheduledTask { due, seq, task });
    }

    /// Remove and return every task that is due at `now`.
    ///
    /// Next-tick tasks come first, then timers by deadline. Ties keep
    /// scheduling order.
    pub fn take_due(&mut self, now: Instant) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|scheduled| match scheduled.due {
                Due::NextTick => true,
                Due::At(deadline) => deadline <= now,
            });
        self.tasks = pending;
        due.sort_by_key(|scheduled| (scheduled.due, scheduled.seq));
        due.into_iter().map(|scheduled| scheduled.task).collect()
    }

    /// The earliest moment something becomes due, if anything is queued.
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        self.tasks
            .iter()
            .map(|scheduled| match scheduled.due {
                Due::NextTick => now,
                Due::At(deadline) => deadline,
            })
            .min()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
