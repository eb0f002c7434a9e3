//! Deadline queue for deferred work on the event-loop thread.
//!
//! Nothing here sleeps. The loop asks for [`TimerQueue::next_deadline`] to
//! bound its input poll, then drains whatever is due.

use std::time::{Duration, Instant};

pub struct TimerQueue<T> {
    pending: Vec<(Instant, u64, T)>,
    seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, payload: T) {
        self.pending.push((now + delay, self.seq, payload));
        self.seq += 1;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|(at, _, _)| *at).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Removes and returns every payload whose deadline is `<= now`, ordered
    /// by deadline and then by scheduling order.
    pub fn take_due(&mut self, now: Instant) -> Vec<T> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|(at, _, _)| *at <= now);
        self.pending = rest;
        due.sort_by_key(|(at, seq, _)| (*at, *seq));
        due.into_iter().map(|(_, _, p)| p).collect()
    }
}
