//! Timer Scheduler
//!
//! Cancellable delayed tasks expressed as data rather than closures. The
//! classifier schedules a payload for a deadline, holds on to the returned
//! token, and later receives the payload back from [`TimerScheduler::pop_due`]
//! once the host clock has passed the deadline.
//!
//! Time is an opaque monotonic millisecond counter supplied by the caller, so
//! the same scheduler works under a real clock (see the gesture driver) and
//! under a fully deterministic one in tests.

use std::collections::{BTreeMap, HashMap};

/// Handle for a scheduled timer
///
/// Tokens are never reused within one scheduler, so a stale token can never
/// cancel a newer timer by accident.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    /// Raw token value (useful for logging)
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Schedules and cancels delayed payloads
pub trait TimerScheduler<T> {
    /// Schedule `payload` to become due at `deadline_ms`
    fn schedule_at(&mut self, deadline_ms: u64, payload: T) -> TimerToken;

    /// Cancel a pending timer
    ///
    /// Returns `false` if the timer already fired or was already cancelled.
    fn cancel(&mut self, token: TimerToken) -> bool;

    /// Earliest pending deadline, if any
    fn next_deadline(&self) -> Option<u64>;

    /// Remove and return the earliest timer due at or before `now_ms`
    fn pop_due(&mut self, now_ms: u64) -> Option<(TimerToken, T)>;

    /// Number of pending timers
    fn pending(&self) -> usize;

    /// Schedule `payload` to fire `delay_ms` after `now_ms`
    fn schedule(&mut self, now_ms: u64, delay_ms: u64, payload: T) -> TimerToken {
        self.schedule_at(now_ms.saturating_add(delay_ms), payload)
    }
}

/// Deadline-ordered scheduler
///
/// Timers fire in deadline order; timers sharing a deadline fire in the order
/// they were scheduled.
#[derive(Debug)]
pub struct DeadlineScheduler<T> {
    queue: BTreeMap<(u64, u64), T>,
    deadlines: HashMap<TimerToken, u64>,
    next_token: u64,
}

impl<T> Default for DeadlineScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeadlineScheduler<T> {
    /// Create an empty scheduler
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
            next_token: 0,
        }
    }

    /// Check whether a token is still pending
    #[must_use]
    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.deadlines.contains_key(&token)
    }
}

impl<T> TimerScheduler<T> for DeadlineScheduler<T> {
    fn schedule_at(&mut self, deadline_ms: u64, payload: T) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;

        self.queue.insert((deadline_ms, token.0), payload);
        self.deadlines.insert(token, deadline_ms);

        tracing::trace!(token = token.as_u64(), deadline_ms, "timer scheduled");
        token
    }

    fn cancel(&mut self, token: TimerToken) -> bool {
        match self.deadlines.remove(&token) {
            Some(deadline) => {
                self.queue.remove(&(deadline, token.0));
                tracing::trace!(token = token.as_u64(), "timer cancelled");
                true
            }
            None => false,
        }
    }

    fn next_deadline(&self) -> Option<u64> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    fn pop_due(&mut self, now_ms: u64) -> Option<(TimerToken, T)> {
        let (&(deadline, seq), _) = self.queue.iter().next()?;
        if deadline > now_ms {
            return None;
        }

        let payload = self.queue.remove(&(deadline, seq))?;
        let token = TimerToken(seq);
        self.deadlines.remove(&token);
        Some((token, payload))
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_deadline_order() {
        let mut scheduler = DeadlineScheduler::new();
        scheduler.schedule_at(300, "late");
        scheduler.schedule_at(100, "early");
        scheduler.schedule_at(200, "middle");

        assert_eq!(scheduler.next_deadline(), Some(100));
        assert_eq!(scheduler.pop_due(250).map(|(_, p)| p), Some("early"));
        assert_eq!(scheduler.pop_due(250).map(|(_, p)| p), Some("middle"));
        assert!(scheduler.pop_due(250).is_none());
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_ties_fire_in_schedule_order() {
        let mut scheduler = DeadlineScheduler::new();
        scheduler.schedule_at(50, 1);
        scheduler.schedule_at(50, 2);

        assert_eq!(scheduler.pop_due(50).map(|(_, p)| p), Some(1));
        assert_eq!(scheduler.pop_due(50).map(|(_, p)| p), Some(2));
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut scheduler = DeadlineScheduler::new();
        let token = scheduler.schedule(0, 10, "tap");

        assert!(scheduler.is_pending(token));
        assert!(scheduler.cancel(token));
        assert!(!scheduler.cancel(token));
        assert!(scheduler.pop_due(u64::MAX).is_none());
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn test_tokens_are_not_reused() {
        let mut scheduler = DeadlineScheduler::new();
        let first = scheduler.schedule_at(10, ());
        scheduler.cancel(first);
        let second = scheduler.schedule_at(10, ());

        assert_ne!(first, second);
        assert_eq!(second.as_u64(), first.as_u64() + 1);
        assert!(!scheduler.cancel(first));
        assert!(scheduler.is_pending(second));
    }

    #[test]
    fn test_schedule_saturates() {
        let mut scheduler = DeadlineScheduler::new();
        scheduler.schedule(u64::MAX - 1, 10, ());
        assert_eq!(scheduler.next_deadline(), Some(u64::MAX));
    }
}
