//! Deterministic one-shot timers.
//!
//! The controller owns two timers: the deep-link settle delay and the
//! post-jump cooldown. At most one timer of each kind is armed; scheduling a
//! kind again moves its deadline instead of stacking a second timer. Time
//! comes from the host clock and timers only fire when the controller polls.

use core::time::Duration;

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Resolve the pending deep link with a jump.
    Settle,
    /// Re-enable visibility reports after a jump.
    Cooldown,
}

impl TimerKind {
    /// Stable name used in logs and traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Settle => "settle",
            Self::Cooldown => "cooldown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Timer {
    kind: TimerKind,
    deadline: Duration,
    seq: u64,
}

/// A timer that came due, with its scheduled deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub kind: TimerKind,
    pub deadline: Duration,
}

/// Armed timers, at most one per [`TimerKind`].
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
    next_seq: u64,
}

impl TimerQueue {
    /// Empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `kind` to fire at `deadline`, replacing any armed timer of the
    /// same kind.
    pub fn schedule(&mut self, kind: TimerKind, deadline: Duration) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let timer = Timer {
            kind,
            deadline,
            seq,
        };
        match self.timers.iter_mut().find(|t| t.kind == kind) {
            Some(slot) => *slot = timer,
            None => self.timers.push(timer),
        }
    }

    /// Disarm `kind`. Returns whether it was armed.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.kind != kind);
        self.timers.len() != before
    }

    /// Disarm everything.
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    /// Whether `kind` is armed.
    #[must_use]
    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.timers.iter().any(|t| t.kind == kind)
    }

    /// Deadline of `kind`, if armed.
    #[must_use]
    pub fn deadline(&self, kind: TimerKind) -> Option<Duration> {
        self.timers
            .iter()
            .find(|t| t.kind == kind)
            .map(|t| t.deadline)
    }

    /// Earliest deadline of any armed timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.iter().map(|t| t.deadline).min()
    }

    /// Whether no timer is armed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Remove and return the earliest timer due at `now`.
    ///
    /// Timers with equal deadlines fire in scheduling order.
    pub fn pop_due(&mut self, now: Duration) -> Option<FiredTimer> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= now)
            .min_by_key(|(_, t)| (t.deadline, t.seq))
            .map(|(index, _)| index)?;
        let timer = self.timers.swap_remove(index);
        Some(FiredTimer {
            kind: timer.kind,
            deadline: timer.deadline,
        })
    }
}
