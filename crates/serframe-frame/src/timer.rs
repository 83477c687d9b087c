use std::time::{Duration, Instant};

/// Re-armable idle countdown.
///
/// Every [`arm`](IdleTimer::arm) restarts the countdown from `period`. Once
/// the deadline passes, [`poll`](IdleTimer::poll) reports the expiry exactly
/// once and the timer stays dormant until armed again.
#[derive(Debug, Clone)]
pub struct IdleTimer {
    period: Duration,
    deadline: Option<Instant>,
    generation: u64,
}

impl IdleTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: None,
            generation: 0,
        }
    }

    /// Cancel any pending expiry and restart the countdown at `now`.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.period);
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Report whether the countdown expired at or before `now`.
    ///
    /// Returns `true` at most once per arm.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until expiry, `None` while dormant.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of times the timer has been armed.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
