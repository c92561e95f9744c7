//! Single-deadline phase timer on the logical millisecond clock.
//!
//! The whole phase sequence runs off one outstanding deadline; arming a new
//! phase requires the previous deadline to have been cancelled first, so a
//! stale callback can never advance the machine twice.

use crate::task::Millis;

#[derive(Debug, Default)]
pub struct PhaseTimer {
    deadline: Option<Millis>,
    frozen_remaining: Option<Millis>,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the deadline `duration` from `now`. The previous deadline
    /// must already be cancelled; arming over a live one is a sequencing
    /// defect upstream.
    pub fn arm(&mut self, now: Millis, duration: Millis) {
        debug_assert!(
            self.deadline.is_none() && self.frozen_remaining.is_none(),
            "arming over a live timer"
        );
        self.deadline = Some(now.saturating_add(duration));
    }

    /// Invalidate the pending deadline. Idempotent: cancelling an already
    /// clear timer is a no-op.
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.frozen_remaining = None;
    }

    /// Freeze the countdown, recording how much time was left. No-op if
    /// nothing is armed or the timer is already frozen.
    pub fn pause(&mut self, now: Millis) {
        if let Some(deadline) = self.deadline.take() {
            self.frozen_remaining = Some(deadline.saturating_sub(now));
        }
    }

    /// Reschedule a frozen countdown with exactly the remaining duration.
    pub fn resume(&mut self, now: Millis) {
        if let Some(remaining) = self.frozen_remaining.take() {
            self.deadline = Some(now.saturating_add(remaining));
        }
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.deadline
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen_remaining.is_some()
    }

    pub fn expired(&self, now: Millis) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }
}
