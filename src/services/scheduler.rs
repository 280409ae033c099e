//! Debounce scheduler and one-shot timers for the controller loop.
//!
//! Both are plain deadline holders: callers pass the current instant in and ask
//! whether something is due, the controller sleeps until the earliest deadline.

use std::time::Duration;
use tokio::time::Instant;

/// A pending recomputation handed out when the debounce deadline passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Firing {
    /// Repaint even if the classification did not change
    pub force: bool,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    fire_at: Instant,
    force: bool,
}

/// Collapses bursts of "recompute requested" into a single firing.
#[derive(Debug, Default)]
pub struct DebounceScheduler {
    pending: Option<Pending>,
}

impl DebounceScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any pending firing with one `after` from `now`.
    ///
    /// A pending forced firing is left alone: it is already due and will read
    /// a fresh snapshot anyway.
    pub fn schedule_debounced(&mut self, after: Duration, now: Instant) {
        if let Some(pending) = self.pending {
            if pending.force {
                return;
            }
        }
        self.pending = Some(Pending {
            fire_at: now + after,
            force: false,
        });
    }

    /// Cancels any pending debounced firing and makes a forced one due at `now`
    pub fn schedule_immediate(&mut self, now: Instant) {
        self.pending = Some(Pending {
            fire_at: now,
            force: true,
        });
    }

    /// Drops the pending firing. Returns whether anything was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.fire_at)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the pending firing if its deadline has passed
    pub fn poll_fire(&mut self, now: Instant) -> Option<Firing> {
        match self.pending {
            Some(pending) if pending.fire_at <= now => {
                self.pending = None;
                Some(Firing {
                    force: pending.force,
                })
            }
            _ => None,
        }
    }
}

/// Fire-once timer; re-arming replaces the previous deadline
#[derive(Debug, Default)]
pub struct OneShotTimer {
    deadline: Option<Instant>,
}

impl OneShotTimer {
    pub fn arm(&mut self, at: Instant) {
        self.deadline = Some(at);
    }

    pub fn disarm(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True exactly once, the first time it is polled at or after the deadline
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(at) if at <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Sleeps until `deadline`, or forever when there is none
pub async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

/// Earliest of several optional deadlines
pub fn earliest(deadlines: impl IntoIterator<Item = Option<Instant>>) -> Option<Instant> {
    deadlines.into_iter().flatten().min()
}
