//! Cooperative wall-clock budget and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A wall-clock budget threaded through every long-running call.
///
/// Nothing is interrupted preemptively: the outer loops poll [`expired`]
/// between iterations and sub-solver backends poll it while searching.
/// An optional shared flag lets another thread request a stop.
///
/// [`expired`]: Deadline::expired
#[derive(Debug, Clone)]
pub struct Deadline {
    start: Instant,
    limit: Option<Duration>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Deadline {
    /// A deadline that expires `limit` after now.
    pub fn after(limit: Duration) -> Self {
        Self {
            start: Instant::now(),
            limit: Some(limit),
            cancel: None,
        }
    }

    /// A deadline that never expires on its own.
    pub fn unbounded() -> Self {
        Self {
            start: Instant::now(),
            limit: None,
            cancel: None,
        }
    }

    /// Attaches an external cancellation flag.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Time since the deadline was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time left, `Duration::MAX` when unbounded.
    pub fn remaining(&self) -> Duration {
        match self.limit {
            Some(limit) => limit.saturating_sub(self.start.elapsed()),
            None => Duration::MAX,
        }
    }

    /// Whether the external flag was raised.
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Whether the budget is exhausted or a stop was requested.
    pub fn expired(&self) -> bool {
        if self.is_cancelled() {
            return true;
        }
        match self.limit {
            Some(limit) => self.start.elapsed() >= limit,
            None => false,
        }
    }

    /// A child deadline owning `fraction` of the remaining time.
    ///
    /// The child shares the cancellation flag and never outlives the parent.
    pub fn split(&self, fraction: f64) -> Deadline {
        let fraction = fraction.clamp(0.0, 1.0);
        let limit = self
            .limit
            .map(|_| self.remaining().mul_f64(fraction));
        Deadline {
            start: Instant::now(),
            limit,
            cancel: self.cancel.clone(),
        }
    }
}
