//! Adaptive micro time budget and optimality gap.

use std::time::Duration;

/// Parameters of the adaptive controller.
#[derive(Debug, Clone)]
pub struct AdaptiveConfig {
    /// Micro budget of the first sub-solver call.
    pub initial_micro_budget: Duration,
    pub max_micro_budget: Duration,
    /// Relative gap of the first call.
    pub initial_gap: f64,
    /// Below this the gap snaps to zero.
    pub gap_floor: f64,
    /// Relative density improvement under which an iteration counts as small.
    pub small_improvement: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            initial_micro_budget: Duration::from_millis(500),
            max_micro_budget: Duration::from_secs(60),
            initial_gap: 0.25,
            gap_floor: 1e-3,
            small_improvement: 1e-3,
        }
    }
}

impl AdaptiveConfig {
    pub fn with_initial_micro_budget(mut self, budget: Duration) -> Self {
        self.initial_micro_budget = budget;
        self
    }

    pub fn with_max_micro_budget(mut self, budget: Duration) -> Self {
        self.max_micro_budget = budget;
        self
    }

    pub fn with_initial_gap(mut self, gap: f64) -> Self {
        self.initial_gap = gap;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.initial_micro_budget.is_zero() {
            return Err("initial_micro_budget must be positive".into());
        }
        if self.max_micro_budget < self.initial_micro_budget {
            return Err("max_micro_budget must be at least initial_micro_budget".into());
        }
        if !(0.0..1.0).contains(&self.initial_gap) {
            return Err("initial_gap must be in [0, 1)".into());
        }
        if self.gap_floor < 0.0 || self.small_improvement < 0.0 {
            return Err("gap_floor and small_improvement must be non-negative".into());
        }
        Ok(())
    }
}

/// Trades exactness for throughput while the search is young.
///
/// The micro budget doubles (up to the cap) whenever a call finishes in
/// under half of it or hits its time limit. The gap halves whenever a call
/// is fast or the density barely moved, and becomes exactly zero once it
/// falls below the floor.
#[derive(Debug, Clone)]
pub struct AdaptiveControl {
    config: AdaptiveConfig,
    micro_budget: Duration,
    gap: f64,
}

impl AdaptiveControl {
    pub fn new(config: &AdaptiveConfig) -> Self {
        let mut control = Self {
            config: config.clone(),
            micro_budget: config.initial_micro_budget,
            gap: config.initial_gap,
        };
        control.snap_gap();
        control
    }

    pub fn micro_budget(&self) -> Duration {
        self.micro_budget
    }

    pub fn gap(&self) -> f64 {
        self.gap
    }

    /// Feeds back one call: its wall time, whether it was cut short, and the
    /// relative density improvement it produced.
    pub fn record(&mut self, elapsed: Duration, timed_out: bool, improvement: f64) {
        let fast = elapsed < self.micro_budget / 2;
        if fast || timed_out {
            self.micro_budget = (self.micro_budget * 2).min(self.config.max_micro_budget);
        }
        if fast || improvement < self.config.small_improvement {
            self.gap *= 0.5;
            self.snap_gap();
        }
    }

    /// Forces exact solves from now on.
    pub fn tighten(&mut self) {
        self.gap = 0.0;
    }

    fn snap_gap(&mut self) {
        if self.gap < self.config.gap_floor {
            self.gap = 0.0;
        }
    }
}
