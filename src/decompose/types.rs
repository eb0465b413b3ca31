//! Run results.

use crate::bounds::Bracket;
use crate::model::Wave;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Compact per-run record for external logging.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunSummary {
    pub orders: usize,
    pub aisles: usize,
    pub items: usize,
    pub feasible: bool,
    pub density: f64,
    pub elapsed_secs: f64,
    pub iterations: usize,
}

/// Result of [`WaveSolver::solve`](super::WaveSolver::solve).
#[derive(Debug, Clone)]
pub struct WaveResult {
    /// The selected wave; always feasible.
    pub wave: Wave,

    pub density: f64,

    /// Whether the final pass proved optimality.
    pub converged: bool,

    /// Whether the time limit or cancellation cut the run short.
    pub cancelled: bool,

    /// Total parametric iterations across partitions and the final pass.
    pub iterations: usize,

    /// Bracket on the optimal density from the final pass.
    pub bracket: Bracket,

    /// Incumbent density per iteration of the final pass.
    pub density_history: Vec<f64>,

    pub summary: RunSummary,
}
