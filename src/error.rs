//! Caller-visible errors.

use thiserror::Error;

/// Errors surfaced to callers of [`WaveSolver`](crate::decompose::WaveSolver)
/// and of the instance constructors.
///
/// Infeasibility at a trial price, time limits and backend hiccups are
/// recovered inside the search loop and never reach this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaveError {
    /// Malformed instance data (negative or inverted bounds, unknown item ids,
    /// zero order quantities).
    #[error("invalid instance: {0}")]
    InvalidInstance(String),

    /// A configuration failed its `validate()` check.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The instance admits no wave satisfying the band and coverage
    /// constraints (or nothing was found within the budget).
    #[error("no feasible wave")]
    NoFeasibleWave,
}
