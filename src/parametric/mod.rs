//! Parametric optimization core.
//!
//! Maximizing the ratio `units(S) / aisles(S)` is reduced to a sequence of
//! linear sub-problems `f(λ) = max units(S) - λ·aisles(S)`. `f` is
//! piecewise-linear and strictly decreasing with its root at the optimal
//! density, so the search either jumps to the density of each new solution
//! (Newton/Dinkelbach) or bisects a bracket built from the bounding layer.
//!
//! Every call is warm-started from the incumbent, constrained by a density
//! cut at the current price, and optionally restricted to an aisle
//! neighbourhood of the incumbent on alternate iterations. An adaptive
//! controller loosens the optimality gap and shortens the per-call budget
//! early on, then tightens both as the search settles. An optional sweep
//! over fixed aisle counts adds a seed before the first call.
//!
//! # References
//!
//! - Dinkelbach (1967), "On nonlinear fractional programming"
//! - Schaible (1976), "Fractional programming. II, On Dinkelbach's algorithm"

mod adaptive;
mod config;
mod runner;
mod sweep;

pub use adaptive::{AdaptiveConfig, AdaptiveControl};
pub use config::{ParametricConfig, PriceUpdate};
pub use runner::{ParametricResult, ParametricRunner};
pub use sweep::{AisleSweep, SweepMode};
