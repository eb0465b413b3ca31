//! Bounds bracketing the optimal density.
//!
//! - [`density_prefix_bound`]: combinatorial, no solver needed
//! - [`relaxation_bound`]: Charnes-Cooper linearization of the LP relaxation
//! - [`LagrangianBound`]: upper bound on the parametric sub-problem at a
//!   fixed price, used to skip sub-solver calls that cannot improve
//!
//! # References
//!
//! - Charnes & Cooper (1962), "Programming with linear fractional functionals"
//! - Fisher (1981), "The Lagrangian relaxation method for solving integer
//!   programming problems"

mod bracket;
mod lagrangian;
mod prefix;
mod relaxation;

pub use bracket::Bracket;
pub use lagrangian::{LagrangianBound, LagrangianConfig};
pub use prefix::density_prefix_bound;
pub use relaxation::{charnes_cooper, relaxation_bound};
