//! Wave selection for warehouse order picking.
//!
//! Picks a set of customer orders and a set of aisles (a "wave") that
//! maximizes pick density, the units picked per aisle visited, subject to a
//! band on total units and to every selected order being covered by the
//! selected aisles' stock.
//!
//! - **Model**: [`model::Instance`], [`model::Wave`] and the feasibility check.
//! - **Sub-solver**: [`mip::SubSolver`], the exact backend contract, with
//!   [`mip::GoodLpSolver`] (`good_lp` + `microlp`) and the exhaustive
//!   [`mip::EnumerationSolver`].
//! - **Greedy**: Greedy Fill over pluggable aisle rules and Greedy Covering
//!   for single-unit orders.
//! - **Bounds**: density-prefix, Charnes-Cooper LP relaxation and
//!   Lagrangian bounds.
//! - **Repair**: fill/swap local search on a fixed aisle set.
//! - **Parametric**: Dinkelbach and bisection search over the trial price,
//!   with adaptive time/gap control.
//! - **Decompose**: unit/general partitioning and the top-level
//!   [`WaveSolver`].
//!
//! # Architecture
//!
//! Everything runs on the caller's thread. Long-running calls take a
//! [`Deadline`] carrying the wall-clock budget and an optional shared
//! cancellation flag, polled between iterations and inside sub-solver calls.

pub mod bounds;
pub mod deadline;
pub mod decompose;
pub mod error;
pub mod greedy;
pub mod mip;
pub mod model;
pub mod parametric;
pub mod repair;

pub use deadline::Deadline;
pub use decompose::{RunSummary, WaveConfig, WaveResult, WaveSolver};
pub use error::WaveError;
pub use model::{Aisle, Incumbent, Instance, Order, Violation, Wave};
