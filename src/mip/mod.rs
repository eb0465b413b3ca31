//! Exact sub-solver abstraction.
//!
//! Every parametric iteration asks a backend to maximize a linear objective
//! over binary order/aisle selections subject to the wave rows plus a few
//! extra rows (density cut, neighbourhood). This module defines that
//! contract and ships two backends.
//!
//! # Key Components
//!
//! - **Formulation**: [`WaveFormulation`], the base rows built once per run
//! - **Request/Response**: [`SolveRequest`], [`SolveResponse`], [`SolveStatus`]
//! - **Backends**: [`SubSolver`] trait, [`GoodLpSolver`] (`good_lp` + `microlp`),
//!   [`EnumerationSolver`] (exhaustive, for tiny instances)
//!
//! # References
//!
//! Charnes & Cooper (1962), "Programming with linear fractional functionals"

mod backend;
mod enumeration;
mod model;
mod solver;

pub use backend::GoodLpSolver;
pub use enumeration::EnumerationSolver;
pub use model::{
    LinearConstraint, LinearObjective, LinearProgram, LpOutcome, LpRow, RowKind, Sense,
    WaveFormulation,
};
pub use solver::{CallBudget, SolveRequest, SolveResponse, SolveStatus, SubSolver};
