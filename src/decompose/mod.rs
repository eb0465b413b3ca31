//! Decomposition controller.
//!
//! Orders demanding a single unit behave very differently from general
//! orders: covering them is a pure set-cover question. The controller
//! solves both classes on their own (unit orders additionally seeded by
//! Greedy Covering), keeps the denser wave, and finishes with a full pass
//! on the whole instance warm-started from it. A hard wall-clock limit
//! bounds the run; the best incumbent is always returned.

mod config;
mod solver;
mod types;

pub use config::WaveConfig;
pub use solver::WaveSolver;
pub use types::{RunSummary, WaveResult};
