//! Problem data, candidate waves and the feasibility predicate.
//!
//! A wave is a set of orders together with a set of aisles. It is feasible
//! when its picked units lie in `[lb, ub]`, the selected aisles stock enough
//! of every item the selected orders demand, and at least one aisle is
//! visited. Its density is units per visited aisle.

mod generator;
mod instance;
mod wave;

pub use generator::InstanceGenerator;
pub use instance::{Aisle, Instance, Order};
pub use wave::{Incumbent, Violation, Wave};
