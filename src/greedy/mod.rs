//! Construction heuristics.
//!
//! - **Greedy Fill**: sweep aisles ranked by an [`AisleRule`] and admit every
//!   order the opened stock already covers; keep the densest prefix.
//! - **Greedy Covering**: for single-unit orders, repeatedly open the aisle
//!   serving the most pending orders, with incremental rescoring.
//!
//! Both return a result only when it beats the incoming density.

mod covering;
mod fill;
mod rules;

pub use covering::GreedyCovering;
pub use fill::GreedyFill;
pub use rules::{rank, AisleRule, DistinctItems, TotalStock};
