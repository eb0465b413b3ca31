//! Local search repair.
//!
//! Cheap improvement of a feasible wave without touching its aisles: first
//! fill leftover stock with unselected orders, then try to swap each
//! selected order for a larger unselected one that the freed stock covers.

mod local_search;

pub use local_search::LocalSearch;
