//! Exhaustive reference backend for tiny instances.

use std::time::Instant;

use tracing::warn;

use super::solver::{SolveRequest, SolveResponse, SubSolver};
use crate::model::Wave;

/// How many combinations pass between two stop checks.
const POLL_INTERVAL: u64 = 4096;

/// Tries every aisle subset against every order subset.
///
/// Useful as ground truth in tests and for instances small enough that
/// `2^(orders + aisles)` stays below a few million. Instances above
/// `max_variables` are refused with a time-limit response carrying the warm
/// start.
#[derive(Debug, Clone)]
pub struct EnumerationSolver {
    pub max_variables: usize,
}

impl Default for EnumerationSolver {
    fn default() -> Self {
        Self { max_variables: 20 }
    }
}

impl EnumerationSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_variables(mut self, max_variables: usize) -> Self {
        self.max_variables = max_variables;
        self
    }
}

fn mask_to_indices(mask: u64, n: usize) -> Vec<usize> {
    (0..n).filter(|&i| mask & (1u64 << i) != 0).collect()
}

impl SubSolver for EnumerationSolver {
    fn name(&self) -> &str {
        "enumeration"
    }

    fn solve(&self, request: &SolveRequest<'_>) -> SolveResponse {
        let started = Instant::now();
        let n_orders = request.formulation.n_orders();
        let n_aisles = request.formulation.n_aisles();

        let mut best: Option<(Wave, f64)> = request
            .warm_start
            .and_then(|w| request.evaluate(w).map(|v| (w.clone(), v)));

        if n_orders + n_aisles > self.max_variables || n_orders + n_aisles >= 63 {
            warn!(
                orders = n_orders,
                aisles = n_aisles,
                cap = self.max_variables,
                "instance too large for enumeration"
            );
            return SolveResponse::time_limit(best);
        }
        if request.deadline.expired() {
            return SolveResponse::time_limit(best);
        }

        let mut visited: u64 = 0;
        for aisle_mask in 1u64..(1u64 << n_aisles) {
            let aisles = mask_to_indices(aisle_mask, n_aisles);
            for order_mask in 0u64..(1u64 << n_orders) {
                visited += 1;
                if visited % POLL_INTERVAL == 0
                    && request.should_stop(started, best.as_ref().map(|b| b.1))
                {
                    return SolveResponse::time_limit(best);
                }
                let wave = Wave::new(mask_to_indices(order_mask, n_orders), aisles.clone());
                if let Some(value) = request.evaluate(&wave) {
                    if best.as_ref().map_or(true, |(_, v)| value > *v) {
                        best = Some((wave, value));
                    }
                }
            }
        }

        match best {
            Some((wave, value)) => SolveResponse::optimal(wave, value),
            None => SolveResponse::infeasible(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::Deadline;
    use crate::mip::{LinearObjective, SolveStatus, WaveFormulation};
    use crate::model::{Aisle, Instance, Order};
    use std::time::Duration;

    fn instance() -> Instance {
        Instance::new(
            1,
            vec![Order::new([(0, 1)]), Order::new([(0, 1)])],
            vec![Aisle::new([(0, 2)]), Aisle::new([(0, 1)])],
            0,
            4,
        )
        .unwrap()
    }

    #[test]
    fn test_finds_optimum() {
        let inst = instance();
        let f = WaveFormulation::new(&inst);
        let deadline = Deadline::unbounded();
        let request = SolveRequest::new(&f, LinearObjective::parametric(&inst, 1.0), &deadline);
        let response = EnumerationSolver::new().solve(&request);
        assert_eq!(response.status, SolveStatus::Optimal);
        assert_eq!(response.objective_value, Some(1.0));
        assert_eq!(response.assignment, Some(Wave::new(vec![0, 1], vec![0])));
    }

    #[test]
    fn test_reports_infeasible() {
        let inst = instance();
        let f = WaveFormulation::new(&inst);
        let deadline = Deadline::unbounded();
        let request = SolveRequest::new(&f, LinearObjective::parametric(&inst, 5.0), &deadline)
            .with_constraint(f.density_cut(5.0));
        let response = EnumerationSolver::new().solve(&request);
        assert_eq!(response.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_respects_variable_cap() {
        let inst = instance();
        let f = WaveFormulation::new(&inst);
        let deadline = Deadline::unbounded();
        let warm = Wave::new(vec![0], vec![1]);
        let request = SolveRequest::new(&f, LinearObjective::parametric(&inst, 1.0), &deadline)
            .with_warm_start(&warm);
        let response = EnumerationSolver::new().with_max_variables(2).solve(&request);
        assert_eq!(response.status, SolveStatus::TimeLimit);
        assert_eq!(response.assignment, Some(warm));
        assert_eq!(response.objective_value, Some(0.0));
    }

    #[test]
    fn test_expired_deadline_keeps_warm_start() {
        let inst = Instance::new(
            1,
            (0..10).map(|_| Order::new([(0, 1)])).collect(),
            (0..6).map(|_| Aisle::new([(0, 2)])).collect(),
            0,
            40,
        )
        .unwrap();
        let f = WaveFormulation::new(&inst);
        let deadline = Deadline::after(Duration::ZERO);
        let warm = Wave::new(vec![0], vec![0]);
        let request = SolveRequest::new(&f, LinearObjective::parametric(&inst, 0.5), &deadline)
            .with_warm_start(&warm);
        let response = EnumerationSolver::new().solve(&request);
        assert_eq!(response.status, SolveStatus::TimeLimit);
        assert_eq!(response.assignment, Some(warm));
    }
}
