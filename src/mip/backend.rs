//! `good_lp` backend: LP-based branch and bound on the pure-Rust `microlp`
//! engine.
//!
//! Every node solves the continuous relaxation of the request with the
//! node's fixings as variable bounds. Between nodes the search polls the
//! request (deadline, call time limit, micro-budget abort), so a call
//! overruns its budget by at most one LP solve.

use std::ops::Range;
use std::time::Instant;

use good_lp::solvers::microlp::microlp;
use good_lp::{variable, variables, Expression, ResolutionError, Solution, SolverModel, Variable};
use tracing::{debug, warn};

use super::model::{LinearConstraint, LinearProgram, LpOutcome, Sense};
use super::solver::{SolveRequest, SolveResponse, SubSolver, ROW_TOLERANCE};
use crate::deadline::Deadline;
use crate::model::Wave;

/// Distance from 0 or 1 under which a relaxed value counts as integral.
const INTEGRALITY: f64 = 1e-6;

fn row_expression(row: &LinearConstraint, x: &[Variable], y: &[Variable]) -> Expression {
    let orders = row.orders.iter().map(|&(o, c)| (x[o], c));
    let aisles = row.aisles.iter().map(|&(a, c)| (y[a], c));
    orders
        .chain(aisles)
        .fold(Expression::from(0.0), |acc, (v, c)| acc + c * v)
}

fn bind(expr: Expression, sense: Sense, rhs: f64) -> good_lp::Constraint {
    match sense {
        Sense::Le => expr.leq(rhs),
        Sense::Ge => expr.geq(rhs),
        Sense::Eq => expr.eq(rhs),
    }
}

fn is_fractional(v: f64) -> bool {
    v > INTEGRALITY && v < 1.0 - INTEGRALITY
}

/// Index in `range` whose value is closest to 1/2, if any is fractional.
fn most_fractional(values: &[f64], range: Range<usize>) -> Option<usize> {
    range
        .filter(|&j| is_fractional(values[j]))
        .min_by(|&a, &b| (values[a] - 0.5).abs().total_cmp(&(values[b] - 0.5).abs()))
}

/// An open subtree: fixed variables (orders first, then aisles) and the
/// relaxation bound inherited from its parent.
#[derive(Debug, Clone)]
struct Node {
    fixed: Vec<Option<bool>>,
    bound: f64,
}

enum Relaxed {
    Solved { values: Vec<f64>, bound: f64 },
    Infeasible,
    Failed,
}

fn relax(request: &SolveRequest<'_>, fixed: &[Option<bool>]) -> Relaxed {
    let n_orders = request.formulation.n_orders();
    let mut vars = variables!();
    let cols: Vec<Variable> = fixed
        .iter()
        .map(|f| {
            let (lo, hi) = match f {
                Some(true) => (1.0, 1.0),
                Some(false) => (0.0, 0.0),
                None => (0.0, 1.0),
            };
            vars.add(variable().min(lo).max(hi))
        })
        .collect();
    let (x, y) = cols.split_at(n_orders);

    let coefficients: Vec<f64> = request
        .objective
        .orders
        .iter()
        .chain(&request.objective.aisles)
        .copied()
        .collect();
    let objective = cols
        .iter()
        .zip(&coefficients)
        .fold(Expression::from(0.0), |acc, (&v, &c)| acc + c * v);

    let mut problem = vars.maximise(objective).using(microlp);
    let rows = request
        .formulation
        .rows()
        .iter()
        .map(|(_, row)| row)
        .chain(request.extra.iter());
    for row in rows {
        problem.add_constraint(bind(row_expression(row, x, y), row.sense, row.rhs));
    }

    match problem.solve() {
        Ok(solution) => {
            let values: Vec<f64> = cols.iter().map(|&v| solution.value(v)).collect();
            let bound = values.iter().zip(&coefficients).map(|(v, c)| v * c).sum();
            Relaxed::Solved { values, bound }
        }
        Err(ResolutionError::Infeasible) => Relaxed::Infeasible,
        Err(err) => {
            warn!(error = %err, "node relaxation failed");
            Relaxed::Failed
        }
    }
}

/// Rounds a relaxed point to integral waves and keeps the best admissible
/// one.
///
/// Besides the plain rounding, aisles above a threshold are opened and
/// orders are packed into their stock in decreasing relaxed value.
fn round(request: &SolveRequest<'_>, values: &[f64]) -> Option<(Wave, f64)> {
    let instance = request.formulation.instance();
    let (x, y) = values.split_at(instance.n_orders());

    let plain = Wave::new(
        (0..x.len()).filter(|&o| x[o] > 0.5).collect(),
        (0..y.len()).filter(|&a| y[a] > 0.5).collect(),
    );
    let mut candidates = vec![plain];

    let mut by_value: Vec<usize> = (0..x.len()).collect();
    by_value.sort_by(|&a, &b| x[b].total_cmp(&x[a]));
    for threshold in [0.5, INTEGRALITY] {
        let aisles: Vec<usize> = (0..y.len()).filter(|&a| y[a] > threshold).collect();
        if aisles.is_empty() {
            continue;
        }
        let mut unused = vec![0i64; instance.n_items()];
        for &a in &aisles {
            for &(item, qty) in instance.aisles()[a].lines() {
                unused[item] += i64::from(qty);
            }
        }
        let mut slack = instance.upper_bound();
        let mut orders = Vec::new();
        for &o in &by_value {
            let order = &instance.orders()[o];
            let fits = order.size() <= slack
                && order
                    .lines()
                    .iter()
                    .all(|&(item, qty)| i64::from(qty) <= unused[item]);
            if fits {
                for &(item, qty) in order.lines() {
                    unused[item] -= i64::from(qty);
                }
                slack -= order.size();
                orders.push(o);
            }
        }
        candidates.push(Wave::new(orders, aisles));
    }

    candidates
        .into_iter()
        .filter_map(|wave| request.evaluate(&wave).map(|value| (wave, value)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

/// Whether a node with relaxation `bound` can be dropped against the
/// incumbent. Nodes dropped only by the relative gap raise `gap_bound`.
fn prune(bound: f64, incumbent: Option<f64>, gap: f64, gap_bound: &mut f64) -> bool {
    let Some(value) = incumbent else {
        return false;
    };
    if bound <= value + ROW_TOLERANCE {
        return true;
    }
    if bound <= value + gap * value.abs().max(1.0) {
        *gap_bound = gap_bound.max(bound);
        return true;
    }
    false
}

/// Solves sub-problems by branch and bound over `microlp` relaxations, and
/// continuous programs directly.
///
/// Nodes are explored depth first, branching on the most fractional aisle
/// (orders once all aisles are integral) and diving towards the rounded
/// value. A node is pruned once its bound is within the request's relative
/// gap of the incumbent; if any node was pruned only by the gap, the call
/// reports `FeasibleWithinGap` with the largest such bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpSolver;

impl GoodLpSolver {
    pub fn new() -> Self {
        Self
    }
}

impl SubSolver for GoodLpSolver {
    fn name(&self) -> &str {
        "good_lp/microlp"
    }

    fn solve(&self, request: &SolveRequest<'_>) -> SolveResponse {
        let started = Instant::now();
        let n_orders = request.formulation.n_orders();
        let n_vars = n_orders + request.formulation.n_aisles();

        let mut best: Option<(Wave, f64)> = request
            .warm_start
            .and_then(|w| request.evaluate(w).map(|v| (w.clone(), v)));
        let mut open = vec![Node {
            fixed: vec![None; n_vars],
            bound: f64::INFINITY,
        }];
        let mut gap_bound = f64::NEG_INFINITY;
        let mut unresolved = false;
        let mut nodes = 0usize;

        while let Some(node) = open.pop() {
            let incumbent = best.as_ref().map(|b| b.1);
            if request.should_stop(started, incumbent) {
                let bound = open
                    .iter()
                    .map(|n| n.bound)
                    .fold(node.bound.max(gap_bound), f64::max);
                debug!(nodes, bound, "branch and bound stopped");
                return SolveResponse::time_limit(best).with_bound(bound);
            }
            if prune(node.bound, incumbent, request.gap_tolerance, &mut gap_bound) {
                continue;
            }

            nodes += 1;
            let (values, bound) = match relax(request, &node.fixed) {
                Relaxed::Solved { values, bound } => (values, bound.min(node.bound)),
                Relaxed::Infeasible => continue,
                Relaxed::Failed => {
                    unresolved = true;
                    continue;
                }
            };

            if let Some((wave, value)) = round(request, &values) {
                if best.as_ref().map_or(true, |b| value > b.1) {
                    best = Some((wave, value));
                }
            }
            let incumbent = best.as_ref().map(|b| b.1);
            if prune(bound, incumbent, request.gap_tolerance, &mut gap_bound) {
                continue;
            }

            let Some(j) = most_fractional(&values, n_orders..n_vars)
                .or_else(|| most_fractional(&values, 0..n_orders))
            else {
                // Integral but not admissible after rounding; nothing to split on.
                unresolved = true;
                continue;
            };
            let toward = values[j] >= 0.5;
            for side in [!toward, toward] {
                let mut fixed = node.fixed.clone();
                fixed[j] = Some(side);
                open.push(Node { fixed, bound });
            }
        }

        debug!(nodes, unresolved, gap_bound, "branch and bound finished");
        match best {
            best if unresolved => SolveResponse::time_limit(best),
            None => SolveResponse::infeasible(),
            Some((wave, value)) if gap_bound > value + ROW_TOLERANCE => {
                SolveResponse::within_gap(wave, value, gap_bound)
            }
            Some((wave, value)) => SolveResponse::optimal(wave, value),
        }
    }

    fn solve_lp(&self, program: &LinearProgram, deadline: &Deadline) -> LpOutcome {
        if deadline.expired() {
            return LpOutcome::Unsupported;
        }
        let mut vars = variables!();
        let cols: Vec<Variable> = program
            .bounds
            .iter()
            .map(|&(lo, hi)| {
                let def = variable().min(lo);
                if hi.is_finite() {
                    vars.add(def.max(hi))
                } else {
                    vars.add(def)
                }
            })
            .collect();
        let objective = cols
            .iter()
            .zip(&program.objective)
            .fold(Expression::from(0.0), |acc, (&v, &c)| acc + c * v);

        let mut problem = vars.maximise(objective).using(microlp);
        for row in &program.rows {
            let expr = row
                .terms
                .iter()
                .fold(Expression::from(0.0), |acc, &(j, c)| acc + c * cols[j]);
            problem.add_constraint(bind(expr, row.sense, row.rhs));
        }

        match problem.solve() {
            Ok(solution) => {
                let value = cols
                    .iter()
                    .zip(&program.objective)
                    .map(|(&v, &c)| c * solution.value(v))
                    .sum();
                debug!(value, "relaxation solved");
                LpOutcome::Optimal(value)
            }
            Err(ResolutionError::Infeasible) => LpOutcome::Infeasible,
            Err(ResolutionError::Unbounded) => LpOutcome::Unbounded,
            Err(err) => {
                warn!(error = %err, "microlp relaxation failed");
                LpOutcome::Unsupported
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mip::{CallBudget, LinearObjective, LpRow, SolveStatus, WaveFormulation};
    use crate::model::{Aisle, Instance, Order};
    use std::time::Duration;

    // Either order alone fits under ub = 3, both do not; the relaxation
    // picks 1.5 orders for a bound of 3 against an optimum of 2.
    fn half_relaxed() -> Instance {
        Instance::new(
            1,
            vec![Order::new([(0, 2)]), Order::new([(0, 2)])],
            vec![Aisle::new([(0, 4)])],
            0,
            3,
        )
        .unwrap()
    }

    #[test]
    fn test_solves_parametric_subproblem() {
        let inst = Instance::new(
            1,
            vec![Order::new([(0, 1)]), Order::new([(0, 1)])],
            vec![Aisle::new([(0, 2)]), Aisle::new([(0, 1)])],
            0,
            4,
        )
        .unwrap();
        let f = WaveFormulation::new(&inst);
        let deadline = Deadline::unbounded();
        let request = SolveRequest::new(&f, LinearObjective::parametric(&inst, 1.0), &deadline);
        let response = GoodLpSolver::new().solve(&request);
        assert_eq!(response.status, SolveStatus::Optimal);
        let value = response.objective_value.unwrap();
        assert!((value - 1.0).abs() < 1e-6, "value = {value}");
        assert!(inst.is_feasible(response.assignment.as_ref().unwrap()));
    }

    #[test]
    fn test_infeasible_cut() {
        let inst = Instance::new(
            1,
            vec![Order::new([(0, 1)])],
            vec![Aisle::new([(0, 1)])],
            0,
            4,
        )
        .unwrap();
        let f = WaveFormulation::new(&inst);
        let deadline = Deadline::unbounded();
        let request = SolveRequest::new(&f, LinearObjective::parametric(&inst, 3.0), &deadline)
            .with_constraint(f.density_cut(3.0));
        let response = GoodLpSolver::new().solve(&request);
        assert_eq!(response.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_gap_prune_reports_bound() {
        let inst = half_relaxed();
        let f = WaveFormulation::new(&inst);
        let deadline = Deadline::unbounded();
        let start = Wave::new(vec![0], vec![0]);

        let request = SolveRequest::new(&f, LinearObjective::units(&inst), &deadline)
            .with_warm_start(&start)
            .with_gap(0.6);
        let response = GoodLpSolver::new().solve(&request);
        assert_eq!(response.status, SolveStatus::FeasibleWithinGap);
        assert_eq!(response.objective_value, Some(2.0));
        let bound = response.best_bound.unwrap();
        assert!((bound - 3.0).abs() < 1e-6, "bound = {bound}");

        let exact = SolveRequest::new(&f, LinearObjective::units(&inst), &deadline)
            .with_warm_start(&start);
        let response = GoodLpSolver::new().solve(&exact);
        assert_eq!(response.status, SolveStatus::Optimal);
        assert_eq!(response.objective_value, Some(2.0));
        assert!(inst.is_feasible(response.assignment.as_ref().unwrap()));
    }

    #[test]
    fn test_expired_deadline_returns_warm_start() {
        let inst = half_relaxed();
        let f = WaveFormulation::new(&inst);
        let deadline = Deadline::after(Duration::ZERO);
        let start = Wave::new(vec![1], vec![0]);
        let request = SolveRequest::new(&f, LinearObjective::units(&inst), &deadline)
            .with_warm_start(&start);
        let response = GoodLpSolver::new().solve(&request);
        assert_eq!(response.status, SolveStatus::TimeLimit);
        assert_eq!(response.assignment, Some(start));
        assert_eq!(response.objective_value, Some(2.0));

        let cold = SolveRequest::new(&f, LinearObjective::units(&inst), &deadline);
        let response = GoodLpSolver::new().solve(&cold);
        assert_eq!(response.status, SolveStatus::TimeLimit);
        assert!(response.assignment.is_none());
        assert!(response.best_bound.is_none());
    }

    #[test]
    fn test_micro_budget_abort() {
        let inst = half_relaxed();
        let f = WaveFormulation::new(&inst);
        let deadline = Deadline::unbounded();
        let start = Wave::new(vec![0], vec![0]);
        let budget = |abort_above| CallBudget {
            time_limit: None,
            micro_budget: Some(Duration::ZERO),
            abort_above,
        };

        let request = SolveRequest::new(&f, LinearObjective::units(&inst), &deadline)
            .with_warm_start(&start)
            .with_budget(budget(0.5));
        let response = GoodLpSolver::new().solve(&request);
        assert_eq!(response.status, SolveStatus::TimeLimit);
        assert_eq!(response.assignment, Some(start.clone()));

        // The held value never clears the threshold, so the search completes.
        let request = SolveRequest::new(&f, LinearObjective::units(&inst), &deadline)
            .with_warm_start(&start)
            .with_budget(budget(5.0));
        let response = GoodLpSolver::new().solve(&request);
        assert_eq!(response.status, SolveStatus::Optimal);
    }

    #[test]
    fn test_solves_continuous_program() {
        // max x + y s.t. x + 2y <= 4, x <= 3
        let program = LinearProgram {
            bounds: vec![(0.0, 3.0), (0.0, f64::INFINITY)],
            objective: vec![1.0, 1.0],
            rows: vec![LpRow {
                terms: vec![(0, 1.0), (1, 2.0)],
                sense: Sense::Le,
                rhs: 4.0,
            }],
        };
        match GoodLpSolver::new().solve_lp(&program, &Deadline::unbounded()) {
            LpOutcome::Optimal(v) => assert!((v - 3.5).abs() < 1e-6, "v = {v}"),
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
