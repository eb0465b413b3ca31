//! Sub-solver interface: request, response and the trait backends implement.

use std::time::{Duration, Instant};

use super::model::{LinearConstraint, LinearObjective, LinearProgram, LpOutcome, WaveFormulation};
use crate::deadline::Deadline;
use crate::model::Wave;

/// Tolerance used when checking rows against integral selections.
pub(crate) const ROW_TOLERANCE: f64 = 1e-6;

/// Status of a sub-solver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Proven optimal.
    Optimal,
    /// Feasible and within the requested relative gap.
    FeasibleWithinGap,
    /// Budget exhausted; the response may still carry the best assignment found.
    TimeLimit,
    /// No selection satisfies the rows.
    Infeasible,
}

/// Time allowances for a single call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallBudget {
    /// Hard cap on this call.
    pub time_limit: Option<Duration>,
    /// Once this much time has passed, a call that already holds an
    /// assignment worth more than `abort_above` may stop early.
    pub micro_budget: Option<Duration>,
    pub abort_above: f64,
}

impl Default for CallBudget {
    fn default() -> Self {
        Self {
            time_limit: None,
            micro_budget: None,
            abort_above: f64::INFINITY,
        }
    }
}

/// One sub-problem: maximize `objective` over the formulation rows plus
/// `extra` rows.
#[derive(Debug, Clone)]
pub struct SolveRequest<'a> {
    pub formulation: &'a WaveFormulation<'a>,
    pub objective: LinearObjective,
    pub extra: Vec<LinearConstraint>,
    /// Relative optimality gap in `[0, 1)`.
    pub gap_tolerance: f64,
    pub budget: CallBudget,
    pub warm_start: Option<&'a Wave>,
    pub deadline: &'a Deadline,
}

impl<'a> SolveRequest<'a> {
    pub fn new(
        formulation: &'a WaveFormulation<'a>,
        objective: LinearObjective,
        deadline: &'a Deadline,
    ) -> Self {
        Self {
            formulation,
            objective,
            extra: Vec::new(),
            gap_tolerance: 0.0,
            budget: CallBudget::default(),
            warm_start: None,
            deadline,
        }
    }

    pub fn with_constraint(mut self, row: LinearConstraint) -> Self {
        self.extra.push(row);
        self
    }

    pub fn with_gap(mut self, gap: f64) -> Self {
        self.gap_tolerance = gap;
        self
    }

    pub fn with_budget(mut self, budget: CallBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_warm_start(mut self, wave: &'a Wave) -> Self {
        self.warm_start = Some(wave);
        self
    }

    /// Whether the wave satisfies the base rows and every extra row.
    pub fn admits(&self, wave: &Wave) -> bool {
        self.formulation.admits(wave, ROW_TOLERANCE)
            && self
                .extra
                .iter()
                .all(|row| row.is_satisfied(wave, ROW_TOLERANCE))
    }

    /// Objective value of the wave if it is admissible.
    pub fn evaluate(&self, wave: &Wave) -> Option<f64> {
        self.admits(wave).then(|| self.objective.value(wave))
    }

    /// Polled by backends while searching.
    ///
    /// True once the run deadline has passed, once `time_limit` has elapsed
    /// since `started`, or once the micro budget has elapsed while the best
    /// value held by the call exceeds `abort_above`.
    pub fn should_stop(&self, started: Instant, best: Option<f64>) -> bool {
        if self.deadline.expired() {
            return true;
        }
        let elapsed = started.elapsed();
        if self.budget.time_limit.is_some_and(|limit| elapsed >= limit) {
            return true;
        }
        match (self.budget.micro_budget, best) {
            (Some(micro), Some(value)) => elapsed >= micro && value > self.budget.abort_above,
            _ => false,
        }
    }
}

/// Outcome of a sub-solver call.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResponse {
    pub status: SolveStatus,
    pub objective_value: Option<f64>,
    pub assignment: Option<Wave>,
    /// Proven upper bound on the sub-problem optimum, when known.
    pub best_bound: Option<f64>,
}

impl SolveResponse {
    pub fn optimal(assignment: Wave, value: f64) -> Self {
        Self {
            status: SolveStatus::Optimal,
            objective_value: Some(value),
            assignment: Some(assignment),
            best_bound: Some(value),
        }
    }

    /// Feasible assignment whose value is within the requested gap of
    /// `bound`.
    pub fn within_gap(assignment: Wave, value: f64, bound: f64) -> Self {
        Self {
            status: SolveStatus::FeasibleWithinGap,
            objective_value: Some(value),
            assignment: Some(assignment),
            best_bound: Some(bound),
        }
    }

    pub fn infeasible() -> Self {
        Self {
            status: SolveStatus::Infeasible,
            objective_value: None,
            assignment: None,
            best_bound: None,
        }
    }

    /// Budget ran out; carries the best assignment seen, if any.
    pub fn time_limit(best: Option<(Wave, f64)>) -> Self {
        let (assignment, objective_value) = match best {
            Some((wave, value)) => (Some(wave), Some(value)),
            None => (None, None),
        };
        Self {
            status: SolveStatus::TimeLimit,
            objective_value,
            assignment,
            best_bound: None,
        }
    }

    /// Attaches a proven bound; infinite bounds are dropped.
    pub fn with_bound(mut self, bound: f64) -> Self {
        self.best_bound = bound.is_finite().then_some(bound);
        self
    }

    /// Whether the status proves the value (optimal or gap-bounded).
    pub fn is_proven(&self) -> bool {
        matches!(
            self.status,
            SolveStatus::Optimal | SolveStatus::FeasibleWithinGap
        )
    }
}

/// A backend able to solve wave sub-problems.
///
/// The search core never enumerates selections itself; it only builds
/// requests and interprets responses. Backends may wrap a MILP engine or
/// implement a custom search.
pub trait SubSolver {
    fn name(&self) -> &str;

    /// Maximizes the request objective over binary selections.
    fn solve(&self, request: &SolveRequest<'_>) -> SolveResponse;

    /// Solves a continuous program. Backends without LP support keep the
    /// default.
    fn solve_lp(&self, _program: &LinearProgram, _deadline: &Deadline) -> LpOutcome {
        LpOutcome::Unsupported
    }
}
