//! Parametric search loop.

use std::time::Instant;

use tracing::{debug, info};

use super::adaptive::AdaptiveControl;
use super::config::{ParametricConfig, PriceUpdate};
use crate::bounds::{Bracket, LagrangianBound};
use crate::deadline::Deadline;
use crate::error::WaveError;
use crate::greedy::GreedyFill;
use crate::mip::{
    CallBudget, LinearObjective, SolveRequest, SolveResponse, SolveStatus, SubSolver,
    WaveFormulation,
};
use crate::model::{Incumbent, Instance};
use crate::repair::LocalSearch;

/// Result of a parametric run.
#[derive(Debug, Clone)]
pub struct ParametricResult {
    /// Densest feasible wave found, if any.
    pub best: Option<Incumbent>,

    /// Sub-solver calls plus pruned iterations.
    pub iterations: usize,

    /// Whether optimality of `best` was proven (or infeasibility, when
    /// `best` is `None`).
    pub converged: bool,

    /// Whether the deadline stopped the run.
    pub cancelled: bool,

    /// Final bracket on the optimal density.
    pub bracket: Bracket,

    /// Incumbent density after each iteration that had an incumbent.
    pub density_history: Vec<f64>,
}

/// What one iteration concluded.
enum Step {
    Continue,
    Converged,
}

/// Executes the parametric (Dinkelbach or bisection) search.
///
/// At price `λ` the sub-problem `max units(S) - λ·aisles(S)` is linear in
/// the selection. Its optimum is positive exactly when some wave is denser
/// than `λ`, so the search drives `λ` to the root of that function.
pub struct ParametricRunner;

struct Search<'r, 'f, S: SubSolver + ?Sized> {
    formulation: &'r WaveFormulation<'f>,
    instance: &'f Instance,
    solver: &'r S,
    deadline: &'r Deadline,
    config: &'r ParametricConfig,
    repair: LocalSearch,
    control: AdaptiveControl,
    best: Option<Incumbent>,
    bracket: Bracket,
}

impl ParametricRunner {
    /// Runs the search from an optional seed wave.
    ///
    /// Greedy Fill and local search improve the seed before the first
    /// sub-solver call. The best incumbent is returned even when the
    /// deadline interrupts the loop.
    pub fn run<S: SubSolver + ?Sized>(
        formulation: &WaveFormulation<'_>,
        solver: &S,
        seed: Option<Incumbent>,
        deadline: &Deadline,
        config: &ParametricConfig,
    ) -> Result<ParametricResult, WaveError> {
        config.validate().map_err(WaveError::InvalidConfig)?;
        let instance = formulation.instance();
        let eps = config.epsilon;

        if instance.n_aisles() == 0 {
            return Ok(ParametricResult {
                best: None,
                iterations: 0,
                converged: true,
                cancelled: false,
                bracket: Bracket::new(0.0, 0.0),
                density_history: Vec::new(),
            });
        }

        let mut best = seed.filter(|s| instance.is_feasible(&s.wave));
        if let Some(greedy) = GreedyFill::default().solve(instance, best.as_ref().map(|b| b.density)) {
            Incumbent::offer(&mut best, greedy, eps);
        }
        if let Some(sweep) = &config.aisle_sweep {
            if let Some(found) = sweep.run(formulation, solver, deadline, eps) {
                Incumbent::offer(&mut best, found, eps);
            }
        }
        let repair = LocalSearch { epsilon: eps };
        if config.local_search {
            if let Some(inc) = &best {
                if let Some(better) = repair.repair(instance, &inc.wave, inc.density) {
                    Incumbent::offer(&mut best, better, eps);
                }
            }
        }

        let lower = best.as_ref().map_or(0.0, |b| b.density);
        let bracket = Bracket::initial(formulation, solver, lower, deadline);
        let mut search = Search {
            formulation,
            instance,
            solver,
            deadline,
            config,
            repair,
            control: AdaptiveControl::new(&config.adaptive),
            best,
            bracket,
        };

        let mut iterations = 0;
        let mut converged = search.best.is_some() && search.bracket.is_closed(eps);
        let mut density_history = Vec::new();

        while !converged && iterations < config.max_iterations && !deadline.expired() {
            let step = search.iterate(iterations);
            iterations += 1;
            if let Some(inc) = &search.best {
                density_history.push(inc.density);
            }
            converged = matches!(step, Step::Converged)
                || (search.best.is_some() && search.bracket.is_closed(eps));
        }

        let cancelled = !converged && deadline.expired();
        info!(
            iterations,
            converged,
            cancelled,
            density = Incumbent::density_of(&search.best),
            lo = search.bracket.lo,
            hi = search.bracket.hi,
            solver = solver.name(),
            "parametric search finished"
        );

        Ok(ParametricResult {
            best: search.best,
            iterations,
            converged,
            cancelled,
            bracket: search.bracket,
            density_history,
        })
    }
}

impl<S: SubSolver + ?Sized> Search<'_, '_, S> {
    fn price(&self) -> f64 {
        match self.config.price_update {
            PriceUpdate::Newton => self.best.as_ref().map_or(0.0, |b| b.density),
            PriceUpdate::Bisection => match &self.best {
                Some(_) => self.bracket.midpoint(),
                None => self.bracket.lo,
            },
        }
    }

    fn iterate(&mut self, iteration: usize) -> Step {
        let eps = self.config.epsilon;
        let price = self.price();

        if self.config.lagrangian_pruning && self.best.is_some() {
            let bound = LagrangianBound::compute(self.formulation, price, &self.config.lagrangian);
            if bound <= eps {
                self.bracket.lower_hi(price + bound.max(0.0));
                debug!(iteration, price, bound, "pruned by lagrangian bound");
                return match self.config.price_update {
                    PriceUpdate::Newton => Step::Converged,
                    PriceUpdate::Bisection => Step::Continue,
                };
            }
        }

        let restricted = match (self.config.neighborhood_radius, &self.best) {
            (Some(radius), Some(inc)) if iteration % 2 == 1 => {
                Some(self.formulation.neighborhood(&inc.wave, radius))
            }
            _ => None,
        };
        let is_restricted = restricted.is_some();

        let warm = self.best.as_ref().map(|b| b.wave.clone());
        let mut request = SolveRequest::new(
            self.formulation,
            LinearObjective::parametric(self.instance, price),
            self.deadline,
        )
        .with_constraint(self.formulation.density_cut(price))
        .with_gap(self.control.gap())
        .with_budget(CallBudget {
            time_limit: None,
            micro_budget: Some(self.control.micro_budget()),
            abort_above: eps,
        });
        if let Some(row) = restricted {
            request = request.with_constraint(row);
        }
        if let Some(wave) = &warm {
            request = request.with_warm_start(wave);
        }

        let before = Incumbent::density_of(&self.best);
        let started = Instant::now();
        let response = self.solver.solve(&request);
        let elapsed = started.elapsed();

        self.absorb(&response);
        let after = Incumbent::density_of(&self.best);
        let improvement = if before.is_finite() && before > 0.0 {
            (after - before) / before
        } else if after.is_finite() {
            1.0
        } else {
            0.0
        };
        self.control
            .record(elapsed, response.status == SolveStatus::TimeLimit, improvement);

        debug!(
            iteration,
            price,
            status = ?response.status,
            objective = ?response.objective_value,
            density = after,
            lo = self.bracket.lo,
            hi = self.bracket.hi,
            restricted = is_restricted,
            "parametric iteration"
        );

        self.interpret(price, &response, is_restricted)
    }

    /// Merges the response assignment (after repair) into the incumbent.
    ///
    /// Any strictly denser assignment is taken, even by less than epsilon,
    /// so that the Newton price keeps moving.
    fn absorb(&mut self, response: &SolveResponse) {
        let eps = self.config.epsilon;
        let Some(wave) = &response.assignment else {
            return;
        };
        let Some(density) = self.instance.evaluate(wave) else {
            return;
        };
        Incumbent::offer(&mut self.best, Incumbent::new(wave.clone(), density), 0.0);
        if self.config.local_search {
            if let Some(inc) = &self.best {
                if let Some(better) = self.repair.repair(self.instance, &inc.wave, inc.density) {
                    Incumbent::offer(&mut self.best, better, eps);
                }
            }
        }
        if let Some(inc) = &self.best {
            self.bracket.raise_lo(inc.density);
        }
    }

    fn interpret(&mut self, price: f64, response: &SolveResponse, restricted: bool) -> Step {
        let eps = self.config.epsilon;
        let newton = self.config.price_update == PriceUpdate::Newton;

        match response.status {
            SolveStatus::Infeasible if restricted => Step::Continue,
            SolveStatus::Infeasible => {
                // Nothing reaches density `price`.
                self.bracket.lower_hi(price);
                if newton || self.best.is_none() {
                    Step::Converged
                } else {
                    Step::Continue
                }
            }
            SolveStatus::TimeLimit => Step::Continue,
            SolveStatus::Optimal | SolveStatus::FeasibleWithinGap if restricted => Step::Continue,
            SolveStatus::Optimal | SolveStatus::FeasibleWithinGap => {
                let value = response.objective_value.unwrap_or(f64::NEG_INFINITY);
                let bound = response.best_bound.unwrap_or(if response.status == SolveStatus::Optimal {
                    value
                } else {
                    f64::INFINITY
                });
                if bound.is_finite() {
                    self.bracket.lower_hi(price + bound.max(0.0));
                }
                if bound <= eps {
                    return if newton { Step::Converged } else { Step::Continue };
                }
                if newton && value > eps && self.price() <= price {
                    // The assignment is no denser than the incumbent.
                    debug!(price, value, "price stalled");
                    return Step::Converged;
                }
                if value <= eps {
                    // The gap hides whether anything beats `price`.
                    self.control.tighten();
                }
                Step::Continue
            }
        }
    }
}
