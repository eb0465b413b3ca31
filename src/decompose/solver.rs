//! Decomposition controller and public entry point.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::{debug, info};

use super::config::WaveConfig;
use super::types::{RunSummary, WaveResult};
use crate::deadline::Deadline;
use crate::error::WaveError;
use crate::greedy::{rank, DistinctItems, GreedyCovering};
use crate::mip::{GoodLpSolver, SubSolver, WaveFormulation};
use crate::model::{Incumbent, Instance, Wave};
use crate::parametric::ParametricRunner;

/// Selects the densest feasible wave of an instance.
///
/// # Examples
///
/// ```
/// use u_wavepick::decompose::{WaveConfig, WaveSolver};
/// use u_wavepick::mip::EnumerationSolver;
/// use u_wavepick::model::{Aisle, Instance, Order};
///
/// let instance = Instance::new(
///     1,
///     vec![Order::new([(0, 1)]), Order::new([(0, 1)])],
///     vec![Aisle::new([(0, 2)])],
///     0,
///     4,
/// )
/// .unwrap();
/// let solver = WaveSolver::new(EnumerationSolver::new(), WaveConfig::default());
/// let result = solver.solve(&instance).unwrap();
/// assert_eq!(result.density, 2.0);
/// assert_eq!(result.wave.orders(), &[0, 1]);
/// ```
pub struct WaveSolver<S: SubSolver> {
    solver: S,
    config: WaveConfig,
}

impl Default for WaveSolver<GoodLpSolver> {
    fn default() -> Self {
        Self::new(GoodLpSolver::new(), WaveConfig::default())
    }
}

impl<S: SubSolver> WaveSolver<S> {
    pub fn new(solver: S, config: WaveConfig) -> Self {
        Self { solver, config }
    }

    pub fn config(&self) -> &WaveConfig {
        &self.config
    }

    pub fn solve(&self, instance: &Instance) -> Result<WaveResult, WaveError> {
        self.solve_with_cancel(instance, None)
    }

    /// Solves with an optional cancellation flag.
    ///
    /// # Errors
    ///
    /// [`WaveError::InvalidConfig`] when the configuration fails validation,
    /// [`WaveError::NoFeasibleWave`] when nothing feasible was found.
    pub fn solve_with_cancel(
        &self,
        instance: &Instance,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<WaveResult, WaveError> {
        self.config.validate().map_err(WaveError::InvalidConfig)?;
        let mut deadline = match self.config.time_limit {
            Some(limit) => Deadline::after(limit),
            None => Deadline::unbounded(),
        };
        if let Some(flag) = cancel {
            deadline = deadline.with_cancel(flag);
        }

        if instance.n_aisles() == 0 {
            return Err(WaveError::NoFeasibleWave);
        }

        let eps = self.config.parametric.epsilon;
        let mut iterations = 0;
        let mut seed = if self.config.decomposition {
            self.partition_seed(instance, &deadline, &mut iterations)?
        } else {
            None
        };
        if let Some(share) = self.config.aisle_reduction {
            if let Some(reduced) =
                self.reduced_seed(instance, share, seed.as_ref(), &deadline, &mut iterations)?
            {
                Incumbent::offer(&mut seed, reduced, eps);
            }
        }

        let formulation = WaveFormulation::new(instance);
        let result = ParametricRunner::run(
            &formulation,
            &self.solver,
            seed.clone(),
            &deadline,
            &self.config.parametric,
        )?;
        iterations += result.iterations;

        let mut best = seed;
        if let Some(found) = result.best {
            Incumbent::offer(&mut best, found, eps);
        }
        let best = best
            .filter(|b| instance.is_feasible(&b.wave))
            .ok_or(WaveError::NoFeasibleWave)?;

        let summary = RunSummary {
            orders: instance.n_orders(),
            aisles: instance.n_aisles(),
            items: instance.n_items(),
            feasible: instance.is_feasible(&best.wave),
            density: best.density,
            elapsed_secs: deadline.elapsed().as_secs_f64(),
            iterations,
        };
        info!(
            density = best.density,
            orders = best.wave.orders().len(),
            aisles = best.wave.aisles().len(),
            converged = result.converged,
            elapsed = summary.elapsed_secs,
            "wave selected"
        );

        Ok(WaveResult {
            wave: best.wave,
            density: best.density,
            converged: result.converged,
            cancelled: result.cancelled,
            iterations,
            bracket: result.bracket,
            density_history: result.density_history,
            summary,
        })
    }

    /// Solves over the `share` of aisles stocking the most distinct items and
    /// returns the result in the instance's own indices.
    fn reduced_seed(
        &self,
        instance: &Instance,
        share: f64,
        seed: Option<&Incumbent>,
        deadline: &Deadline,
        iterations: &mut usize,
    ) -> Result<Option<Incumbent>, WaveError> {
        let n = instance.n_aisles();
        let keep = ((share * n as f64).ceil() as usize).clamp(1, n);
        if keep == n || deadline.expired() {
            return Ok(None);
        }
        let ranked = rank(instance, &DistinctItems);
        let (sub, map) = instance.restrict_aisles(&ranked[..keep]);

        // A seed living on the kept aisles carries over.
        let sub_seed = seed.and_then(|s| {
            let mut inverse = vec![None; n];
            for (new, &old) in map.iter().enumerate() {
                inverse[old] = Some(new);
            }
            let aisles = s
                .wave
                .aisles()
                .iter()
                .map(|&a| inverse[a])
                .collect::<Option<Vec<_>>>()?;
            let wave = Wave::new(s.wave.orders().to_vec(), aisles);
            sub.evaluate(&wave).map(|density| Incumbent::new(wave, density))
        });

        let budget = deadline.split(self.config.partition_share);
        let formulation = WaveFormulation::new(&sub);
        let result = ParametricRunner::run(
            &formulation,
            &self.solver,
            sub_seed,
            &budget,
            &self.config.parametric,
        )?;
        *iterations += result.iterations;
        info!(
            aisles = keep,
            density = Incumbent::density_of(&result.best),
            iterations = result.iterations,
            "reduced instance solved"
        );

        Ok(result.best.and_then(|best| {
            let wave = best.wave.remap(None, Some(&map));
            instance
                .evaluate(&wave)
                .map(|density| Incumbent::new(wave, density))
        }))
    }

    /// Solves unit-demand and general orders separately and returns the
    /// denser result in the instance's own indices.
    fn partition_seed(
        &self,
        instance: &Instance,
        deadline: &Deadline,
        iterations: &mut usize,
    ) -> Result<Option<Incumbent>, WaveError> {
        let eps = self.config.parametric.epsilon;
        let (unit, general): (Vec<usize>, Vec<usize>) =
            (0..instance.n_orders()).partition(|&o| instance.orders()[o].size() == 1);

        if unit.is_empty() || general.is_empty() {
            // Nothing to split; covering still seeds an all-unit instance.
            return Ok(if general.is_empty() {
                GreedyCovering::new().solve(instance, None)
            } else {
                None
            });
        }

        let mut seed: Option<Incumbent> = None;
        for (label, orders) in [("unit", unit), ("general", general)] {
            if deadline.expired() {
                break;
            }
            let (sub, map) = instance.restrict_orders(&orders);
            let part_seed = if label == "unit" {
                GreedyCovering::new().solve(&sub, None)
            } else {
                None
            };
            let budget = deadline.split(self.config.partition_share);
            let formulation = WaveFormulation::new(&sub);
            let result = ParametricRunner::run(
                &formulation,
                &self.solver,
                part_seed,
                &budget,
                &self.config.parametric,
            )?;
            *iterations += result.iterations;

            info!(
                partition = label,
                orders = sub.n_orders(),
                density = Incumbent::density_of(&result.best),
                iterations = result.iterations,
                "partition solved"
            );
            if let Some(best) = result.best {
                let wave = best.wave.remap(Some(&map), None);
                match instance.evaluate(&wave) {
                    Some(density) => {
                        Incumbent::offer(&mut seed, Incumbent::new(wave, density), eps);
                    }
                    None => debug!(partition = label, "partition wave rejected"),
                }
            }
        }
        Ok(seed)
    }
}
