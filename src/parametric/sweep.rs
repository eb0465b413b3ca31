//! Fixed aisle-count sweeps.
//!
//! For each count `k` the ratio objective collapses to a plain maximization
//! of picked units, which the sub-solver handles without any price. The
//! densest wave over all counts seeds the parametric loop.

use tracing::debug;

use crate::deadline::Deadline;
use crate::greedy::{rank, TotalStock};
use crate::mip::{LinearObjective, SolveRequest, SubSolver, WaveFormulation};
use crate::model::{Incumbent, Wave};

/// Which aisle sets are tried for a count `k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    /// Any `k` aisles (`Σ y = k`); the sub-solver picks them.
    AisleCount,
    /// The `k` aisles holding the most stock; only orders are chosen.
    StockPrefix,
}

/// Sweep over `k = 1..=max_aisles` aisles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AisleSweep {
    pub mode: SweepMode,
    /// Largest aisle count tried (capped by the instance).
    pub max_aisles: usize,
}

impl Default for AisleSweep {
    fn default() -> Self {
        Self {
            mode: SweepMode::AisleCount,
            max_aisles: 40,
        }
    }
}

impl AisleSweep {
    pub fn new(mode: SweepMode, max_aisles: usize) -> Self {
        Self { mode, max_aisles }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_aisles == 0 {
            return Err("aisle sweep max_aisles must be at least 1".into());
        }
        Ok(())
    }

    /// Solves one units-maximization per count and returns the densest
    /// feasible wave seen. Stops early when the deadline passes.
    pub fn run<S: SubSolver + ?Sized>(
        &self,
        formulation: &WaveFormulation<'_>,
        solver: &S,
        deadline: &Deadline,
        epsilon: f64,
    ) -> Option<Incumbent> {
        let instance = formulation.instance();
        let objective = LinearObjective::units(instance);
        let by_stock = match self.mode {
            SweepMode::StockPrefix => rank(instance, &TotalStock),
            SweepMode::AisleCount => Vec::new(),
        };

        let mut best: Option<Incumbent> = None;
        for k in 1..=self.max_aisles.min(instance.n_aisles()) {
            if deadline.expired() {
                break;
            }
            let row = match self.mode {
                SweepMode::AisleCount => formulation.aisle_count(k),
                SweepMode::StockPrefix => {
                    formulation.neighborhood(&Wave::new(Vec::new(), by_stock[..k].to_vec()), 0)
                }
            };
            let request =
                SolveRequest::new(formulation, objective.clone(), deadline).with_constraint(row);
            let response = solver.solve(&request);
            if let Some(wave) = &response.assignment {
                if let Some(density) = instance.evaluate(wave) {
                    Incumbent::offer(&mut best, Incumbent::new(wave.clone(), density), epsilon);
                }
            }
            debug!(
                k,
                mode = ?self.mode,
                status = ?response.status,
                density = Incumbent::density_of(&best),
                "aisle sweep step"
            );
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mip::EnumerationSolver;
    use crate::model::{Aisle, Instance, Order};

    // Two big aisles beat any single one: the best wave needs k = 2.
    fn instance() -> Instance {
        Instance::new(
            2,
            vec![
                Order::new([(0, 3), (1, 3)]),
                Order::new([(0, 1)]),
                Order::new([(1, 1)]),
            ],
            vec![
                Aisle::new([(0, 3)]),
                Aisle::new([(1, 3)]),
                Aisle::new([(0, 1), (1, 1)]),
            ],
            0,
            20,
        )
        .unwrap()
    }

    #[test]
    fn test_aisle_count_sweep_finds_optimum() {
        let inst = instance();
        let f = WaveFormulation::new(&inst);
        let best = AisleSweep::new(SweepMode::AisleCount, 40)
            .run(&f, &EnumerationSolver::new(), &Deadline::unbounded(), 1e-9)
            .unwrap();
        // Order 0 over aisles {0, 1} gives 6 / 2; all three aisles give 8 / 3.
        assert!(inst.is_feasible(&best.wave));
        assert_eq!(best.density, 3.0);
    }

    #[test]
    fn test_stock_prefix_uses_largest_aisles() {
        let inst = instance();
        let f = WaveFormulation::new(&inst);
        let best = AisleSweep::new(SweepMode::StockPrefix, 1)
            .run(&f, &EnumerationSolver::new(), &Deadline::unbounded(), 1e-9)
            .unwrap();
        // Only aisle 0 (first of the stock ties) is open: order 1 alone.
        assert_eq!(best.wave, Wave::new(vec![1], vec![0]));
        assert_eq!(best.density, 1.0);
    }

    #[test]
    fn test_expired_deadline_and_validation() {
        let inst = instance();
        let f = WaveFormulation::new(&inst);
        let expired = Deadline::after(std::time::Duration::ZERO);
        assert!(AisleSweep::default()
            .run(&f, &EnumerationSolver::new(), &expired, 1e-9)
            .is_none());
        assert!(AisleSweep::new(SweepMode::AisleCount, 0).validate().is_err());
        assert!(AisleSweep::default().validate().is_ok());
    }
}
