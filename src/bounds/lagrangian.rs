//! Lagrangian upper bound on the parametric sub-problem.
//!
//! Dualizing coverage (`μ_i`), the two band rows (`ψL`, `ψU`) and the
//! at-least-one-aisle row (`φ`) leaves a problem separable per variable:
//!
//! ```text
//! r_o = s_o (1 + ψL - ψU) - Σ_i μ_i q_oi
//! r_a = -λ + Σ_i μ_i cap_ai + φ
//! L   = ψU·ub - ψL·lb - φ + Σ max(0, r_o) + Σ max(0, r_a)
//! ```
//!
//! Any non-negative multipliers give `L >= max_S units(S) - λ·aisles(S)`.
//! Projected subgradient descent drives `L` down.

use crate::mip::{RowKind, WaveFormulation};

/// Subgradient schedule.
#[derive(Debug, Clone)]
pub struct LagrangianConfig {
    pub iterations: usize,
    pub initial_step: f64,
    /// Geometric step decay per iteration, in `(0, 1]`.
    pub decay: f64,
}

impl Default for LagrangianConfig {
    fn default() -> Self {
        Self {
            iterations: 75,
            initial_step: 2.0,
            decay: 0.9,
        }
    }
}

impl LagrangianConfig {
    pub fn with_iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    pub fn with_initial_step(mut self, step: f64) -> Self {
        self.initial_step = step;
        self
    }

    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.iterations == 0 {
            return Err("lagrangian iterations must be at least 1".into());
        }
        if !(self.initial_step > 0.0) {
            return Err("lagrangian initial_step must be positive".into());
        }
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err("lagrangian decay must be in (0, 1]".into());
        }
        Ok(())
    }
}

/// Coverage rows as `(order terms, aisle terms)` with positive coefficients.
struct CoverageRow {
    orders: Vec<(usize, f64)>,
    aisles: Vec<(usize, f64)>,
}

pub struct LagrangianBound;

impl LagrangianBound {
    /// Lowest Lagrangian value found for the sub-problem at `price`.
    pub fn compute(formulation: &WaveFormulation<'_>, price: f64, config: &LagrangianConfig) -> f64 {
        let instance = formulation.instance();
        let n = formulation.n_orders();
        let m = formulation.n_aisles();
        let lower = instance.lower_bound() as f64;
        let upper = instance.upper_bound() as f64;
        let sizes: Vec<f64> = instance.orders().iter().map(|o| o.size() as f64).collect();

        let coverage: Vec<CoverageRow> = formulation
            .rows()
            .iter()
            .filter(|(kind, _)| matches!(kind, RowKind::Coverage(_)))
            .map(|(_, row)| CoverageRow {
                orders: row.orders.clone(),
                aisles: row.aisles.iter().map(|&(a, c)| (a, -c)).collect(),
            })
            .collect();

        let mut mu = vec![0.0; coverage.len()];
        let (mut psi_lower, mut psi_upper, mut phi) = (0.0_f64, 0.0_f64, 0.0_f64);
        let mut step = config.initial_step;
        let mut best = f64::INFINITY;

        let mut order_cost = vec![0.0; n];
        let mut aisle_cost = vec![0.0; m];
        let mut x = vec![false; n];
        let mut y = vec![false; m];

        for _ in 0..config.iterations {
            for (o, &s) in sizes.iter().enumerate() {
                order_cost[o] = s * (1.0 + psi_lower - psi_upper);
            }
            aisle_cost.iter_mut().for_each(|c| *c = phi - price);
            for (row, &weight) in coverage.iter().zip(&mu) {
                if weight == 0.0 {
                    continue;
                }
                for &(o, q) in &row.orders {
                    order_cost[o] -= weight * q;
                }
                for &(a, cap) in &row.aisles {
                    aisle_cost[a] += weight * cap;
                }
            }

            let mut value = psi_upper * upper - psi_lower * lower - phi;
            for o in 0..n {
                x[o] = order_cost[o] > 0.0;
                if x[o] {
                    value += order_cost[o];
                }
            }
            for a in 0..m {
                y[a] = aisle_cost[a] > 0.0;
                if y[a] {
                    value += aisle_cost[a];
                }
            }
            best = best.min(value);

            // Subgradients are the row violations at the inner maximizer.
            let picked: f64 = (0..n).filter(|&o| x[o]).map(|o| sizes[o]).sum();
            let opened = y.iter().filter(|&&on| on).count() as f64;
            let g_cov: Vec<f64> = coverage
                .iter()
                .map(|row| {
                    let demand: f64 = row.orders.iter().filter(|&&(o, _)| x[o]).map(|&(_, q)| q).sum();
                    let supply: f64 = row.aisles.iter().filter(|&&(a, _)| y[a]).map(|&(_, c)| c).sum();
                    demand - supply
                })
                .collect();
            let g_upper = picked - upper;
            let g_lower = lower - picked;
            let g_phi = 1.0 - opened;

            let norm = (g_cov.iter().map(|g| g * g).sum::<f64>()
                + g_upper * g_upper
                + g_lower * g_lower
                + g_phi * g_phi)
                .sqrt();
            if norm < 1e-12 {
                break;
            }
            let t = step / norm;
            for (w, g) in mu.iter_mut().zip(&g_cov) {
                *w = (*w + t * g).max(0.0);
            }
            psi_upper = (psi_upper + t * g_upper).max(0.0);
            psi_lower = (psi_lower + t * g_lower).max(0.0);
            phi = (phi + t * g_phi).max(0.0);
            step *= config.decay;
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::Deadline;
    use crate::mip::{EnumerationSolver, LinearObjective, SolveRequest, SubSolver};
    use crate::model::{Instance, InstanceGenerator};

    fn subproblem_max(inst: &Instance, price: f64) -> Option<f64> {
        let f = WaveFormulation::new(inst);
        let deadline = Deadline::unbounded();
        let request = SolveRequest::new(&f, LinearObjective::parametric(inst, price), &deadline);
        EnumerationSolver::new().solve(&request).objective_value
    }

    #[test]
    fn test_config_validation() {
        assert!(LagrangianConfig::default().validate().is_ok());
        assert!(LagrangianConfig::default().with_iterations(0).validate().is_err());
        assert!(LagrangianConfig::default().with_decay(1.5).validate().is_err());
        assert!(LagrangianConfig::default().with_initial_step(0.0).validate().is_err());
    }

    #[test]
    fn test_bound_dominates_subproblem_value() {
        let generator = InstanceGenerator::default()
            .with_orders(3..=6)
            .with_aisles(3..=6);
        for seed in 0..15 {
            let inst = generator.generate(seed).unwrap();
            let f = WaveFormulation::new(&inst);
            for price in [0.0, 1.0, 2.5, 5.0] {
                let bound = LagrangianBound::compute(&f, price, &LagrangianConfig::default());
                if let Some(value) = subproblem_max(&inst, price) {
                    assert!(
                        bound >= value - 1e-6,
                        "seed {seed} price {price}: bound {bound} < value {value}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_bound_certifies_high_price() {
        // Best density is 2; at price 10 the bound must be negative.
        let inst = Instance::new(
            1,
            vec![
                crate::model::Order::new([(0, 1)]),
                crate::model::Order::new([(0, 1)]),
            ],
            vec![crate::model::Aisle::new([(0, 2)])],
            0,
            4,
        )
        .unwrap();
        let f = WaveFormulation::new(&inst);
        let bound = LagrangianBound::compute(&f, 10.0, &LagrangianConfig::default());
        assert!(bound < 0.0, "bound = {bound}");
    }
}
