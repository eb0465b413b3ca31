//! LP-relaxation upper bound through the Charnes-Cooper transformation.

use tracing::debug;

use crate::deadline::Deadline;
use crate::mip::{LinearProgram, LpOutcome, LpRow, RowKind, Sense, SubSolver, WaveFormulation};

/// Builds the linearized relaxation of `max units(x) / Σ y`.
///
/// With `t = 1 / Σ y`, `X = t x` and `Y = t y` the ratio becomes the linear
/// objective `Σ s_o X_o` under `Σ Y = 1`, homogeneous coverage rows, the
/// band scaled by `t`, and `X, Y <= t <= 1`. Variable layout: orders, then
/// aisles, then `t`.
pub fn charnes_cooper(formulation: &WaveFormulation<'_>) -> LinearProgram {
    let instance = formulation.instance();
    let n = formulation.n_orders();
    let m = formulation.n_aisles();
    let t = n + m;

    let sizes: Vec<(usize, f64)> = instance
        .orders()
        .iter()
        .enumerate()
        .map(|(o, order)| (o, order.size() as f64))
        .collect();

    let mut rows = Vec::new();
    rows.push(LpRow {
        terms: (0..m).map(|a| (n + a, 1.0)).collect(),
        sense: Sense::Eq,
        rhs: 1.0,
    });
    let banded = |bound: u64, sense: Sense| {
        let mut terms = sizes.clone();
        terms.push((t, -(bound as f64)));
        LpRow {
            terms,
            sense,
            rhs: 0.0,
        }
    };
    rows.push(banded(instance.upper_bound(), Sense::Le));
    rows.push(banded(instance.lower_bound(), Sense::Ge));

    for (kind, row) in formulation.rows() {
        if let RowKind::Coverage(_) = kind {
            let terms = row
                .orders
                .iter()
                .copied()
                .chain(row.aisles.iter().map(|&(a, c)| (n + a, c)))
                .collect();
            rows.push(LpRow {
                terms,
                sense: Sense::Le,
                rhs: 0.0,
            });
        }
    }
    for j in 0..t {
        rows.push(LpRow {
            terms: vec![(j, 1.0), (t, -1.0)],
            sense: Sense::Le,
            rhs: 0.0,
        });
    }

    let mut objective = vec![0.0; t + 1];
    for &(o, s) in &sizes {
        objective[o] = s;
    }

    LinearProgram {
        bounds: vec![(0.0, f64::INFINITY); t]
            .into_iter()
            .chain(std::iter::once((0.0, 1.0)))
            .collect(),
        objective,
        rows,
    }
}

/// Optimum of the relaxation, an upper bound on the best density.
///
/// `None` when the backend has no LP support, the relaxation is infeasible,
/// or the solve failed.
pub fn relaxation_bound<S: SubSolver + ?Sized>(
    formulation: &WaveFormulation<'_>,
    solver: &S,
    deadline: &Deadline,
) -> Option<f64> {
    if formulation.n_aisles() == 0 {
        return None;
    }
    match solver.solve_lp(&charnes_cooper(formulation), deadline) {
        LpOutcome::Optimal(value) => Some(value),
        outcome => {
            debug!(?outcome, solver = solver.name(), "relaxation bound unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mip::{EnumerationSolver, GoodLpSolver};
    use crate::model::{Aisle, Instance, Order};

    fn instance() -> Instance {
        Instance::new(
            1,
            vec![Order::new([(0, 1)]), Order::new([(0, 1)])],
            vec![Aisle::new([(0, 2)])],
            0,
            4,
        )
        .unwrap()
    }

    #[test]
    fn test_program_shape() {
        let inst = instance();
        let f = WaveFormulation::new(&inst);
        let lp = charnes_cooper(&f);
        assert_eq!(lp.n_vars(), 4);
        assert_eq!(lp.objective, vec![1.0, 1.0, 0.0, 0.0]);
        // aisle sum, two band rows, one coverage row, three scaling rows
        assert_eq!(lp.rows.len(), 7);
        assert_eq!(lp.bounds[3], (0.0, 1.0));
    }

    #[test]
    fn test_bound_matches_integer_optimum_on_trivial_instance() {
        let inst = instance();
        let f = WaveFormulation::new(&inst);
        let bound = relaxation_bound(&f, &GoodLpSolver::new(), &Deadline::unbounded()).unwrap();
        assert!((bound - 2.0).abs() < 1e-6, "bound = {bound}");
    }

    #[test]
    fn test_unsupported_backend() {
        let inst = instance();
        let f = WaveFormulation::new(&inst);
        assert_eq!(
            relaxation_bound(&f, &EnumerationSolver::new(), &Deadline::unbounded()),
            None
        );
    }
}
