//! The wave selection model as linear rows over order/aisle binaries.

use crate::model::{Instance, Wave};

/// Direction of a linear row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl Sense {
    fn holds(self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            Sense::Le => lhs <= rhs + tolerance,
            Sense::Ge => lhs >= rhs - tolerance,
            Sense::Eq => (lhs - rhs).abs() <= tolerance,
        }
    }
}

/// A sparse linear row `Σ c_o x_o + Σ d_a y_a (sense) rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub orders: Vec<(usize, f64)>,
    pub aisles: Vec<(usize, f64)>,
    pub sense: Sense,
    pub rhs: f64,
}

impl LinearConstraint {
    /// Left-hand side evaluated at the wave's selection.
    pub fn activity(&self, wave: &Wave) -> f64 {
        let orders: f64 = self
            .orders
            .iter()
            .filter(|&&(o, _)| wave.contains_order(o))
            .map(|&(_, c)| c)
            .sum();
        let aisles: f64 = self
            .aisles
            .iter()
            .filter(|&&(a, _)| wave.contains_aisle(a))
            .map(|&(_, c)| c)
            .sum();
        orders + aisles
    }

    pub fn is_satisfied(&self, wave: &Wave, tolerance: f64) -> bool {
        self.sense.holds(self.activity(wave), self.rhs, tolerance)
    }
}

/// Dense linear objective over the order and aisle binaries (maximized).
#[derive(Debug, Clone, PartialEq)]
pub struct LinearObjective {
    pub orders: Vec<f64>,
    pub aisles: Vec<f64>,
}

impl LinearObjective {
    /// `units(S) - price * aisles(S)`.
    pub fn parametric(instance: &Instance, price: f64) -> Self {
        Self {
            orders: instance.orders().iter().map(|o| o.size() as f64).collect(),
            aisles: vec![-price; instance.n_aisles()],
        }
    }

    /// `units(S)`, with aisles free.
    pub fn units(instance: &Instance) -> Self {
        Self::parametric(instance, 0.0)
    }

    pub fn value(&self, wave: &Wave) -> f64 {
        let orders: f64 = wave.orders().iter().map(|&o| self.orders[o]).sum();
        let aisles: f64 = wave.aisles().iter().map(|&a| self.aisles[a]).sum();
        orders + aisles
    }
}

/// Which family a base row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Picked units at least the lower bound.
    LowerBand,
    /// Picked units at most the upper bound.
    UpperBand,
    /// Demand for one item covered by capped aisle stock.
    Coverage(usize),
    /// At least one aisle selected.
    AnyAisle,
}

/// The fixed part of every sub-problem, built once per run.
///
/// Coverage rows use aisle stock capped at the total demand of the item,
/// which keeps the integer feasible set and tightens the relaxation.
/// Items nobody demands produce no row.
#[derive(Debug, Clone)]
pub struct WaveFormulation<'a> {
    instance: &'a Instance,
    rows: Vec<(RowKind, LinearConstraint)>,
}

impl<'a> WaveFormulation<'a> {
    pub fn new(instance: &'a Instance) -> Self {
        let sizes: Vec<(usize, f64)> = instance
            .orders()
            .iter()
            .enumerate()
            .map(|(o, order)| (o, order.size() as f64))
            .collect();

        let mut rows = Vec::with_capacity(instance.n_items() + 3);
        rows.push((
            RowKind::LowerBand,
            LinearConstraint {
                orders: sizes.clone(),
                aisles: Vec::new(),
                sense: Sense::Ge,
                rhs: instance.lower_bound() as f64,
            },
        ));
        rows.push((
            RowKind::UpperBand,
            LinearConstraint {
                orders: sizes,
                aisles: Vec::new(),
                sense: Sense::Le,
                rhs: instance.upper_bound() as f64,
            },
        ));

        let mut aisle_terms: Vec<Vec<(usize, f64)>> = vec![Vec::new(); instance.n_items()];
        for a in 0..instance.n_aisles() {
            for &(item, cap) in instance.capped_lines(a) {
                aisle_terms[item].push((a, -(cap as f64)));
            }
        }
        for (item, aisles) in aisle_terms.into_iter().enumerate() {
            if instance.item_demand(item) == 0 {
                continue;
            }
            let orders = instance
                .orders_with(item)
                .iter()
                .map(|&o| (o, f64::from(instance.orders()[o].quantity(item))))
                .collect();
            rows.push((
                RowKind::Coverage(item),
                LinearConstraint {
                    orders,
                    aisles,
                    sense: Sense::Le,
                    rhs: 0.0,
                },
            ));
        }

        rows.push((
            RowKind::AnyAisle,
            LinearConstraint {
                orders: Vec::new(),
                aisles: (0..instance.n_aisles()).map(|a| (a, 1.0)).collect(),
                sense: Sense::Ge,
                rhs: 1.0,
            },
        ));

        Self { instance, rows }
    }

    pub fn instance(&self) -> &'a Instance {
        self.instance
    }

    pub fn n_orders(&self) -> usize {
        self.instance.n_orders()
    }

    pub fn n_aisles(&self) -> usize {
        self.instance.n_aisles()
    }

    /// Base rows tagged by family.
    pub fn rows(&self) -> &[(RowKind, LinearConstraint)] {
        &self.rows
    }

    /// Cut keeping only selections at least as dense as `price`:
    /// `units(S) - price * aisles(S) >= 0`.
    pub fn density_cut(&self, price: f64) -> LinearConstraint {
        let objective = LinearObjective::parametric(self.instance, price);
        LinearConstraint {
            orders: objective.orders.into_iter().enumerate().collect(),
            aisles: objective.aisles.into_iter().enumerate().collect(),
            sense: Sense::Ge,
            rhs: 0.0,
        }
    }

    /// At most `radius` aisles may differ from those of `center`:
    /// `Σ_{a∉I} y_a - Σ_{a∈I} y_a <= radius - |I|`.
    pub fn neighborhood(&self, center: &Wave, radius: usize) -> LinearConstraint {
        let aisles = (0..self.n_aisles())
            .map(|a| (a, if center.contains_aisle(a) { -1.0 } else { 1.0 }))
            .collect();
        LinearConstraint {
            orders: Vec::new(),
            aisles,
            sense: Sense::Le,
            rhs: radius as f64 - center.aisles().len() as f64,
        }
    }

    /// Exactly `count` aisles selected.
    pub fn aisle_count(&self, count: usize) -> LinearConstraint {
        LinearConstraint {
            orders: Vec::new(),
            aisles: (0..self.n_aisles()).map(|a| (a, 1.0)).collect(),
            sense: Sense::Eq,
            rhs: count as f64,
        }
    }

    /// Whether the wave satisfies every base row.
    pub fn admits(&self, wave: &Wave, tolerance: f64) -> bool {
        self.rows
            .iter()
            .all(|(_, row)| row.is_satisfied(wave, tolerance))
    }
}

/// A row of a continuous program over dense variable indices.
#[derive(Debug, Clone, PartialEq)]
pub struct LpRow {
    pub terms: Vec<(usize, f64)>,
    pub sense: Sense,
    pub rhs: f64,
}

/// A continuous linear program, maximized.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearProgram {
    /// `(lower, upper)` per variable; `f64::INFINITY` for no upper bound.
    pub bounds: Vec<(f64, f64)>,
    pub objective: Vec<f64>,
    pub rows: Vec<LpRow>,
}

impl LinearProgram {
    pub fn n_vars(&self) -> usize {
        self.bounds.len()
    }
}

/// Result of a continuous solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LpOutcome {
    Optimal(f64),
    Infeasible,
    Unbounded,
    /// The backend has no LP support or it failed.
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Aisle, Order};

    fn instance() -> Instance {
        Instance::new(
            2,
            vec![Order::new([(0, 1)]), Order::new([(0, 1), (1, 2)])],
            vec![
                Aisle::new([(0, 4)]),
                Aisle::new([(1, 1)]),
                Aisle::new([(1, 5)]),
            ],
            1,
            4,
        )
        .unwrap()
    }

    #[test]
    fn test_rows() {
        let inst = instance();
        let f = WaveFormulation::new(&inst);
        let kinds: Vec<RowKind> = f.rows().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                RowKind::LowerBand,
                RowKind::UpperBand,
                RowKind::Coverage(0),
                RowKind::Coverage(1),
                RowKind::AnyAisle
            ]
        );
        // item 0: demand 2, aisle stock 4 capped to 2
        let (_, cov0) = &f.rows()[2];
        assert_eq!(cov0.aisles, vec![(0, -2.0)]);
        let (_, cov1) = &f.rows()[3];
        assert_eq!(cov1.aisles, vec![(1, -1.0), (2, -2.0)]);
    }

    #[test]
    fn test_admits_matches_feasibility() {
        let inst = instance();
        let f = WaveFormulation::new(&inst);
        let good = Wave::new(vec![0, 1], vec![0, 2]);
        let short = Wave::new(vec![1], vec![0, 1]);
        assert!(f.admits(&good, 1e-9));
        assert!(inst.is_feasible(&good));
        assert!(!f.admits(&short, 1e-9));
        assert!(!inst.is_feasible(&short));
    }

    #[test]
    fn test_density_cut() {
        let inst = instance();
        let f = WaveFormulation::new(&inst);
        let cut = f.density_cut(1.5);
        // 4 units over 2 aisles: 4 - 1.5 * 2 > 0
        assert!(cut.is_satisfied(&Wave::new(vec![0, 1], vec![0, 2]), 1e-9));
        assert!(!cut.is_satisfied(&Wave::new(vec![0], vec![0, 2]), 1e-9));
    }

    #[test]
    fn test_neighborhood() {
        let inst = instance();
        let f = WaveFormulation::new(&inst);
        let center = Wave::new(vec![], vec![0, 2]);
        let row = f.neighborhood(&center, 1);
        assert!(row.is_satisfied(&Wave::new(vec![], vec![0, 2]), 1e-9));
        assert!(row.is_satisfied(&Wave::new(vec![], vec![0]), 1e-9));
        assert!(row.is_satisfied(&Wave::new(vec![], vec![0, 1, 2]), 1e-9));
        assert!(!row.is_satisfied(&Wave::new(vec![], vec![1]), 1e-9));

        // Radius zero pins the aisle set exactly.
        let pinned = f.neighborhood(&center, 0);
        assert!(pinned.is_satisfied(&center, 1e-9));
        assert!(!pinned.is_satisfied(&Wave::new(vec![], vec![0]), 1e-9));
        assert!(!pinned.is_satisfied(&Wave::new(vec![], vec![0, 1, 2]), 1e-9));
    }

    #[test]
    fn test_aisle_count() {
        let inst = instance();
        let f = WaveFormulation::new(&inst);
        let row = f.aisle_count(2);
        assert!(row.is_satisfied(&Wave::new(vec![], vec![0, 1]), 1e-9));
        assert!(!row.is_satisfied(&Wave::new(vec![], vec![0]), 1e-9));
        let units = LinearObjective::units(&inst);
        assert!(units.aisles.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_parametric_objective() {
        let inst = instance();
        let obj = LinearObjective::parametric(&inst, 2.0);
        assert_eq!(obj.value(&Wave::new(vec![0, 1], vec![0, 2])), 0.0);
        assert_eq!(obj.value(&Wave::new(vec![1], vec![2])), 1.0);
    }
}
