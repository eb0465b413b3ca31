use tracing::trace;

use crate::model::{Incumbent, Instance, Order, Wave};

/// Single deterministic fill-then-swap pass over a wave's orders.
#[derive(Debug, Clone)]
pub struct LocalSearch {
    pub epsilon: f64,
}

impl Default for LocalSearch {
    fn default() -> Self {
        Self { epsilon: 1e-9 }
    }
}

/// Residual stock of the open aisles and room left under the upper bound.
struct Residual {
    unused: Vec<i64>,
    slack: u64,
}

impl Residual {
    fn fits(&self, order: &Order) -> bool {
        order.size() <= self.slack
            && order
                .lines()
                .iter()
                .all(|&(item, qty)| i64::from(qty) <= self.unused[item])
    }

    fn take(&mut self, order: &Order) {
        for &(item, qty) in order.lines() {
            self.unused[item] -= i64::from(qty);
        }
        self.slack -= order.size();
    }

    fn give_back(&mut self, order: &Order) {
        for &(item, qty) in order.lines() {
            self.unused[item] += i64::from(qty);
        }
        self.slack += order.size();
    }
}

impl LocalSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Improves a feasible wave. Returns the result only when its density
    /// beats `baseline` by more than epsilon; infeasible input gives `None`.
    pub fn repair(&self, instance: &Instance, wave: &Wave, baseline: f64) -> Option<Incumbent> {
        if !instance.is_feasible(wave) {
            return None;
        }
        let orders = instance.orders();

        let mut unused = vec![0i64; instance.n_items()];
        for &a in wave.aisles() {
            for &(item, qty) in instance.aisles()[a].lines() {
                unused[item] += i64::from(qty);
            }
        }
        let mut residual = Residual {
            unused,
            slack: instance.upper_bound(),
        };
        let mut selected = vec![false; instance.n_orders()];
        for &o in wave.orders() {
            selected[o] = true;
            residual.take(&orders[o]);
        }

        for o in 0..orders.len() {
            if !selected[o] && residual.fits(&orders[o]) {
                residual.take(&orders[o]);
                selected[o] = true;
                trace!(order = o, "fill");
            }
        }

        let current: Vec<usize> = (0..orders.len()).filter(|&o| selected[o]).collect();
        for o in current {
            residual.give_back(&orders[o]);
            let size = orders[o].size();
            let replacement = (0..orders.len()).find(|&p| {
                !selected[p] && orders[p].size() >= size && residual.fits(&orders[p])
            });
            match replacement {
                Some(p) => {
                    residual.take(&orders[p]);
                    selected[o] = false;
                    selected[p] = true;
                    trace!(out = o, into = p, "swap");
                }
                None => residual.take(&orders[o]),
            }
        }

        let aisles: Vec<bool> = (0..instance.n_aisles())
            .map(|a| wave.contains_aisle(a))
            .collect();
        let repaired = Wave::from_selection(&selected, &aisles);
        let density = instance.density(&repaired)?;
        (density > baseline + self.epsilon).then(|| Incumbent::new(repaired, density))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Aisle, InstanceGenerator};
    use proptest::prelude::*;

    #[test]
    fn test_swap_to_larger_order() {
        let inst = Instance::new(
            1,
            vec![Order::new([(0, 2)]), Order::new([(0, 1)])],
            vec![Aisle::new([(0, 2)])],
            0,
            10,
        )
        .unwrap();
        let wave = Wave::new(vec![1], vec![0]);
        let repaired = LocalSearch::new().repair(&inst, &wave, 1.0).unwrap();
        assert_eq!(repaired.wave, Wave::new(vec![0], vec![0]));
        assert_eq!(repaired.density, 2.0);
    }

    #[test]
    fn test_fill_leftover_stock() {
        let inst = Instance::new(
            2,
            vec![Order::new([(0, 1)]), Order::new([(1, 2)]), Order::new([(0, 5)])],
            vec![Aisle::new([(0, 2), (1, 2)])],
            0,
            3,
        )
        .unwrap();
        let wave = Wave::new(vec![0], vec![0]);
        let repaired = LocalSearch::new().repair(&inst, &wave, 1.0).unwrap();
        assert_eq!(repaired.wave, Wave::new(vec![0, 1], vec![0]));
        assert_eq!(repaired.density, 3.0);
    }

    #[test]
    fn test_no_improvement_returns_none() {
        let inst = Instance::new(
            1,
            vec![Order::new([(0, 2)])],
            vec![Aisle::new([(0, 2)])],
            0,
            10,
        )
        .unwrap();
        let wave = Wave::new(vec![0], vec![0]);
        assert!(LocalSearch::new().repair(&inst, &wave, 2.0).is_none());
        assert!(LocalSearch::new()
            .repair(&inst, &Wave::new(vec![0], vec![]), 0.0)
            .is_none());
    }

    proptest! {
        #[test]
        fn prop_repair_keeps_feasibility_and_improves(seed in 0u64..200) {
            let inst = InstanceGenerator::default().generate(seed).unwrap();
            let all_aisles: Vec<usize> = (0..inst.n_aisles()).collect();
            let start = Wave::new(vec![], all_aisles);
            prop_assume!(inst.is_feasible(&start));
            let baseline = inst.density(&start).unwrap();
            if let Some(result) = LocalSearch::new().repair(&inst, &start, baseline) {
                prop_assert!(inst.is_feasible(&result.wave));
                prop_assert!(result.density > baseline);
                prop_assert_eq!(result.wave.aisles(), start.aisles());
            }
        }
    }
}
