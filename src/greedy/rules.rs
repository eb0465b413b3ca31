//! Aisle ranking rules.

use crate::model::Instance;

/// Scores an aisle for the order in which Greedy Fill opens aisles.
///
/// Rules return `f64` scores where **lower is higher priority**; ties keep
/// the aisle index order.
pub trait AisleRule: Send + Sync {
    fn name(&self) -> &str;

    fn score(&self, aisle: usize, instance: &Instance) -> f64;
}

/// Largest total stock first.
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalStock;

impl AisleRule for TotalStock {
    fn name(&self) -> &str {
        "TotalStock"
    }

    fn score(&self, aisle: usize, instance: &Instance) -> f64 {
        -(instance.aisles()[aisle].stock() as f64)
    }
}

/// Most distinct item types first.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistinctItems;

impl AisleRule for DistinctItems {
    fn name(&self) -> &str {
        "DistinctItems"
    }

    fn score(&self, aisle: usize, instance: &Instance) -> f64 {
        -(instance.aisles()[aisle].distinct_items() as f64)
    }
}

/// Aisle indices sorted by ascending score, stable on ties.
pub fn rank(instance: &Instance, rule: &dyn AisleRule) -> Vec<usize> {
    let scores: Vec<f64> = (0..instance.n_aisles())
        .map(|a| rule.score(a, instance))
        .collect();
    let mut order: Vec<usize> = (0..instance.n_aisles()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Aisle, Order};

    fn instance() -> Instance {
        Instance::new(
            3,
            vec![Order::new([(0, 1)])],
            vec![
                Aisle::new([(0, 1), (1, 1), (2, 1)]),
                Aisle::new([(0, 9)]),
                Aisle::new([(1, 2), (2, 2)]),
            ],
            0,
            5,
        )
        .unwrap()
    }

    #[test]
    fn test_total_stock_ranking() {
        let inst = instance();
        assert_eq!(rank(&inst, &TotalStock), vec![1, 2, 0]);
    }

    #[test]
    fn test_distinct_items_ranking() {
        let inst = instance();
        assert_eq!(rank(&inst, &DistinctItems), vec![0, 2, 1]);
        assert_eq!(DistinctItems.name(), "DistinctItems");
    }

    #[test]
    fn test_ties_keep_index_order() {
        let inst = Instance::new(
            1,
            vec![],
            vec![Aisle::new([(0, 2)]), Aisle::new([(0, 2)])],
            0,
            1,
        )
        .unwrap();
        assert_eq!(rank(&inst, &TotalStock), vec![0, 1]);
    }
}
