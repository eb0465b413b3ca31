//! Candidate waves, feasibility violations and the incumbent.

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A candidate selection of orders and aisles.
///
/// Index lists are kept sorted and duplicate-free so two waves with the
/// same selection compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Wave {
    orders: Vec<usize>,
    aisles: Vec<usize>,
}

impl Wave {
    pub fn new(mut orders: Vec<usize>, mut aisles: Vec<usize>) -> Self {
        orders.sort_unstable();
        orders.dedup();
        aisles.sort_unstable();
        aisles.dedup();
        Self { orders, aisles }
    }

    /// Builds a wave from per-order and per-aisle selection flags.
    pub fn from_selection(orders: &[bool], aisles: &[bool]) -> Self {
        let pick = |flags: &[bool]| {
            flags
                .iter()
                .enumerate()
                .filter_map(|(i, &on)| on.then_some(i))
                .collect()
        };
        Self {
            orders: pick(orders),
            aisles: pick(aisles),
        }
    }

    pub fn orders(&self) -> &[usize] {
        &self.orders
    }

    pub fn aisles(&self) -> &[usize] {
        &self.aisles
    }

    pub fn contains_order(&self, o: usize) -> bool {
        self.orders.binary_search(&o).is_ok()
    }

    pub fn contains_aisle(&self, a: usize) -> bool {
        self.aisles.binary_search(&a).is_ok()
    }

    /// Rewrites order and aisle indices through the given maps (sub-instance
    /// index → parent index). A `None` map keeps those indices.
    pub fn remap(&self, order_map: Option<&[usize]>, aisle_map: Option<&[usize]>) -> Wave {
        let through = |indices: &[usize], map: Option<&[usize]>| -> Vec<usize> {
            match map {
                Some(map) => indices.iter().map(|&i| map[i]).collect(),
                None => indices.to_vec(),
            }
        };
        Wave::new(
            through(&self.orders, order_map),
            through(&self.aisles, aisle_map),
        )
    }
}

/// The first rule a wave breaks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("{kind} index {index} is out of range")]
    IndexOutOfRange { kind: &'static str, index: usize },

    #[error("wave visits no aisle")]
    EmptyAisles,

    #[error("wave picks {units} units, below the lower bound {lower}")]
    BelowLowerBound { units: u64, lower: u64 },

    #[error("wave picks {units} units, above the upper bound {upper}")]
    AboveUpperBound { units: u64, upper: u64 },

    #[error("item {item}: demand {demand} exceeds supply {supply}")]
    ItemShortage { item: usize, demand: u64, supply: u64 },
}

/// Best feasible wave found so far and its density.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Incumbent {
    pub wave: Wave,
    pub density: f64,
}

impl Incumbent {
    pub fn new(wave: Wave, density: f64) -> Self {
        Self { wave, density }
    }

    /// Replaces `slot` with `candidate` when the slot is empty or the
    /// candidate is denser by more than `epsilon`. Returns whether it did.
    pub fn offer(slot: &mut Option<Incumbent>, candidate: Incumbent, epsilon: f64) -> bool {
        let improves = match slot {
            Some(current) => candidate.density > current.density + epsilon,
            None => true,
        };
        if improves {
            *slot = Some(candidate);
        }
        improves
    }

    /// Density of the slot, or `f64::NEG_INFINITY` when empty.
    pub fn density_of(slot: &Option<Incumbent>) -> f64 {
        slot.as_ref().map_or(f64::NEG_INFINITY, |inc| inc.density)
    }
}

#[cfg(test)]
mod tests {
    use super::super::instance::{Aisle, Instance, Order};
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_sorts_and_dedups() {
        let wave = Wave::new(vec![3, 1, 3], vec![2, 0, 2]);
        assert_eq!(wave.orders(), &[1, 3]);
        assert_eq!(wave.aisles(), &[0, 2]);
        assert!(wave.contains_order(3));
        assert!(!wave.contains_aisle(1));
    }

    #[test]
    fn test_from_selection() {
        let wave = Wave::from_selection(&[true, false, true], &[false, true]);
        assert_eq!(wave, Wave::new(vec![0, 2], vec![1]));
    }

    #[test]
    fn test_remap() {
        let wave = Wave::new(vec![0, 1], vec![0]);
        let mapped = wave.remap(Some(&[4, 7]), None);
        assert_eq!(mapped, Wave::new(vec![4, 7], vec![0]));
        let mapped = wave.remap(None, Some(&[5, 2]));
        assert_eq!(mapped, Wave::new(vec![0, 1], vec![5]));
    }

    #[test]
    fn test_offer_only_strict_improvements() {
        let mut slot = None;
        assert!(Incumbent::offer(&mut slot, Incumbent::new(Wave::default(), 1.0), 1e-6));
        assert!(!Incumbent::offer(
            &mut slot,
            Incumbent::new(Wave::default(), 1.0 + 1e-9),
            1e-6
        ));
        assert!(!Incumbent::offer(&mut slot, Incumbent::new(Wave::default(), 0.5), 1e-6));
        assert!(Incumbent::offer(&mut slot, Incumbent::new(Wave::default(), 2.0), 1e-6));
        assert_eq!(Incumbent::density_of(&slot), 2.0);
    }

    /// Single-item instance where each aisle holds `stock[a]` units and each
    /// order wants `demand[o]` units.
    fn single_item(demand: &[u32], stock: &[u32], ub: i64) -> Instance {
        Instance::new(
            1,
            demand.iter().map(|&q| Order::new([(0, q)])).collect(),
            stock.iter().map(|&q| Aisle::new([(0, q)])).collect(),
            0,
            ub,
        )
        .unwrap()
    }

    proptest! {
        #[test]
        fn prop_covered_waves_are_feasible(
            demand in prop::collection::vec(1u32..5, 1..8),
            extra in 0u32..4,
        ) {
            let total: u32 = demand.iter().sum();
            let inst = single_item(&demand, &[total + extra], i64::from(total));
            let wave = Wave::new((0..demand.len()).collect(), vec![0]);
            prop_assert!(inst.is_feasible(&wave));
            prop_assert_eq!(inst.density(&wave), Some(f64::from(total)));
        }

        #[test]
        fn prop_short_supply_is_rejected(
            demand in prop::collection::vec(1u32..5, 1..8),
            deficit in 1u32..3,
        ) {
            let total: u32 = demand.iter().sum();
            let stock = total.saturating_sub(deficit);
            let inst = single_item(&demand, &[stock], i64::from(total));
            let wave = Wave::new((0..demand.len()).collect(), vec![0]);
            let is_shortage = matches!(inst.check(&wave), Err(Violation::ItemShortage { .. }));
            prop_assert!(is_shortage);
        }

        #[test]
        fn prop_upper_bound_is_enforced(
            demand in prop::collection::vec(1u32..5, 2..8),
        ) {
            let total: u32 = demand.iter().sum();
            let inst = single_item(&demand, &[total], i64::from(total - 1));
            let wave = Wave::new((0..demand.len()).collect(), vec![0]);
            let too_many = matches!(inst.check(&wave), Err(Violation::AboveUpperBound { .. }));
            prop_assert!(too_many);
        }
    }
}
