//! Greedy Fill: open aisles in rank order, admit covered orders as they fit.

use tracing::debug;

use super::rules::{rank, AisleRule, DistinctItems, TotalStock};
use crate::model::{Incumbent, Instance, Wave};

/// Builds waves by sweeping aisles in the order given by each rule.
///
/// After opening an aisle every pending order (largest first) whose demand
/// is covered by the unused stock is admitted; orders that would push the
/// wave past the upper bound are dropped for good. Each aisle prefix that
/// reaches the lower bound is a candidate and the densest is kept.
pub struct GreedyFill {
    rules: Vec<Box<dyn AisleRule>>,
    epsilon: f64,
}

impl Default for GreedyFill {
    fn default() -> Self {
        Self::new()
            .with_rule(TotalStock)
            .with_rule(DistinctItems)
    }
}

impl GreedyFill {
    /// An empty rule set. See [`Default`] for the stock configuration.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            epsilon: 1e-9,
        }
    }

    pub fn with_rule<R: AisleRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Runs every rule and returns the densest wave, but only when it beats
    /// `incoming` by more than epsilon.
    pub fn solve(&self, instance: &Instance, incoming: Option<f64>) -> Option<Incumbent> {
        let mut best: Option<Incumbent> = None;
        for rule in &self.rules {
            if let Some(candidate) = Self::run(instance, rule.as_ref()) {
                debug!(rule = rule.name(), density = candidate.density, "greedy fill");
                Incumbent::offer(&mut best, candidate, self.epsilon);
            }
        }
        best.filter(|b| incoming.map_or(true, |floor| b.density > floor + self.epsilon))
    }

    /// One sweep with a single aisle ordering.
    pub fn run(instance: &Instance, rule: &dyn AisleRule) -> Option<Incumbent> {
        let lower = instance.lower_bound();
        let upper = instance.upper_bound();

        let mut pending: Vec<usize> = (0..instance.n_orders()).collect();
        pending.sort_by_key(|&o| std::cmp::Reverse(instance.orders()[o].size()));

        let mut unused = vec![0u64; instance.n_items()];
        let mut opened: Vec<usize> = Vec::new();
        let mut admitted: Vec<usize> = Vec::new();
        let mut units: u64 = 0;
        let mut best: Option<Incumbent> = None;

        for a in rank(instance, rule) {
            opened.push(a);
            for &(item, qty) in instance.aisles()[a].lines() {
                unused[item] += u64::from(qty);
            }

            pending.retain(|&o| {
                let order = &instance.orders()[o];
                if units + order.size() > upper {
                    return false;
                }
                let covered = order
                    .lines()
                    .iter()
                    .all(|&(item, qty)| u64::from(qty) <= unused[item]);
                if !covered {
                    return true;
                }
                for &(item, qty) in order.lines() {
                    unused[item] -= u64::from(qty);
                }
                units += order.size();
                admitted.push(o);
                false
            });

            if units >= lower {
                let density = units as f64 / opened.len() as f64;
                if best.as_ref().map_or(true, |b| density > b.density) {
                    best = Some(Incumbent::new(
                        Wave::new(admitted.clone(), opened.clone()),
                        density,
                    ));
                }
            }
        }
        best
    }
}
