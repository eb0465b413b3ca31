//! Seeded random instances for tests and benchmarks.

use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

use super::instance::{Aisle, Instance, Order};
use crate::error::WaveError;

/// Parameters of the random instance family.
///
/// Defaults give tiny instances (at most ten orders and ten aisles) that
/// exhaustive search can still verify.
#[derive(Debug, Clone)]
pub struct InstanceGenerator {
    pub orders: RangeInclusive<usize>,
    pub aisles: RangeInclusive<usize>,
    pub items: RangeInclusive<usize>,
    /// Distinct items per order.
    pub order_lines: RangeInclusive<usize>,
    pub order_qty: RangeInclusive<u32>,
    /// Distinct items per aisle.
    pub aisle_lines: RangeInclusive<usize>,
    pub aisle_qty: RangeInclusive<u32>,
    pub lower_bound: i64,
    pub upper_bound: RangeInclusive<i64>,
}

impl Default for InstanceGenerator {
    fn default() -> Self {
        Self {
            orders: 3..=10,
            aisles: 3..=10,
            items: 3..=10,
            order_lines: 1..=3,
            order_qty: 1..=3,
            aisle_lines: 1..=6,
            aisle_qty: 1..=6,
            lower_bound: 0,
            upper_bound: 20..=40,
        }
    }
}

impl InstanceGenerator {
    pub fn with_orders(mut self, range: RangeInclusive<usize>) -> Self {
        self.orders = range;
        self
    }

    pub fn with_aisles(mut self, range: RangeInclusive<usize>) -> Self {
        self.aisles = range;
        self
    }

    pub fn with_items(mut self, range: RangeInclusive<usize>) -> Self {
        self.items = range;
        self
    }

    pub fn with_bounds(mut self, lower: i64, upper: RangeInclusive<i64>) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    /// Validates that every range is non-empty and sensible.
    pub fn validate(&self) -> Result<(), String> {
        if self.items.is_empty() || *self.items.start() == 0 {
            return Err("items range must be non-empty and positive".into());
        }
        if self.orders.is_empty() || self.aisles.is_empty() {
            return Err("orders and aisles ranges must be non-empty".into());
        }
        if self.order_lines.is_empty() || *self.order_lines.start() == 0 {
            return Err("order_lines must be non-empty and positive".into());
        }
        if self.aisle_lines.is_empty() || *self.aisle_lines.start() == 0 {
            return Err("aisle_lines must be non-empty and positive".into());
        }
        if self.order_qty.is_empty() || *self.order_qty.start() == 0 {
            return Err("order_qty must be non-empty and positive".into());
        }
        if self.aisle_qty.is_empty() {
            return Err("aisle_qty must be non-empty".into());
        }
        if self.upper_bound.is_empty() || self.lower_bound < 0 {
            return Err("bounds must be non-negative with a non-empty upper range".into());
        }
        if self.lower_bound > *self.upper_bound.start() {
            return Err("lower_bound exceeds the smallest upper bound".into());
        }
        Ok(())
    }

    /// Draws one instance. The same seed always gives the same instance.
    pub fn generate(&self, seed: u64) -> Result<Instance, WaveError> {
        self.validate().map_err(WaveError::InvalidConfig)?;
        let mut rng = StdRng::seed_from_u64(seed);

        let n_items = rng.random_range(self.items.clone());
        let n_orders = rng.random_range(self.orders.clone());
        let n_aisles = rng.random_range(self.aisles.clone());

        let orders = (0..n_orders)
            .map(|_| {
                let k = rng.random_range(self.order_lines.clone()).min(n_items);
                let items = sample(&mut rng, n_items, k).into_vec();
                Order::new(
                    items
                        .into_iter()
                        .map(|i| (i, rng.random_range(self.order_qty.clone()))),
                )
            })
            .collect();
        let aisles = (0..n_aisles)
            .map(|_| {
                let k = rng.random_range(self.aisle_lines.clone()).min(n_items);
                let items = sample(&mut rng, n_items, k).into_vec();
                Aisle::new(
                    items
                        .into_iter()
                        .map(|i| (i, rng.random_range(self.aisle_qty.clone()))),
                )
            })
            .collect();
        let ub = rng.random_range(self.upper_bound.clone());

        Instance::new(n_items, orders, aisles, self.lower_bound, ub)
    }
}
