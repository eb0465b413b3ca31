//! Orders, aisles and the validated instance with its derived aggregates.

use super::wave::{Violation, Wave};
use crate::error::WaveError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Merges `(item, quantity)` pairs into a sorted, duplicate-free list.
fn normalize(lines: impl IntoIterator<Item = (usize, u32)>) -> Vec<(usize, u32)> {
    let mut lines: Vec<(usize, u32)> = lines.into_iter().collect();
    lines.sort_unstable_by_key(|&(item, _)| item);
    let mut merged: Vec<(usize, u32)> = Vec::with_capacity(lines.len());
    for (item, qty) in lines {
        match merged.last_mut() {
            Some(last) if last.0 == item => last.1 = last.1.saturating_add(qty),
            _ => merged.push((item, qty)),
        }
    }
    merged
}

fn lookup(lines: &[(usize, u32)], item: usize) -> u32 {
    lines
        .binary_search_by_key(&item, |&(i, _)| i)
        .map(|pos| lines[pos].1)
        .unwrap_or(0)
}

/// A customer order: a sparse demand vector over item types.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Order {
    lines: Vec<(usize, u32)>,
    size: u64,
}

impl Order {
    /// Builds an order from `(item, quantity)` pairs. Repeated items are summed.
    pub fn new(lines: impl IntoIterator<Item = (usize, u32)>) -> Self {
        let lines = normalize(lines);
        let size = lines.iter().map(|&(_, q)| u64::from(q)).sum();
        Self { lines, size }
    }

    /// Demand lines sorted by item id.
    pub fn lines(&self) -> &[(usize, u32)] {
        &self.lines
    }

    /// Total units demanded.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Units of `item` demanded (0 when absent).
    pub fn quantity(&self, item: usize) -> u32 {
        lookup(&self.lines, item)
    }
}

/// A supply location: a sparse stock vector over item types.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aisle {
    lines: Vec<(usize, u32)>,
    stock: u64,
}

impl Aisle {
    /// Builds an aisle from `(item, quantity)` pairs. Zero quantities are dropped.
    pub fn new(lines: impl IntoIterator<Item = (usize, u32)>) -> Self {
        let lines: Vec<(usize, u32)> = normalize(lines)
            .into_iter()
            .filter(|&(_, q)| q > 0)
            .collect();
        let stock = lines.iter().map(|&(_, q)| u64::from(q)).sum();
        Self { lines, stock }
    }

    /// Stock lines sorted by item id.
    pub fn lines(&self) -> &[(usize, u32)] {
        &self.lines
    }

    /// Total units held.
    pub fn stock(&self) -> u64 {
        self.stock
    }

    /// Number of distinct item types held.
    pub fn distinct_items(&self) -> usize {
        self.lines.len()
    }

    /// Units of `item` held (0 when absent).
    pub fn quantity(&self, item: usize) -> u32 {
        lookup(&self.lines, item)
    }
}

/// A validated problem instance.
///
/// Besides the raw data it keeps the aggregates every search layer needs in
/// constant time: per-item total demand, item→orders and item→aisles indices,
/// and per-aisle stock capped at the total demand of each item. The capped
/// coefficients give the same feasible set as the raw stock but a tighter
/// linear relaxation.
#[derive(Debug, Clone)]
pub struct Instance {
    n_items: usize,
    orders: Vec<Order>,
    aisles: Vec<Aisle>,
    lower: u64,
    upper: u64,
    item_demand: Vec<u64>,
    item_orders: Vec<Vec<usize>>,
    item_aisles: Vec<Vec<usize>>,
    capped: Vec<Vec<(usize, u64)>>,
    capped_stock: Vec<u64>,
}

impl Instance {
    /// Validates the data and builds the aggregates.
    ///
    /// # Errors
    ///
    /// [`WaveError::InvalidInstance`] for negative bounds, `lb > ub`, an item
    /// id `>= n_items` in any order or aisle, or a zero order quantity.
    pub fn new(
        n_items: usize,
        orders: Vec<Order>,
        aisles: Vec<Aisle>,
        lb: i64,
        ub: i64,
    ) -> Result<Self, WaveError> {
        if lb < 0 || ub < 0 {
            return Err(WaveError::InvalidInstance(format!(
                "wave size bounds must be non-negative (lb={lb}, ub={ub})"
            )));
        }
        if lb > ub {
            return Err(WaveError::InvalidInstance(format!(
                "lower bound {lb} exceeds upper bound {ub}"
            )));
        }
        for (o, order) in orders.iter().enumerate() {
            for &(item, qty) in order.lines() {
                if item >= n_items {
                    return Err(WaveError::InvalidInstance(format!(
                        "order {o} references item {item} (n_items={n_items})"
                    )));
                }
                if qty == 0 {
                    return Err(WaveError::InvalidInstance(format!(
                        "order {o} has zero quantity for item {item}"
                    )));
                }
            }
        }
        for (a, aisle) in aisles.iter().enumerate() {
            if let Some(&(item, _)) = aisle.lines().iter().find(|&&(i, _)| i >= n_items) {
                return Err(WaveError::InvalidInstance(format!(
                    "aisle {a} references item {item} (n_items={n_items})"
                )));
            }
        }
        Ok(Self::assemble(n_items, orders, aisles, lb as u64, ub as u64))
    }

    fn assemble(
        n_items: usize,
        orders: Vec<Order>,
        aisles: Vec<Aisle>,
        lower: u64,
        upper: u64,
    ) -> Self {
        let mut item_demand = vec![0u64; n_items];
        let mut item_orders = vec![Vec::new(); n_items];
        for (o, order) in orders.iter().enumerate() {
            for &(item, qty) in order.lines() {
                item_demand[item] += u64::from(qty);
                item_orders[item].push(o);
            }
        }

        let mut item_aisles = vec![Vec::new(); n_items];
        let mut capped = Vec::with_capacity(aisles.len());
        let mut capped_stock = Vec::with_capacity(aisles.len());
        for (a, aisle) in aisles.iter().enumerate() {
            let mut lines = Vec::with_capacity(aisle.lines().len());
            for &(item, qty) in aisle.lines() {
                item_aisles[item].push(a);
                let cap = u64::from(qty).min(item_demand[item]);
                if cap > 0 {
                    lines.push((item, cap));
                }
            }
            capped_stock.push(lines.iter().map(|&(_, c)| c).sum());
            capped.push(lines);
        }

        Self {
            n_items,
            orders,
            aisles,
            lower,
            upper,
            item_demand,
            item_orders,
            item_aisles,
            capped,
            capped_stock,
        }
    }

    /// Number of item types; valid item ids are `0..n_items`.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of orders.
    pub fn n_orders(&self) -> usize {
        self.orders.len()
    }

    /// Number of aisles.
    pub fn n_aisles(&self) -> usize {
        self.aisles.len()
    }

    /// Orders in input order; a wave refers to them by index.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Aisles in input order; a wave refers to them by index.
    pub fn aisles(&self) -> &[Aisle] {
        &self.aisles
    }

    /// Minimum units a wave must pick.
    pub fn lower_bound(&self) -> u64 {
        self.lower
    }

    /// Maximum units a wave may pick.
    pub fn upper_bound(&self) -> u64 {
        self.upper
    }

    /// Total demand for `item` over all orders.
    pub fn item_demand(&self, item: usize) -> u64 {
        self.item_demand[item]
    }

    /// Orders demanding `item`.
    pub fn orders_with(&self, item: usize) -> &[usize] {
        &self.item_orders[item]
    }

    /// Aisles stocking `item`.
    pub fn aisles_with(&self, item: usize) -> &[usize] {
        &self.item_aisles[item]
    }

    /// Stock lines of aisle `a` capped at total demand; items nobody demands
    /// are omitted.
    pub fn capped_lines(&self, a: usize) -> &[(usize, u64)] {
        &self.capped[a]
    }

    /// Sum of [`capped_lines`](Self::capped_lines) for aisle `a`.
    pub fn capped_stock(&self, a: usize) -> u64 {
        self.capped_stock[a]
    }

    /// Verifies the wave against the band, coverage and non-empty-aisle
    /// rules, reporting the first violation found.
    pub fn check(&self, wave: &Wave) -> Result<(), Violation> {
        if let Some(&o) = wave.orders().iter().find(|&&o| o >= self.orders.len()) {
            return Err(Violation::IndexOutOfRange { kind: "order", index: o });
        }
        if let Some(&a) = wave.aisles().iter().find(|&&a| a >= self.aisles.len()) {
            return Err(Violation::IndexOutOfRange { kind: "aisle", index: a });
        }
        if wave.aisles().is_empty() {
            return Err(Violation::EmptyAisles);
        }

        let units = self.units(wave);
        if units < self.lower {
            return Err(Violation::BelowLowerBound { units, lower: self.lower });
        }
        if units > self.upper {
            return Err(Violation::AboveUpperBound { units, upper: self.upper });
        }

        let mut balance = vec![0i64; self.n_items];
        for &o in wave.orders() {
            for &(item, qty) in self.orders[o].lines() {
                balance[item] += i64::from(qty);
            }
        }
        for &a in wave.aisles() {
            for &(item, qty) in self.aisles[a].lines() {
                balance[item] -= i64::from(qty);
            }
        }
        if let Some((item, &excess)) = balance.iter().enumerate().find(|(_, &b)| b > 0) {
            let demand: u64 = wave
                .orders()
                .iter()
                .map(|&o| u64::from(self.orders[o].quantity(item)))
                .sum();
            return Err(Violation::ItemShortage {
                item,
                demand,
                supply: demand - excess as u64,
            });
        }
        Ok(())
    }

    /// Whether [`check`](Self::check) passes.
    pub fn is_feasible(&self, wave: &Wave) -> bool {
        self.check(wave).is_ok()
    }

    /// Units picked by the wave's orders. Out-of-range indices count as zero.
    pub fn units(&self, wave: &Wave) -> u64 {
        wave.orders()
            .iter()
            .filter_map(|&o| self.orders.get(o))
            .map(Order::size)
            .sum()
    }

    /// Picked units per selected aisle; `None` when no aisle is selected.
    pub fn density(&self, wave: &Wave) -> Option<f64> {
        if wave.aisles().is_empty() {
            return None;
        }
        Some(self.units(wave) as f64 / wave.aisles().len() as f64)
    }

    /// Density of the wave if it is feasible.
    pub fn evaluate(&self, wave: &Wave) -> Option<f64> {
        if self.is_feasible(wave) {
            self.density(wave)
        } else {
            None
        }
    }

    /// Sub-instance over the given orders with every aisle and the same
    /// bounds. Returns it with the map from sub-instance order index to
    /// original order index.
    pub fn restrict_orders(&self, keep: &[usize]) -> (Instance, Vec<usize>) {
        let mut map: Vec<usize> = keep
            .iter()
            .copied()
            .filter(|&o| o < self.orders.len())
            .collect();
        map.sort_unstable();
        map.dedup();
        let orders = map.iter().map(|&o| self.orders[o].clone()).collect();
        let sub = Self::assemble(
            self.n_items,
            orders,
            self.aisles.clone(),
            self.lower,
            self.upper,
        );
        (sub, map)
    }

    /// Sub-instance over the given aisles with every order and the same
    /// bounds. Returns it with the map from sub-instance aisle index to
    /// original aisle index, in the order given (duplicates and
    /// out-of-range indices dropped).
    pub fn restrict_aisles(&self, keep: &[usize]) -> (Instance, Vec<usize>) {
        let mut seen = vec![false; self.aisles.len()];
        let map: Vec<usize> = keep
            .iter()
            .copied()
            .filter(|&a| a < self.aisles.len() && !std::mem::replace(&mut seen[a], true))
            .collect();
        let aisles = map.iter().map(|&a| self.aisles[a].clone()).collect();
        let sub = Self::assemble(
            self.n_items,
            self.orders.clone(),
            aisles,
            self.lower,
            self.upper,
        );
        (sub, map)
    }
}
