//! Greedy Covering for orders of a single unit.

use crate::model::{Incumbent, Instance, Wave};

/// Opens aisles by how many pending single-unit orders they could serve.
///
/// Each aisle's score is `Σ_i min(stock_i, pending_i)`. After an aisle is
/// opened only the aisles stocking the items it consumed are rescored.
/// Orders with more than one unit are ignored.
#[derive(Debug, Clone)]
pub struct GreedyCovering {
    epsilon: f64,
}

impl Default for GreedyCovering {
    fn default() -> Self {
        Self { epsilon: 1e-9 }
    }
}

impl GreedyCovering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a wave from the unit orders; `None` when the lower bound cannot
    /// be reached or the result does not beat `incoming`.
    pub fn solve(&self, instance: &Instance, incoming: Option<f64>) -> Option<Incumbent> {
        let lower = instance.lower_bound();
        let upper = instance.upper_bound();

        let mut pending: Vec<Vec<usize>> = vec![Vec::new(); instance.n_items()];
        for (o, order) in instance.orders().iter().enumerate() {
            if let [(item, 1)] = order.lines() {
                pending[*item].push(o);
            }
        }

        let stock = |a: usize, item: usize| u64::from(instance.aisles()[a].quantity(item));
        let mut score: Vec<u64> = instance
            .aisles()
            .iter()
            .map(|aisle| {
                aisle
                    .lines()
                    .iter()
                    .map(|&(item, qty)| u64::from(qty).min(pending[item].len() as u64))
                    .sum()
            })
            .collect();
        let mut open = vec![false; instance.n_aisles()];

        let mut opened: Vec<usize> = Vec::new();
        let mut picked: Vec<usize> = Vec::new();

        loop {
            if !opened.is_empty() && picked.len() as u64 >= lower {
                break;
            }
            let best = (0..instance.n_aisles())
                .filter(|&a| !open[a] && score[a] > 0)
                .max_by(|&a, &b| score[a].cmp(&score[b]).then(b.cmp(&a)));
            let Some(a) = best else { break };
            open[a] = true;
            opened.push(a);

            for &(item, qty) in instance.aisles()[a].lines() {
                let before = pending[item].len() as u64;
                let room = upper - picked.len() as u64;
                let take = u64::from(qty).min(before).min(room);
                if take == 0 {
                    continue;
                }
                for _ in 0..take {
                    if let Some(o) = pending[item].pop() {
                        picked.push(o);
                    }
                }
                let after = pending[item].len() as u64;
                for &b in instance.aisles_with(item) {
                    if open[b] {
                        continue;
                    }
                    let c = stock(b, item);
                    if c <= after {
                        continue;
                    }
                    score[b] -= if c >= before { before - after } else { c - after };
                }
            }
        }

        if opened.is_empty() || (picked.len() as u64) < lower {
            return None;
        }
        let density = picked.len() as f64 / opened.len() as f64;
        if incoming.is_some_and(|floor| density <= floor + self.epsilon) {
            return None;
        }
        Some(Incumbent::new(Wave::new(picked, opened), density))
    }
}
