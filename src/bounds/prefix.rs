//! Density-prefix upper bound.

use crate::model::Instance;

/// `max_k min(top_k capped stock, ub) / k` over the aisles sorted by capped
/// stock, descending.
///
/// Any wave visiting `k` aisles picks at most the capped stock of those
/// aisles and at most `ub`, so no wave is denser than this. `None` when the
/// instance has no aisle.
pub fn density_prefix_bound(instance: &Instance) -> Option<f64> {
    let mut stock: Vec<u64> = (0..instance.n_aisles())
        .map(|a| instance.capped_stock(a))
        .collect();
    stock.sort_unstable_by(|a, b| b.cmp(a));

    let upper = instance.upper_bound();
    let mut cumulative: u64 = 0;
    stock
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            cumulative += s;
            cumulative.min(upper) as f64 / (i + 1) as f64
        })
        .reduce(f64::max)
}
