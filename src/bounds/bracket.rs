//! Interval known to contain the optimal density.

use tracing::debug;

use super::prefix::density_prefix_bound;
use super::relaxation::relaxation_bound;
use crate::deadline::Deadline;
use crate::mip::{SubSolver, WaveFormulation};

/// `lo <= λ* <= hi`. Both ends only ever move inward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub lo: f64,
    pub hi: f64,
}

impl Bracket {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Starts from the cheapest valid upper bounds: the density prefix bound
    /// and, when the backend supports it, the LP relaxation.
    pub fn initial<S: SubSolver + ?Sized>(
        formulation: &WaveFormulation<'_>,
        solver: &S,
        lower: f64,
        deadline: &Deadline,
    ) -> Self {
        let instance = formulation.instance();
        let prefix = density_prefix_bound(instance).unwrap_or(0.0);
        let relaxed = relaxation_bound(formulation, solver, deadline);
        let hi = relaxed.map_or(prefix, |r| r.min(prefix));
        debug!(prefix, relaxed = ?relaxed, lower, "initial bracket");
        Self {
            lo: lower.max(0.0),
            hi: hi.max(lower),
        }
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn midpoint(&self) -> f64 {
        0.5 * (self.lo + self.hi)
    }

    pub fn raise_lo(&mut self, value: f64) {
        if value > self.lo {
            self.lo = value.min(self.hi);
        }
    }

    pub fn lower_hi(&mut self, value: f64) {
        if value < self.hi {
            self.hi = value.max(self.lo);
        }
    }

    pub fn is_closed(&self, epsilon: f64) -> bool {
        self.width() <= epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mip::{EnumerationSolver, GoodLpSolver};
    use crate::model::{Aisle, Instance, Order};

    #[test]
    fn test_moves_only_inward() {
        let mut b = Bracket::new(1.0, 4.0);
        b.raise_lo(0.5);
        b.lower_hi(5.0);
        assert_eq!(b, Bracket::new(1.0, 4.0));
        b.raise_lo(2.0);
        b.lower_hi(3.0);
        assert_eq!(b.midpoint(), 2.5);
        b.raise_lo(10.0);
        assert_eq!(b, Bracket::new(3.0, 3.0));
        assert!(b.is_closed(1e-9));
    }

    #[test]
    fn test_initial_bracket() {
        let inst = Instance::new(
            1,
            vec![Order::new([(0, 1)]), Order::new([(0, 1)]), Order::new([(0, 1)])],
            vec![Aisle::new([(0, 2)]), Aisle::new([(0, 1)])],
            0,
            4,
        )
        .unwrap();
        let f = WaveFormulation::new(&inst);
        let deadline = Deadline::unbounded();
        let with_lp = Bracket::initial(&f, &GoodLpSolver::new(), 1.0, &deadline);
        let without_lp = Bracket::initial(&f, &EnumerationSolver::new(), 1.0, &deadline);
        assert_eq!(without_lp, Bracket::new(1.0, 2.0));
        assert!(with_lp.hi <= without_lp.hi + 1e-9);
        assert!(with_lp.hi >= 2.0 - 1e-6);
    }
}
