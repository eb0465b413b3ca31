//! Parametric search configuration and strategy presets.

use super::adaptive::AdaptiveConfig;
use super::sweep::{AisleSweep, SweepMode};
use crate::bounds::LagrangianConfig;

/// How the trial price moves between iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceUpdate {
    /// Dinkelbach/Newton step: the next price is the density of the latest
    /// solution, `λ + f(λ) / aisles(S*)`.
    Newton,
    /// Midpoint of the current bracket.
    Bisection,
}

/// Configuration for [`ParametricRunner`](super::ParametricRunner).
///
/// # Examples
///
/// ```
/// use u_wavepick::parametric::{ParametricConfig, PriceUpdate};
///
/// let config = ParametricConfig::neighborhood(3)
///     .with_max_iterations(50)
///     .with_local_search(false);
/// assert_eq!(config.price_update, PriceUpdate::Newton);
/// assert_eq!(config.neighborhood_radius, Some(3));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ParametricConfig {
    pub price_update: PriceUpdate,

    /// Skip sub-solver calls the Lagrangian bound proves useless.
    pub lagrangian_pruning: bool,

    pub lagrangian: LagrangianConfig,

    /// On odd iterations, allow at most this many aisles to differ from the
    /// incumbent. `None` disables the restriction.
    pub neighborhood_radius: Option<usize>,

    /// Run local search repair after every sub-solver call.
    pub local_search: bool,

    pub max_iterations: usize,

    /// Zero tolerance for objective values and bracket width.
    pub epsilon: f64,

    pub adaptive: AdaptiveConfig,

    /// Seed the loop with a fixed aisle-count sweep. `None` skips it.
    pub aisle_sweep: Option<AisleSweep>,
}

impl Default for ParametricConfig {
    fn default() -> Self {
        Self::dinkelbach()
    }
}

impl ParametricConfig {
    /// Plain Dinkelbach iteration with local search.
    pub fn dinkelbach() -> Self {
        Self {
            price_update: PriceUpdate::Newton,
            lagrangian_pruning: false,
            lagrangian: LagrangianConfig::default(),
            neighborhood_radius: None,
            local_search: true,
            max_iterations: 100,
            epsilon: 1e-6,
            adaptive: AdaptiveConfig::default(),
            aisle_sweep: None,
        }
    }

    /// Bisection on the bracket.
    pub fn binary_search() -> Self {
        Self {
            price_update: PriceUpdate::Bisection,
            max_iterations: 200,
            ..Self::dinkelbach()
        }
    }

    /// Dinkelbach with Lagrangian pruning of hopeless calls.
    pub fn lagrangian() -> Self {
        Self {
            lagrangian_pruning: true,
            ..Self::dinkelbach()
        }
    }

    /// Dinkelbach alternating with aisle-neighbourhood restricted calls.
    pub fn neighborhood(radius: usize) -> Self {
        Self {
            neighborhood_radius: Some(radius),
            ..Self::dinkelbach()
        }
    }

    /// Dinkelbach seeded by a sweep over `k = 1..=max_aisles` aisles.
    pub fn fixed_aisles(max_aisles: usize) -> Self {
        Self {
            aisle_sweep: Some(AisleSweep::new(SweepMode::AisleCount, max_aisles)),
            ..Self::dinkelbach()
        }
    }

    pub fn with_price_update(mut self, update: PriceUpdate) -> Self {
        self.price_update = update;
        self
    }

    pub fn with_lagrangian_pruning(mut self, enabled: bool) -> Self {
        self.lagrangian_pruning = enabled;
        self
    }

    pub fn with_lagrangian(mut self, config: LagrangianConfig) -> Self {
        self.lagrangian = config;
        self
    }

    pub fn with_neighborhood_radius(mut self, radius: Option<usize>) -> Self {
        self.neighborhood_radius = radius;
        self
    }

    pub fn with_local_search(mut self, enabled: bool) -> Self {
        self.local_search = enabled;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_adaptive(mut self, adaptive: AdaptiveConfig) -> Self {
        self.adaptive = adaptive;
        self
    }

    pub fn with_aisle_sweep(mut self, sweep: Option<AisleSweep>) -> Self {
        self.aisle_sweep = sweep;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".into());
        }
        if !(self.epsilon > 0.0 && self.epsilon < 1.0) {
            return Err("epsilon must be in (0, 1)".into());
        }
        if self.neighborhood_radius == Some(0) {
            return Err("neighborhood_radius must be positive".into());
        }
        if self.lagrangian_pruning {
            self.lagrangian.validate()?;
        }
        if let Some(sweep) = &self.aisle_sweep {
            sweep.validate()?;
        }
        self.adaptive.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(ParametricConfig::dinkelbach().price_update, PriceUpdate::Newton);
        assert_eq!(
            ParametricConfig::binary_search().price_update,
            PriceUpdate::Bisection
        );
        assert!(ParametricConfig::lagrangian().lagrangian_pruning);
        assert_eq!(
            ParametricConfig::neighborhood(2).neighborhood_radius,
            Some(2)
        );
        assert_eq!(
            ParametricConfig::fixed_aisles(10).aisle_sweep,
            Some(AisleSweep::new(SweepMode::AisleCount, 10))
        );
        for config in [
            ParametricConfig::dinkelbach(),
            ParametricConfig::binary_search(),
            ParametricConfig::lagrangian(),
            ParametricConfig::neighborhood(4),
            ParametricConfig::fixed_aisles(40),
        ] {
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_validation() {
        assert!(ParametricConfig::default()
            .with_max_iterations(0)
            .validate()
            .is_err());
        assert!(ParametricConfig::default().with_epsilon(0.0).validate().is_err());
        assert!(ParametricConfig::neighborhood(0).validate().is_err());
        assert!(ParametricConfig::fixed_aisles(0).validate().is_err());
        assert!(ParametricConfig::lagrangian()
            .with_lagrangian(LagrangianConfig::default().with_iterations(0))
            .validate()
            .is_err());
    }
}
