//! Top-level solver configuration.

use std::time::Duration;

use crate::parametric::ParametricConfig;

/// Configuration for [`WaveSolver`](super::WaveSolver).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_wavepick::decompose::WaveConfig;
/// use u_wavepick::parametric::ParametricConfig;
///
/// let config = WaveConfig::default()
///     .with_time_limit(Duration::from_secs(30))
///     .with_parametric(ParametricConfig::lagrangian());
/// assert!(config.decomposition);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct WaveConfig {
    /// Hard wall-clock limit for the whole run. `None` = no limit.
    pub time_limit: Option<Duration>,

    /// Solve unit-demand and general orders separately first, then use the
    /// denser partition result to seed the full pass.
    pub decomposition: bool,

    /// Fraction of the remaining time each partition may use.
    pub partition_share: f64,

    /// Solve first over only this share of the aisles, ranked by distinct
    /// items, and seed the full pass with the result. `None` = skip.
    pub aisle_reduction: Option<f64>,

    pub parametric: ParametricConfig,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            time_limit: Some(Duration::from_secs(600)),
            decomposition: true,
            partition_share: 0.25,
            aisle_reduction: None,
            parametric: ParametricConfig::default(),
        }
    }
}

impl WaveConfig {
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn without_time_limit(mut self) -> Self {
        self.time_limit = None;
        self
    }

    pub fn with_decomposition(mut self, enabled: bool) -> Self {
        self.decomposition = enabled;
        self
    }

    pub fn with_partition_share(mut self, share: f64) -> Self {
        self.partition_share = share;
        self
    }

    pub fn with_aisle_reduction(mut self, share: f64) -> Self {
        self.aisle_reduction = Some(share);
        self
    }

    pub fn with_parametric(mut self, parametric: ParametricConfig) -> Self {
        self.parametric = parametric;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.time_limit.is_some_and(|t| t.is_zero()) {
            return Err("time_limit must be positive".into());
        }
        if !(self.partition_share > 0.0 && self.partition_share < 0.5) {
            return Err("partition_share must be in (0, 0.5)".into());
        }
        if self
            .aisle_reduction
            .is_some_and(|share| !(share > 0.0 && share <= 1.0))
        {
            return Err("aisle_reduction must be in (0, 1]".into());
        }
        self.parametric.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(WaveConfig::default().validate().is_ok());
        assert!(WaveConfig::default().without_time_limit().validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        assert!(WaveConfig::default()
            .with_time_limit(Duration::ZERO)
            .validate()
            .is_err());
        assert!(WaveConfig::default()
            .with_partition_share(0.75)
            .validate()
            .is_err());
        assert!(WaveConfig::default()
            .with_aisle_reduction(0.0)
            .validate()
            .is_err());
        assert!(WaveConfig::default()
            .with_aisle_reduction(1.5)
            .validate()
            .is_err());
        assert!(WaveConfig::default()
            .with_aisle_reduction(0.75)
            .validate()
            .is_ok());
        assert!(WaveConfig::default()
            .with_parametric(ParametricConfig::default().with_max_iterations(0))
            .validate()
            .is_err());
    }
}
