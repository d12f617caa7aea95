//! Mean-variance optimizers.
//!
//! All three optimizers solve their problem in closed form through a dense
//! linear system. A numerically singular system is not an error: the
//! optimizer logs a warning and returns equal weights.

use ballast_traits::{BallastError, Result};
use ndarray::{Array1, Array2, s};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::linalg::solve;
use crate::optimizer::{
    PortfolioOptimizer, clip, equal_weights, resolve_covariance, resolve_expected_returns,
    validate_bounds,
};

/// Normalizers smaller than this in magnitude are treated as zero.
const DEGENERATE_SUM: f64 = 1e-12;

/// Configuration for [`UnconstrainedMeanVarianceOptimizer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnconstrainedConfig {
    /// Risk aversion `γ`. Must be positive.
    pub risk_aversion: f64,
}

impl Default for UnconstrainedConfig {
    fn default() -> Self {
        Self { risk_aversion: 1.0 }
    }
}

/// Maximizes `μᵀw − (γ/2) wᵀΣw` with no constraints: `w = Σ⁻¹μ / γ`.
///
/// The weights are not normalized and may be leveraged.
#[derive(Debug, Clone, Default)]
pub struct UnconstrainedMeanVarianceOptimizer {
    config: UnconstrainedConfig,
}

impl UnconstrainedMeanVarianceOptimizer {
    /// Creates an optimizer.
    pub const fn new(config: UnconstrainedConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub const fn config(&self) -> &UnconstrainedConfig {
        &self.config
    }
}

impl PortfolioOptimizer for UnconstrainedMeanVarianceOptimizer {
    fn optimize(
        &self,
        historical_returns: &Array2<f64>,
        expected_returns: Option<&Array1<f64>>,
        covariance: Option<&Array2<f64>>,
    ) -> Result<Array1<f64>> {
        let gamma = self.config.risk_aversion;
        if !(gamma.is_finite() && gamma > 0.0) {
            return Err(BallastError::InvalidData(format!(
                "risk aversion must be positive, got {gamma}"
            )));
        }
        let covariance = resolve_covariance(historical_returns, covariance)?;
        let assets = covariance.nrows();
        let expected = resolve_expected_returns(historical_returns, expected_returns, assets)?;

        match solve(&covariance, &expected) {
            Ok(x) => Ok(x / gamma),
            Err(err) => {
                warn!(optimizer = self.name(), error = %err, "falling back to equal weights");
                Ok(equal_weights(assets))
            }
        }
    }

    fn name(&self) -> &str {
        "unconstrained_mean_variance"
    }
}

/// Configuration for [`MinimumVarianceOptimizer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimumVarianceConfig {
    /// Lower bound applied to every weight.
    pub lower_bound: f64,
    /// Upper bound applied to every weight.
    pub upper_bound: f64,
    /// Minimum expected portfolio return.
    pub target_return: f64,
}

impl Default for MinimumVarianceConfig {
    fn default() -> Self {
        Self {
            lower_bound: -1.0,
            upper_bound: 1.0,
            target_return: 0.02,
        }
    }
}

/// Minimizes `wᵀΣw` subject to `Σw = 1` and `μᵀw ≥ target_return`.
///
/// The budget-only problem is solved first; when its expected return falls
/// short of the target, the return constraint is added as an equality. The
/// solution is then clipped into `[lower_bound, upper_bound]`.
#[derive(Debug, Clone, Default)]
pub struct MinimumVarianceOptimizer {
    config: MinimumVarianceConfig,
}

impl MinimumVarianceOptimizer {
    /// Creates an optimizer.
    pub const fn new(config: MinimumVarianceConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub const fn config(&self) -> &MinimumVarianceConfig {
        &self.config
    }

    /// Solves the KKT system for `wᵀΣw` under the budget constraint and, when
    /// given, the return equality `μᵀw = target`.
    fn solve_kkt(
        covariance: &Array2<f64>,
        return_constraint: Option<(&Array1<f64>, f64)>,
    ) -> Result<Array1<f64>> {
        let n = covariance.nrows();
        let constraints = if return_constraint.is_some() { 2 } else { 1 };
        let size = n + constraints;

        let mut kkt = Array2::<f64>::zeros((size, size));
        let mut rhs = Array1::<f64>::zeros(size);
        kkt.slice_mut(s![..n, ..n]).assign(&(covariance * 2.0));
        for i in 0..n {
            kkt[[i, n]] = 1.0;
            kkt[[n, i]] = 1.0;
        }
        rhs[n] = 1.0;
        if let Some((expected, target)) = return_constraint {
            for i in 0..n {
                kkt[[i, n + 1]] = expected[i];
                kkt[[n + 1, i]] = expected[i];
            }
            rhs[n + 1] = target;
        }

        let solution = solve(&kkt, &rhs)?;
        Ok(solution.slice(s![..n]).to_owned())
    }
}

impl PortfolioOptimizer for MinimumVarianceOptimizer {
    fn optimize(
        &self,
        historical_returns: &Array2<f64>,
        expected_returns: Option<&Array1<f64>>,
        covariance: Option<&Array2<f64>>,
    ) -> Result<Array1<f64>> {
        let MinimumVarianceConfig {
            lower_bound,
            upper_bound,
            target_return,
        } = self.config;
        validate_bounds(lower_bound, upper_bound)?;
        let covariance = resolve_covariance(historical_returns, covariance)?;
        let assets = covariance.nrows();
        let expected = resolve_expected_returns(historical_returns, expected_returns, assets)?;

        let solved = Self::solve_kkt(&covariance, None).and_then(|weights| {
            if expected.dot(&weights) >= target_return {
                Ok(weights)
            } else {
                debug!(target_return, "adding target return constraint");
                Self::solve_kkt(&covariance, Some((&expected, target_return)))
            }
        });

        let weights = match solved {
            Ok(weights) => weights,
            Err(err) => {
                warn!(optimizer = self.name(), error = %err, "falling back to equal weights");
                equal_weights(assets)
            }
        };
        Ok(clip(weights, lower_bound, upper_bound))
    }

    fn name(&self) -> &str {
        "minimum_variance"
    }
}

/// Configuration for [`MaximumSharpeRatioOptimizer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaximumSharpeConfig {
    /// Lower bound applied to every weight.
    pub lower_bound: f64,
    /// Upper bound applied to every weight.
    pub upper_bound: f64,
    /// Per-period risk-free rate subtracted from expected returns.
    pub risk_free_rate: f64,
}

impl Default for MaximumSharpeConfig {
    fn default() -> Self {
        Self {
            lower_bound: -1.0,
            upper_bound: 1.0,
            risk_free_rate: 0.0,
        }
    }
}

/// Tangency portfolio: `w ∝ Σ⁻¹(μ − r_f)`, scaled to sum to one and clipped
/// into `[lower_bound, upper_bound]`.
#[derive(Debug, Clone, Default)]
pub struct MaximumSharpeRatioOptimizer {
    config: MaximumSharpeConfig,
}

impl MaximumSharpeRatioOptimizer {
    /// Creates an optimizer.
    pub const fn new(config: MaximumSharpeConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub const fn config(&self) -> &MaximumSharpeConfig {
        &self.config
    }
}

impl PortfolioOptimizer for MaximumSharpeRatioOptimizer {
    fn optimize(
        &self,
        historical_returns: &Array2<f64>,
        expected_returns: Option<&Array1<f64>>,
        covariance: Option<&Array2<f64>>,
    ) -> Result<Array1<f64>> {
        let MaximumSharpeConfig {
            lower_bound,
            upper_bound,
            risk_free_rate,
        } = self.config;
        validate_bounds(lower_bound, upper_bound)?;
        let covariance = resolve_covariance(historical_returns, covariance)?;
        let assets = covariance.nrows();
        let excess = resolve_expected_returns(historical_returns, expected_returns, assets)?
            - risk_free_rate;

        let weights = match solve(&covariance, &excess) {
            Ok(z) => {
                let total = z.sum();
                if total.abs() > DEGENERATE_SUM && total.is_finite() {
                    z / total
                } else {
                    warn!(
                        optimizer = self.name(),
                        total, "degenerate tangency portfolio, falling back to equal weights"
                    );
                    equal_weights(assets)
                }
            }
            Err(err) => {
                warn!(optimizer = self.name(), error = %err, "falling back to equal weights");
                equal_weights(assets)
            }
        };
        Ok(clip(weights, lower_bound, upper_bound))
    }

    fn name(&self) -> &str {
        "maximum_sharpe_ratio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ballast_traits::stats::portfolio_variance;
    use ndarray::array;

    fn no_returns(assets: usize) -> Array2<f64> {
        Array2::zeros((0, assets))
    }

    fn covariance() -> Array2<f64> {
        array![[0.04, 0.0], [0.0, 0.01]]
    }

    #[test]
    fn test_unconstrained_closed_form() {
        let optimizer = UnconstrainedMeanVarianceOptimizer::new(UnconstrainedConfig {
            risk_aversion: 2.0,
        });
        let mu = array![0.08, 0.02];
        let weights = optimizer
            .optimize(&no_returns(2), Some(&mu), Some(&covariance()))
            .unwrap();
        assert_relative_eq!(weights[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(weights[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unconstrained_uses_mean_returns() {
        let returns = array![[0.02, 0.01], [0.00, -0.01], [0.01, 0.03]];
        let optimizer = UnconstrainedMeanVarianceOptimizer::default();
        let implicit = optimizer.optimize(&returns, None, None).unwrap();
        let mean = array![0.01, 0.01];
        let explicit = optimizer.optimize(&returns, Some(&mean), None).unwrap();
        assert_relative_eq!(implicit[0], explicit[0], max_relative = 1e-9);
        assert_relative_eq!(implicit[1], explicit[1], max_relative = 1e-9);
    }

    #[test]
    fn test_unconstrained_singular_falls_back() {
        let cov = array![[1.0, 1.0], [1.0, 1.0]];
        let weights = UnconstrainedMeanVarianceOptimizer::default()
            .optimize(&no_returns(2), Some(&array![0.1, 0.2]), Some(&cov))
            .unwrap();
        assert_eq!(weights, array![0.5, 0.5]);
    }

    #[test]
    fn test_unconstrained_rejects_nonpositive_risk_aversion() {
        let optimizer = UnconstrainedMeanVarianceOptimizer::new(UnconstrainedConfig {
            risk_aversion: 0.0,
        });
        assert!(
            optimizer
                .optimize(&no_returns(2), Some(&array![0.1, 0.2]), Some(&covariance()))
                .is_err()
        );
    }

    #[test]
    fn test_minimum_variance_budget_only() {
        let optimizer = MinimumVarianceOptimizer::new(MinimumVarianceConfig {
            target_return: 0.0,
            ..MinimumVarianceConfig::default()
        });
        let weights = optimizer
            .optimize(&no_returns(2), Some(&array![0.05, 0.05]), Some(&covariance()))
            .unwrap();

        // inverse-variance weights
        assert_relative_eq!(weights[0], 0.2, epsilon = 1e-12);
        assert_relative_eq!(weights[1], 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_minimum_variance_hits_target() {
        let optimizer = MinimumVarianceOptimizer::default();
        let mu = array![0.03, 0.01];
        let weights = optimizer
            .optimize(&no_returns(2), Some(&mu), Some(&covariance()))
            .unwrap();

        // budget-only solution returns 0.014 < 0.02, so the target binds
        assert_relative_eq!(mu.dot(&weights), 0.02, epsilon = 1e-12);
        assert_relative_eq!(weights.sum(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(weights[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_minimum_variance_beats_equal_weights() {
        let cov = array![[0.04, 0.01, 0.0], [0.01, 0.02, 0.0], [0.0, 0.0, 0.09]];
        let optimizer = MinimumVarianceOptimizer::new(MinimumVarianceConfig {
            target_return: f64::NEG_INFINITY,
            ..MinimumVarianceConfig::default()
        });
        let weights = optimizer
            .optimize(&no_returns(3), Some(&Array1::zeros(3)), Some(&cov))
            .unwrap();
        let equal = Array1::from_elem(3, 1.0 / 3.0);
        assert!(portfolio_variance(&weights, &cov) < portfolio_variance(&equal, &cov));
    }

    #[test]
    fn test_minimum_variance_clips() {
        let optimizer = MinimumVarianceOptimizer::new(MinimumVarianceConfig {
            lower_bound: 0.0,
            upper_bound: 0.6,
            target_return: 0.0,
        });
        let weights = optimizer
            .optimize(&no_returns(2), Some(&array![0.05, 0.05]), Some(&covariance()))
            .unwrap();
        assert_relative_eq!(weights[0], 0.2, epsilon = 1e-12);
        assert_relative_eq!(weights[1], 0.6);
    }

    #[test]
    fn test_minimum_variance_singular_falls_back() {
        let cov = Array2::<f64>::zeros((3, 3));
        let weights = MinimumVarianceOptimizer::default()
            .optimize(&no_returns(3), Some(&Array1::zeros(3)), Some(&cov))
            .unwrap();
        for w in weights.iter() {
            assert_relative_eq!(*w, 1.0 / 3.0);
        }
    }

    #[test]
    fn test_maximum_sharpe_tangency() {
        let mu = array![0.08, 0.02];
        let weights = MaximumSharpeRatioOptimizer::default()
            .optimize(&no_returns(2), Some(&mu), Some(&covariance()))
            .unwrap();
        // Σ⁻¹μ = (2, 2)
        assert_relative_eq!(weights[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(weights[1], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_maximum_sharpe_risk_free_rate() {
        let optimizer = MaximumSharpeRatioOptimizer::new(MaximumSharpeConfig {
            risk_free_rate: 0.01,
            ..MaximumSharpeConfig::default()
        });
        let mu = array![0.09, 0.02];
        let weights = optimizer
            .optimize(&no_returns(2), Some(&mu), Some(&covariance()))
            .unwrap();
        // Σ⁻¹(μ − r_f) = (2, 1)
        assert_relative_eq!(weights[0], 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(weights[1], 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_maximum_sharpe_degenerate_normalizer() {
        let mu = array![0.04, -0.01];
        let weights = MaximumSharpeRatioOptimizer::default()
            .optimize(&no_returns(2), Some(&mu), Some(&covariance()))
            .unwrap();
        assert_eq!(weights, array![0.5, 0.5]);
    }

    #[test]
    fn test_invalid_bounds() {
        let optimizer = MaximumSharpeRatioOptimizer::new(MaximumSharpeConfig {
            lower_bound: 1.0,
            upper_bound: 0.0,
            risk_free_rate: 0.0,
        });
        assert!(
            optimizer
                .optimize(&no_returns(2), Some(&array![0.1, 0.1]), Some(&covariance()))
                .is_err()
        );
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: MinimumVarianceConfig =
            serde_json::from_str(r#"{"target_return": 0.05}"#).unwrap();
        assert_relative_eq!(config.target_return, 0.05);
        assert_relative_eq!(config.lower_bound, -1.0);
    }
}
