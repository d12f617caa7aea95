//! Risk parity (risk budgeting) optimizer.

use ballast_traits::{BallastError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::linalg::{cholesky, cholesky_solve};
use crate::optimizer::{PortfolioOptimizer, clip, equal_weights, resolve_covariance};

/// Lowest admissible minimum weight.
pub const MINIMUM_WEIGHT_FLOOR: f64 = 1e-5;

/// Step halvings allowed per Newton iteration before giving up.
const MAX_STEP_HALVINGS: usize = 64;

/// Configuration for [`RiskParityOptimizer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParityConfig {
    /// Lower bound applied to every weight. Floored at [`MINIMUM_WEIGHT_FLOOR`].
    pub minimum_weight: f64,
    /// Upper bound applied to every weight. Floored at `minimum_weight`.
    pub maximum_weight: f64,
    /// Newton iteration limit.
    pub max_iterations: usize,
    /// Convergence threshold on the largest gradient component, relative to
    /// the larger of `max|Σw|` and `max|b/w|`.
    pub tolerance: f64,
}

impl Default for RiskParityConfig {
    fn default() -> Self {
        Self {
            minimum_weight: MINIMUM_WEIGHT_FLOOR,
            maximum_weight: f64::MAX,
            max_iterations: 100,
            tolerance: 1e-10,
        }
    }
}

/// Allocates so that each asset's share of portfolio variance matches a
/// risk budget.
///
/// Solves
///
/// ```text
/// minimize  ½ wᵀ Σ w − Σᵢ bᵢ ln wᵢ      (w > 0)
/// ```
///
/// by Newton's method from `w₀ = 1/K`. At the optimum `wᵢ (Σw)ᵢ = bᵢ`, so
/// after normalizing to sum to one each asset's risk contribution is
/// proportional to its budget.
///
/// When the solve fails (indefinite Hessian, non-finite iterate, iteration
/// limit) the optimizer falls back to `w₀`. Either way the result is clipped
/// into `[minimum_weight, maximum_weight]` without re-normalizing, so a
/// binding bound can leave the weights summing to something other than one.
///
/// # Examples
///
/// ```
/// use ballast_optim::RiskParityOptimizer;
/// use ndarray::{Array2, array};
///
/// let optimizer = RiskParityOptimizer::default();
/// let covariance = array![[0.04, 0.0], [0.0, 0.01]];
/// let weights = optimizer
///     .optimize(&Array2::zeros((0, 2)), None, Some(&covariance))
///     .unwrap();
///
/// // the low-volatility asset gets twice the weight
/// assert!((weights[0] - 1.0 / 3.0).abs() < 1e-8);
/// assert!((weights[1] - 2.0 / 3.0).abs() < 1e-8);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RiskParityOptimizer {
    config: RiskParityConfig,
}

impl RiskParityOptimizer {
    /// Creates an optimizer, flooring the bounds into a valid range.
    pub fn new(config: RiskParityConfig) -> Self {
        let minimum_weight = if config.minimum_weight.is_nan() {
            MINIMUM_WEIGHT_FLOOR
        } else {
            config.minimum_weight.max(MINIMUM_WEIGHT_FLOOR)
        };
        let maximum_weight = if config.maximum_weight.is_nan() {
            f64::MAX
        } else {
            config.maximum_weight.max(minimum_weight)
        };
        Self {
            config: RiskParityConfig {
                minimum_weight,
                maximum_weight,
                ..config
            },
        }
    }

    /// Get the effective configuration.
    pub const fn config(&self) -> &RiskParityConfig {
        &self.config
    }

    /// Computes risk parity weights.
    ///
    /// `budget` defaults to `1/K` for every asset. `covariance` defaults to
    /// the sample covariance of `historical_returns`.
    ///
    /// # Errors
    ///
    /// Returns an error when the covariance is missing and cannot be
    /// estimated, is malformed, or when the budget length differs from the
    /// number of assets or holds negative or non-finite entries. Solver
    /// failures are not errors; see the type-level docs.
    pub fn optimize(
        &self,
        historical_returns: &Array2<f64>,
        budget: Option<&Array1<f64>>,
        covariance: Option<&Array2<f64>>,
    ) -> Result<Array1<f64>> {
        let covariance = resolve_covariance(historical_returns, covariance)?;
        let assets = covariance.nrows();
        let budget = match budget {
            Some(budget) => {
                validate_budget(budget, assets)?;
                budget.to_owned()
            }
            None => equal_weights(assets),
        };

        let start = equal_weights(assets);
        let weights = match self.solve(&covariance, &budget, &start) {
            Ok(solution) => {
                let total = solution.sum();
                solution / total
            }
            Err(reason) => {
                warn!(
                    assets,
                    reason = %reason,
                    "risk parity solve failed, falling back to equal weights"
                );
                start
            }
        };

        Ok(clip(
            weights,
            self.config.minimum_weight,
            self.config.maximum_weight,
        ))
    }

    /// Newton iteration on the log-barrier objective.
    fn solve(
        &self,
        covariance: &Array2<f64>,
        budget: &Array1<f64>,
        start: &Array1<f64>,
    ) -> std::result::Result<Array1<f64>, String> {
        let mut w = start.clone();

        for iteration in 0..self.config.max_iterations {
            let marginal = covariance.dot(&w);
            let barrier = budget / &w;
            let gradient = &marginal - &barrier;
            let residual = max_abs(&gradient);
            if !residual.is_finite() {
                return Err(format!("non-finite gradient at iteration {iteration}"));
            }
            // both terms balance at the optimum, so their size sets the scale
            let scale = max_abs(&marginal).max(max_abs(&barrier));
            if residual <= self.config.tolerance * scale {
                debug!(iterations = iteration, residual, scale, "risk parity converged");
                return Ok(w);
            }

            let mut hessian = covariance.clone();
            for i in 0..w.len() {
                hessian[[i, i]] += budget[i] / (w[i] * w[i]);
            }
            let factor = cholesky(&hessian)
                .ok_or_else(|| format!("hessian not positive definite at iteration {iteration}"))?;
            let direction = cholesky_solve(&factor, &gradient.mapv(|g| -g));

            let mut step = 1.0;
            let mut halvings = 0;
            while w.iter().zip(direction.iter()).any(|(wi, di)| wi + step * di <= 0.0) {
                step *= 0.5;
                halvings += 1;
                if halvings > MAX_STEP_HALVINGS {
                    return Err(format!("step vanished at iteration {iteration}"));
                }
            }
            w.scaled_add(step, &direction);

            if w.iter().any(|wi| !wi.is_finite()) {
                return Err(format!("non-finite iterate at iteration {iteration}"));
            }
        }

        Err(format!(
            "no convergence within {} iterations",
            self.config.max_iterations
        ))
    }
}

fn max_abs(values: &Array1<f64>) -> f64 {
    values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}

fn validate_budget(budget: &Array1<f64>, assets: usize) -> Result<()> {
    if budget.len() != assets {
        return Err(BallastError::DimensionMismatch(format!(
            "risk budget has {} entries for {assets} assets",
            budget.len()
        )));
    }
    if budget.iter().any(|b| !b.is_finite() || *b < 0.0) {
        return Err(BallastError::InvalidData(
            "risk budget entries must be finite and nonnegative".to_string(),
        ));
    }
    Ok(())
}

impl PortfolioOptimizer for RiskParityOptimizer {
    /// Risk parity ignores expected returns and uses the equal budget.
    fn optimize(
        &self,
        historical_returns: &Array2<f64>,
        _expected_returns: Option<&Array1<f64>>,
        covariance: Option<&Array2<f64>>,
    ) -> Result<Array1<f64>> {
        Self::optimize(self, historical_returns, None, covariance)
    }

    fn name(&self) -> &str {
        "risk_parity"
    }
}
