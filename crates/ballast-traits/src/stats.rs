//! Statistical utility functions over return matrices.
//!
//! Return matrices are laid out `(periods × assets)`: one row per period,
//! one column per asset.

use ndarray::{Array1, Array2, Axis};

use crate::error::{BallastError, Result};

/// Relative tolerance used when checking covariance symmetry.
pub const SYMMETRY_TOLERANCE: f64 = 1e-8;

/// Per-asset mean of a `(periods × assets)` return matrix.
///
/// # Errors
///
/// Returns [`BallastError::InsufficientData`] when the matrix has no rows.
pub fn mean_returns(returns: &Array2<f64>) -> Result<Array1<f64>> {
    returns
        .mean_axis(Axis(0))
        .ok_or_else(|| BallastError::InsufficientData("return history has no rows".to_string()))
}

/// Sample covariance (N-1 denominator) of a `(periods × assets)` return matrix.
///
/// # Errors
///
/// Returns [`BallastError::InsufficientData`] with fewer than two periods or
/// no assets, and [`BallastError::InvalidData`] when the returns hold
/// non-finite values.
///
/// # Examples
///
/// ```
/// use ballast_traits::stats::sample_covariance;
/// use ndarray::array;
///
/// let returns = array![[0.01, 0.02], [0.03, 0.00], [-0.01, 0.01]];
/// let cov = sample_covariance(&returns).unwrap();
/// assert_eq!(cov.dim(), (2, 2));
/// assert!((cov[[0, 1]] - cov[[1, 0]]).abs() < 1e-15);
/// ```
pub fn sample_covariance(returns: &Array2<f64>) -> Result<Array2<f64>> {
    let (periods, assets) = returns.dim();
    if assets == 0 {
        return Err(BallastError::InsufficientData(
            "return history has no assets".to_string(),
        ));
    }
    if periods < 2 {
        return Err(BallastError::InsufficientData(format!(
            "need at least 2 periods to estimate covariance, have {periods}"
        )));
    }
    if returns.iter().any(|r| !r.is_finite()) {
        return Err(BallastError::InvalidData(
            "return history contains non-finite values".to_string(),
        ));
    }

    let mean = mean_returns(returns)?;
    let centered = returns - &mean;
    Ok(centered.t().dot(&centered) / (periods - 1) as f64)
}

/// Checks that `covariance` is a finite, square, symmetric matrix.
///
/// # Errors
///
/// Returns [`BallastError::InvalidData`] describing the first violation.
pub fn validate_covariance(covariance: &Array2<f64>) -> Result<()> {
    let (rows, cols) = covariance.dim();
    if rows != cols {
        return Err(BallastError::InvalidData(format!(
            "covariance must be square, got {rows}x{cols}"
        )));
    }
    if covariance.iter().any(|c| !c.is_finite()) {
        return Err(BallastError::InvalidData(
            "covariance contains non-finite values".to_string(),
        ));
    }
    let scale = covariance.iter().fold(1.0_f64, |acc, c| acc.max(c.abs()));
    for i in 0..rows {
        for j in (i + 1)..cols {
            if (covariance[[i, j]] - covariance[[j, i]]).abs() > SYMMETRY_TOLERANCE * scale {
                return Err(BallastError::InvalidData(format!(
                    "covariance is not symmetric at ({i}, {j})"
                )));
            }
        }
    }
    Ok(())
}

/// Portfolio variance `wᵀ Σ w`.
pub fn portfolio_variance(weights: &Array1<f64>, covariance: &Array2<f64>) -> f64 {
    weights.dot(&covariance.dot(weights))
}

/// Absolute risk contribution of each asset, `wᵢ (Σ w)ᵢ`.
///
/// The contributions sum to the portfolio variance.
pub fn risk_contributions(weights: &Array1<f64>, covariance: &Array2<f64>) -> Array1<f64> {
    weights * &covariance.dot(weights)
}
