//! Optimizer trait and input plumbing shared by every optimizer.

use ballast_traits::stats::{mean_returns, sample_covariance, validate_covariance};
use ballast_traits::{BallastError, Result};
use ndarray::{Array1, Array2};

/// Computes a weight vector from a return history.
///
/// `historical_returns` is laid out `(periods × assets)`. When `covariance`
/// is supplied it is used as is, and it fixes the number of assets; otherwise
/// the sample covariance of the returns is estimated. `expected_returns`
/// defaults to the mean historical return for optimizers that need it.
///
/// The returned vector has one entry per asset, in column order.
pub trait PortfolioOptimizer: Send + Sync {
    /// Computes portfolio weights.
    fn optimize(
        &self,
        historical_returns: &Array2<f64>,
        expected_returns: Option<&Array1<f64>>,
        covariance: Option<&Array2<f64>>,
    ) -> Result<Array1<f64>>;

    /// Name of the optimizer.
    fn name(&self) -> &str;
}

impl<T: PortfolioOptimizer + ?Sized> PortfolioOptimizer for Box<T> {
    fn optimize(
        &self,
        historical_returns: &Array2<f64>,
        expected_returns: Option<&Array1<f64>>,
        covariance: Option<&Array2<f64>>,
    ) -> Result<Array1<f64>> {
        (**self).optimize(historical_returns, expected_returns, covariance)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Covariance to optimize against: the supplied one (validated) or the
/// sample covariance of `historical_returns`.
pub(crate) fn resolve_covariance(
    historical_returns: &Array2<f64>,
    covariance: Option<&Array2<f64>>,
) -> Result<Array2<f64>> {
    let covariance = match covariance {
        Some(covariance) => {
            validate_covariance(covariance)?;
            covariance.to_owned()
        }
        None => sample_covariance(historical_returns)?,
    };
    if covariance.nrows() == 0 {
        return Err(BallastError::InsufficientData(
            "cannot optimize a portfolio with no assets".to_string(),
        ));
    }
    Ok(covariance)
}

/// Expected returns to optimize against: the supplied ones or the mean
/// historical return, checked against the asset count.
pub(crate) fn resolve_expected_returns(
    historical_returns: &Array2<f64>,
    expected_returns: Option<&Array1<f64>>,
    assets: usize,
) -> Result<Array1<f64>> {
    let expected = match expected_returns {
        Some(expected) => expected.to_owned(),
        None => mean_returns(historical_returns)?,
    };
    if expected.len() != assets {
        return Err(BallastError::DimensionMismatch(format!(
            "expected returns have {} entries for {assets} assets",
            expected.len()
        )));
    }
    if expected.iter().any(|r| !r.is_finite()) {
        return Err(BallastError::InvalidData(
            "expected returns contain non-finite values".to_string(),
        ));
    }
    Ok(expected)
}

/// `1/K` for each of `assets` assets.
pub(crate) fn equal_weights(assets: usize) -> Array1<f64> {
    Array1::from_elem(assets, 1.0 / assets as f64)
}

/// Clips every weight into `[lower, upper]`.
pub(crate) fn clip(weights: Array1<f64>, lower: f64, upper: f64) -> Array1<f64> {
    weights.mapv_into(|w| w.clamp(lower, upper))
}

/// Checks a `(lower, upper)` weight bound pair.
pub(crate) fn validate_bounds(lower: f64, upper: f64) -> Result<()> {
    if lower.is_nan() || upper.is_nan() || lower > upper {
        return Err(BallastError::InvalidData(format!(
            "invalid weight bounds [{lower}, {upper}]"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_supplied_covariance_fixes_asset_count() {
        let returns = Array2::<f64>::zeros((0, 0));
        let cov = array![[1.0, 0.0], [0.0, 1.0]];
        let resolved = resolve_covariance(&returns, Some(&cov)).unwrap();
        assert_eq!(resolved, cov);
    }

    #[test]
    fn test_asymmetric_covariance_rejected() {
        let returns = Array2::<f64>::zeros((0, 0));
        let cov = array![[1.0, 0.5], [0.0, 1.0]];
        assert!(matches!(
            resolve_covariance(&returns, Some(&cov)),
            Err(BallastError::InvalidData(_))
        ));
    }

    #[test]
    fn test_zero_assets_rejected() {
        let returns = Array2::<f64>::zeros((0, 0));
        let cov = Array2::<f64>::zeros((0, 0));
        assert!(matches!(
            resolve_covariance(&returns, Some(&cov)),
            Err(BallastError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_expected_returns_default_to_mean() {
        let returns = array![[0.01, 0.03], [0.03, 0.01]];
        let expected = resolve_expected_returns(&returns, None, 2).unwrap();
        assert_eq!(expected, array![0.02, 0.02]);
        assert!(resolve_expected_returns(&returns, Some(&array![0.1]), 2).is_err());
    }

    #[test]
    fn test_clip() {
        let clipped = clip(array![-2.0, 0.5, 3.0], -1.0, 1.0);
        assert_eq!(clipped, array![-1.0, 0.5, 1.0]);
    }

    #[test]
    fn test_validate_bounds() {
        assert!(validate_bounds(-1.0, 1.0).is_ok());
        assert!(validate_bounds(1.0, -1.0).is_err());
        assert!(validate_bounds(f64::NAN, 1.0).is_err());
    }
}
