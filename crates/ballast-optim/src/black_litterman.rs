//! Black-Litterman blending of market equilibrium returns with views.
//!
//! The model starts from the returns implied by an equal-weight market
//! portfolio, tilts them towards a set of [`View`]s in proportion to each
//! view's confidence, and hands the posterior moments to a
//! [`PortfolioOptimizer`].
//!
//! ```text
//! Σ      = cov(returns) · periods_per_year
//! Π      = δ Σ w_mkt
//! Ω      = diag(P τΣ Pᵀ) / confidence
//! μ_post = Π + τΣPᵀ (P τΣ Pᵀ + Ω)⁻¹ (Q − PΠ)
//! Σ_post = Σ + τΣ − τΣPᵀ (P τΣ Pᵀ + Ω)⁻¹ P τΣ
//! ```

use std::collections::BTreeMap;
use std::fmt;

use ballast_traits::stats::{mean_returns, portfolio_variance, sample_covariance};
use ballast_traits::{BallastError, Insight, PortfolioBias, Result, Symbol, TargetWeights};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::linalg::solve_many;
use crate::mean_variance::UnconstrainedMeanVarianceOptimizer;
use crate::model::{select_universe, to_target_weights};
use crate::optimizer::{PortfolioOptimizer, equal_weights};
use crate::returns::ReturnHistory;

/// Risk aversion used when the implied value cannot be computed.
pub const FALLBACK_RISK_AVERSION: f64 = 2.5;

/// An investor view on the return of one asset or a combination of assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// Pick coefficients by symbol.
    pub picks: BTreeMap<Symbol, f64>,
    /// Expected return of the picked combination.
    pub expected_return: f64,
    /// Confidence in `(0, 1]`.
    #[serde(default = "full_confidence")]
    pub confidence: f64,
}

const fn full_confidence() -> f64 {
    1.0
}

impl View {
    /// `symbol` returns `expected_return`.
    pub fn absolute(symbol: impl Into<Symbol>, expected_return: f64) -> Self {
        Self {
            picks: BTreeMap::from([(symbol.into(), 1.0)]),
            expected_return,
            confidence: 1.0,
        }
    }

    /// `long` outperforms `short` by `expected_return`.
    pub fn relative(
        long: impl Into<Symbol>,
        short: impl Into<Symbol>,
        expected_return: f64,
    ) -> Self {
        Self {
            picks: BTreeMap::from([(long.into(), 1.0), (short.into(), -1.0)]),
            expected_return,
            confidence: 1.0,
        }
    }

    /// Set the confidence.
    pub const fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Absolute view `sign(direction) · |magnitude|` on the insight's symbol.
    ///
    /// Returns `None` for flat insights and insights without a magnitude. The
    /// insight's confidence is used when it lies in `(0, 1]`.
    pub fn from_insight(insight: &Insight) -> Option<Self> {
        if insight.direction.is_flat() {
            return None;
        }
        let magnitude = insight.magnitude?;
        let confidence = insight
            .confidence
            .filter(|c| *c > 0.0 && *c <= 1.0)
            .unwrap_or(1.0);
        Some(
            Self::absolute(
                insight.symbol.clone(),
                insight.direction.sign() * magnitude.abs(),
            )
            .with_confidence(confidence),
        )
    }

    fn validate(&self) -> Result<()> {
        if self.picks.is_empty() {
            return Err(BallastError::InvalidData("view picks no assets".to_string()));
        }
        if !self.expected_return.is_finite() || self.picks.values().any(|p| !p.is_finite()) {
            return Err(BallastError::InvalidData(
                "view holds non-finite values".to_string(),
            ));
        }
        if !(self.confidence > 0.0 && self.confidence <= 1.0) {
            return Err(BallastError::InvalidData(format!(
                "view confidence must be in (0, 1], got {}",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// Configuration for [`BlackLittermanModel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackLittermanConfig {
    /// Uncertainty scaling of the prior covariance. Must be positive.
    pub tau: f64,
    /// Market risk aversion `δ`; implied from the history when `None`.
    pub risk_aversion: Option<f64>,
    /// Annual risk-free rate.
    pub risk_free_rate: f64,
    /// Periods per year used to annualize the history.
    pub periods_per_year: f64,
    /// Which weight signs [`BlackLittermanModel::compute_weights`] keeps.
    pub bias: PortfolioBias,
}

impl Default for BlackLittermanConfig {
    fn default() -> Self {
        Self {
            tau: 0.05,
            risk_aversion: None,
            risk_free_rate: 0.0,
            periods_per_year: 252.0,
            bias: PortfolioBias::default(),
        }
    }
}

/// Prior moments implied by the equal-weight market portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct Equilibrium {
    /// Implied excess returns `Π`.
    pub implied_returns: Array1<f64>,
    /// Annualized covariance `Σ`.
    pub covariance: Array2<f64>,
    /// Risk aversion `δ` used for `Π`.
    pub risk_aversion: f64,
}

/// Posterior moments after blending in the views.
#[derive(Debug, Clone, PartialEq)]
pub struct Posterior {
    /// Posterior expected returns.
    pub expected_returns: Array1<f64>,
    /// Posterior covariance.
    pub covariance: Array2<f64>,
}

/// Black-Litterman model feeding a pluggable optimizer.
///
/// # Examples
///
/// ```
/// use ballast_optim::{BlackLittermanConfig, BlackLittermanModel, ReturnHistory, View};
/// use ndarray::array;
///
/// let history = ReturnHistory::new(
///     vec!["A".to_string(), "B".to_string()],
///     array![[0.010, 0.002], [-0.004, 0.001], [0.006, -0.003], [-0.002, 0.004]],
/// )
/// .unwrap();
/// let model = BlackLittermanModel::new(BlackLittermanConfig {
///     risk_aversion: Some(2.5),
///     ..BlackLittermanConfig::default()
/// });
///
/// let prior = model.equilibrium(history.returns()).unwrap();
/// let views = [View::absolute("A", 0.30)];
/// let posterior = model.posterior(history.symbols(), &prior, &views).unwrap();
///
/// assert!(posterior.expected_returns[0] > prior.implied_returns[0]);
/// ```
pub struct BlackLittermanModel {
    config: BlackLittermanConfig,
    optimizer: Box<dyn PortfolioOptimizer>,
}

impl fmt::Debug for BlackLittermanModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlackLittermanModel")
            .field("config", &self.config)
            .field("optimizer", &self.optimizer.name())
            .finish()
    }
}

impl Default for BlackLittermanModel {
    fn default() -> Self {
        Self::new(BlackLittermanConfig::default())
    }
}

impl BlackLittermanModel {
    /// Create a model that optimizes with [`UnconstrainedMeanVarianceOptimizer`].
    pub fn new(config: BlackLittermanConfig) -> Self {
        Self {
            config,
            optimizer: Box::new(UnconstrainedMeanVarianceOptimizer::default()),
        }
    }

    /// Replace the downstream optimizer.
    pub fn with_optimizer(mut self, optimizer: impl PortfolioOptimizer + 'static) -> Self {
        self.optimizer = Box::new(optimizer);
        self
    }

    /// Get the configuration.
    pub const fn config(&self) -> &BlackLittermanConfig {
        &self.config
    }

    /// Name of the downstream optimizer.
    pub fn optimizer_name(&self) -> &str {
        self.optimizer.name()
    }

    fn validate_config(&self) -> Result<()> {
        let BlackLittermanConfig {
            tau,
            risk_aversion,
            risk_free_rate,
            periods_per_year,
            ..
        } = self.config;
        if !(tau.is_finite() && tau > 0.0) {
            return Err(BallastError::InvalidData(format!(
                "tau must be positive, got {tau}"
            )));
        }
        if !(periods_per_year.is_finite() && periods_per_year > 0.0) {
            return Err(BallastError::InvalidData(format!(
                "periods per year must be positive, got {periods_per_year}"
            )));
        }
        if !risk_free_rate.is_finite() || risk_aversion.is_some_and(|d| !d.is_finite()) {
            return Err(BallastError::InvalidData(
                "risk-free rate and risk aversion must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Annualized covariance and returns implied by an equal-weight market.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid configuration or a history too short
    /// to estimate a covariance.
    pub fn equilibrium(&self, historical_returns: &Array2<f64>) -> Result<Equilibrium> {
        self.validate_config()?;
        let periods = self.config.periods_per_year;
        let covariance = sample_covariance(historical_returns)? * periods;
        let market = equal_weights(covariance.nrows());

        let risk_aversion = match self.config.risk_aversion {
            Some(delta) => delta,
            None => {
                let annual =
                    mean_returns(historical_returns)?.mapv(|r| (1.0 + r).powf(periods) - 1.0);
                let excess = market.dot(&annual) - self.config.risk_free_rate;
                let variance = portfolio_variance(&market, &covariance);
                let delta = excess / variance;
                if variance > f64::EPSILON && delta.is_finite() {
                    delta
                } else {
                    warn!(variance, "cannot imply risk aversion, using fallback");
                    FALLBACK_RISK_AVERSION
                }
            }
        };

        let implied_returns = covariance.dot(&market) * risk_aversion;
        debug!(risk_aversion, assets = market.len(), "computed market equilibrium");
        Ok(Equilibrium {
            implied_returns,
            covariance,
            risk_aversion,
        })
    }

    /// Blends `views` into the prior.
    ///
    /// `symbols` names the columns of the prior. Without views the prior is
    /// returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`BallastError::SymbolNotFound`] for a view on an unknown
    /// symbol, [`BallastError::InvalidData`] for an invalid view or
    /// configuration, and [`BallastError::SingularMatrix`] when the view
    /// system cannot be solved.
    pub fn posterior(
        &self,
        symbols: &[Symbol],
        prior: &Equilibrium,
        views: &[View],
    ) -> Result<Posterior> {
        self.validate_config()?;
        let assets = prior.implied_returns.len();
        if symbols.len() != assets || prior.covariance.dim() != (assets, assets) {
            return Err(BallastError::DimensionMismatch(format!(
                "{} symbols for a prior over {assets} assets",
                symbols.len()
            )));
        }
        if views.is_empty() {
            return Ok(Posterior {
                expected_returns: prior.implied_returns.clone(),
                covariance: prior.covariance.clone(),
            });
        }

        let k = views.len();
        let mut pick = Array2::<f64>::zeros((k, assets));
        let mut q = Array1::<f64>::zeros(k);
        for (row, view) in views.iter().enumerate() {
            view.validate()?;
            for (symbol, coefficient) in &view.picks {
                let col = symbols
                    .iter()
                    .position(|s| s == symbol)
                    .ok_or_else(|| BallastError::SymbolNotFound(symbol.clone()))?;
                pick[[row, col]] = *coefficient;
            }
            q[row] = view.expected_return;
        }

        let tau_sigma = &prior.covariance * self.config.tau;
        // A = τΣPᵀ, M = PA + Ω
        let a = tau_sigma.dot(&pick.t());
        let mut m = pick.dot(&a);
        for (row, view) in views.iter().enumerate() {
            m[[row, row]] += m[[row, row]] / view.confidence;
        }

        // X = M⁻¹Aᵀ, so A M⁻¹ = Xᵀ because M is symmetric
        let x = solve_many(&m, &a.t().to_owned())?;
        let surprise = &q - &pick.dot(&prior.implied_returns);
        let expected_returns = &prior.implied_returns + &x.t().dot(&surprise);
        let covariance = &prior.covariance + &tau_sigma - &a.dot(&x);

        debug!(views = k, assets, "blended views into prior");
        Ok(Posterior {
            expected_returns,
            covariance,
        })
    }

    /// Optimizes over the posterior implied by `history` and `views`.
    ///
    /// # Errors
    ///
    /// See [`BlackLittermanModel::equilibrium`], [`BlackLittermanModel::posterior`]
    /// and the downstream optimizer.
    pub fn optimize(&self, history: &ReturnHistory, views: &[View]) -> Result<Array1<f64>> {
        let prior = self.equilibrium(history.returns())?;
        let posterior = self.posterior(history.symbols(), &prior, views)?;
        self.optimizer.optimize(
            history.returns(),
            Some(&posterior.expected_returns),
            Some(&posterior.covariance),
        )
    }

    /// Target weights for the symbols of `insights`.
    ///
    /// Each non-flat insight with a magnitude becomes an absolute view (see
    /// [`View::from_insight`]). Symbols without return history are skipped.
    ///
    /// # Errors
    ///
    /// See [`BlackLittermanModel::optimize`].
    pub fn compute_weights(
        &self,
        insights: &[Insight],
        history: &ReturnHistory,
    ) -> Result<TargetWeights> {
        let Some(universe) = select_universe(insights, history)? else {
            return Ok(TargetWeights::new());
        };
        let views: Vec<View> = universe
            .insights
            .iter()
            .filter_map(|insight| View::from_insight(insight))
            .collect();

        let raw = self.optimize(&universe.history, &views)?;
        let weights = to_target_weights(universe.history.symbols(), &raw, self.config.bias);
        debug!(
            optimizer = self.optimizer.name(),
            views = views.len(),
            targets = weights.len(),
            gross = weights.gross_exposure(),
            "computed black-litterman weights"
        );
        Ok(weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mean_variance::MaximumSharpeRatioOptimizer;
    use approx::assert_relative_eq;
    use ballast_traits::Direction;
    use chrono::{Duration, TimeZone, Utc};
    use ndarray::array;

    fn symbols() -> Vec<Symbol> {
        vec!["A".to_string(), "B".to_string()]
    }

    fn prior() -> Equilibrium {
        Equilibrium {
            implied_returns: array![0.05, 0.03],
            covariance: array![[0.04, 0.0], [0.0, 0.01]],
            risk_aversion: 2.5,
        }
    }

    fn fixed_risk_aversion() -> BlackLittermanConfig {
        BlackLittermanConfig {
            risk_aversion: Some(2.5),
            ..BlackLittermanConfig::default()
        }
    }

    fn history() -> ReturnHistory {
        ReturnHistory::new(
            symbols(),
            array![
                [0.010, 0.002],
                [-0.004, 0.001],
                [0.006, -0.003],
                [-0.002, 0.004],
                [0.003, 0.000]
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_no_views_returns_prior() {
        let posterior = BlackLittermanModel::default()
            .posterior(&symbols(), &prior(), &[])
            .unwrap();
        assert_eq!(posterior.expected_returns, prior().implied_returns);
        assert_eq!(posterior.covariance, prior().covariance);
    }

    #[test]
    fn test_full_confidence_view_meets_halfway() {
        // one asset: μ = Π + c/(1+c) (q − Π)
        let prior = prior();
        let posterior = BlackLittermanModel::default()
            .posterior(&symbols(), &prior, &[View::absolute("A", 0.15)])
            .unwrap();

        assert_relative_eq!(posterior.expected_returns[0], 0.10, epsilon = 1e-12);
        assert_relative_eq!(posterior.expected_returns[1], 0.03, epsilon = 1e-12);
        // Σ + τΣ/2 on the viewed asset
        assert_relative_eq!(posterior.covariance[[0, 0]], 0.041, epsilon = 1e-12);
        assert_relative_eq!(posterior.covariance[[1, 1]], 0.0105, epsilon = 1e-12);
    }

    #[test]
    fn test_lower_confidence_moves_less() {
        let posterior = BlackLittermanModel::default()
            .posterior(
                &symbols(),
                &prior(),
                &[View::absolute("A", 0.15).with_confidence(0.25)],
            )
            .unwrap();
        // c/(1+c) = 0.2
        assert_relative_eq!(posterior.expected_returns[0], 0.07, epsilon = 1e-12);
    }

    #[test]
    fn test_relative_view() {
        let posterior = BlackLittermanModel::default()
            .posterior(&symbols(), &prior(), &[View::relative("B", "A", 0.05)])
            .unwrap();
        let spread = posterior.expected_returns[1] - posterior.expected_returns[0];
        assert!(spread > -0.02);
        assert!(spread < 0.05);
    }

    #[test]
    fn test_view_errors() {
        let model = BlackLittermanModel::default();
        assert!(matches!(
            model.posterior(&symbols(), &prior(), &[View::absolute("ZZZ", 0.1)]),
            Err(BallastError::SymbolNotFound(_))
        ));
        assert!(matches!(
            model.posterior(
                &symbols(),
                &prior(),
                &[View::absolute("A", 0.1).with_confidence(0.0)]
            ),
            Err(BallastError::InvalidData(_))
        ));

        let bad_tau = BlackLittermanModel::new(BlackLittermanConfig {
            tau: 0.0,
            ..BlackLittermanConfig::default()
        });
        assert!(matches!(
            bad_tau.posterior(&symbols(), &prior(), &[]),
            Err(BallastError::InvalidData(_))
        ));
    }

    #[test]
    fn test_equilibrium_with_configured_risk_aversion() {
        let model = BlackLittermanModel::new(BlackLittermanConfig {
            risk_aversion: Some(3.0),
            ..BlackLittermanConfig::default()
        });
        let history = history();
        let equilibrium = model.equilibrium(history.returns()).unwrap();

        let expected_cov = history.covariance().unwrap() * 252.0;
        let expected_pi = expected_cov.dot(&array![0.5, 0.5]) * 3.0;
        assert_relative_eq!(equilibrium.risk_aversion, 3.0);
        for (x, y) in equilibrium.implied_returns.iter().zip(expected_pi.iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_implied_risk_aversion() {
        let history = history();
        let equilibrium = BlackLittermanModel::default()
            .equilibrium(history.returns())
            .unwrap();

        let mean = history.mean().unwrap();
        let annual: f64 = mean.iter().map(|r| ((1.0 + r).powf(252.0) - 1.0) * 0.5).sum();
        let cov = history.covariance().unwrap() * 252.0;
        let variance = portfolio_variance(&array![0.5, 0.5], &cov);
        assert_relative_eq!(equilibrium.risk_aversion, annual / variance, max_relative = 1e-9);
    }

    #[test]
    fn test_degenerate_variance_uses_fallback() {
        let returns = array![[0.01, 0.01], [0.01, 0.01], [0.01, 0.01]];
        let equilibrium = BlackLittermanModel::default().equilibrium(&returns).unwrap();
        assert_relative_eq!(equilibrium.risk_aversion, FALLBACK_RISK_AVERSION);
    }

    #[test]
    fn test_view_from_insight() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 13, 30, 0).unwrap();
        let down = Insight::new("A", Direction::Down, t0, Duration::days(1))
            .with_magnitude(0.04)
            .with_confidence(0.5);
        let view = View::from_insight(&down).unwrap();
        assert_relative_eq!(view.expected_return, -0.04);
        assert_relative_eq!(view.confidence, 0.5);

        let no_magnitude = Insight::new("A", Direction::Up, t0, Duration::days(1));
        assert!(View::from_insight(&no_magnitude).is_none());

        let flat = Insight::new("A", Direction::Flat, t0, Duration::days(1)).with_magnitude(0.1);
        assert!(View::from_insight(&flat).is_none());
    }

    #[test]
    fn test_bullish_view_raises_weight() {
        let history = history();
        let model = BlackLittermanModel::new(fixed_risk_aversion());
        let neutral = model.optimize(&history, &[]).unwrap();
        let bullish = model
            .optimize(&history, &[View::absolute("A", 0.5)])
            .unwrap();
        assert!(bullish[0] > neutral[0]);
    }

    #[test]
    fn test_compute_weights_from_insights() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 13, 30, 0).unwrap();
        let insights = vec![
            Insight::new("A", Direction::Up, t0, Duration::days(1)).with_magnitude(0.2),
            Insight::new("B", Direction::Up, t0, Duration::days(1)),
            Insight::new("ZZZ", Direction::Up, t0, Duration::days(1)).with_magnitude(0.2),
        ];
        let model = BlackLittermanModel::new(fixed_risk_aversion())
            .with_optimizer(MaximumSharpeRatioOptimizer::default());
        assert_eq!(model.optimizer_name(), "maximum_sharpe_ratio");

        let weights = model.compute_weights(&insights, &history()).unwrap();

        assert!(!weights.contains("ZZZ"));
        assert!(weights.gross_exposure() <= 1.0 + 1e-12);
        assert!(weights.get("A").unwrap() > 0.0);
    }
}
