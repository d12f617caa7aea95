//! Optimizer-driven weighting of insight universes.

use ballast_traits::{Insight, PortfolioBias, Result, Symbol, TargetWeights, latest_per_symbol};
use ndarray::Array1;
use tracing::{debug, warn};

use crate::optimizer::PortfolioOptimizer;
use crate::returns::ReturnHistory;

/// Insights eligible for optimization together with their return columns.
#[derive(Debug)]
pub(crate) struct Universe<'a> {
    pub(crate) insights: Vec<&'a Insight>,
    pub(crate) history: ReturnHistory,
}

impl Universe<'_> {
    /// Expected return implied by each insight, `sign · |magnitude|`.
    ///
    /// `None` unless every insight carries a magnitude.
    pub(crate) fn expected_returns(&self) -> Option<Array1<f64>> {
        self.insights
            .iter()
            .map(|insight| {
                insight
                    .magnitude
                    .map(|m| insight.direction.sign() * m.abs())
            })
            .collect::<Option<Vec<f64>>>()
            .map(Array1::from)
    }
}

/// Keeps the latest non-flat insight per symbol that has return history.
///
/// Returns `Ok(None)` when nothing remains to optimize.
pub(crate) fn select_universe<'a>(
    insights: &'a [Insight],
    history: &ReturnHistory,
) -> Result<Option<Universe<'a>>> {
    let selected: Vec<&Insight> = latest_per_symbol(insights)
        .into_iter()
        .filter(|insight| !insight.direction.is_flat())
        .filter(|insight| {
            let known = history.contains(&insight.symbol);
            if !known {
                warn!(symbol = %insight.symbol, "no return history, skipping insight");
            }
            known
        })
        .collect();

    if selected.is_empty() {
        return Ok(None);
    }
    let symbols: Vec<Symbol> = selected.iter().map(|i| i.symbol.clone()).collect();
    let history = history.select(&symbols)?;
    Ok(Some(Universe {
        insights: selected,
        history,
    }))
}

/// Maps a weight vector back to symbols, dropping weights the bias rejects,
/// and applies the gross exposure cap.
pub(crate) fn to_target_weights(
    symbols: &[Symbol],
    weights: &Array1<f64>,
    bias: PortfolioBias,
) -> TargetWeights {
    TargetWeights::from_raw(
        symbols
            .iter()
            .zip(weights.iter())
            .filter(|(_, w)| w.is_finite() && bias.admits_weight(**w))
            .map(|(symbol, w)| (symbol.clone(), *w)),
    )
}

/// Turns active insights into target weights with a [`PortfolioOptimizer`].
///
/// The optimizer runs over the return history of the symbols the insights
/// cover. Insight magnitudes are passed as expected returns when every
/// insight has one; otherwise the optimizer falls back to historical means.
/// Weights whose sign contradicts the bias are dropped, then the gross
/// exposure is capped at 100%.
///
/// # Examples
///
/// ```
/// use ballast_optim::{OptimizedWeighting, ReturnHistory, RiskParityOptimizer};
/// use ballast_traits::{Direction, Insight};
/// use chrono::{Duration, Utc};
/// use ndarray::array;
///
/// let history = ReturnHistory::new(
///     vec!["SPY".to_string(), "TLT".to_string()],
///     array![[0.02, 0.01], [-0.01, -0.005], [0.015, 0.002], [-0.02, 0.004]],
/// )
/// .unwrap();
/// let now = Utc::now();
/// let insights = vec![
///     Insight::new("SPY", Direction::Up, now, Duration::days(5)),
///     Insight::new("TLT", Direction::Up, now, Duration::days(5)),
/// ];
///
/// let model = OptimizedWeighting::new(RiskParityOptimizer::default());
/// let weights = model.compute_weights(&insights, &history).unwrap();
/// assert!(weights.get("TLT").unwrap() > weights.get("SPY").unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct OptimizedWeighting<O> {
    optimizer: O,
    bias: PortfolioBias,
}

impl<O: PortfolioOptimizer> OptimizedWeighting<O> {
    /// Create a model around `optimizer` with a long/short bias.
    pub fn new(optimizer: O) -> Self {
        Self {
            optimizer,
            bias: PortfolioBias::default(),
        }
    }

    /// Set the portfolio bias.
    pub const fn with_bias(mut self, bias: PortfolioBias) -> Self {
        self.bias = bias;
        self
    }

    /// The wrapped optimizer.
    pub const fn optimizer(&self) -> &O {
        &self.optimizer
    }

    /// Computes target weights for `insights` from `history`.
    ///
    /// # Errors
    ///
    /// Propagates optimizer errors, e.g. too little history to estimate a
    /// covariance.
    pub fn compute_weights(
        &self,
        insights: &[Insight],
        history: &ReturnHistory,
    ) -> Result<TargetWeights> {
        let Some(universe) = select_universe(insights, history)? else {
            return Ok(TargetWeights::new());
        };

        let expected = universe.expected_returns();
        let raw = self
            .optimizer
            .optimize(universe.history.returns(), expected.as_ref(), None)?;
        let weights = to_target_weights(universe.history.symbols(), &raw, self.bias);

        debug!(
            optimizer = self.optimizer.name(),
            assets = universe.history.num_assets(),
            targets = weights.len(),
            gross = weights.gross_exposure(),
            "computed optimized weights"
        );
        Ok(weights)
    }
}
