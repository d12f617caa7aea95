//! Selector-driven weighting: equal, insight-weight and confidence schemes.
//!
//! All three schemes share one algorithm. Each eligible insight asks for
//! `sign(direction) * value` of the portfolio; when the requested gross
//! exposure exceeds 100%, every request is scaled down by the same factor.

use ballast_traits::{Insight, PortfolioBias, Symbol, TargetWeights, latest_per_symbol};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scheme::{ValueSelector, WeightingScheme};

/// Configuration shared by the insight-driven weighting schemes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightingConfig {
    /// Which directions may produce targets.
    #[serde(default)]
    pub bias: PortfolioBias,
}

/// Selects the insight's `weight`; insights without one are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByWeight;

impl ValueSelector for ByWeight {
    fn includes(&self, insight: &Insight) -> bool {
        insight.weight.is_some()
    }

    fn value(&self, insight: &Insight) -> f64 {
        insight.weight.unwrap_or(0.0)
    }

    fn name(&self) -> &str {
        "insight_weight"
    }
}

/// Selects the insight's `confidence`; insights without one are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByConfidence;

impl ValueSelector for ByConfidence {
    fn includes(&self, insight: &Insight) -> bool {
        insight.confidence.is_some()
    }

    fn value(&self, insight: &Insight) -> f64 {
        insight.confidence.unwrap_or(0.0)
    }

    fn name(&self) -> &str {
        "confidence_weight"
    }
}

/// Gives every insight the same unit value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unit;

impl ValueSelector for Unit {
    fn includes(&self, _insight: &Insight) -> bool {
        true
    }

    fn value(&self, _insight: &Insight) -> f64 {
        1.0
    }

    fn name(&self) -> &str {
        "equal_weight"
    }
}

/// Weights each insight by the value its selector extracts.
///
/// Flat insights, insights the bias rejects and insights the selector excludes
/// receive no entry in the output.
///
/// # Examples
///
/// ```rust
/// use ballast_traits::{Direction, Insight};
/// use ballast_weight::{InsightWeighting, WeightingScheme};
/// use chrono::{Duration, Utc};
///
/// let now = Utc::now();
/// let insights = vec![
///     Insight::new("A", Direction::Up, now, Duration::days(1)).with_weight(0.6),
///     Insight::new("B", Direction::Down, now, Duration::days(1)).with_weight(0.6),
/// ];
///
/// let weights = InsightWeighting::default().compute_weights(&insights);
/// assert!((weights.get("A").unwrap() - 0.5).abs() < 1e-12);
/// assert!((weights.get("B").unwrap() + 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SelectorWeighting<S> {
    config: WeightingConfig,
    selector: S,
}

/// Weights insights by their `weight` field.
pub type InsightWeighting = SelectorWeighting<ByWeight>;

/// Weights insights by their `confidence` field.
pub type ConfidenceWeighting = SelectorWeighting<ByConfidence>;

/// Gives every non-flat insight the same absolute weight, `1/n`.
pub type EqualWeighting = SelectorWeighting<Unit>;

impl<S: ValueSelector> SelectorWeighting<S> {
    /// Create a weighting scheme from a configuration and a selector.
    pub const fn new(config: WeightingConfig, selector: S) -> Self {
        Self { config, selector }
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &WeightingConfig {
        &self.config
    }
}

impl<S: ValueSelector + Default> SelectorWeighting<S> {
    /// Create a weighting scheme with the default selector.
    pub fn with_config(config: WeightingConfig) -> Self {
        Self::new(config, S::default())
    }
}

/// Signed, unnormalized allocation for every eligible insight.
///
/// Keeps the latest insight per symbol, then drops flat insights, insights
/// against `bias`, insights the selector excludes and non-finite values.
pub(crate) fn signed_allocations<'a, S>(
    selector: &S,
    bias: PortfolioBias,
    insights: impl IntoIterator<Item = &'a Insight>,
) -> Vec<(&'a Insight, f64)>
where
    S: ValueSelector + ?Sized,
{
    latest_per_symbol(insights)
        .into_iter()
        .filter(|insight| bias.admits(insight.direction) && selector.includes(insight))
        .filter_map(|insight| {
            let value = selector.value(insight);
            value
                .is_finite()
                .then_some((insight, insight.direction.sign() * value))
        })
        .collect()
}

impl<S: ValueSelector> WeightingScheme for SelectorWeighting<S> {
    fn compute_weights(&self, insights: &[Insight]) -> TargetWeights {
        let raw: Vec<(Symbol, f64)> = signed_allocations(&self.selector, self.config.bias, insights)
            .into_iter()
            .map(|(insight, weight)| (insight.symbol.clone(), weight))
            .collect();

        let weights = TargetWeights::from_raw(raw);
        debug!(
            scheme = self.name(),
            insights = insights.len(),
            targets = weights.len(),
            gross = weights.gross_exposure(),
            "computed target weights"
        );
        weights
    }

    fn name(&self) -> &str {
        self.selector.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ballast_traits::Direction;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 15, 0, 0).unwrap()
    }

    fn insight(symbol: &str, direction: Direction) -> Insight {
        Insight::new(symbol, direction, t0(), Duration::days(1))
    }

    #[test]
    fn test_insight_weight_scales_when_over_budget() {
        let insights = vec![
            insight("A", Direction::Up).with_weight(0.6),
            insight("B", Direction::Down).with_weight(0.6),
        ];

        let weights = InsightWeighting::default().compute_weights(&insights);

        assert_relative_eq!(weights.get("A").unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(weights.get("B").unwrap(), -0.5, epsilon = 1e-12);
        assert_relative_eq!(weights.gross_exposure(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_insight_weight_under_budget_unchanged() {
        let insights = vec![insight("A", Direction::Up).with_weight(0.25)];

        let weights = InsightWeighting::default().compute_weights(&insights);

        assert_eq!(weights.len(), 1);
        assert_relative_eq!(weights.get("A").unwrap(), 0.25);
    }

    #[test]
    fn test_insight_without_weight_is_excluded() {
        let insights = vec![
            insight("A", Direction::Up),
            insight("B", Direction::Up).with_weight(0.1),
        ];

        let weights = InsightWeighting::default().compute_weights(&insights);

        assert!(!weights.contains("A"));
        assert_relative_eq!(weights.get("B").unwrap(), 0.1);
    }

    #[test]
    fn test_non_finite_values_are_excluded() {
        let insights = vec![
            insight("A", Direction::Up).with_weight(f64::INFINITY),
            insight("B", Direction::Up).with_weight(0.2),
            insight("C", Direction::Up).with_weight(-0.3),
            insight("D", Direction::Down).with_weight(f64::NAN),
        ];

        let weights = InsightWeighting::default().compute_weights(&insights);

        assert_eq!(weights.len(), 2);
        assert_relative_eq!(weights.get("B").unwrap(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(weights.get("C").unwrap(), -0.3, epsilon = 1e-12);
        assert_relative_eq!(weights.gross_exposure(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_confidence_is_excluded() {
        let insights = vec![
            insight("A", Direction::Up).with_confidence(f64::NEG_INFINITY),
            insight("B", Direction::Down).with_confidence(0.4),
        ];

        let weights = ConfidenceWeighting::default().compute_weights(&insights);

        assert!(!weights.contains("A"));
        assert_relative_eq!(weights.get("B").unwrap(), -0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_confidence_weighting_reads_confidence() {
        let insights = vec![
            insight("A", Direction::Up).with_confidence(0.8).with_weight(0.1),
            insight("B", Direction::Down).with_confidence(0.4),
            insight("C", Direction::Up).with_weight(0.3),
        ];

        let weights = ConfidenceWeighting::default().compute_weights(&insights);

        let total = 0.8 + 0.4;
        assert_relative_eq!(weights.get("A").unwrap(), 0.8 / total, epsilon = 1e-12);
        assert_relative_eq!(weights.get("B").unwrap(), -0.4 / total, epsilon = 1e-12);
        assert!(!weights.contains("C"));
    }

    #[test]
    fn test_flat_insight_has_no_target() {
        let insights = vec![
            insight("A", Direction::Flat).with_weight(0.5),
            insight("B", Direction::Up).with_weight(0.5),
        ];

        let weights = InsightWeighting::default().compute_weights(&insights);

        assert!(!weights.contains("A"));
        assert_relative_eq!(weights.get("B").unwrap(), 0.5);
    }

    #[test]
    fn test_equal_weighting() {
        let insights = vec![
            insight("A", Direction::Up),
            insight("B", Direction::Down),
            insight("C", Direction::Up),
            insight("D", Direction::Flat),
        ];

        let weights = EqualWeighting::default().compute_weights(&insights);

        assert_eq!(weights.len(), 3);
        assert_relative_eq!(weights.get("A").unwrap(), 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(weights.get("B").unwrap(), -1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(weights.get("C").unwrap(), 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_equal_weight_gets_full_allocation() {
        let weights = EqualWeighting::default().compute_weights(&[insight("A", Direction::Down)]);
        assert_relative_eq!(weights.get("A").unwrap(), -1.0);
    }

    #[test]
    fn test_long_bias_drops_shorts() {
        let config = WeightingConfig {
            bias: PortfolioBias::Long,
        };
        let insights = vec![insight("A", Direction::Up), insight("B", Direction::Down)];

        let weights = EqualWeighting::with_config(config).compute_weights(&insights);

        assert_eq!(weights.len(), 1);
        assert_relative_eq!(weights.get("A").unwrap(), 1.0);
    }

    #[test]
    fn test_latest_insight_per_symbol_wins() {
        let older = insight("A", Direction::Up).with_weight(0.2);
        let mut newer = insight("A", Direction::Down).with_weight(0.3);
        newer.generated_time = t0() + Duration::minutes(5);

        let weights = InsightWeighting::default().compute_weights(&[newer, older]);

        assert_eq!(weights.len(), 1);
        assert_relative_eq!(weights.get("A").unwrap(), -0.3);
    }

    #[test]
    fn test_empty_insights() {
        let weights = InsightWeighting::default().compute_weights(&[]);
        assert!(weights.is_empty());
    }

    #[test]
    fn test_scheme_names() {
        assert_eq!(InsightWeighting::default().name(), "insight_weight");
        assert_eq!(ConfidenceWeighting::default().name(), "confidence_weight");
        assert_eq!(EqualWeighting::default().name(), "equal_weight");
    }
}
