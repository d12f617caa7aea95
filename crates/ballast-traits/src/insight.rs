//! Insights and the active-insight collection.
//!
//! An [`Insight`] is a directional, time-bounded prediction about one symbol.
//! It may carry a magnitude (expected return), a confidence and a weight;
//! weighting schemes pick whichever value they need.
//!
//! The [`InsightCollection`] answers the question a weighting scheme asks on
//! every rebalance: which insight is active for each symbol right now?

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::types::{Direction, Symbol};

/// A directional prediction about a single symbol.
///
/// # Example
///
/// ```
/// use ballast_traits::{Direction, Insight};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
/// let insight = Insight::new("SPY", Direction::Up, now, Duration::days(1)).with_weight(0.25);
///
/// assert!(insight.is_active(now));
/// assert!(!insight.is_active(now + Duration::days(1)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// Symbol the prediction is about.
    pub symbol: Symbol,
    /// Predicted direction.
    pub direction: Direction,
    /// Time the insight was generated; it is active from this instant.
    pub generated_time: DateTime<Utc>,
    /// Time the insight expires; it is inactive from this instant.
    pub close_time: DateTime<Utc>,
    /// Predicted return magnitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<f64>,
    /// Confidence in the prediction, usually in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Requested portfolio weight magnitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl Insight {
    /// Creates an insight valid for `period` starting at `generated_time`.
    pub fn new(
        symbol: impl Into<Symbol>,
        direction: Direction,
        generated_time: DateTime<Utc>,
        period: Duration,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            direction,
            generated_time,
            close_time: generated_time + period,
            magnitude: None,
            confidence: None,
            weight: None,
        }
    }

    /// Sets the predicted magnitude.
    pub fn with_magnitude(mut self, magnitude: f64) -> Self {
        self.magnitude = Some(magnitude);
        self
    }

    /// Sets the confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Sets the requested weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Validity period of the insight.
    pub fn period(&self) -> Duration {
        self.close_time - self.generated_time
    }

    /// Returns whether the insight is active at `at`.
    pub fn is_active(&self, at: DateTime<Utc>) -> bool {
        self.generated_time <= at && at < self.close_time
    }

    /// Returns whether the insight has expired at `at`.
    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        at >= self.close_time
    }
}

/// Keeps the most recently generated insight for each symbol.
///
/// On equal generation times the insight appearing later in `insights` wins.
/// The result is ordered by symbol.
pub fn latest_per_symbol<'a, I>(insights: I) -> Vec<&'a Insight>
where
    I: IntoIterator<Item = &'a Insight>,
{
    let mut latest: BTreeMap<&str, &Insight> = BTreeMap::new();
    for insight in insights {
        match latest.get(insight.symbol.as_str()) {
            Some(current) if current.generated_time > insight.generated_time => {}
            _ => {
                latest.insert(insight.symbol.as_str(), insight);
            }
        }
    }
    latest.into_values().collect()
}

/// Insights grouped by symbol.
///
/// Any number of insights may be stored per symbol; at most one of them is
/// reported as active at a given time: the most recently generated one that
/// has not expired.
#[derive(Debug, Clone, Default)]
pub struct InsightCollection {
    by_symbol: HashMap<Symbol, Vec<Insight>>,
}

impl InsightCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an insight.
    pub fn add(&mut self, insight: Insight) {
        self.by_symbol
            .entry(insight.symbol.clone())
            .or_default()
            .push(insight);
    }

    /// Adds every insight from `insights`.
    pub fn add_all(&mut self, insights: impl IntoIterator<Item = Insight>) {
        for insight in insights {
            self.add(insight);
        }
    }

    /// Total number of stored insights, active or not.
    pub fn len(&self) -> usize {
        self.by_symbol.values().map(Vec::len).sum()
    }

    /// Returns whether the collection holds no insights.
    pub fn is_empty(&self) -> bool {
        self.by_symbol.values().all(Vec::is_empty)
    }

    /// Returns the active insight for every symbol at `at`, ordered by symbol.
    pub fn active_insights(&self, at: DateTime<Utc>) -> Vec<Insight> {
        latest_per_symbol(
            self.by_symbol
                .values()
                .flatten()
                .filter(|insight| insight.is_active(at)),
        )
        .into_iter()
        .cloned()
        .collect()
    }

    /// Returns the active insight for `symbol` at `at`, if any.
    pub fn active_for(&self, symbol: &str, at: DateTime<Utc>) -> Option<&Insight> {
        latest_per_symbol(
            self.by_symbol
                .get(symbol)?
                .iter()
                .filter(|insight| insight.is_active(at)),
        )
        .pop()
    }

    /// Removes and returns every insight that has expired at `at`.
    pub fn remove_expired(&mut self, at: DateTime<Utc>) -> Vec<Insight> {
        let mut expired = Vec::new();
        for insights in self.by_symbol.values_mut() {
            let (gone, kept): (Vec<_>, Vec<_>) =
                insights.drain(..).partition(|insight| insight.is_expired(at));
            *insights = kept;
            expired.extend(gone);
        }
        self.by_symbol.retain(|_, insights| !insights.is_empty());
        expired
    }
}
