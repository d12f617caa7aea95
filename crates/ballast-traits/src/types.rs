//! Common types used throughout the Ballast framework.
//!
//! This module defines symbols, insight directions, portfolio bias and the
//! target weight map produced by every weighting scheme.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A market symbol identifier.
///
/// Symbols are opaque keys, typically ticker symbols like "AAPL" or "MSFT".
pub type Symbol = String;

/// Predicted direction of an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The price is expected to rise.
    Up,
    /// The price is expected to fall.
    Down,
    /// No directional opinion.
    Flat,
}

impl Direction {
    /// Returns the sign of the direction: `1.0`, `-1.0` or `0.0`.
    pub const fn sign(self) -> f64 {
        match self {
            Self::Up => 1.0,
            Self::Down => -1.0,
            Self::Flat => 0.0,
        }
    }

    /// Returns `true` for [`Direction::Flat`].
    pub const fn is_flat(self) -> bool {
        matches!(self, Self::Flat)
    }
}

/// Which side of the book a portfolio is allowed to hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortfolioBias {
    /// Long positions only.
    Long,
    /// Short positions only.
    Short,
    /// Both long and short positions.
    #[default]
    LongShort,
}

impl PortfolioBias {
    /// Returns whether an insight pointing in `direction` may produce a target.
    ///
    /// Flat insights never produce a target.
    pub const fn admits(self, direction: Direction) -> bool {
        match (self, direction) {
            (_, Direction::Flat) => false,
            (Self::LongShort, _) => true,
            (Self::Long, Direction::Up) | (Self::Short, Direction::Down) => true,
            _ => false,
        }
    }

    /// Returns whether a signed weight agrees with this bias.
    pub fn admits_weight(self, weight: f64) -> bool {
        match self {
            Self::LongShort => true,
            Self::Long => weight >= 0.0,
            Self::Short => weight <= 0.0,
        }
    }
}

/// Scale factor that keeps gross exposure at or below 100%.
///
/// Returns `1 / total` when `total` exceeds 1, otherwise `1`.
pub fn gross_exposure_factor(total: f64) -> f64 {
    if total > 1.0 { 1.0 / total } else { 1.0 }
}

/// Target portfolio weights keyed by symbol.
///
/// Values are signed fractions of total portfolio value (negative = short).
/// Weights built through [`TargetWeights::from_raw`] always satisfy
/// `Σ|w| ≤ 1`: when the requested gross exposure exceeds one, every weight is
/// scaled by `1 / Σ|w|`.
///
/// A symbol absent from the map has no target; the caller treats it as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetWeights(BTreeMap<Symbol, f64>);

impl TargetWeights {
    /// Creates an empty set of target weights.
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builds target weights from unnormalized signed allocations.
    ///
    /// Later entries for the same symbol replace earlier ones before the
    /// gross-exposure rescaling is applied.
    ///
    /// # Example
    ///
    /// ```
    /// use ballast_traits::TargetWeights;
    ///
    /// let weights = TargetWeights::from_raw([
    ///     ("SPY".to_string(), 0.6),
    ///     ("TLT".to_string(), -0.6),
    /// ]);
    /// assert!((weights.get("SPY").unwrap() - 0.5).abs() < 1e-12);
    /// assert!((weights.gross_exposure() - 1.0).abs() < 1e-12);
    /// ```
    pub fn from_raw(raw: impl IntoIterator<Item = (Symbol, f64)>) -> Self {
        let mut map: BTreeMap<Symbol, f64> = raw.into_iter().collect();
        let factor = gross_exposure_factor(map.values().map(|w| w.abs()).sum());
        for weight in map.values_mut() {
            *weight *= factor;
        }
        Self(map)
    }

    /// Returns the target for `symbol`, if any.
    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.0.get(symbol).copied()
    }

    /// Returns whether `symbol` has a target.
    pub fn contains(&self, symbol: &str) -> bool {
        self.0.contains_key(symbol)
    }

    /// Number of symbols with a target.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether no symbol has a target.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(symbol, weight)` pairs in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, f64)> + '_ {
        self.0.iter().map(|(s, w)| (s, *w))
    }

    /// Sum of absolute weights.
    pub fn gross_exposure(&self) -> f64 {
        self.0.values().map(|w| w.abs()).sum()
    }

    /// Sum of signed weights.
    pub fn net_exposure(&self) -> f64 {
        self.0.values().sum()
    }

    /// Consumes self and returns the underlying map.
    pub fn into_inner(self) -> BTreeMap<Symbol, f64> {
        self.0
    }
}

impl IntoIterator for TargetWeights {
    type Item = (Symbol, f64);
    type IntoIter = std::collections::btree_map::IntoIter<Symbol, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl AsRef<BTreeMap<Symbol, f64>> for TargetWeights {
    fn as_ref(&self) -> &BTreeMap<Symbol, f64> {
        &self.0
    }
}
