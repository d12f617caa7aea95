//! Sector-weighted portfolio construction.

use std::collections::{BTreeMap, HashMap};

use ballast_traits::{Insight, Symbol, TargetWeights, gross_exposure_factor};
use tracing::debug;

use crate::insight_weight::{Unit, WeightingConfig, signed_allocations};
use crate::scheme::{ValueSelector, WeightingScheme};

/// Group assigned to symbols without a sector classification.
pub const UNKNOWN_SECTOR: &str = "unknown";

/// Splits the budget evenly across sectors, then within each sector.
///
/// Every sector holding at least one eligible insight receives `1/G` of the
/// portfolio, where `G` is the number of such sectors. Inside a sector the
/// selector's values are used the same way [`SelectorWeighting`] uses them,
/// rescaled so that the sector's gross exposure stays within its share.
/// Unclassified symbols form the [`UNKNOWN_SECTOR`] group, which competes for
/// a share like any other sector.
///
/// [`SelectorWeighting`]: crate::SelectorWeighting
///
/// # Examples
///
/// ```rust
/// use ballast_traits::{Direction, Insight};
/// use ballast_weight::{SectorWeighting, WeightingScheme};
/// use chrono::{Duration, Utc};
///
/// let now = Utc::now();
/// let scheme = SectorWeighting::default()
///     .with_sector("AAPL", "technology")
///     .with_sector("MSFT", "technology")
///     .with_sector("XOM", "energy");
///
/// let insights = vec![
///     Insight::new("AAPL", Direction::Up, now, Duration::days(1)),
///     Insight::new("MSFT", Direction::Up, now, Duration::days(1)),
///     Insight::new("XOM", Direction::Down, now, Duration::days(1)),
/// ];
///
/// let weights = scheme.compute_weights(&insights);
/// assert!((weights.get("AAPL").unwrap() - 0.25).abs() < 1e-12);
/// assert!((weights.get("XOM").unwrap() + 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct SectorWeighting<S = Unit> {
    config: WeightingConfig,
    sectors: HashMap<Symbol, String>,
    selector: S,
}

impl SectorWeighting {
    /// Create an equal-within-sector scheme with the given configuration.
    pub fn with_config(config: WeightingConfig) -> Self {
        Self::new(config, Unit)
    }
}

impl Default for SectorWeighting {
    fn default() -> Self {
        Self::with_config(WeightingConfig::default())
    }
}

impl<S: ValueSelector> SectorWeighting<S> {
    /// Create a sector weighting scheme with no classifications.
    pub fn new(config: WeightingConfig, selector: S) -> Self {
        Self {
            config,
            sectors: HashMap::new(),
            selector,
        }
    }

    /// Classify `symbol` under `sector`.
    pub fn with_sector(mut self, symbol: impl Into<Symbol>, sector: impl Into<String>) -> Self {
        self.sectors.insert(symbol.into(), sector.into());
        self
    }

    /// Classify every `(symbol, sector)` pair.
    pub fn with_sectors(mut self, sectors: impl IntoIterator<Item = (Symbol, String)>) -> Self {
        self.sectors.extend(sectors);
        self
    }

    /// Sector of `symbol`, or [`UNKNOWN_SECTOR`].
    pub fn sector_of(&self, symbol: &str) -> &str {
        self.sectors
            .get(symbol)
            .map_or(UNKNOWN_SECTOR, String::as_str)
    }
}

impl<S: ValueSelector> WeightingScheme for SectorWeighting<S> {
    fn compute_weights(&self, insights: &[Insight]) -> TargetWeights {
        let mut groups: BTreeMap<&str, Vec<(&Insight, f64)>> = BTreeMap::new();
        for (insight, weight) in signed_allocations(&self.selector, self.config.bias, insights) {
            groups
                .entry(self.sector_of(&insight.symbol))
                .or_default()
                .push((insight, weight));
        }

        if groups.is_empty() {
            return TargetWeights::new();
        }

        let share = 1.0 / groups.len() as f64;
        let mut raw: Vec<(Symbol, f64)> = Vec::new();
        for members in groups.values() {
            let factor = gross_exposure_factor(members.iter().map(|(_, w)| w.abs()).sum());
            raw.extend(
                members
                    .iter()
                    .map(|(insight, w)| (insight.symbol.clone(), w * factor * share)),
            );
        }

        let weights = TargetWeights::from_raw(raw);
        debug!(
            scheme = self.name(),
            sectors = groups.len(),
            targets = weights.len(),
            gross = weights.gross_exposure(),
            "computed sector weights"
        );
        weights
    }

    fn name(&self) -> &str {
        "sector_weight"
    }
}
