//! JSON settings for the CLI.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ballast_optim::{
    BlackLittermanConfig, MaximumSharpeConfig, MinimumVarianceConfig, RiskParityConfig,
    UnconstrainedConfig,
};
use ballast_weight::WeightingConfig;
use serde::{Deserialize, Serialize};

/// Configuration for every scheme and optimizer, each section defaulted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) weighting: WeightingConfig,
    pub(crate) risk_parity: RiskParityConfig,
    pub(crate) minimum_variance: MinimumVarianceConfig,
    pub(crate) maximum_sharpe: MaximumSharpeConfig,
    pub(crate) unconstrained: UnconstrainedConfig,
    pub(crate) black_litterman: BlackLittermanConfig,
}

impl Settings {
    /// Read settings from `path`, or the defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config in {}", path.display()))
    }
}
