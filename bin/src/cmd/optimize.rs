//! Optimize command implementation.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Result, bail};
use ballast_optim::{
    BlackLittermanModel, MaximumSharpeRatioOptimizer, MinimumVarianceOptimizer,
    OptimizedWeighting, PortfolioOptimizer, RiskParityOptimizer,
    UnconstrainedMeanVarianceOptimizer,
};
use ballast_traits::{Symbol, TargetWeights};
use clap::ValueEnum;
use ndarray::Array1;
use serde::Serialize;
use tracing::info;

use super::{OutputFormat, print_header, print_json, print_weights};
use crate::config::Settings;
use crate::data;

/// Return-history optimization method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Method {
    /// Equal risk contributions (or a custom risk budget)
    RiskParity,
    /// Minimum variance with a target return floor
    MinVariance,
    /// Maximum Sharpe ratio (tangency) portfolio
    MaxSharpe,
    /// Unconstrained mean-variance
    Unconstrained,
    /// Black-Litterman posterior fed to unconstrained mean-variance
    BlackLitterman,
}

#[derive(Debug, Serialize)]
struct OptimizeReport<'a> {
    method: &'a str,
    assets: usize,
    periods: usize,
    gross_exposure: f64,
    net_exposure: f64,
    weights: BTreeMap<&'a str, f64>,
}

fn build_optimizer(method: Method, settings: &Settings) -> Box<dyn PortfolioOptimizer> {
    match method {
        Method::RiskParity => Box::new(RiskParityOptimizer::new(settings.risk_parity)),
        Method::MinVariance => {
            Box::new(MinimumVarianceOptimizer::new(settings.minimum_variance))
        }
        Method::MaxSharpe => {
            Box::new(MaximumSharpeRatioOptimizer::new(settings.maximum_sharpe))
        }
        Method::Unconstrained | Method::BlackLitterman => Box::new(
            UnconstrainedMeanVarianceOptimizer::new(settings.unconstrained),
        ),
    }
}

fn black_litterman(settings: &Settings) -> BlackLittermanModel {
    BlackLittermanModel::new(settings.black_litterman)
        .with_optimizer(build_optimizer(Method::BlackLitterman, settings))
}

/// Optimize portfolio weights over a return table.
///
/// With insights, only their symbols are optimized and the result is capped
/// at 100% gross exposure; without, every column is optimized and the raw
/// optimizer output is reported.
pub(crate) fn optimize_weights(
    returns_path: &Path,
    method: Method,
    insights_path: Option<&Path>,
    budget: &[f64],
    settings: &Settings,
    format: OutputFormat,
) -> Result<()> {
    let history = data::load_returns(returns_path)?;
    let insights = insights_path.map(data::load_insights).transpose()?;
    let budget = data::parse_budget(budget);
    if budget.is_some() && (method != Method::RiskParity || insights.is_some()) {
        bail!("--budget applies only to risk-parity without --insights");
    }
    info!(
        assets = history.num_assets(),
        periods = history.num_periods(),
        method = ?method,
        "loaded return history"
    );

    let (name, weights): (String, Vec<(Symbol, f64)>) = match (method, insights) {
        (Method::RiskParity, None) => {
            let optimizer = RiskParityOptimizer::new(settings.risk_parity);
            let raw = optimizer.optimize(history.returns(), budget.as_ref(), None)?;
            ("risk_parity".to_string(), zip_rows(history.symbols(), &raw))
        }
        (Method::BlackLitterman, Some(insights)) => {
            let weights = black_litterman(settings).compute_weights(&insights, &history)?;
            ("black_litterman".to_string(), into_rows(weights))
        }
        (Method::BlackLitterman, None) => {
            let raw = black_litterman(settings).optimize(&history, &[])?;
            ("black_litterman".to_string(), zip_rows(history.symbols(), &raw))
        }
        (_, Some(insights)) => {
            let optimizer = build_optimizer(method, settings);
            let name = optimizer.name().to_string();
            let model = OptimizedWeighting::new(optimizer).with_bias(settings.weighting.bias);
            (name, into_rows(model.compute_weights(&insights, &history)?))
        }
        (_, None) => {
            let optimizer = build_optimizer(method, settings);
            let raw = optimizer.optimize(history.returns(), None, None)?;
            (optimizer.name().to_string(), zip_rows(history.symbols(), &raw))
        }
    };

    match format {
        OutputFormat::Json => print_json(&OptimizeReport {
            method: &name,
            assets: history.num_assets(),
            periods: history.num_periods(),
            gross_exposure: weights.iter().map(|(_, w)| w.abs()).sum(),
            net_exposure: weights.iter().map(|(_, w)| w).sum(),
            weights: weights.iter().map(|(s, w)| (s.as_str(), *w)).collect(),
        })?,
        OutputFormat::Text => {
            print_header("Portfolio Optimization");
            println!("Method:  {}", name);
            println!(
                "History: {} periods x {} assets",
                history.num_periods(),
                history.num_assets()
            );
            println!();
            print_weights(weights.iter().map(|(s, w)| (s.as_str(), *w)));
        }
    }

    Ok(())
}

fn zip_rows(symbols: &[Symbol], weights: &Array1<f64>) -> Vec<(Symbol, f64)> {
    symbols.iter().cloned().zip(weights.iter().copied()).collect()
}

fn into_rows(weights: TargetWeights) -> Vec<(Symbol, f64)> {
    weights.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_optimizer_reads_settings() {
        let settings = Settings::default();
        let name = |method| build_optimizer(method, &settings).name().to_string();
        assert_eq!(name(Method::RiskParity), "risk_parity");
        assert_eq!(name(Method::MinVariance), "minimum_variance");
        assert_eq!(name(Method::MaxSharpe), "maximum_sharpe_ratio");
        assert_eq!(name(Method::BlackLitterman), "unconstrained_mean_variance");
    }

    #[test]
    fn test_black_litterman_uses_configured_downstream_optimizer() {
        let mut settings = Settings::default();
        settings.black_litterman.tau = 0.1;
        let model = black_litterman(&settings);
        assert_eq!(model.optimizer_name(), "unconstrained_mean_variance");
        assert_eq!(model.config().tau, 0.1);
    }

    #[test]
    fn test_zip_rows() {
        let symbols = vec!["A".to_string(), "B".to_string()];
        let rows = zip_rows(&symbols, &Array1::from(vec![0.25, 0.75]));
        assert_eq!(rows, vec![("A".to_string(), 0.25), ("B".to_string(), 0.75)]);
    }
}
