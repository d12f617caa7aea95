//! Weights command implementation.

use std::path::Path;

use anyhow::Result;
use ballast_traits::{InsightCollection, TargetWeights};
use ballast_weight::{
    ConfidenceWeighting, EqualWeighting, InsightWeighting, SectorWeighting, WeightingScheme,
};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;
use tracing::{info, warn};

use super::{OutputFormat, print_header, print_json, print_weights};
use crate::config::Settings;
use crate::data;

/// Insight-driven weighting scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Scheme {
    /// Same absolute weight for every insight
    Equal,
    /// The insight's own weight
    Insight,
    /// The insight's confidence
    Confidence,
    /// Equal budget per sector, then equal within the sector
    Sector,
}

#[derive(Debug, Serialize)]
struct WeightsReport<'a> {
    scheme: &'a str,
    at: DateTime<Utc>,
    active_insights: usize,
    gross_exposure: f64,
    net_exposure: f64,
    weights: &'a TargetWeights,
}

fn build_scheme(
    scheme: Scheme,
    sectors: Option<&Path>,
    settings: &Settings,
) -> Result<Box<dyn WeightingScheme>> {
    let config = settings.weighting;
    Ok(match scheme {
        Scheme::Equal => Box::new(EqualWeighting::with_config(config)),
        Scheme::Insight => Box::new(InsightWeighting::with_config(config)),
        Scheme::Confidence => Box::new(ConfidenceWeighting::with_config(config)),
        Scheme::Sector => {
            let mut sector_scheme = SectorWeighting::with_config(config);
            match sectors {
                Some(path) => {
                    sector_scheme = sector_scheme.with_sectors(data::load_sectors(path)?);
                }
                None => warn!("no sector file given, every symbol is unclassified"),
            }
            Box::new(sector_scheme)
        }
    })
}

/// Compute target weights from the insights active at `at`.
///
/// Without `at`, the most recent generation time in the file is used.
pub(crate) fn compute_weights(
    insights_path: &Path,
    scheme: Scheme,
    sectors: Option<&Path>,
    at: Option<&str>,
    settings: &Settings,
    format: OutputFormat,
) -> Result<()> {
    let insights = data::load_insights(insights_path)?;
    let at = match at {
        Some(text) => data::parse_time(text)?,
        None => insights
            .iter()
            .map(|insight| insight.generated_time)
            .max()
            .unwrap_or_else(Utc::now),
    };

    let mut collection = InsightCollection::new();
    collection.add_all(insights);
    let active = collection.active_insights(at);
    info!(loaded = collection.len(), active = active.len(), %at, "selected active insights");

    let scheme = build_scheme(scheme, sectors, settings)?;
    let weights = scheme.compute_weights(&active);

    match format {
        OutputFormat::Json => print_json(&WeightsReport {
            scheme: scheme.name(),
            at,
            active_insights: active.len(),
            gross_exposure: weights.gross_exposure(),
            net_exposure: weights.net_exposure(),
            weights: &weights,
        })?,
        OutputFormat::Text => {
            print_header("Target Weights");
            println!("Scheme:   {}", scheme.name());
            println!("Time:     {}", at.to_rfc3339());
            println!("Insights: {} active of {} loaded", active.len(), collection.len());
            println!();
            print_weights(weights.iter().map(|(symbol, w)| (symbol.as_str(), w)));
        }
    }

    Ok(())
}
