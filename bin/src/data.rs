//! Input loading for the Ballast CLI.

use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use ballast_optim::ReturnHistory;
use ballast_traits::{BallastError, Insight};
use chrono::{DateTime, NaiveDate, Utc};
use ndarray::Array1;
use polars::prelude::*;

/// Load insights from a JSON array.
pub(crate) fn load_insights(path: &Path) -> Result<Vec<Insight>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading insights from {}", path.display()))?;
    parse_insights(&text).with_context(|| format!("parsing insights in {}", path.display()))
}

pub(crate) fn parse_insights(json: &str) -> Result<Vec<Insight>> {
    Ok(serde_json::from_str(json)?)
}

/// Load a symbol → sector map from a JSON object.
pub(crate) fn load_sectors(path: &Path) -> Result<HashMap<String, String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading sectors from {}", path.display()))?;
    Ok(serde_json::from_str(&text)
        .with_context(|| format!("parsing sectors in {}", path.display()))?)
}

/// Load a return table from CSV: one column per symbol, optional `date`.
pub(crate) fn load_returns(path: &Path) -> Result<ReturnHistory> {
    let bytes =
        fs::read(path).with_context(|| format!("reading returns from {}", path.display()))?;
    parse_returns(bytes).with_context(|| format!("parsing returns in {}", path.display()))
}

pub(crate) fn parse_returns(csv: Vec<u8>) -> Result<ReturnHistory> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(csv))
        .finish()?;
    Ok(ReturnHistory::from_dataframe(&df)?)
}

/// Parse a timestamp in RFC 3339 or YYYY-MM-DD (midnight UTC) format.
pub(crate) fn parse_time(text: &str) -> Result<DateTime<Utc>, BallastError> {
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Ok(time.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|time| time.and_utc())
        .ok_or_else(|| BallastError::InvalidData(format!("Invalid time format: {text}")))
}

/// Parse a comma-separated risk budget.
pub(crate) fn parse_budget(values: &[f64]) -> Option<Array1<f64>> {
    (!values.is_empty()).then(|| Array1::from(values.to_vec()))
}
