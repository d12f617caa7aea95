//! Insight-driven weighting schemes for ballast portfolios.
//!
//! This crate turns a set of active insights into target portfolio weights.
//! It implements equal weighting, insight-weight and confidence weighting
//! (one algorithm parameterised by a [`ValueSelector`]) and sector weighting.
//!
//! Every scheme guarantees that the gross exposure of its output never
//! exceeds 100%: oversubscribed requests are scaled down proportionally.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ballast_traits::{Direction, Insight};
//! use ballast_weight::{ConfidenceWeighting, WeightingScheme};
//! use chrono::{Duration, Utc};
//!
//! let now = Utc::now();
//! let insights = vec![
//!     Insight::new("SPY", Direction::Up, now, Duration::days(1)).with_confidence(0.7),
//!     Insight::new("TLT", Direction::Down, now, Duration::days(1)).with_confidence(0.6),
//! ];
//!
//! let weights = ConfidenceWeighting::default().compute_weights(&insights);
//! ```

mod insight_weight;
mod scheme;
mod sector_weight;

// Re-export main types
pub use insight_weight::{
    ByConfidence, ByWeight, ConfidenceWeighting, EqualWeighting, InsightWeighting,
    SelectorWeighting, Unit, WeightingConfig,
};
pub use scheme::{ValueSelector, WeightingScheme};
pub use sector_weight::{SectorWeighting, UNKNOWN_SECTOR};
