#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ballast/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core type definitions for the Ballast portfolio construction framework.
//!
//! This crate provides the foundational types shared by weighting schemes and
//! optimizers: insights, target weights, directions, errors and statistics.

/// The version of the ballast-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod insight;
pub mod stats;
pub mod types;

// Re-exports
pub use error::{BallastError, Result};
pub use insight::{Insight, InsightCollection, latest_per_symbol};
pub use types::{Direction, PortfolioBias, Symbol, TargetWeights, gross_exposure_factor};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
