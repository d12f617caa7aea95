#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ballast/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # ballast
//!
//! ballast is an umbrella crate that re-exports all ballast sub-crates for
//! convenience.
//!
//! ## Quick Start
//!
//! ```rust
//! use ballast::{Direction, Insight, InsightWeighting, WeightingScheme};
//! use chrono::{Duration, Utc};
//!
//! let now = Utc::now();
//! let insights = vec![
//!     Insight::new("A", Direction::Up, now, Duration::days(1)).with_weight(0.6),
//!     Insight::new("B", Direction::Down, now, Duration::days(1)).with_weight(0.6),
//! ];
//!
//! let weights = InsightWeighting::default().compute_weights(&insights);
//! assert!((weights.get("A").unwrap() - 0.5).abs() < 1e-12);
//! assert!((weights.get("B").unwrap() + 0.5).abs() < 1e-12);
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Core types ([`Insight`], [`TargetWeights`], [`BallastError`])
//! - [`weight`] - Insight-driven weighting schemes
//! - [`optim`] - Return-history optimizers and Black-Litterman
//!
//! ## Architecture
//!
//! 1. **Insights** state a direction for one symbol over a time window
//! 2. **Weighting schemes** turn active insights into target weights
//! 3. **Optimizers** turn return histories (and views) into weight vectors
//! 4. **Target weights** are handed back to the execution layer

/// Version information for the ballast crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Core Types
// ============================================================================

/// Core type definitions for ballast.
///
/// - [`Insight`] - Directional, time-bounded prediction for one symbol
/// - [`InsightCollection`] - Active-insight bookkeeping per symbol
/// - [`TargetWeights`] - Signed weights with the gross exposure cap
pub mod traits {
    pub use ballast_traits::*;
}

// Re-export error types
pub use ballast_traits::{BallastError, Result};

// Re-export common types
pub use ballast_traits::{
    Direction, Insight, InsightCollection, PortfolioBias, Symbol, TargetWeights,
};

// ============================================================================
// Weighting Schemes
// ============================================================================

/// Insight-driven weighting schemes.
///
/// ## Available Schemes
///
/// - **EqualWeighting**: `±1/n` for every non-flat insight
/// - **InsightWeighting**: the insight's own `weight`
/// - **ConfidenceWeighting**: the insight's `confidence`
/// - **SectorWeighting**: equal budget per sector, then within each sector
///
/// # Example
///
/// ```rust
/// use ballast::weight::{SectorWeighting, WeightingScheme};
///
/// let scheme = SectorWeighting::default()
///     .with_sector("AAPL", "technology")
///     .with_sector("XOM", "energy");
/// assert!(scheme.compute_weights(&[]).is_empty());
/// ```
pub mod weight {
    pub use ballast_weight::*;
}

pub use ballast_weight::{
    ConfidenceWeighting, EqualWeighting, InsightWeighting, SectorWeighting, WeightingConfig,
    WeightingScheme,
};

// ============================================================================
// Optimizers
// ============================================================================

/// Return-history optimizers.
///
/// ## Available Optimizers
///
/// - **RiskParityOptimizer**: equal or budgeted risk contributions
/// - **MinimumVarianceOptimizer**: minimum variance with a return floor
/// - **MaximumSharpeRatioOptimizer**: tangency portfolio
/// - **UnconstrainedMeanVarianceOptimizer**: `Σ⁻¹μ / γ`
/// - **BlackLittermanModel**: equilibrium returns blended with views
///
/// # Example
///
/// ```rust
/// use ballast::optim::{MinimumVarianceOptimizer, PortfolioOptimizer};
/// use ndarray::{Array2, array};
///
/// let covariance = array![[0.04, 0.0], [0.0, 0.01]];
/// let weights = MinimumVarianceOptimizer::default()
///     .optimize(&Array2::zeros((0, 2)), Some(&array![0.1, 0.1]), Some(&covariance))
///     .unwrap();
/// assert!(weights[1] > weights[0]);
/// ```
pub mod optim {
    pub use ballast_optim::*;
}

pub use ballast_optim::{
    BlackLittermanModel, OptimizedWeighting, PortfolioOptimizer, ReturnHistory,
    RiskParityOptimizer, View,
};
