//! Return-history optimizers for ballast portfolios.
//!
//! This crate computes portfolio weights from historical returns:
//!
//! - [`RiskParityOptimizer`]: risk budgeting through a Newton solve of the
//!   log-barrier formulation, with an equal-weight fallback
//! - [`MinimumVarianceOptimizer`], [`MaximumSharpeRatioOptimizer`] and
//!   [`UnconstrainedMeanVarianceOptimizer`]: closed-form mean-variance
//!   portfolios
//! - [`BlackLittermanModel`]: equilibrium returns blended with views, fed to
//!   any [`PortfolioOptimizer`]
//! - [`OptimizedWeighting`]: runs an optimizer over the symbols of active
//!   insights and returns capped target weights
//!
//! # Examples
//!
//! ```rust
//! use ballast_optim::RiskParityOptimizer;
//! use ndarray::Array2;
//!
//! let covariance = Array2::<f64>::eye(2);
//! let weights = RiskParityOptimizer::default()
//!     .optimize(&Array2::zeros((0, 2)), None, Some(&covariance))
//!     .unwrap();
//!
//! assert!((weights[0] - 0.5).abs() < 1e-8);
//! assert!((weights[1] - 0.5).abs() < 1e-8);
//! ```

pub mod linalg;

mod black_litterman;
mod mean_variance;
mod model;
mod optimizer;
mod returns;
mod risk_parity;

// Re-export main types
pub use black_litterman::{
    BlackLittermanConfig, BlackLittermanModel, Equilibrium, FALLBACK_RISK_AVERSION, Posterior,
    View,
};
pub use mean_variance::{
    MaximumSharpeConfig, MaximumSharpeRatioOptimizer, MinimumVarianceConfig,
    MinimumVarianceOptimizer, UnconstrainedConfig, UnconstrainedMeanVarianceOptimizer,
};
pub use model::OptimizedWeighting;
pub use optimizer::PortfolioOptimizer;
pub use returns::{DATE_COLUMN, ReturnHistory};
pub use risk_parity::{MINIMUM_WEIGHT_FLOOR, RiskParityConfig, RiskParityOptimizer};
