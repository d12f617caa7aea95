//! Error types for the Ballast framework.
//!
//! This module defines the error type used throughout the Ballast crates,
//! covering input validation, linear algebra failures and data loading.

use thiserror::Error;

/// The main error type for Ballast operations.
///
/// Numerical non-convergence is not represented here: optimizers recover from
/// it locally by falling back to equal weights.
#[derive(Debug, Error)]
pub enum BallastError {
    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error when two inputs disagree on the number of assets.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error when data is insufficient for the requested operation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Error when a symbol is not found in the universe.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// Error when a matrix that must be inverted is singular.
    #[error("Singular matrix: {0}")]
    SingularMatrix(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl From<String> for BallastError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for BallastError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for Ballast operations.
pub type Result<T> = std::result::Result<T, BallastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BallastError::DimensionMismatch("budget has 3 entries, expected 2".to_string());
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: budget has 3 entries, expected 2"
        );

        let err = BallastError::SymbolNotFound("SPY".to_string());
        assert_eq!(err.to_string(), "Symbol not found: SPY");
    }

    #[test]
    fn test_error_from_str() {
        let err: BallastError = "fail".into();
        assert!(matches!(err, BallastError::Other(_)));
    }

    #[test]
    fn test_result_type() {
        let ok_result: Result<i32> = Ok(42);
        assert!(ok_result.is_ok());

        let err_result: Result<i32> = Err(BallastError::SingularMatrix("tau * sigma".to_string()));
        assert!(err_result.is_err());
    }
}
