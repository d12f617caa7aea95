//! Historical return tables.

use ballast_traits::stats::{mean_returns, sample_covariance};
use ballast_traits::{BallastError, Result, Symbol};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;

/// Name of the optional column holding period labels in a return table.
pub const DATE_COLUMN: &str = "date";

/// Periodic returns for a set of symbols, laid out `(periods × assets)`.
///
/// Column `j` of [`returns`](Self::returns) belongs to `symbols()[j]`.
///
/// # Example
///
/// ```
/// use ballast_optim::ReturnHistory;
/// use ndarray::array;
///
/// let history = ReturnHistory::new(
///     vec!["SPY".to_string(), "TLT".to_string()],
///     array![[0.01, -0.002], [-0.004, 0.003], [0.007, 0.001]],
/// )
/// .unwrap();
///
/// assert_eq!(history.num_assets(), 2);
/// assert_eq!(history.num_periods(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnHistory {
    symbols: Vec<Symbol>,
    returns: Array2<f64>,
}

impl ReturnHistory {
    /// Creates a return history from symbols and a return matrix.
    ///
    /// # Errors
    ///
    /// Returns [`BallastError::DimensionMismatch`] when the number of columns
    /// differs from the number of symbols and [`BallastError::InvalidData`]
    /// for duplicate symbols.
    pub fn new(symbols: Vec<Symbol>, returns: Array2<f64>) -> Result<Self> {
        if returns.ncols() != symbols.len() {
            return Err(BallastError::DimensionMismatch(format!(
                "return matrix has {} columns for {} symbols",
                returns.ncols(),
                symbols.len()
            )));
        }
        for (i, symbol) in symbols.iter().enumerate() {
            if symbols[..i].contains(symbol) {
                return Err(BallastError::InvalidData(format!(
                    "duplicate symbol {symbol} in return history"
                )));
            }
        }
        Ok(Self { symbols, returns })
    }

    /// Builds simple returns `p[t] / p[t-1] - 1` from a price matrix.
    ///
    /// # Errors
    ///
    /// Returns [`BallastError::InvalidData`] for non-positive prices, plus the
    /// errors of [`ReturnHistory::new`].
    pub fn from_prices(symbols: Vec<Symbol>, prices: &Array2<f64>) -> Result<Self> {
        if prices.iter().any(|p| !(p.is_finite() && *p > 0.0)) {
            return Err(BallastError::InvalidData(
                "prices must be finite and positive".to_string(),
            ));
        }
        let periods = prices.nrows().saturating_sub(1);
        let mut returns = Array2::<f64>::zeros((periods, prices.ncols()));
        for t in 0..periods {
            for j in 0..prices.ncols() {
                returns[[t, j]] = prices[[t + 1, j]] / prices[[t, j]] - 1.0;
            }
        }
        Self::new(symbols, returns)
    }

    /// Reads a return table with one numeric column per symbol.
    ///
    /// A [`DATE_COLUMN`] column, if present, is ignored. Rows holding a null in
    /// any column are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`BallastError::Polars`] when a column cannot be cast to
    /// `Float64`, and [`BallastError::InsufficientData`] when no symbol column
    /// is present.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let df = df.drop_nulls::<String>(None)?;
        let symbols: Vec<Symbol> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .filter(|name| name != DATE_COLUMN)
            .collect();
        if symbols.is_empty() {
            return Err(BallastError::InsufficientData(
                "return table has no symbol columns".to_string(),
            ));
        }

        let mut returns = Array2::<f64>::zeros((df.height(), symbols.len()));
        for (j, symbol) in symbols.iter().enumerate() {
            let column = df.column(symbol)?.cast(&DataType::Float64)?;
            let values = column.as_materialized_series().f64()?;
            for (t, value) in values.into_iter().enumerate() {
                returns[[t, j]] = value.unwrap_or(f64::NAN);
            }
        }
        Self::new(symbols, returns)
    }

    /// Symbols in column order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// The `(periods × assets)` return matrix.
    pub const fn returns(&self) -> &Array2<f64> {
        &self.returns
    }

    /// Number of assets (columns).
    pub fn num_assets(&self) -> usize {
        self.symbols.len()
    }

    /// Number of periods (rows).
    pub fn num_periods(&self) -> usize {
        self.returns.nrows()
    }

    /// Column index of `symbol`.
    pub fn position(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Returns whether the history holds a column for `symbol`.
    pub fn contains(&self, symbol: &str) -> bool {
        self.position(symbol).is_some()
    }

    /// Restricts the history to `symbols`, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`BallastError::SymbolNotFound`] for a symbol without a column.
    pub fn select(&self, symbols: &[Symbol]) -> Result<Self> {
        let indices = symbols
            .iter()
            .map(|symbol| {
                self.position(symbol)
                    .ok_or_else(|| BallastError::SymbolNotFound(symbol.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(symbols.to_vec(), self.returns.select(Axis(1), &indices))
    }

    /// Keeps only the most recent `periods` rows.
    pub fn tail(&self, periods: usize) -> Self {
        let start = self.num_periods().saturating_sub(periods);
        Self {
            symbols: self.symbols.clone(),
            returns: self.returns.slice(ndarray::s![start.., ..]).to_owned(),
        }
    }

    /// Mean return per asset.
    ///
    /// # Errors
    ///
    /// Returns [`BallastError::InsufficientData`] for an empty history.
    pub fn mean(&self) -> Result<Array1<f64>> {
        mean_returns(&self.returns)
    }

    /// Sample covariance of the returns.
    ///
    /// # Errors
    ///
    /// See [`sample_covariance`].
    pub fn covariance(&self) -> Result<Array2<f64>> {
        sample_covariance(&self.returns)
    }
}
