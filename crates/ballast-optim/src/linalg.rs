//! Dense linear algebra for small systems.
//!
//! Portfolio problems rarely exceed a few hundred assets, so the solvers here
//! work directly on `ndarray` matrices without a BLAS/LAPACK backend.

use ballast_traits::{BallastError, Result};
use ndarray::{Array1, Array2};

/// Pivots smaller than this (relative to the largest entry) count as zero.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Cholesky factor `L` with `A = L Lᵀ`.
///
/// Returns `None` when `a` is not square or not positive definite.
pub fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let (n, m) = a.dim();
    if n != m {
        return None;
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut diag = a[[j, j]];
        for k in 0..j {
            diag -= l[[j, k]] * l[[j, k]];
        }
        if diag <= 0.0 || !diag.is_finite() {
            return None;
        }
        let pivot = diag.sqrt();
        l[[j, j]] = pivot;

        for i in (j + 1)..n {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = sum / pivot;
        }
    }
    Some(l)
}

/// Solves `L Lᵀ x = b` given the Cholesky factor `L`.
pub fn cholesky_solve(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();

    // Forward substitution: L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * y[k];
        }
        y[i] = sum / l[[i, i]];
    }

    // Back substitution: Lᵀ x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    x
}

/// Solves `A X = B` by Gaussian elimination with partial pivoting.
///
/// # Errors
///
/// Returns [`BallastError::DimensionMismatch`] for incompatible shapes and
/// [`BallastError::SingularMatrix`] when `a` is numerically singular.
pub fn solve_many(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>> {
    let (n, m) = a.dim();
    if n != m {
        return Err(BallastError::DimensionMismatch(format!(
            "cannot solve with a non-square {n}x{m} matrix"
        )));
    }
    if b.nrows() != n {
        return Err(BallastError::DimensionMismatch(format!(
            "right-hand side has {} rows, expected {n}",
            b.nrows()
        )));
    }

    let mut lhs = a.to_owned();
    let mut rhs = b.to_owned();
    let scale = lhs.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return Err(BallastError::SingularMatrix(
            "matrix is zero or non-finite".to_string(),
        ));
    }

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| lhs[[i, col]].abs().total_cmp(&lhs[[j, col]].abs()))
            .unwrap_or(col);
        if lhs[[pivot_row, col]].abs() <= PIVOT_TOLERANCE * scale {
            return Err(BallastError::SingularMatrix(format!(
                "zero pivot in column {col}"
            )));
        }
        if pivot_row != col {
            for k in 0..n {
                lhs.swap([col, k], [pivot_row, k]);
            }
            for k in 0..rhs.ncols() {
                rhs.swap([col, k], [pivot_row, k]);
            }
        }

        let pivot = lhs[[col, col]];
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = lhs[[row, col]] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                lhs[[row, k]] -= factor * lhs[[col, k]];
            }
            for k in 0..rhs.ncols() {
                rhs[[row, k]] -= factor * rhs[[col, k]];
            }
        }
    }

    for row in 0..n {
        let pivot = lhs[[row, row]];
        for k in 0..rhs.ncols() {
            rhs[[row, k]] /= pivot;
        }
    }
    Ok(rhs)
}

/// Solves `A x = b`.
///
/// # Errors
///
/// See [`solve_many`].
pub fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let rhs = b.to_owned().insert_axis(ndarray::Axis(1));
    let x = solve_many(a, &rhs)?;
    Ok(x.column(0).to_owned())
}

/// Inverse of a square matrix.
///
/// # Errors
///
/// See [`solve_many`].
pub fn invert(a: &Array2<f64>) -> Result<Array2<f64>> {
    solve_many(a, &Array2::eye(a.nrows()))
}
