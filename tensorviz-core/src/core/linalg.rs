//! # Linear Algebra Operations
//!
//! Dense matrices and integer matrix powers.
//!
//! ## Tensor as Matrices
//!
//! A rank-3 tensor of shape (depth, rows, cols) is read as `depth`
//! independent rows x cols matrices. [`matrix_power_tensor`] raises each of
//! them to the same power.

use serde::{Deserialize, Serialize};

use super::tensor::Tensor;
use crate::error::{Result, TensorError};

/// Exponent used by the `matrix_power` operation when none is configured
pub const DEFAULT_MATRIX_POWER: u32 = 2;

/// Row-major dense matrix of `f64`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Build a matrix from a flat row-major buffer
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(TensorError::InvalidInput(format!(
                "{}x{} matrix needs {} elements, got {}",
                rows,
                cols,
                rows * cols,
                data.len()
            )));
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Build a matrix from rows, rejecting ragged input
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_rows * n_cols);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(TensorError::InvalidInput(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    n_cols
                )));
            }
            data.extend(row);
        }

        Ok(Matrix {
            rows: n_rows,
            cols: n_cols,
            data,
        })
    }

    /// Identity matrix: 1 on the diagonal, 0 elsewhere
    pub fn identity(n: usize) -> Self {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Matrix {
            rows: n,
            cols: n,
            data,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Matrix product: C = A x B
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        multiply(self, other)
    }

    /// Integer power by repeated squaring
    pub fn pow(&self, p: u32) -> Result<Matrix> {
        power(self, p)
    }

    /// Largest absolute elementwise difference, for approximate comparisons
    pub fn max_abs_diff(&self, other: &Matrix) -> Option<f64> {
        if self.rows != other.rows || self.cols != other.cols {
            return None;
        }
        Some(
            self.data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max),
        )
    }
}

/// Identity matrix of size n
pub fn identity(n: usize) -> Matrix {
    Matrix::identity(n)
}

/// Classic O(n³) matrix product
///
/// Fails with [`TensorError::DimensionMismatch`] when `a.cols != b.rows` or
/// either operand is empty.
pub fn multiply(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    if a.is_empty() || b.is_empty() || a.cols != b.rows {
        return Err(TensorError::DimensionMismatch {
            left_rows: a.rows,
            left_cols: a.cols,
            right_rows: b.rows,
            right_cols: b.cols,
        });
    }

    let mut data = vec![0.0; a.rows * b.cols];
    for i in 0..a.rows {
        for j in 0..b.cols {
            let mut sum = 0.0;
            for k in 0..a.cols {
                sum += a.data[i * a.cols + k] * b.data[k * b.cols + j];
            }
            data[i * b.cols + j] = sum;
        }
    }

    Ok(Matrix {
        rows: a.rows,
        cols: b.cols,
        data,
    })
}

/// Matrix power by binary exponentiation
///
/// `p = 1` returns a copy of the input without any multiplication. Otherwise
/// the result starts at the identity and the base is squared once per bit of
/// `p`, for O(log p) products.
pub fn power(matrix: &Matrix, p: u32) -> Result<Matrix> {
    if p < 1 {
        return Err(TensorError::InvalidExponent(p.to_string()));
    }
    if matrix.is_empty() {
        return Err(TensorError::InvalidInput("cannot raise an empty matrix to a power".into()));
    }
    if p == 1 {
        return Ok(matrix.clone());
    }

    let mut result = Matrix::identity(matrix.rows);
    let mut base = matrix.clone();
    let mut remaining = p;

    while remaining > 0 {
        if remaining & 1 == 1 {
            result = multiply(&result, &base)?;
        }
        remaining >>= 1;
        if remaining > 0 {
            base = multiply(&base, &base)?;
        }
    }

    Ok(result)
}

/// Validate an exponent given as a float (e.g. from user input)
pub fn checked_exponent(p: f64) -> Result<u32> {
    if !p.is_finite() || p.fract() != 0.0 || p < 1.0 || p > u32::MAX as f64 {
        return Err(TensorError::InvalidExponent(p.to_string()));
    }
    Ok(p as u32)
}

/// Raise every first-axis plane of `tensor` to `power`
///
/// Fails with [`TensorError::InvalidExponent`] for `power < 1`; planes that
/// are not square fail with [`TensorError::DimensionMismatch`] once `power >= 2`.
pub fn matrix_power_tensor(tensor: &Tensor, power: u32) -> Result<Tensor> {
    if power < 1 {
        return Err(TensorError::InvalidExponent(power.to_string()));
    }

    let planes = tensor
        .planes()
        .map(|plane| self::power(&plane, power))
        .collect::<Result<Vec<_>>>()?;

    Tensor::from_planes(planes)
}
