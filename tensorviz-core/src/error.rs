//! Error types for tensorviz-core

use thiserror::Error;

/// Result type for tensor operations
pub type Result<T> = std::result::Result<T, TensorError>;

/// Failures raised by the numeric transforms
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: cannot multiply {left_rows}x{left_cols} by {right_rows}x{right_cols}")]
    DimensionMismatch {
        left_rows: usize,
        left_cols: usize,
        right_rows: usize,
        right_cols: usize,
    },

    #[error("Invalid exponent: {0} (must be an integer >= 1)")]
    InvalidExponent(String),

    #[error("Kernel too large: {kernel_rows}x{kernel_cols} kernel exceeds {height}x{width} input")]
    KernelTooLarge {
        kernel_rows: usize,
        kernel_cols: usize,
        height: usize,
        width: usize,
    },
}
