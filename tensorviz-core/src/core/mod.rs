//! # Core Tensor Primitives
//!
//! - Rank-3 tensors and the random tensor factory
//! - Elementwise transforms (sine, tanh, exponential decay)
//! - Linear algebra (identity, multiplication, matrix power)
//! - 2D convolution
//! - Summary statistics

pub mod tensor;
pub mod elementwise;
pub mod linalg;
pub mod conv;
pub mod stats;

pub use tensor::{Shape, Tensor, create_tensor, create_tensor_from_dims, create_tensor_with_rng};
pub use elementwise::{DECAY_CONSTANT, decay_factor, exp_decay, sine, tanh};
pub use linalg::{
    DEFAULT_MATRIX_POWER, Matrix, checked_exponent, identity, matrix_power_tensor, multiply, power,
};
pub use conv::{Kernel, convolve, convolve_default, output_shape};
pub use stats::TensorStatistics;

/// Prelude module for core exports
pub mod prelude {
    pub use crate::core::tensor::{Shape, Tensor, create_tensor, create_tensor_with_rng};
    pub use crate::core::elementwise::{exp_decay, sine, tanh};
    pub use crate::core::linalg::{Matrix, identity, matrix_power_tensor, multiply, power};
    pub use crate::core::conv::{Kernel, convolve};
    pub use crate::core::stats::TensorStatistics;
}
