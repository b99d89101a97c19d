//! # Elementwise Transforms
//!
//! Scalar functions mapped over every element of a tensor.
//!
//! | Function | Element mapping |
//! |----------|-----------------|
//! | `sine` | `sin(x)` |
//! | `tanh` | `tanh(x)` |
//! | `exp_decay` | `x * exp(-step / 1000)` |
//!
//! All of them preserve shape and cannot fail.

use super::tensor::Tensor;

/// Time constant of [`exp_decay`], in steps
pub const DECAY_CONSTANT: f64 = 1000.0;

/// Sine of every element
pub fn sine(tensor: &Tensor) -> Tensor {
    tensor.map(f64::sin)
}

/// Hyperbolic tangent of every element
pub fn tanh(tensor: &Tensor) -> Tensor {
    tensor.map(f64::tanh)
}

/// Scale factor applied by [`exp_decay`] at a given step
#[inline]
pub fn decay_factor(step: usize) -> f64 {
    (-(step as f64) / DECAY_CONSTANT).exp()
}

/// Multiply every element by `exp(-step / 1000)`
///
/// `step` is the 0-based global step index, so step 0 leaves the tensor as is.
pub fn exp_decay(tensor: &Tensor, step: usize) -> Tensor {
    let decay = decay_factor(step);
    tensor.map(|v| v * decay)
}
