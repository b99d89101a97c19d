//! # tensorviz-core - Rank-3 Tensor Transforms
//!
//! Pure numeric building blocks for the TensorViz simulator.
//!
//! ## Features
//!
//! - **tensor**: [`Shape`], [`Tensor`] and the random tensor factory
//! - **elementwise**: sine, tanh and exponential decay
//! - **linalg**: dense matrices and matrix power by repeated squaring
//! - **conv**: per-channel 2D convolution with stride and padding
//! - **stats**: summary statistics
//!
//! Every transform takes `&Tensor` and returns a new tensor.
//!
//! ```
//! use tensorviz_core::prelude::*;
//!
//! let shape = Shape::new(10, 10, 3).unwrap();
//! let tensor = create_tensor(shape);
//! let edges = convolve(&sine(&tensor), &Kernel::laplacian(), 1, 0).unwrap();
//! assert_eq!(edges.shape().dims(), [8, 8, 3]);
//! ```

pub mod error;
pub use error::{Result, TensorError};

pub mod core;
pub use self::core::*;

/// Prelude module with common re-exports
pub mod prelude {
    pub use crate::core::prelude::*;
    pub use crate::error::{Result, TensorError};
}
