//! Operation registry
//!
//! Fixed vocabulary of transforms (`sine`, `tanh`, `exp_decay`,
//! `matrix_power`, `conv`) with their explanations. The registry carries the
//! parameters of the structural operations and is read-only once built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tensorviz_core::{Kernel, Tensor, elementwise, linalg, conv};

use crate::error::{SimError, SimResult};

/// Name reported for a step whose operation failed
pub const ERROR_OPERATION: &str = "error";

/// Explanation for names outside the vocabulary (including [`ERROR_OPERATION`])
pub const NO_EXPLANATION: &str = "No detailed explanation available for this operation.";

/// The five operations a simulation can apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Sine,
    Tanh,
    ExpDecay,
    MatrixPower,
    Conv,
}

impl OperationKind {
    /// Every operation in display order
    pub const ALL: [OperationKind; 5] = [
        OperationKind::Sine,
        OperationKind::Tanh,
        OperationKind::ExpDecay,
        OperationKind::MatrixPower,
        OperationKind::Conv,
    ];

    /// Stable external name
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Sine => "sine",
            OperationKind::Tanh => "tanh",
            OperationKind::ExpDecay => "exp_decay",
            OperationKind::MatrixPower => "matrix_power",
            OperationKind::Conv => "conv",
        }
    }

    /// Human-readable description of the numeric effect
    pub fn explanation(&self) -> &'static str {
        match self {
            OperationKind::Sine => {
                "Applies sine function to all elements, creating a wave-like pattern in the data."
            }
            OperationKind::Tanh => {
                "Squashes values to range [-1, 1], useful for introducing non-linearity."
            }
            OperationKind::ExpDecay => {
                "Reduces tensor values over time, simulating decay or learning rate adjustment."
            }
            OperationKind::MatrixPower => {
                "Raises the matrix to a power, intensifying patterns in the data."
            }
            OperationKind::Conv => {
                "Applies convolution, often used for feature extraction in neural networks."
            }
        }
    }

    /// Whether the output always has the input's shape
    pub fn preserves_shape(&self) -> bool {
        !matches!(self, OperationKind::Conv)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperationKind {
    type Err = SimError;

    fn from_str(s: &str) -> SimResult<Self> {
        OperationKind::ALL
            .into_iter()
            .find(|op| op.name() == s.trim())
            .ok_or_else(|| SimError::UnknownOperation(s.to_string()))
    }
}

/// Explanation for any reported operation name
pub fn explain(name: &str) -> &'static str {
    name.parse::<OperationKind>()
        .map(|op| op.explanation())
        .unwrap_or(NO_EXPLANATION)
}

/// Parameters of the `conv` operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvParams {
    pub kernel: Kernel,
    pub stride: usize,
    pub padding: usize,
}

impl Default for ConvParams {
    fn default() -> Self {
        Self {
            kernel: Kernel::laplacian(),
            stride: 1,
            padding: 0,
        }
    }
}

/// Maps each [`OperationKind`] to its transform
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRegistry {
    matrix_power: u32,
    conv: ConvParams,
}

impl OperationRegistry {
    /// Registry with exponent 2 and the Laplacian kernel
    pub fn new() -> Self {
        Self {
            matrix_power: linalg::DEFAULT_MATRIX_POWER,
            conv: ConvParams::default(),
        }
    }

    /// Registry with explicit parameters for the structural operations
    pub fn with_params(matrix_power: u32, conv: ConvParams) -> SimResult<Self> {
        if matrix_power < 1 {
            return Err(tensorviz_core::TensorError::InvalidExponent(matrix_power.to_string()).into());
        }
        if conv.stride == 0 {
            return Err(SimError::InvalidConfiguration("conv stride must be at least 1".into()));
        }
        Ok(Self { matrix_power, conv })
    }

    pub fn matrix_power(&self) -> u32 {
        self.matrix_power
    }

    pub fn conv_params(&self) -> &ConvParams {
        &self.conv
    }

    /// Apply `op` to `tensor` at global step `step`
    ///
    /// Only `exp_decay` reads the step; the other operations ignore it.
    /// `matrix_power` raises to the configured exponent, never to the step.
    pub fn apply(&self, op: OperationKind, tensor: &Tensor, step: usize) -> tensorviz_core::Result<Tensor> {
        match op {
            OperationKind::Sine => Ok(elementwise::sine(tensor)),
            OperationKind::Tanh => Ok(elementwise::tanh(tensor)),
            OperationKind::ExpDecay => Ok(elementwise::exp_decay(tensor, step)),
            OperationKind::MatrixPower => linalg::matrix_power_tensor(tensor, self.matrix_power),
            OperationKind::Conv => conv::convolve(
                tensor,
                &self.conv.kernel,
                self.conv.stride,
                self.conv.padding,
            ),
        }
    }

    /// Resolve user-supplied names into a validated sequence
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> SimResult<crate::sequencer::OperationSequence> {
        let ops = names
            .iter()
            .map(|name| name.as_ref().parse::<OperationKind>())
            .collect::<SimResult<Vec<_>>>()?;
        crate::sequencer::OperationSequence::new(ops)
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
