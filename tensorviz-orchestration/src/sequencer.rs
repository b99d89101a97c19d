//! Step sequencer
//!
//! Picks `sequence[step % len]` for every step and applies it through the
//! registry. A failed transform is returned as an explicit [`StepFailure`]
//! holding the untouched input, so the caller decides whether to continue.

use std::fmt;

use serde::{Deserialize, Serialize};
use tensorviz_core::{Tensor, TensorError};

use crate::error::{SimError, SimResult};
use crate::registry::{ERROR_OPERATION, OperationKind, OperationRegistry};

/// Non-empty, ordered list of operations, repeated cyclically
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<OperationKind>")]
pub struct OperationSequence {
    ops: Vec<OperationKind>,
}

impl OperationSequence {
    pub fn new(ops: Vec<OperationKind>) -> SimResult<Self> {
        if ops.is_empty() {
            return Err(SimError::EmptyOperationSequence);
        }
        Ok(Self { ops })
    }

    /// Operation scheduled for a given step
    #[inline]
    pub fn at(&self, step: usize) -> OperationKind {
        self.ops[step % self.ops.len()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Always false: construction rejects empty sequences
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn as_slice(&self) -> &[OperationKind] {
        &self.ops
    }
}

impl TryFrom<Vec<OperationKind>> for OperationSequence {
    type Error = SimError;

    fn try_from(ops: Vec<OperationKind>) -> SimResult<Self> {
        OperationSequence::new(ops)
    }
}

impl fmt::Display for OperationSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.ops.iter().map(OperationKind::name).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// What a step ended up applying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliedOp {
    /// The scheduled operation succeeded
    Applied(OperationKind),
    /// The scheduled operation failed and the tensor was passed through
    Failed(OperationKind),
}

impl AppliedOp {
    /// Reported name: the operation's name, or `"error"` on failure
    pub fn name(&self) -> &'static str {
        match self {
            AppliedOp::Applied(op) => op.name(),
            AppliedOp::Failed(_) => ERROR_OPERATION,
        }
    }

    /// Operation that was scheduled for the step
    pub fn scheduled(&self) -> OperationKind {
        match self {
            AppliedOp::Applied(op) | AppliedOp::Failed(op) => *op,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AppliedOp::Failed(_))
    }
}

impl fmt::Display for AppliedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A transform failure; `tensor` is the unchanged input
#[derive(Debug, Clone)]
pub struct StepFailure {
    pub operation: OperationKind,
    pub step: usize,
    pub error: TensorError,
    pub tensor: Tensor,
}

/// Applies an [`OperationSequence`] one step at a time
#[derive(Debug, Clone, Copy)]
pub struct Sequencer<'a> {
    registry: &'a OperationRegistry,
}

impl<'a> Sequencer<'a> {
    pub fn new(registry: &'a OperationRegistry) -> Self {
        Self { registry }
    }

    /// Apply the scheduled operation, surfacing a failure as `Err`
    pub fn try_apply_at(
        &self,
        tensor: Tensor,
        step: usize,
        sequence: &OperationSequence,
    ) -> Result<(Tensor, OperationKind), StepFailure> {
        let op = sequence.at(step);
        match self.registry.apply(op, &tensor, step) {
            Ok(next) => Ok((next, op)),
            Err(error) => Err(StepFailure {
                operation: op,
                step,
                error,
                tensor,
            }),
        }
    }

    /// Apply the scheduled operation; a failure yields `("error", tensor unchanged)`
    ///
    /// Every failure is logged at `warn` level.
    pub fn apply_at(&self, tensor: Tensor, step: usize, sequence: &OperationSequence) -> (Tensor, AppliedOp) {
        match self.try_apply_at(tensor, step, sequence) {
            Ok((next, op)) => (next, AppliedOp::Applied(op)),
            Err(failure) => {
                tracing::warn!(
                    step = failure.step,
                    operation = %failure.operation,
                    error = %failure.error,
                    "operation failed, passing tensor through unchanged"
                );
                (failure.tensor, AppliedOp::Failed(failure.operation))
            }
        }
    }
}
