//! Simulation errors

use thiserror::Error;
use tensorviz_core::TensorError;

use crate::driver::RunId;

pub type SimResult<T> = Result<T, SimError>;

/// Errors raised while configuring or driving a simulation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// No operation selected for the run
    #[error("Operation sequence is empty: select at least one operation")]
    EmptyOperationSequence,

    /// Name outside the operation vocabulary
    #[error("Unknown operation: {0} (expected one of sine, tanh, exp_decay, matrix_power, conv)")]
    UnknownOperation(String),

    /// Step count outside [1, 1000]
    #[error("Invalid step count: {0} (must be between 1 and 1000)")]
    InvalidStepCount(usize),

    /// Malformed configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Tensor construction or transform failure
    #[error(transparent)]
    Tensor(#[from] TensorError),

    /// Step request for a run that has been superseded
    #[error("Stale run: {requested} was superseded by {current}")]
    StaleRun { requested: RunId, current: RunId },

    /// Step request with no active run
    #[error("No simulation is running")]
    NotRunning,

    /// Config file could not be read
    #[error("I/O error: {0}")]
    Io(String),

    /// Config file is not valid TOML for a simulation
    #[error("Config parse error: {0}")]
    ConfigParse(String),

    /// Lock poison
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<std::io::Error> for SimError {
    fn from(err: std::io::Error) -> Self {
        SimError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for SimError {
    fn from(err: toml::de::Error) -> Self {
        SimError::ConfigParse(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for SimError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        SimError::LockPoisoned(err.to_string())
    }
}
