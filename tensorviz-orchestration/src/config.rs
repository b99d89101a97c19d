//! Simulation configuration (`tensorviz.toml`)
//!
//! ```toml
//! shape = [10, 10, 3]
//! operations = ["sine", "conv"]
//! steps = 50
//! step_delay_ms = 100
//! seed = 7
//!
//! [matrix_power]
//! exponent = 2
//!
//! [conv]
//! kernel = [[1, 1, 1], [1, -8, 1], [1, 1, 1]]
//! stride = 1
//! padding = 0
//! ```
//!
//! Every key is optional. Values stay raw until [`SimulationConfig::validate`]
//! so that bad input surfaces as a typed [`SimError`] instead of a parse
//! failure.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tensorviz_core::{DEFAULT_MATRIX_POWER, Kernel, Shape, checked_exponent};

use crate::driver::{RunRequest, SimulationDriver};
use crate::error::{SimError, SimResult};
use crate::registry::{ConvParams, OperationRegistry};
use crate::scheduler::{SchedulerConfig, SchedulerMode};

/// Default config file name
pub const CONFIG_FILE: &str = "tensorviz.toml";

/// Settings of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// `[depth, rows, cols]`
    pub shape: Vec<i64>,
    pub operations: Vec<String>,
    pub steps: usize,
    pub step_delay_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub matrix_power: MatrixPowerConfig,
    pub conv: ConvConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            shape: vec![10, 10, 3],
            operations: vec!["sine".to_string()],
            steps: 50,
            step_delay_ms: 100,
            seed: None,
            matrix_power: MatrixPowerConfig::default(),
            conv: ConvConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixPowerConfig {
    pub exponent: f64,
}

impl Default for MatrixPowerConfig {
    fn default() -> Self {
        Self {
            exponent: DEFAULT_MATRIX_POWER as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvConfig {
    /// Laplacian when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel: Option<Kernel>,
    pub stride: usize,
    pub padding: usize,
}

impl Default for ConvConfig {
    fn default() -> Self {
        Self {
            kernel: None,
            stride: 1,
            padding: 0,
        }
    }
}

impl SimulationConfig {
    /// Parse a config from TOML
    pub fn from_toml_str(content: &str) -> SimResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config file
    pub fn load_from_file(path: &Path) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SimError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Load `path` if given, otherwise `./tensorviz.toml` if present, otherwise defaults
    pub fn load_or_default(path: Option<&Path>) -> SimResult<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let local = Path::new(CONFIG_FILE);
                if local.exists() {
                    tracing::debug!(path = CONFIG_FILE, "using local config file");
                    Self::load_from_file(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn to_toml_string(&self) -> SimResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| SimError::ConfigParse(format!("Failed to serialize config: {}", e)))
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// Scheduler settings; a zero delay disables pacing
    pub fn scheduler_config(&self) -> SchedulerConfig {
        let mode = if self.step_delay_ms == 0 {
            SchedulerMode::BestEffort
        } else {
            SchedulerMode::FixedDelay
        };
        SchedulerConfig {
            step_delay: self.step_delay(),
            mode,
        }
    }

    /// Build the operation registry from `[matrix_power]` and `[conv]`
    pub fn registry(&self) -> SimResult<OperationRegistry> {
        let exponent = checked_exponent(self.matrix_power.exponent)?;
        let conv = ConvParams {
            kernel: self.conv.kernel.clone().unwrap_or_default(),
            stride: self.conv.stride,
            padding: self.conv.padding,
        };
        OperationRegistry::with_params(exponent, conv)
    }

    /// Check every value and produce what a run needs
    pub fn validate(&self) -> SimResult<(RunRequest, OperationRegistry)> {
        let shape = Shape::from_dims(&self.shape)?;
        let registry = self.registry()?;
        let sequence = registry.resolve(self.operations.as_slice())?;
        let request = RunRequest::new(shape, sequence, self.steps)?;
        Ok((request, registry))
    }

    /// Driver for `registry`, seeded when `seed` is set
    pub fn driver(&self, registry: OperationRegistry) -> SimulationDriver {
        match self.seed {
            Some(seed) => SimulationDriver::with_seed(registry, seed),
            None => SimulationDriver::new(registry),
        }
    }
}
