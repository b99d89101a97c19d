//! # tensorviz-orchestration - Simulation Driver
//!
//! Turns the pure transforms of `tensorviz-core` into a stepped simulation:
//! a registry of named operations, a cyclic sequencer, and a driver that
//! hands every intermediate tensor to an observer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SimulationDriver                         │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │  OperationRegistry                                    │  │
//! │  │  sine | tanh | exp_decay | matrix_power | conv        │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │  Sequencer                                            │  │
//! │  │  step k → sequence[k % len] → apply or pass through   │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │  Observer / EventBus                                  │  │
//! │  │  Started | Step | StepFailed | Completed              │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use tensorviz_orchestration::*;
//!
//! let config = SimulationConfig {
//!     shape: vec![2, 2, 2],
//!     operations: vec!["sine".into(), "tanh".into()],
//!     steps: 5,
//!     step_delay_ms: 0,
//!     ..SimulationConfig::default()
//! };
//! let (request, registry) = config.validate().unwrap();
//! let mut driver = config.driver(registry);
//! let mut scheduler = Scheduler::new(config.scheduler_config());
//!
//! let summary = driver.run(request, &mut NullObserver, &mut scheduler).unwrap();
//! assert_eq!(summary.applied.len(), 5);
//! assert_eq!(summary.applied[4].name(), "sine");
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod registry;
pub mod scheduler;
pub mod sequencer;

pub use config::{CONFIG_FILE, ConvConfig, MatrixPowerConfig, SimulationConfig};
pub use driver::{
    DriverPhase, DriverState, MAX_STEPS, MIN_STEPS, RunId, RunRequest, RunSummary,
    SimulationDriver, SimulationState, StepReport,
};
pub use error::{SimError, SimResult};
pub use events::{EventBus, EventFilter, EventHandler, EventRecord, NullObserver, SimEvent, SimulationObserver};
pub use registry::{ConvParams, ERROR_OPERATION, NO_EXPLANATION, OperationKind, OperationRegistry, explain};
pub use scheduler::{DEFAULT_STEP_DELAY, Scheduler, SchedulerConfig, SchedulerMode, SchedulerStats, TickInfo};
pub use sequencer::{AppliedOp, OperationSequence, Sequencer, StepFailure};

// Re-export the core types observers work with
pub use tensorviz_core::{Kernel, Shape, Tensor, TensorError, TensorStatistics};
