//! Simulation driver
//!
//! State machine `Idle -> Running -> Complete` that owns the current tensor
//! and advances it one operation per step.
//!
//! ```text
//!            start(request)                 step(run) x total_steps
//!   Idle ──────────────────▶ Running ───────────────────────────────▶ Complete
//!     ▲                        │  ▲                                      │
//!     │                        └──┘ step < total_steps                   │
//!     └──────────────────────── start(request) ◀─────────────────────────┘
//! ```
//!
//! Every `start` mints a new [`RunId`]. Step requests carrying an older id are
//! rejected with [`SimError::StaleRun`], so a continuation scheduled for a
//! superseded run can never touch the fresh one.

use std::fmt;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tensorviz_core::{Shape, Tensor, TensorStatistics, create_tensor_with_rng};

use crate::error::{SimError, SimResult};
use crate::events::{SimEvent, SimulationObserver};
use crate::registry::{OperationRegistry, explain};
use crate::scheduler::{Scheduler, SchedulerStats};
use crate::sequencer::{AppliedOp, OperationSequence, Sequencer};

/// Smallest allowed step count
pub const MIN_STEPS: usize = 1;
/// Largest allowed step count
pub const MAX_STEPS: usize = 1000;

/// Identifier of one simulation run (the driver's generation counter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(u64);

impl RunId {
    pub fn new(id: u64) -> Self {
        RunId(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// Everything needed to start a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub shape: Shape,
    pub sequence: OperationSequence,
    pub total_steps: usize,
}

impl RunRequest {
    pub fn new(shape: Shape, sequence: OperationSequence, total_steps: usize) -> SimResult<Self> {
        let request = Self {
            shape,
            sequence,
            total_steps,
        };
        request.validate()?;
        Ok(request)
    }

    /// Build a request from raw user input
    pub fn from_input<S: AsRef<str>>(
        dims: &[i64],
        operations: &[S],
        total_steps: usize,
        registry: &OperationRegistry,
    ) -> SimResult<Self> {
        let shape = Shape::from_dims(dims)?;
        let sequence = registry.resolve(operations)?;
        Self::new(shape, sequence, total_steps)
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(MIN_STEPS..=MAX_STEPS).contains(&self.total_steps) {
            return Err(SimError::InvalidStepCount(self.total_steps));
        }
        Ok(())
    }
}

/// State of the run in progress (or just finished)
#[derive(Debug, Clone)]
pub struct SimulationState {
    run: RunId,
    tensor: Tensor,
    step: usize,
    total_steps: usize,
    sequence: OperationSequence,
    applied: Vec<AppliedOp>,
    failures: usize,
}

impl SimulationState {
    pub fn run(&self) -> RunId {
        self.run
    }

    pub fn tensor(&self) -> &Tensor {
        &self.tensor
    }

    /// Number of steps applied so far
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn sequence(&self) -> &OperationSequence {
        &self.sequence
    }

    /// Outcome of every step so far, in order
    pub fn applied(&self) -> &[AppliedOp] {
        &self.applied
    }

    pub fn last_applied(&self) -> Option<AppliedOp> {
        self.applied.last().copied()
    }

    pub fn failures(&self) -> usize {
        self.failures
    }
}

/// Driver state
#[derive(Debug, Clone, Default)]
pub enum DriverState {
    #[default]
    Idle,
    Running(SimulationState),
    Complete(SimulationState),
}

/// State without payload, for quick checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverPhase {
    Idle,
    Running,
    Complete,
}

impl DriverState {
    pub fn phase(&self) -> DriverPhase {
        match self {
            DriverState::Idle => DriverPhase::Idle,
            DriverState::Running(_) => DriverPhase::Running,
            DriverState::Complete(_) => DriverPhase::Complete,
        }
    }

    pub fn simulation(&self) -> Option<&SimulationState> {
        match self {
            DriverState::Idle => None,
            DriverState::Running(sim) | DriverState::Complete(sim) => Some(sim),
        }
    }
}

/// Result of one `step` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub run: RunId,
    /// Steps applied so far, 1-based
    pub step: usize,
    pub total_steps: usize,
    pub applied: AppliedOp,
    /// True when this step completed the run
    pub finished: bool,
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run: RunId,
    pub total_steps: usize,
    pub applied: Vec<AppliedOp>,
    pub failures: usize,
    pub final_shape: Shape,
    pub statistics: TensorStatistics,
    pub explanation: &'static str,
    pub scheduler: Option<SchedulerStats>,
}

/// Owns the simulation state and advances it
#[derive(Debug)]
pub struct SimulationDriver {
    registry: OperationRegistry,
    state: DriverState,
    generation: u64,
    rng: StdRng,
}

impl SimulationDriver {
    /// Driver whose tensors come from OS entropy
    pub fn new(registry: OperationRegistry) -> Self {
        Self::with_rng(registry, StdRng::from_entropy())
    }

    /// Driver with reproducible initial tensors
    pub fn with_seed(registry: OperationRegistry, seed: u64) -> Self {
        Self::with_rng(registry, StdRng::seed_from_u64(seed))
    }

    fn with_rng(registry: OperationRegistry, rng: StdRng) -> Self {
        Self {
            registry,
            state: DriverState::Idle,
            generation: 0,
            rng,
        }
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    pub fn state(&self) -> &DriverState {
        &self.state
    }

    pub fn phase(&self) -> DriverPhase {
        self.state.phase()
    }

    /// Id of the most recent run, if any was started
    pub fn current_run(&self) -> Option<RunId> {
        (self.generation > 0).then_some(RunId(self.generation))
    }

    /// Current tensor (`None` while idle)
    pub fn tensor(&self) -> Option<&Tensor> {
        self.state.simulation().map(SimulationState::tensor)
    }

    /// Start a new run, superseding any run in progress
    ///
    /// The request is validated before anything changes; on error the
    /// previous state is kept. On success the initial tensor is emitted as
    /// [`SimEvent::Started`].
    pub fn start<O>(&mut self, request: RunRequest, observer: &mut O) -> SimResult<RunId>
    where
        O: SimulationObserver + ?Sized,
    {
        request.validate()?;

        if let DriverState::Running(previous) = &self.state {
            tracing::info!(
                run = %previous.run,
                step = previous.step,
                "superseding run in progress"
            );
        }

        let tensor = create_tensor_with_rng(request.shape, &mut self.rng);
        self.generation += 1;
        let run = RunId(self.generation);

        tracing::info!(
            run = %run,
            shape = %request.shape,
            steps = request.total_steps,
            operations = %request.sequence,
            "simulation started"
        );

        self.state = DriverState::Running(SimulationState {
            run,
            tensor,
            step: 0,
            total_steps: request.total_steps,
            sequence: request.sequence,
            applied: Vec::with_capacity(request.total_steps),
            failures: 0,
        });

        if let Some(sim) = self.state.simulation() {
            observer.on_event(&SimEvent::Started {
                run,
                total_steps: sim.total_steps,
                tensor: &sim.tensor,
            });
        }

        Ok(run)
    }

    /// Apply the next operation of `run`
    ///
    /// A failing transform does not abort the run: the step is reported as
    /// `error`, the tensor is kept, and a [`SimEvent::StepFailed`] precedes
    /// the [`SimEvent::Step`] event.
    pub fn step<O>(&mut self, run: RunId, observer: &mut O) -> SimResult<StepReport>
    where
        O: SimulationObserver + ?Sized,
    {
        if run.0 < self.generation {
            return Err(SimError::StaleRun {
                requested: run,
                current: RunId(self.generation),
            });
        }

        let mut sim = match std::mem::take(&mut self.state) {
            DriverState::Running(sim) if sim.run == run => sim,
            other => {
                self.state = other;
                return Err(SimError::NotRunning);
            }
        };

        let index = sim.step;
        let sequencer = Sequencer::new(&self.registry);
        let applied = match sequencer.try_apply_at(sim.tensor, index, &sim.sequence) {
            Ok((next, op)) => {
                sim.tensor = next;
                AppliedOp::Applied(op)
            }
            Err(failure) => {
                tracing::warn!(
                    run = %run,
                    step = index,
                    operation = %failure.operation,
                    error = %failure.error,
                    "step failed, continuing with unchanged tensor"
                );
                observer.on_event(&SimEvent::StepFailed {
                    run,
                    step: index + 1,
                    operation: failure.operation,
                    error: &failure.error,
                });
                sim.tensor = failure.tensor;
                sim.failures += 1;
                AppliedOp::Failed(failure.operation)
            }
        };

        sim.step += 1;
        sim.applied.push(applied);

        tracing::debug!(
            run = %run,
            step = sim.step,
            total = sim.total_steps,
            applied = %applied,
            shape = %sim.tensor.shape(),
            "step applied"
        );

        observer.on_event(&SimEvent::Step {
            run,
            step: sim.step,
            total_steps: sim.total_steps,
            applied,
            tensor: &sim.tensor,
        });

        let finished = sim.step >= sim.total_steps;
        let report = StepReport {
            run,
            step: sim.step,
            total_steps: sim.total_steps,
            applied,
            finished,
        };

        if finished {
            let explanation = explain(applied.name());
            tracing::info!(
                run = %run,
                steps = sim.step,
                failures = sim.failures,
                last = %applied,
                "simulation complete"
            );
            observer.on_event(&SimEvent::Completed {
                run,
                last_applied: applied,
                explanation,
            });
            self.state = DriverState::Complete(sim);
        } else {
            self.state = DriverState::Running(sim);
        }

        Ok(report)
    }

    /// Summary of the last run, once it is complete
    pub fn summary(&self) -> Option<RunSummary> {
        let DriverState::Complete(sim) = &self.state else {
            return None;
        };
        let last = sim.last_applied()?;

        Some(RunSummary {
            run: sim.run,
            total_steps: sim.total_steps,
            applied: sim.applied.clone(),
            failures: sim.failures,
            final_shape: sim.tensor.shape(),
            statistics: sim.tensor.statistics(),
            explanation: explain(last.name()),
            scheduler: None,
        })
    }

    /// Start a run and drive it to completion, pacing steps with `scheduler`
    ///
    /// Each step's observer hand-off returns before the delay to the next
    /// step starts.
    pub fn run<O>(
        &mut self,
        request: RunRequest,
        observer: &mut O,
        scheduler: &mut Scheduler,
    ) -> SimResult<RunSummary>
    where
        O: SimulationObserver + ?Sized,
    {
        let run = self.start(request, observer)?;
        scheduler.reset();

        loop {
            scheduler.wait_for_next_tick();
            let started = Instant::now();
            let report = self.step(run, observer)?;
            scheduler.record_execution_time(started.elapsed());
            scheduler.mark_step_end();

            if report.finished {
                break;
            }
        }

        let mut summary = self.summary().ok_or(SimError::NotRunning)?;
        summary.scheduler = Some(scheduler.stats());
        Ok(summary)
    }
}
