//! Simulation events and the observer seam
//!
//! The driver hands every event to a [`SimulationObserver`] synchronously.
//! Events borrow the current tensor, so observers render it in place instead
//! of receiving a copy. [`EventBus`] fans events out to filtered subscribers
//! and keeps a bounded history without tensors.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tensorviz_core::{Shape, Tensor, TensorError};

use crate::driver::RunId;
use crate::error::SimResult;
use crate::registry::OperationKind;
use crate::sequencer::AppliedOp;

/// Something the driver reports to the outside world
#[derive(Debug, Clone, Copy)]
pub enum SimEvent<'a> {
    /// Initial tensor of a run was created
    Started {
        run: RunId,
        total_steps: usize,
        tensor: &'a Tensor,
    },
    /// A step finished; `step` is 1-based (steps completed so far)
    Step {
        run: RunId,
        step: usize,
        total_steps: usize,
        applied: AppliedOp,
        tensor: &'a Tensor,
    },
    /// The scheduled operation of a step failed; a `Step` event follows
    StepFailed {
        run: RunId,
        step: usize,
        operation: OperationKind,
        error: &'a TensorError,
    },
    /// The run reached its step count
    Completed {
        run: RunId,
        last_applied: AppliedOp,
        explanation: &'static str,
    },
}

impl SimEvent<'_> {
    pub fn run(&self) -> RunId {
        match self {
            SimEvent::Started { run, .. }
            | SimEvent::Step { run, .. }
            | SimEvent::StepFailed { run, .. }
            | SimEvent::Completed { run, .. } => *run,
        }
    }

    /// Tensor carried by the event, if any, with its shape
    pub fn tensor(&self) -> Option<(&Tensor, Shape)> {
        match self {
            SimEvent::Started { tensor, .. } | SimEvent::Step { tensor, .. } => {
                Some((*tensor, tensor.shape()))
            }
            _ => None,
        }
    }

    /// Tensor-free summary of the event
    pub fn record(&self) -> EventRecord {
        match *self {
            SimEvent::Started {
                run,
                total_steps,
                tensor,
            } => EventRecord::Started {
                run,
                total_steps,
                shape: tensor.shape(),
            },
            SimEvent::Step {
                run,
                step,
                total_steps,
                applied,
                tensor,
            } => EventRecord::Step {
                run,
                step,
                total_steps,
                operation: applied.name().to_string(),
                shape: tensor.shape(),
            },
            SimEvent::StepFailed {
                run,
                step,
                operation,
                error,
            } => EventRecord::StepFailed {
                run,
                step,
                operation,
                error: error.to_string(),
            },
            SimEvent::Completed {
                run,
                last_applied,
                explanation,
            } => EventRecord::Completed {
                run,
                operation: last_applied.name().to_string(),
                explanation: explanation.to_string(),
            },
        }
    }
}

/// Owned, tensor-free copy of a [`SimEvent`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventRecord {
    Started {
        run: RunId,
        total_steps: usize,
        shape: Shape,
    },
    Step {
        run: RunId,
        step: usize,
        total_steps: usize,
        operation: String,
        shape: Shape,
    },
    StepFailed {
        run: RunId,
        step: usize,
        operation: OperationKind,
        error: String,
    },
    Completed {
        run: RunId,
        operation: String,
        explanation: String,
    },
}

/// Receiver of driver events (renderer, status line, logger...)
pub trait SimulationObserver {
    fn on_event(&mut self, event: &SimEvent<'_>);
}

impl<F> SimulationObserver for F
where
    F: FnMut(&SimEvent<'_>),
{
    fn on_event(&mut self, event: &SimEvent<'_>) {
        self(event)
    }
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SimulationObserver for NullObserver {
    fn on_event(&mut self, _event: &SimEvent<'_>) {}
}

/// Event filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFilter {
    /// Every event
    All,
    /// Events carrying a tensor (`Started`, `Step`): renderer input
    Tensor,
    /// `Step` events: progress line input
    Progress,
    /// `StepFailed` events
    Failures,
    /// `Completed` events: explanation input
    Completion,
}

impl EventFilter {
    pub fn matches(&self, event: &SimEvent<'_>) -> bool {
        match (self, event) {
            (EventFilter::All, _) => true,
            (EventFilter::Tensor, SimEvent::Started { .. } | SimEvent::Step { .. }) => true,
            (EventFilter::Progress, SimEvent::Step { .. }) => true,
            (EventFilter::Failures, SimEvent::StepFailed { .. }) => true,
            (EventFilter::Completion, SimEvent::Completed { .. }) => true,
            _ => false,
        }
    }
}

/// Boxed event handler
pub type EventHandler = Box<dyn FnMut(&SimEvent<'_>) + Send>;

/// Fan-out bus of simulation events
///
/// Handlers run in subscription order, one at a time.
#[derive(Clone)]
pub struct EventBus {
    handlers: Arc<Mutex<Vec<(EventFilter, EventHandler)>>>,
    history: Arc<Mutex<VecDeque<EventRecord>>>,
    max_history: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_history(100)
    }

    /// Bus that keeps at most `max_history` records
    pub fn with_history(max_history: usize) -> Self {
        Self {
            handlers: Arc::new(Mutex::new(Vec::new())),
            history: Arc::new(Mutex::new(VecDeque::new())),
            max_history,
        }
    }

    /// Register a handler for events matching `filter`
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SimResult<()>
    where
        F: FnMut(&SimEvent<'_>) + Send + 'static,
    {
        let mut handlers = self.handlers.lock()?;
        handlers.push((filter, Box::new(handler)));
        Ok(())
    }

    /// Remove every handler registered with `filter`
    pub fn unsubscribe(&self, filter: EventFilter) -> SimResult<()> {
        let mut handlers = self.handlers.lock()?;
        handlers.retain(|(f, _)| *f != filter);
        Ok(())
    }

    pub fn emit(&self, event: &SimEvent<'_>) -> SimResult<()> {
        if self.max_history > 0 {
            let mut history = self.history.lock()?;
            history.push_back(event.record());
            while history.len() > self.max_history {
                history.pop_front();
            }
        }

        let mut handlers = self.handlers.lock()?;
        for (filter, handler) in handlers.iter_mut() {
            if filter.matches(event) {
                handler(event);
            }
        }

        Ok(())
    }

    pub fn history(&self) -> SimResult<Vec<EventRecord>> {
        let history = self.history.lock()?;
        Ok(history.iter().cloned().collect())
    }

    pub fn clear_history(&self) -> SimResult<()> {
        self.history.lock()?.clear();
        Ok(())
    }

    pub fn handler_count(&self) -> SimResult<usize> {
        Ok(self.handlers.lock()?.len())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationObserver for EventBus {
    fn on_event(&mut self, event: &SimEvent<'_>) {
        if let Err(err) = self.emit(event) {
            tracing::error!(error = %err, "event bus dropped an event");
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("max_history", &self.max_history)
            .field("history_len", &self.history.lock().map(|h| h.len()).unwrap_or(0))
            .finish()
    }
}
