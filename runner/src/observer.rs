//! Step observers: how a running search reports progress to the outside
//!
//! The search never talks to a renderer directly. Every forward step,
//! backtrack, completion, and exhaustion is turned into a [`StepEvent`] that
//! carries owned snapshots of the current position, path, and explored cells,
//! and handed to whatever [`StepObserver`] the host supplied: a UI bridge, a
//! test recorder, a log writer.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::wire::Coord;

/// One observable moment of a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepEvent {
    /// A cell was entered: marked visited and pushed onto the path
    Step {
        position: Coord,
        visited: Vec<Coord>,
        path: Vec<Coord>,
    },
    /// A dead end was popped; `position` is the cell fallen back to, if any
    Backtrack {
        position: Option<Coord>,
        visited: Vec<Coord>,
        path: Vec<Coord>,
    },
    /// An exit was reached; `solution` runs from the start to that exit
    Completed {
        solution: Vec<Coord>,
        visited: Vec<Coord>,
    },
    /// Every branch from the start was explored without reaching an exit
    NoSolution { visited: Vec<Coord> },
}

impl StepEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepEvent::Completed { .. } | StepEvent::NoSolution { .. })
    }

    /// Cell the walker is drawn on after this event
    pub fn position(&self) -> Option<Coord> {
        match self {
            StepEvent::Step { position, .. } => Some(*position),
            StepEvent::Backtrack { position, .. } => *position,
            StepEvent::Completed { solution, .. } => solution.last().copied(),
            StepEvent::NoSolution { .. } => None,
        }
    }

    pub fn path(&self) -> &[Coord] {
        match self {
            StepEvent::Step { path, .. } | StepEvent::Backtrack { path, .. } => path,
            StepEvent::Completed { solution, .. } => solution,
            StepEvent::NoSolution { .. } => &[],
        }
    }

    pub fn visited(&self) -> &[Coord] {
        match self {
            StepEvent::Step { visited, .. }
            | StepEvent::Backtrack { visited, .. }
            | StepEvent::Completed { visited, .. }
            | StepEvent::NoSolution { visited } => visited,
        }
    }
}

/// Receiver of step events
///
/// Observers run on the task driving the search, so they must be `Send` and
/// should return quickly; the step delay is applied after they return.
pub trait StepObserver: Send {
    fn on_event(&mut self, event: &StepEvent);
}

impl<F> StepObserver for F
where
    F: FnMut(&StepEvent) + Send,
{
    fn on_event(&mut self, event: &StepEvent) {
        self(event)
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl StepObserver for NullObserver {
    fn on_event(&mut self, _event: &StepEvent) {}
}

/// Logs every event through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl StepObserver for TracingObserver {
    fn on_event(&mut self, event: &StepEvent) {
        match event {
            StepEvent::Step { position, path, visited } => tracing::debug!(
                row = position.row,
                col = position.col,
                depth = path.len(),
                visited = visited.len(),
                "step"
            ),
            StepEvent::Backtrack { position, path, .. } => {
                tracing::debug!(to = ?position, depth = path.len(), "backtrack")
            }
            StepEvent::Completed { solution, visited } => tracing::info!(
                length = solution.len(),
                visited = visited.len(),
                "exit reached"
            ),
            StepEvent::NoSolution { visited } => {
                tracing::info!(visited = visited.len(), "no path to any exit")
            }
        }
    }
}

/// Keeps every event; clones share the same log
///
/// Hand one clone to a controller and keep another to inspect what it saw.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    events: Arc<Mutex<Vec<StepEvent>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StepEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl StepObserver for Recorder {
    fn on_event(&mut self, event: &StepEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
