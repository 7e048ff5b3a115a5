//! Execution controller: the only thing a UI talks to
//!
//! ```text
//!            start                 exit reached
//!   Idle ───────────▶ Running ─────────────────▶ Completed
//!    ▲                │  ▲  │  all branches failed
//!    │ reset (any)    │  │  └─────────────────────▶ NoSolution
//!    │          pause │  │ start (fresh run)
//!    │                ▼  │
//!    └────────────── Paused         fault in the run ──▶ Error
//! ```
//!
//! Pausing cancels the run. Starting again begins a new search from the
//! start cell with an empty path and visited set; interrupted runs are never
//! resumed. At most one run is in flight: `start` while running does nothing.
//!
//! State is owned by the controller and only changed through its methods.
//! Consumers read it through [`Controller::snapshot`] or watch transitions
//! through [`Controller::subscribe`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use maze_core::rules::{check_grid, ExitRule};
use maze_core::{Grid, Position, Rejection};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::observer::{StepEvent, StepObserver};
use crate::run::{drive, RunOutcome};
use crate::speed::{SpeedError, StepDelay};
use crate::wire::{coords, Coord};

/// Lifecycle of the controller
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionState {
    Idle,
    Running,
    Paused,
    Completed,
    NoSolution,
    Error,
}

impl ExecutionState {
    /// A run ended on its own (not paused, not reset)
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionState::Completed | ExecutionState::NoSolution | ExecutionState::Error
        )
    }
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExecutionState::Idle => "idle",
            ExecutionState::Running => "running",
            ExecutionState::Paused => "paused",
            ExecutionState::Completed => "completed",
            ExecutionState::NoSolution => "no-solution",
            ExecutionState::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("no maze loaded")]
    NoMaze,

    #[error("maze rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    Speed(#[from] SpeedError),

    #[error("start must be called from within a tokio runtime")]
    NoRuntime,
}

/// Read-only view of the controller at one instant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    pub state: ExecutionState,
    pub position: Option<Coord>,
    pub path: Vec<Coord>,
    pub visited: Vec<Coord>,
    pub solution: Vec<Coord>,
    pub delay_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct Session {
    grid: Option<Arc<Grid>>,
    state: ExecutionState,
    /// Bumped by every start and reset; runs from older epochs may not write
    epoch: u64,
    cancel: Option<CancellationToken>,
    position: Option<Coord>,
    path: Vec<Coord>,
    visited: Vec<Coord>,
    solution: Vec<Coord>,
    error: Option<String>,
}

impl Session {
    fn clear_progress(&mut self) {
        self.position = self.grid.as_ref().and_then(|g| g.start()).map(Coord::from);
        self.path.clear();
        self.visited.clear();
        self.solution.clear();
        self.error = None;
    }

    fn cancel_run(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }

    fn is_current(&self, epoch: u64, token: &CancellationToken) -> bool {
        self.epoch == epoch && !token.is_cancelled()
    }
}

struct Inner {
    session: Mutex<Session>,
    observer: Mutex<Box<dyn StepObserver>>,
    state_tx: watch::Sender<ExecutionState>,
}

impl Inner {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, session: &mut Session, state: ExecutionState) {
        if session.state != state {
            tracing::info!(from = %session.state, to = %state, "execution state changed");
        }
        session.state = state;
        self.state_tx.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }
}

/// Start/pause/reset control over an animated backtracking search
pub struct Controller {
    inner: Arc<Inner>,
    delay: StepDelay,
}

impl Controller {
    pub fn new(observer: impl StepObserver + 'static) -> Self {
        Self::with_delay(observer, StepDelay::default())
    }

    pub fn with_delay(observer: impl StepObserver + 'static, delay: StepDelay) -> Self {
        let (state_tx, _) = watch::channel(ExecutionState::Idle);
        Self {
            inner: Arc::new(Inner {
                session: Mutex::new(Session {
                    grid: None,
                    state: ExecutionState::Idle,
                    epoch: 0,
                    cancel: None,
                    position: None,
                    path: Vec::new(),
                    visited: Vec::new(),
                    solution: Vec::new(),
                    error: None,
                }),
                observer: Mutex::new(Box::new(observer)),
                state_tx,
            }),
            delay,
        }
    }

    /// Replace the maze and return to `Idle`
    ///
    /// The maze only needs a single start. Whether its exits can be reached is
    /// for the acceptance rules to decide (see [`Controller::load_checked`]);
    /// a maze without a reachable exit simply runs to `NoSolution`.
    pub fn load(&self, grid: Grid) -> Result<(), ControlError> {
        let starts = grid.starts().len();
        if starts != 1 {
            return Err(Rejection::StartCountMismatch { found: starts }.into());
        }

        let mut session = self.inner.session();
        session.cancel_run();
        session.epoch += 1;
        tracing::info!(rows = grid.rows(), cols = grid.cols(), "maze loaded");
        session.grid = Some(Arc::new(grid));
        session.clear_progress();
        self.inner.set_state(&mut session, ExecutionState::Idle);
        Ok(())
    }

    /// Run the acceptance rules (any positive exit count), then [`Controller::load`]
    pub fn load_checked(&self, grid: Grid) -> Result<(), ControlError> {
        check_grid(&grid, ExitRule::AtLeastOne)?;
        self.load(grid)
    }

    /// Begin a fresh run
    ///
    /// # Returns
    /// * `Ok(true)` - a new run was started
    /// * `Ok(false)` - a run is already in flight; nothing changed
    /// * `Err(ControlError::NoMaze)` - nothing to run on
    pub fn start(&self) -> Result<bool, ControlError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ControlError::NoRuntime)?;

        let mut session = self.inner.session();
        if session.state == ExecutionState::Running {
            return Ok(false);
        }
        let grid = session.grid.clone().ok_or(ControlError::NoMaze)?;
        // load() only accepts grids with exactly one start
        let start = grid.start().ok_or(ControlError::NoMaze)?;

        session.cancel_run();
        session.epoch += 1;
        let epoch = session.epoch;
        let token = CancellationToken::new();
        session.cancel = Some(token.clone());
        session.clear_progress();
        self.inner.set_state(&mut session, ExecutionState::Running);
        drop(session);

        tracing::info!(epoch, row = start.row, col = start.col, "run started");

        let run = runtime.spawn(run_task(
            Arc::clone(&self.inner),
            grid,
            start,
            self.delay.clone(),
            token.clone(),
            epoch,
        ));

        // Supervise the run so a panic inside it becomes the Error state
        let inner = Arc::clone(&self.inner);
        runtime.spawn(async move {
            let result = match run.await {
                Ok(outcome) => outcome,
                Err(err) if err.is_panic() => Err(format!("run panicked: {}", panic_message(err))),
                Err(_) => Ok(RunOutcome::Cancelled),
            };
            finish(&inner, epoch, &token, result);
        });

        Ok(true)
    }

    /// Stop the active run and keep its progress on screen
    ///
    /// Returns `false` (and does nothing) unless a run is in flight.
    pub fn pause(&self) -> bool {
        let mut session = self.inner.session();
        if session.state != ExecutionState::Running {
            return false;
        }
        session.cancel_run();
        self.inner.set_state(&mut session, ExecutionState::Paused);
        tracing::info!(epoch = session.epoch, depth = session.path.len(), "run paused");
        true
    }

    /// Cancel any run and clear all progress; the maze stays loaded
    pub fn reset(&self) {
        let mut session = self.inner.session();
        session.cancel_run();
        session.epoch += 1;
        session.clear_progress();
        self.inner.set_state(&mut session, ExecutionState::Idle);
    }

    /// Set the step delay to `base / multiplier`, effective from the next pause
    pub fn set_speed(&self, multiplier: f64) -> Result<(), ControlError> {
        let delay = self.delay.set_multiplier(multiplier)?;
        tracing::debug!(multiplier, delay_ms = delay.as_millis() as u64, "speed changed");
        Ok(())
    }

    pub fn delay(&self) -> &StepDelay {
        &self.delay
    }

    pub fn state(&self) -> ExecutionState {
        self.inner.session().state
    }

    pub fn grid(&self) -> Option<Arc<Grid>> {
        self.inner.session().grid.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        let session = self.inner.session();
        Snapshot {
            state: session.state,
            position: session.position,
            path: session.path.clone(),
            visited: session.visited.clone(),
            solution: session.solution.clone(),
            delay_ms: self.delay.get().as_millis() as u64,
            error: session.error.clone(),
        }
    }

    /// Receiver that sees every state transition
    pub fn subscribe(&self) -> watch::Receiver<ExecutionState> {
        self.inner.state_tx.subscribe()
    }

    /// Wait until no run is in flight and return the state at that point
    pub async fn settled(&self) -> ExecutionState {
        let mut rx = self.subscribe();
        let settled = rx
            .wait_for(|state| *state != ExecutionState::Running)
            .await
            .map(|state| *state);
        // The sender lives as long as `self`, so the channel cannot close here
        settled.unwrap_or_else(|_| self.state())
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.inner.session().cancel_run();
    }
}

/// Forwards events to the user's observer while keeping the session's view current
struct Relay {
    inner: Arc<Inner>,
    token: CancellationToken,
    epoch: u64,
}

impl StepObserver for Relay {
    fn on_event(&mut self, event: &StepEvent) {
        {
            let mut session = self.inner.session();
            if !session.is_current(self.epoch, &self.token) {
                return;
            }
            session.position = event.position().or(session.position);
            session.path = event.path().to_vec();
            session.visited = event.visited().to_vec();

            // Settle before delivery so a pause can never follow a terminal event
            match event {
                StepEvent::Completed { solution, .. } => {
                    tracing::info!(epoch = self.epoch, length = solution.len(), "run completed");
                    session.cancel = None;
                    session.solution = solution.clone();
                    self.inner.set_state(&mut session, ExecutionState::Completed);
                }
                StepEvent::NoSolution { .. } => {
                    tracing::info!(epoch = self.epoch, "run exhausted every branch");
                    session.cancel = None;
                    self.inner.set_state(&mut session, ExecutionState::NoSolution);
                }
                _ => {}
            }
        }
        self.inner
            .observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_event(event);
    }
}

async fn run_task(
    inner: Arc<Inner>,
    grid: Arc<Grid>,
    start: Position,
    delay: StepDelay,
    token: CancellationToken,
    epoch: u64,
) -> Result<RunOutcome, String> {
    let mut relay = Relay {
        inner,
        token: token.clone(),
        epoch,
    };
    drive(&grid, start, &mut relay, &delay, &token)
        .await
        .map_err(|err| err.to_string())
}

fn finish(inner: &Inner, epoch: u64, token: &CancellationToken, result: Result<RunOutcome, String>) {
    let mut session = inner.session();
    // Terminal events already settled the session; anything else is a stale run
    if !session.is_current(epoch, token) || session.state != ExecutionState::Running {
        tracing::debug!(epoch, "run finished after leaving Running");
        return;
    }
    session.cancel = None;

    match result {
        // Only reachable if the terminal event was never relayed
        Ok(RunOutcome::Completed(path)) => {
            session.solution = coords(&path);
            inner.set_state(&mut session, ExecutionState::Completed);
        }
        Ok(RunOutcome::NoSolution) => inner.set_state(&mut session, ExecutionState::NoSolution),
        Ok(RunOutcome::Cancelled) => {}
        Err(message) => {
            tracing::error!(epoch, %message, "run failed");
            session.error = Some(message);
            inner.set_state(&mut session, ExecutionState::Error);
        }
    }
}

fn panic_message(err: tokio::task::JoinError) -> String {
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
