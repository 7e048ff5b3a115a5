//! Animated search: drives a [`Search`] and pauses between steps
//!
//! A run suspends exactly at the search's suspension points: once after each
//! cell is entered and once after each backtrack that leaves a cell to show.
//! Cancellation is checked before every move and wins any race with a pending
//! delay. Once it is seen, the run returns without emitting anything else, so
//! a cancelled run never reports completion or exhaustion.

use std::time::Duration;

use maze_core::{Grid, Position, Search, SolveError, Step};
use tokio_util::sync::CancellationToken;

use crate::observer::{StepEvent, StepObserver};
use crate::speed::StepDelay;
use crate::wire::{coords, visited_coords, Coord};

/// How an animated run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// An exit was reached along this path
    Completed(Vec<Position>),
    NoSolution,
    /// Cancelled before reaching a terminal step
    Cancelled,
}

/// Run the search from `start`, reporting every move to `observer`
///
/// # Arguments
/// * `grid` - The maze to search
/// * `start` - Cell the search starts from
/// * `observer` - Receives one event per move
/// * `delay` - Read before every suspension, so speed changes apply to the next pause
/// * `cancel` - Stops the run silently
///
/// # Returns
/// * `Ok(RunOutcome)` - Completed, exhausted, or cancelled
/// * `Err(SolveError)` - The start cell is unusable
pub async fn drive(
    grid: &Grid,
    start: Position,
    observer: &mut dyn StepObserver,
    delay: &StepDelay,
    cancel: &CancellationToken,
) -> Result<RunOutcome, SolveError> {
    let mut search = Search::new(grid, start)?;

    loop {
        if cancel.is_cancelled() {
            return Ok(RunOutcome::Cancelled);
        }

        let step = search.advance();
        let event = match step {
            Step::Advanced(pos) => StepEvent::Step {
                position: Coord::from(pos),
                visited: visited_coords(search.visited()),
                path: coords(search.path()),
            },
            Step::Backtracked { to, .. } => StepEvent::Backtrack {
                position: to.map(Coord::from),
                visited: visited_coords(search.visited()),
                path: coords(search.path()),
            },
            Step::Found => StepEvent::Completed {
                solution: coords(search.path()),
                visited: visited_coords(search.visited()),
            },
            Step::Exhausted => StepEvent::NoSolution {
                visited: visited_coords(search.visited()),
            },
        };
        observer.on_event(&event);

        match step {
            Step::Found => return Ok(RunOutcome::Completed(search.path().to_vec())),
            Step::Exhausted => return Ok(RunOutcome::NoSolution),
            _ if step.is_suspension_point() => {
                if !suspend(delay.get(), cancel).await {
                    return Ok(RunOutcome::Cancelled);
                }
            }
            _ => {}
        }
    }
}

/// Sleep for `delay`; `false` if cancelled first
async fn suspend(delay: Duration, cancel: &CancellationToken) -> bool {
    if delay.is_zero() {
        // Still yield so a controller on the same runtime can get a word in
        tokio::task::yield_now().await;
        return !cancel.is_cancelled();
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => !cancel.is_cancelled(),
    }
}
