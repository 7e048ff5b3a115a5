//! Connectivity check: breadth-first reachability from the start cell
//!
//! Walls block movement, diagonal moves are never allowed. The frontier is an
//! explicit queue so arbitrarily large mazes cannot exhaust the call stack.
//! Every cell is enqueued at most once.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;

use crate::grid::{Cell, Grid, Position, VisitedSet};

/// Structural failures detected before any traversal happens
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructureError {
    /// Zero or several start cells
    StartCount(usize),
    /// No exit cell at all
    NoExit,
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureError::StartCount(found) => {
                write!(f, "maze must have exactly 1 start position, found {}", found)
            }
            StructureError::NoExit => write!(f, "maze must have at least 1 exit position"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StructureError {}

/// Outcome of a connectivity check on a structurally sound grid
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Connectivity {
    /// Every exit is reachable from the start
    Reachable,
    /// These exits (row-major) cannot be reached
    Unreachable { unreached: Vec<Position> },
}

impl Connectivity {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Connectivity::Reachable)
    }
}

/// Result of one breadth-first traversal
#[derive(Clone, Debug)]
pub struct Reach {
    /// Cells marked during the traversal
    pub visited: VisitedSet,
    /// Number of enqueue operations; equals `visited.len()` since no cell is queued twice
    pub enqueued: usize,
}

/// Breadth-first traversal from `start` over free and exit cells
///
/// Neighbours are expanded Up, Down, Left, Right. A start cell is only ever
/// the seed: a second `S` elsewhere is not walkable.
pub fn explore(grid: &Grid, start: Position) -> Reach {
    let mut visited = VisitedSet::for_grid(grid);
    let mut frontier = VecDeque::new();
    let mut enqueued = 0;

    if visited.insert(start) {
        frontier.push_back(start);
        enqueued += 1;
    }

    while let Some(current) = frontier.pop_front() {
        for next in grid.neighbors(current) {
            let walkable = matches!(grid.get(next), Some(Cell::Free | Cell::Exit));
            if walkable && visited.insert(next) {
                frontier.push_back(next);
                enqueued += 1;
            }
        }
    }

    Reach { visited, enqueued }
}

/// Whether every exit of `grid` is reachable from its unique start
///
/// # Returns
/// * `Ok(Connectivity::Reachable)` - all exits were marked by the traversal
/// * `Ok(Connectivity::Unreachable { .. })` - some exits were not
/// * `Err(StructureError)` - zero or several starts, or no exits
pub fn check_connectivity(grid: &Grid) -> Result<Connectivity, StructureError> {
    let starts = grid.starts();
    if starts.len() != 1 {
        return Err(StructureError::StartCount(starts.len()));
    }
    let exits = grid.exits();
    if exits.is_empty() {
        return Err(StructureError::NoExit);
    }

    let reach = explore(grid, starts[0]);
    let unreached: Vec<Position> = exits
        .into_iter()
        .filter(|exit| !reach.visited.contains(*exit))
        .collect();

    if unreached.is_empty() {
        Ok(Connectivity::Reachable)
    } else {
        Ok(Connectivity::Unreachable { unreached })
    }
}
