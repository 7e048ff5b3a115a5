//! Acceptance rules for candidate mazes
//!
//! Every maze, whether typed in by a user or returned by a generator, passes
//! through [`accept`] before the player or solver ever sees it. Checks run in
//! a fixed order and stop at the first failure, so the cheap counting checks
//! always run before the traversal:
//!
//! 0. rectangular and non-empty (`Malformed`)
//! 1. alphabet `S` / `E` / `#` / `.` (`InvalidSymbol`)
//! 2. exactly one start (`StartCountMismatch`)
//! 3. exit count as requested (`ExitCountMismatch`)
//! 4. every exit reachable (`Unreachable`)

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::grid::{Grid, GridError, Position};
use crate::validate::{check_connectivity, Connectivity, StructureError};

/// How many exits a candidate must carry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitRule {
    Exactly(usize),
    AtLeastOne,
}

impl ExitRule {
    fn allows(self, found: usize) -> bool {
        match self {
            ExitRule::Exactly(expected) => found == expected,
            ExitRule::AtLeastOne => found >= 1,
        }
    }
}

impl fmt::Display for ExitRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitRule::Exactly(n) => write!(f, "exactly {}", n),
            ExitRule::AtLeastOne => write!(f, "at least 1"),
        }
    }
}

/// Coarse classification used to pick user feedback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectionKind {
    /// Shape, alphabet, or marker-count violation
    StructuralInvalid,
    /// Well-formed maze whose exits cannot all be reached
    Unreachable,
}

/// Why a candidate maze was rejected
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    Malformed(GridError),
    InvalidSymbol { row: usize, col: usize, symbol: String },
    StartCountMismatch { found: usize },
    ExitCountMismatch { expected: ExitRule, found: usize },
    Unreachable { unreached: Vec<Position> },
}

impl Rejection {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Rejection::Unreachable { .. } => RejectionKind::Unreachable,
            _ => RejectionKind::StructuralInvalid,
        }
    }

    /// Stable machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::Malformed(_) => "malformed",
            Rejection::InvalidSymbol { .. } => "invalid_symbol",
            Rejection::StartCountMismatch { .. } => "start_count_mismatch",
            Rejection::ExitCountMismatch { .. } => "exit_count_mismatch",
            Rejection::Unreachable { .. } => "unreachable",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Malformed(err) => write!(f, "malformed maze: {}", err),
            Rejection::InvalidSymbol { row, col, symbol } => {
                write!(f, "invalid cell value '{}' at ({}, {})", symbol, row, col)
            }
            Rejection::StartCountMismatch { found } => {
                write!(f, "maze must have exactly 1 start position, found {}", found)
            }
            Rejection::ExitCountMismatch { expected, found } => {
                write!(f, "maze must have {} exit positions, found {}", expected, found)
            }
            Rejection::Unreachable { unreached } => {
                write!(f, "{} exit(s) unreachable from the start", unreached.len())?;
                if let Some(first) = unreached.first() {
                    write!(f, ", first at {}", first)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Rejection {}

impl From<GridError> for Rejection {
    fn from(err: GridError) -> Self {
        match err {
            GridError::InvalidSymbol { row, col, symbol } => {
                Rejection::InvalidSymbol { row, col, symbol }
            }
            shape => Rejection::Malformed(shape),
        }
    }
}

/// Gate for generated mazes: `expected_exits` must match exactly
pub fn accept<S: AsRef<str>>(raw: &[Vec<S>], expected_exits: usize) -> Result<Grid, Rejection> {
    check(raw, ExitRule::Exactly(expected_exits))
}

/// Gate for user-authored mazes: any positive number of exits
pub fn accept_with_any_exits<S: AsRef<str>>(raw: &[Vec<S>]) -> Result<Grid, Rejection> {
    check(raw, ExitRule::AtLeastOne)
}

/// Run all acceptance checks, short-circuiting on the first failure
pub fn check<S: AsRef<str>>(raw: &[Vec<S>], exits: ExitRule) -> Result<Grid, Rejection> {
    let grid = Grid::from_rows(raw)?;
    check_grid(&grid, exits)?;
    Ok(grid)
}

/// Checks 2 to 4 on an already well-formed grid
pub fn check_grid(grid: &Grid, exits: ExitRule) -> Result<(), Rejection> {
    let starts = grid.starts().len();
    if starts != 1 {
        return Err(Rejection::StartCountMismatch { found: starts });
    }

    let found = grid.exits().len();
    if !exits.allows(found) {
        return Err(Rejection::ExitCountMismatch { expected: exits, found });
    }

    match check_connectivity(grid) {
        Ok(Connectivity::Reachable) => Ok(()),
        Ok(Connectivity::Unreachable { unreached }) => Err(Rejection::Unreachable { unreached }),
        // Counts were checked above; kept for completeness
        Err(StructureError::StartCount(found)) => Err(Rejection::StartCountMismatch { found }),
        Err(StructureError::NoExit) => Err(Rejection::ExitCountMismatch { expected: exits, found: 0 }),
    }
}
