//! Maze model, validation, and backtracking search
//!
//! This crate holds everything about a maze that does not depend on time or
//! I/O: the grid model, the breadth-first connectivity check, the acceptance
//! rules applied to candidate mazes, the step-by-step depth-first solver, and
//! a seeded candidate carver.
//!
//! The crate is no_std compatible (it only needs `alloc`); the `std` feature
//! adds `std::error::Error` impls for host-side convenience.

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod grid;
pub mod maze_gen;
pub mod rng;
pub mod rules;
pub mod solver;
pub mod validate;

// Re-export commonly used types for convenience
pub use grid::{Cell, Direction, Grid, GridError, Position, VisitedSet};
pub use maze_gen::{carve, CarveError, MazeStats};
pub use rng::SimpleLCG;
pub use rules::{accept, accept_with_any_exits, ExitRule, Rejection, RejectionKind};
pub use solver::{solve, Search, SearchOutcome, SolveError, Step};
pub use validate::{check_connectivity, explore, Connectivity, Reach, StructureError};

/// Smallest side length a generator may be asked for
pub const MIN_SIDE: usize = 5;
/// Largest side length a generator may be asked for
pub const MAX_SIDE: usize = 30;

pub const MIN_EXITS: usize = 1;
pub const MAX_EXITS: usize = 5;

/// Step delay at speed multiplier 1.0, in milliseconds
pub const BASE_STEP_DELAY_MS: u64 = 500;

/// Generation attempts before a request is given up
pub const DEFAULT_GENERATION_ATTEMPTS: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!(MIN_SIDE <= MAX_SIDE);
        assert!(MIN_EXITS <= MAX_EXITS);
        // The smallest allowed maze must fit the largest allowed exit count
        assert!(carve(MIN_SIDE, MIN_SIDE, MAX_EXITS, 1).is_ok());
    }

    /// Every maze the rules accept is solved by the backtracking search
    #[test]
    fn test_accepted_mazes_never_exhaust() {
        for seed in 1..40u32 {
            let rows = MIN_SIDE + (seed as usize * 7) % (MAX_SIDE - MIN_SIDE + 1);
            let cols = MIN_SIDE + (seed as usize * 11) % (MAX_SIDE - MIN_SIDE + 1);
            let exits = MIN_EXITS + seed as usize % MAX_EXITS;
            let raw = carve(rows, cols, exits, seed).unwrap().to_rows();
            let grid = accept(&raw, exits).unwrap();
            let outcome = solve(&grid).unwrap();
            assert!(outcome.solution().is_some(), "seed {} exhausted", seed);
        }

        // Hand-written mazes
        for text in ["S..\n.#.\n..E", "S#E\n.#.\n...", "E.S"] {
            let grid = Grid::parse(text).unwrap();
            if rules::check_grid(&grid, ExitRule::AtLeastOne).is_ok() {
                assert!(solve(&grid).unwrap().solution().is_some());
            }
        }
    }
}
