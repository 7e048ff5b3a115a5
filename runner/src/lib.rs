//! Host side of the maze solver: animated runs, generation, configuration
//!
//! `maze-core` holds the pure algorithms. This crate adds time and control:
//! the [`Controller`] drives a backtracking search with a delay between
//! steps and can pause or reset it at any moment, [`generate_accepted`]
//! retries a maze source until a candidate passes the acceptance rules, and
//! [`Settings`] reads process configuration.

pub mod config;
pub mod controller;
pub mod generation;
pub mod observer;
pub mod parse;
pub mod run;
pub mod speed;
pub mod wire;

pub use config::{ConfigError, Settings};
pub use controller::{ControlError, Controller, ExecutionState, Snapshot};
pub use generation::{
    generate_accepted, AttemptFailure, GenerationError, GenerationRequest, Generated, LocalSource,
    MazeSource, SourceError,
};
pub use observer::{NullObserver, Recorder, StepEvent, StepObserver, TracingObserver};
pub use parse::{parse_generated, ParseError};
pub use run::{drive, RunOutcome};
pub use speed::{SpeedError, StepDelay};
pub use wire::{Coord, MazeRows};

use maze_core::Grid;

/// Load a maze from text: JSON rows (`[...]` or `{ "maze": [...] }`) or plain lines
pub fn load_maze_text(text: &str) -> Result<Grid, LoadError> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') || trimmed.starts_with("```") {
        let rows = parse_generated(text)?;
        Ok(Grid::from_rows(&rows)?)
    } else {
        Ok(Grid::parse(text)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Grid(#[from] maze_core::GridError),
}
