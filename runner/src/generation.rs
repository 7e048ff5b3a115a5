//! Generation with retries
//!
//! A [`MazeSource`] produces candidate text (an external generator, or the
//! offline [`LocalSource`]). Each candidate is parsed and run through the
//! acceptance rules; the first one that passes is returned. After a fixed
//! number of failed attempts the caller gets the last failure back.

use std::future::Future;

use maze_core::{carve, accept, CarveError, Grid, MazeStats, Rejection};
use maze_core::{MAX_EXITS, MAX_SIDE, MIN_EXITS, MIN_SIDE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parse::{parse_generated, ParseError};

/// Requested maze shape
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationRequest {
    pub rows: usize,
    pub cols: usize,
    #[serde(alias = "exits")]
    pub exit_count: usize,
}

impl GenerationRequest {
    pub fn new(rows: usize, cols: usize, exit_count: usize) -> Result<Self, GenerationError> {
        let request = Self {
            rows,
            cols,
            exit_count,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        check_range("rows", self.rows, MIN_SIDE, MAX_SIDE)?;
        check_range("cols", self.cols, MIN_SIDE, MAX_SIDE)?;
        check_range("exit_count", self.exit_count, MIN_EXITS, MAX_EXITS)
    }
}

fn check_range(field: &'static str, value: usize, min: usize, max: usize) -> Result<(), GenerationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(GenerationError::InvalidRequest {
            field,
            value,
            min,
            max,
        })
    }
}

/// Failure of the source itself, before any parsing
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Carve(#[from] CarveError),

    #[error("failed to encode candidate: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Why one attempt did not produce an accepted maze
#[derive(Debug, Error)]
pub enum AttemptFailure {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Rejected(#[from] Rejection),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    InvalidRequest {
        field: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },

    #[error("no acceptable maze after {attempts} attempt(s): {last}")]
    Exhausted {
        attempts: usize,
        #[source]
        last: AttemptFailure,
    },
}

/// Anything that can be asked for a candidate maze
pub trait MazeSource {
    fn name(&self) -> &str;

    /// One attempt; the returned text is parsed by [`parse_generated`]
    fn fetch(
        &mut self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<String, SourceError>> + Send;
}

/// Offline source built on the seeded carver
///
/// The seed advances on every fetch, so retries see different mazes while a
/// given starting seed still reproduces the same sequence.
#[derive(Debug, Clone)]
pub struct LocalSource {
    seed: u32,
}

impl LocalSource {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    fn next_candidate(&mut self, request: &GenerationRequest) -> Result<String, SourceError> {
        let grid = carve(request.rows, request.cols, request.exit_count, self.seed)?;
        self.seed = self.seed.wrapping_add(1);
        let body = serde_json::json!({ "maze": grid.to_rows() });
        Ok(serde_json::to_string(&body)?)
    }
}

impl MazeSource for LocalSource {
    fn name(&self) -> &str {
        "local"
    }

    fn fetch(
        &mut self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<String, SourceError>> + Send {
        std::future::ready(self.next_candidate(request))
    }
}

/// An accepted maze and how many attempts it took
#[derive(Debug, Clone)]
pub struct Generated {
    pub grid: Grid,
    pub attempts: usize,
}

/// Ask `source` for up to `attempts` candidates and return the first accepted one
///
/// Candidates must carry exactly `request.exit_count` exits. A shape that
/// differs from the requested one is logged but not rejected.
pub async fn generate_accepted<S: MazeSource>(
    source: &mut S,
    request: &GenerationRequest,
    attempts: usize,
) -> Result<Generated, GenerationError> {
    request.validate()?;
    let attempts = attempts.max(1);
    let mut last = None;

    for attempt in 1..=attempts {
        tracing::info!(
            source = source.name(),
            attempt,
            attempts,
            rows = request.rows,
            cols = request.cols,
            exits = request.exit_count,
            "requesting maze"
        );

        match try_candidate(source, request).await {
            Ok(grid) => {
                let stats = MazeStats::of(&grid);
                tracing::info!(
                    attempt,
                    dead_ends = stats.dead_ends,
                    junctions = stats.junctions,
                    wall_ratio = stats.wall_ratio,
                    "maze accepted"
                );
                return Ok(Generated {
                    grid,
                    attempts: attempt,
                });
            }
            Err(failure) => {
                tracing::warn!(attempt, reason = %failure, "candidate rejected");
                last = Some(failure);
            }
        }
    }

    let last = last.unwrap_or_else(|| {
        AttemptFailure::Source(SourceError::Unavailable("no attempt was made".into()))
    });
    tracing::error!(attempts, reason = %last, "maze generation failed");
    Err(GenerationError::Exhausted { attempts, last })
}

async fn try_candidate<S: MazeSource>(
    source: &mut S,
    request: &GenerationRequest,
) -> Result<Grid, AttemptFailure> {
    let text = source.fetch(request).await?;
    let rows = parse_generated(&text)?;

    if rows.len() != request.rows || rows.iter().any(|row| row.len() != request.cols) {
        tracing::warn!(
            expected_rows = request.rows,
            expected_cols = request.cols,
            rows = rows.len(),
            "candidate shape differs from the request"
        );
    }

    Ok(accept(&rows, request.exit_count)?)
}
