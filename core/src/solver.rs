//! Depth-first backtracking search as a resumable state machine
//!
//! The search keeps an explicit stack of frames instead of recursing, one frame
//! per cell on the current path. A frame remembers which direction to try next,
//! so the walk can stop after any step and pick up exactly where it left off.
//!
//! Each call to [`Search::advance`] performs one observable move:
//! 1. `Advanced(pos)` - `pos` was marked visited and pushed onto the path
//! 2. `Found` - the cell on top of the path is an exit; the path is the solution
//! 3. `Backtracked { .. }` - every direction from the top cell failed, it was popped
//! 4. `Exhausted` - the start cell itself was popped, no exit is reachable
//!
//! Directions are tried Up, Down, Left, Right. The first exit reached wins; this
//! is not a shortest-path search.

use alloc::vec::Vec;
use core::fmt;

use crate::grid::{Cell, Direction, Grid, Position, VisitedSet};

/// Why a search could not begin
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveError {
    /// No unique start cell in the grid
    NoStart,
    StartOutOfBounds(Position),
    StartIsWall(Position),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::NoStart => write!(f, "maze has no unique start position"),
            SolveError::StartOutOfBounds(pos) => write!(f, "start {} is outside the maze", pos),
            SolveError::StartIsWall(pos) => write!(f, "start {} is a wall", pos),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SolveError {}

/// One observable move of the search
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Advanced(Position),
    /// `from` was popped; `to` is the new top of the path, if any
    Backtracked { from: Position, to: Option<Position> },
    Found,
    Exhausted,
}

impl Step {
    pub fn is_terminal(self) -> bool {
        matches!(self, Step::Found | Step::Exhausted)
    }

    /// Moves after which an animated run pauses for one step delay
    pub fn is_suspension_point(self) -> bool {
        match self {
            Step::Advanced(_) => true,
            Step::Backtracked { to, .. } => to.is_some(),
            Step::Found | Step::Exhausted => false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    pos: Position,
    next_dir: usize,
}

/// In-progress depth-first search over one grid
pub struct Search<'g> {
    grid: &'g Grid,
    pending: Option<Position>,
    stack: Vec<Frame>,
    path: Vec<Position>,
    visited: VisitedSet,
    steps: usize,
    finished: Option<Step>,
}

impl<'g> Search<'g> {
    /// Prepare a search from `start`; nothing is visited until the first `advance`
    pub fn new(grid: &'g Grid, start: Position) -> Result<Self, SolveError> {
        match grid.get(start) {
            None => return Err(SolveError::StartOutOfBounds(start)),
            Some(Cell::Wall) => return Err(SolveError::StartIsWall(start)),
            Some(_) => {}
        }

        Ok(Self {
            grid,
            pending: Some(start),
            stack: Vec::new(),
            path: Vec::new(),
            visited: VisitedSet::for_grid(grid),
            steps: 0,
            finished: None,
        })
    }

    /// Search from the grid's unique start cell
    pub fn from_start(grid: &'g Grid) -> Result<Self, SolveError> {
        let start = grid.start().ok_or(SolveError::NoStart)?;
        Self::new(grid, start)
    }

    /// Perform the next move; terminal moves repeat once reached
    pub fn advance(&mut self) -> Step {
        if let Some(done) = self.finished {
            return done;
        }

        if let Some(start) = self.pending.take() {
            return self.enter(start);
        }

        let Some(top) = self.stack.last_mut() else {
            return self.finish(Step::Exhausted);
        };

        if self.grid.get(top.pos) == Some(Cell::Exit) {
            return self.finish(Step::Found);
        }

        while top.next_dir < Direction::ALL.len() {
            let dir = Direction::ALL[top.next_dir];
            top.next_dir += 1;

            let Some(next) = top.pos.step(dir, self.grid.rows(), self.grid.cols()) else {
                continue;
            };
            let open = self.grid.get(next).is_some_and(Cell::is_open);
            if open && !self.visited.contains(next) {
                return self.enter(next);
            }
        }

        // Dead end: pop and report the cell we fall back to
        let from = top.pos;
        self.stack.pop();
        self.path.pop();
        self.steps += 1;
        let to = self.path.last().copied();
        Step::Backtracked { from, to }
    }

    fn enter(&mut self, pos: Position) -> Step {
        self.visited.insert(pos);
        self.path.push(pos);
        self.stack.push(Frame { pos, next_dir: 0 });
        self.steps += 1;
        Step::Advanced(pos)
    }

    fn finish(&mut self, step: Step) -> Step {
        self.finished = Some(step);
        step
    }

    /// Current descent stack, start first
    pub fn path(&self) -> &[Position] {
        &self.path
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    /// Forward plus backward moves made so far
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Cell on top of the path, if any
    pub fn position(&self) -> Option<Position> {
        self.path.last().copied()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }
}

/// Final result of a search run to completion
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Solution path from start to an exit
    Found(Vec<Position>),
    Exhausted,
}

impl SearchOutcome {
    pub fn solution(&self) -> Option<&[Position]> {
        match self {
            SearchOutcome::Found(path) => Some(path),
            SearchOutcome::Exhausted => None,
        }
    }
}

/// Run a search from the grid's start cell without pausing
pub fn solve(grid: &Grid) -> Result<SearchOutcome, SolveError> {
    let mut search = Search::from_start(grid)?;
    loop {
        match search.advance() {
            Step::Found => return Ok(SearchOutcome::Found(search.path().to_vec())),
            Step::Exhausted => return Ok(SearchOutcome::Exhausted),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn p(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    fn assert_valid_solution(grid: &Grid, path: &[Position]) {
        assert_eq!(path.first().copied(), grid.start());
        assert_eq!(grid.get(*path.last().unwrap()), Some(Cell::Exit));
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1, "{:?} not adjacent", pair);
        }
        let mut seen = VisitedSet::for_grid(grid);
        for pos in path {
            assert!(seen.insert(*pos), "{} repeats", pos);
        }
    }

    #[test]
    fn test_prefers_up_down_left_right() {
        let grid = Grid::parse("S..\n.#.\n..E").unwrap();
        let outcome = solve(&grid).unwrap();
        // Down is tried before Right, so the left column is taken
        assert_eq!(
            outcome,
            SearchOutcome::Found(vec![p(0, 0), p(1, 0), p(2, 0), p(2, 1), p(2, 2)])
        );
        assert_valid_solution(&grid, outcome.solution().unwrap());
    }

    #[test]
    fn test_step_sequence_with_backtrack() {
        // Down leads into a dead end first
        let grid = Grid::parse("S.E\n.##").unwrap();
        let mut search = Search::from_start(&grid).unwrap();

        assert_eq!(search.advance(), Step::Advanced(p(0, 0)));
        assert_eq!(search.advance(), Step::Advanced(p(1, 0)));
        assert_eq!(
            search.advance(),
            Step::Backtracked { from: p(1, 0), to: Some(p(0, 0)) }
        );
        assert_eq!(search.path(), &[p(0, 0)]);
        assert_eq!(search.advance(), Step::Advanced(p(0, 1)));
        assert_eq!(search.advance(), Step::Advanced(p(0, 2)));
        assert_eq!(search.advance(), Step::Found);
        assert_eq!(search.advance(), Step::Found);
        assert_eq!(search.path(), &[p(0, 0), p(0, 1), p(0, 2)]);
        assert_eq!(search.visited().len(), 4);
        assert_eq!(search.steps(), 5);
    }

    #[test]
    fn test_exhaustion() {
        let grid = Grid::parse("S.#\n.#.\n#.E").unwrap();
        let mut search = Search::from_start(&grid).unwrap();
        let mut last = Step::Exhausted;
        let mut suspensions = 0;
        for _ in 0..100 {
            last = search.advance();
            if last.is_terminal() {
                break;
            }
            if last.is_suspension_point() {
                suspensions += 1;
            }
        }
        assert_eq!(last, Step::Exhausted);
        assert!(search.path().is_empty());
        assert_eq!(search.visited().len(), 3);
        // Three forward moves, two backward moves with a cell left to show
        assert_eq!(suspensions, 5);
    }

    #[test]
    fn test_final_backtrack_has_no_target() {
        let grid = Grid::parse("S#E").unwrap();
        let mut search = Search::from_start(&grid).unwrap();
        assert_eq!(search.advance(), Step::Advanced(p(0, 0)));
        let last = search.advance();
        assert_eq!(last, Step::Backtracked { from: p(0, 0), to: None });
        assert!(!last.is_suspension_point());
        assert_eq!(search.advance(), Step::Exhausted);
    }

    #[test]
    fn test_deterministic() {
        let grid = Grid::parse(
            "#S#######\n#.....#.#\n#.###.#.#\n#...#...#\n###.#.###\n#...#...E\n#########",
        )
        .unwrap();
        let first = solve(&grid).unwrap();
        let second = solve(&grid).unwrap();
        assert_eq!(first, second);
        assert_valid_solution(&grid, first.solution().unwrap());
    }

    #[test]
    fn test_explicit_start_errors() {
        let grid = Grid::parse("S#\n.E").unwrap();
        assert_eq!(Search::new(&grid, p(0, 1)).err(), Some(SolveError::StartIsWall(p(0, 1))));
        assert_eq!(
            Search::new(&grid, p(5, 0)).err(),
            Some(SolveError::StartOutOfBounds(p(5, 0)))
        );
        let no_start = Grid::parse("..\n.E").unwrap();
        assert_eq!(solve(&no_start), Err(SolveError::NoStart));
    }

    #[test]
    fn test_deep_maze_uses_heap_stack() {
        // Serpentine corridor: path length ~ rows * cols / 2
        let rows = 201;
        let cols = 201;
        let mut text = alloc::string::String::new();
        for r in 0..rows {
            for c in 0..cols {
                let ch = if r == 0 && c == 0 {
                    'S'
                } else if r == rows - 1 && c == cols - 1 {
                    'E'
                } else if r % 2 == 0 {
                    '.'
                } else if (r / 2) % 2 == 0 {
                    if c == cols - 1 { '.' } else { '#' }
                } else if c == 0 {
                    '.'
                } else {
                    '#'
                };
                text.push(ch);
            }
            text.push('\n');
        }
        let grid = Grid::parse(&text).unwrap();
        let outcome = solve(&grid).unwrap();
        let path = outcome.solution().unwrap();
        assert!(path.len() > 20_000);
        assert_valid_solution(&grid, path);
    }
}
