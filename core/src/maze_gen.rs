//! Offline candidate mazes using the recursive backtracker
//!
//! Stands in for an external maze generator. Candidates still go through the
//! acceptance rules like any other generated maze.
//!
//! Layout: room cells sit on odd coordinates `(2r+1, 2c+1)`; everything else
//! starts as wall. The backtracker knocks down the wall between a room and a
//! random unvisited neighbour room until every room is connected, which gives
//! a spanning tree (one path between any two rooms). A few extra walls are
//! then removed so the maze has loops and real decision points.
//!
//! The start is opened on the top border, exits on the left, right, and
//! bottom borders.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::grid::{Cell, Direction, Grid, Position};
use crate::rng::SimpleLCG;

/// Why a candidate could not be carved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CarveError {
    /// Fewer than 3 rows or columns leaves no room for a single room cell
    TooSmall { rows: usize, cols: usize },
    /// More exits requested than border openings available
    TooManyExits { requested: usize, available: usize },
}

impl fmt::Display for CarveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CarveError::TooSmall { rows, cols } => {
                write!(f, "a {}x{} maze is too small to carve", rows, cols)
            }
            CarveError::TooManyExits { requested, available } => write!(
                f,
                "{} exits requested but only {} border openings exist",
                requested, available
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CarveError {}

/// Carve a `rows × cols` maze with `exits` exits from `seed`
///
/// Same seed and shape always give the same maze.
pub fn carve(rows: usize, cols: usize, exits: usize, seed: u32) -> Result<Grid, CarveError> {
    if rows < 3 || cols < 3 {
        return Err(CarveError::TooSmall { rows, cols });
    }

    let room_rows = (rows - 1) / 2;
    let room_cols = (cols - 1) / 2;
    let mut rng = SimpleLCG::new(seed);

    let mut openings = border_openings(rows, cols, room_rows, room_cols);
    if exits > openings.len() {
        return Err(CarveError::TooManyExits {
            requested: exits,
            available: openings.len(),
        });
    }

    let mut grid = Grid::filled(rows, cols, Cell::Wall);
    backtrack(&mut grid, room_rows, room_cols, &mut rng);
    braid(&mut grid, room_rows, room_cols, &mut rng);

    let start = Position::new(0, 2 * rng.choice_index(room_cols) + 1);
    grid.set(start, Cell::Start);

    rng.shuffle(&mut openings);
    for &(exit, inward) in openings.iter().take(exits) {
        grid.set(exit, Cell::Exit);
        // Even dimensions leave a spare wall line between the border and the rooms
        let mut pos = exit;
        while let Some(next) = pos.step(inward, rows, cols) {
            if grid.get(next) != Some(Cell::Wall) {
                break;
            }
            grid.set(next, Cell::Free);
            pos = next;
        }
    }

    Ok(grid)
}

fn room(r: usize, c: usize) -> Position {
    Position::new(2 * r + 1, 2 * c + 1)
}

/// Exit candidates on the bottom, left, and right borders, with the direction
/// pointing into the maze
fn border_openings(
    rows: usize,
    cols: usize,
    room_rows: usize,
    room_cols: usize,
) -> Vec<(Position, Direction)> {
    let mut openings = Vec::with_capacity(room_cols + 2 * room_rows);
    for c in 0..room_cols {
        openings.push((Position::new(rows - 1, 2 * c + 1), Direction::Up));
    }
    for r in 0..room_rows {
        openings.push((Position::new(2 * r + 1, 0), Direction::Right));
        openings.push((Position::new(2 * r + 1, cols - 1), Direction::Left));
    }
    openings
}

/// Recursive backtracker over the room lattice (iterative, explicit stack)
fn backtrack(grid: &mut Grid, room_rows: usize, room_cols: usize, rng: &mut SimpleLCG) {
    let mut visited = vec![false; room_rows * room_cols];
    let mut stack = Vec::with_capacity(room_rows * room_cols);

    visited[0] = true;
    grid.set(room(0, 0), Cell::Free);
    stack.push((0usize, 0usize));

    while let Some(&(r, c)) = stack.last() {
        let mut candidates = [(0usize, 0usize); 4];
        let mut count = 0;
        for dir in Direction::ALL {
            if let Some(next) = Position::new(r, c).step(dir, room_rows, room_cols) {
                if !visited[next.row * room_cols + next.col] {
                    candidates[count] = (next.row, next.col);
                    count += 1;
                }
            }
        }

        if count == 0 {
            stack.pop();
            continue;
        }

        let (nr, nc) = candidates[rng.choice_index(count)];
        let wall = Position::new(r + nr + 1, c + nc + 1);
        grid.set(wall, Cell::Free);
        grid.set(room(nr, nc), Cell::Free);
        visited[nr * room_cols + nc] = true;
        stack.push((nr, nc));
    }
}

/// Knock out roughly one interior wall per ten rooms to create loops
fn braid(grid: &mut Grid, room_rows: usize, room_cols: usize, rng: &mut SimpleLCG) {
    let extra = room_rows * room_cols / 10;
    for _ in 0..extra {
        let r = rng.choice_index(room_rows);
        let c = rng.choice_index(room_cols);
        let dir = Direction::ALL[rng.choice_index(4)];
        if let Some(next) = Position::new(r, c).step(dir, room_rows, room_cols) {
            grid.set(Position::new(r + next.row + 1, c + next.col + 1), Cell::Free);
        }
    }
}

/// Shape statistics used to judge how interesting a maze is
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MazeStats {
    /// Open cells with exactly one open neighbour (markers excluded)
    pub dead_ends: usize,
    /// Share of wall cells, `0.0..=1.0`
    pub wall_ratio: f64,
    /// Open cells with three or more open neighbours
    pub junctions: usize,
}

impl MazeStats {
    pub fn of(grid: &Grid) -> Self {
        let mut walls = 0;
        let mut dead_ends = 0;
        let mut junctions = 0;

        for row in 0..grid.rows() {
            for col in 0..grid.cols() {
                let pos = Position::new(row, col);
                match grid.get(pos) {
                    Some(Cell::Wall) => walls += 1,
                    Some(Cell::Free) => {
                        let open = grid
                            .neighbors(pos)
                            .filter(|n| grid.get(*n).is_some_and(Cell::is_open))
                            .count();
                        if open == 1 {
                            dead_ends += 1;
                        } else if open >= 3 {
                            junctions += 1;
                        }
                    }
                    _ => {}
                }
            }
        }

        Self {
            dead_ends,
            wall_ratio: walls as f64 / (grid.rows() * grid.cols()) as f64,
            junctions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::accept;
    use alloc::string::String;

    fn carve_rows(rows: usize, cols: usize, exits: usize, seed: u32) -> Vec<Vec<String>> {
        carve(rows, cols, exits, seed).unwrap().to_rows()
    }

    #[test]
    fn test_carved_mazes_are_accepted() {
        for (rows, cols) in [(5, 5), (6, 9), (12, 12), (21, 21), (30, 30), (30, 5)] {
            for exits in 1..=5 {
                for seed in [1, 12345, 2918957128] {
                    let raw = carve_rows(rows, cols, exits, seed);
                    let grid = accept(&raw, exits).unwrap_or_else(|e| {
                        panic!("{}x{} exits={} seed={}: {}", rows, cols, exits, seed, e)
                    });
                    assert_eq!(grid.rows(), rows);
                    assert_eq!(grid.cols(), cols);
                }
            }
        }
    }

    #[test]
    fn test_start_on_top_border() {
        let grid = carve(15, 15, 2, 99999).unwrap();
        let start = grid.start().unwrap();
        assert_eq!(start.row, 0);
        for exit in grid.exits() {
            assert!(exit.row == 14 || exit.col == 0 || exit.col == 14);
        }
    }

    #[test]
    fn test_determinism() {
        assert_eq!(carve(20, 20, 3, 99999), carve(20, 20, 3, 99999));
        assert_ne!(carve(20, 20, 3, 11111), carve(20, 20, 3, 22222));
    }

    #[test]
    fn test_errors() {
        assert_eq!(carve(2, 10, 1, 1), Err(CarveError::TooSmall { rows: 2, cols: 10 }));
        // 3x3: one room, one bottom opening, one left, one right
        assert_eq!(
            carve(3, 3, 4, 1),
            Err(CarveError::TooManyExits { requested: 4, available: 3 })
        );
    }

    #[test]
    fn test_stats() {
        let grid = Grid::parse("#S###\n#...#\n#.#.#\n#.#E#\n#####").unwrap();
        let stats = MazeStats::of(&grid);
        // (3,1) is the only dead end; (1,1) meets the start, (2,1) and (1,2)
        assert_eq!(stats.dead_ends, 1);
        assert_eq!(stats.junctions, 1);
        assert!((stats.wall_ratio - 17.0 / 25.0).abs() < 1e-9);

        let carved = carve(21, 21, 1, 4242).unwrap();
        let stats = MazeStats::of(&carved);
        assert!(stats.dead_ends > 0);
        assert!(stats.wall_ratio > 0.3 && stats.wall_ratio < 0.8);
    }
}
