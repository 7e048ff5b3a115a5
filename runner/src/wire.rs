//! Serialized forms shared with renderers, generators, and HTTP clients

use maze_core::{Grid, Position, VisitedSet};
use serde::{Deserialize, Serialize};

/// Maze as rows of single-character symbols (`"S"`, `"E"`, `"#"`, `"."`)
pub type MazeRows = Vec<Vec<String>>;

/// A `{ "row": r, "col": c }` coordinate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl From<Position> for Coord {
    fn from(pos: Position) -> Self {
        Coord {
            row: pos.row,
            col: pos.col,
        }
    }
}

impl From<Coord> for Position {
    fn from(coord: Coord) -> Self {
        Position::new(coord.row, coord.col)
    }
}

pub fn coords(positions: &[Position]) -> Vec<Coord> {
    positions.iter().copied().map(Coord::from).collect()
}

pub fn visited_coords(visited: &VisitedSet) -> Vec<Coord> {
    visited.iter().map(Coord::from).collect()
}

/// Rebuild a bitmap from serialized coordinates (out-of-grid entries are dropped)
pub fn visited_set(grid: &Grid, visited: &[Coord]) -> VisitedSet {
    let mut set = VisitedSet::for_grid(grid);
    for coord in visited {
        let pos = Position::from(*coord);
        if grid.contains(pos) {
            set.insert(pos);
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_json() {
        let coord = Coord::from(Position::new(2, 7));
        assert_eq!(serde_json::to_string(&coord).unwrap(), r#"{"row":2,"col":7}"#);
        let back: Coord = serde_json::from_str(r#"{"row":2,"col":7}"#).unwrap();
        assert_eq!(Position::from(back), Position::new(2, 7));
    }

    #[test]
    fn test_visited_set_drops_outside() {
        let grid = Grid::parse("S.\n.E").unwrap();
        let set = visited_set(
            &grid,
            &[Coord { row: 0, col: 1 }, Coord { row: 4, col: 4 }, Coord { row: 0, col: 1 }],
        );
        assert_eq!(set.len(), 1);
        assert_eq!(visited_coords(&set), vec![Coord { row: 0, col: 1 }]);
    }
}
