//! Grid model: cells, positions, and the explored-cell bitmap
//!
//! A grid is serialized as rows of single-character symbols:
//! - `"S"` = start (exactly one in an accepted maze)
//! - `"E"` = exit (at least one)
//! - `"#"` = wall
//! - `"."` = free cell
//!
//! Cells are stored row-major in a flat vector. Positions are `(row, col)`,
//! 0-indexed from the top-left corner.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

/// The four cell semantics of a maze
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Wall,
    Free,
    Start,
    Exit,
}

impl Cell {
    /// Parse one serialized symbol (`"S"`, `"E"`, `"#"`, `"."`)
    pub fn from_symbol(symbol: &str) -> Option<Cell> {
        let mut chars = symbol.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Cell::from_char(c),
            _ => None,
        }
    }

    pub fn from_char(c: char) -> Option<Cell> {
        match c {
            '#' => Some(Cell::Wall),
            '.' => Some(Cell::Free),
            'S' => Some(Cell::Start),
            'E' => Some(Cell::Exit),
            _ => None,
        }
    }

    pub const fn symbol(self) -> char {
        match self {
            Cell::Wall => '#',
            Cell::Free => '.',
            Cell::Start => 'S',
            Cell::Exit => 'E',
        }
    }

    /// Anything but a wall can be stepped on
    pub const fn is_open(self) -> bool {
        !matches!(self, Cell::Wall)
    }
}

/// Movement directions, in the fixed expansion order used by both searches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Expansion order: Up, Down, Left, Right
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    const fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

/// A `(row, col)` coordinate inside a grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn manhattan(self, other: Position) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// One step in `dir`, or `None` if that leaves a `rows × cols` grid
    pub fn step(self, dir: Direction, rows: usize, cols: usize) -> Option<Position> {
        let (dr, dc) = dir.delta();
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        (row < rows && col < cols).then_some(Position { row, col })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Why a serialized grid could not be turned into a [`Grid`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridError {
    /// No rows, or a first row with no cells
    Empty,
    /// Row `row` has `found` cells where the first row has `expected`
    Jagged { row: usize, expected: usize, found: usize },
    /// A cell outside the `S`/`E`/`#`/`.` alphabet
    InvalidSymbol { row: usize, col: usize, symbol: String },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::Empty => write!(f, "maze has no cells"),
            GridError::Jagged { row, expected, found } => write!(
                f,
                "row {} has {} cells, expected {}",
                row, found, expected
            ),
            GridError::InvalidSymbol { row, col, symbol } => {
                write!(f, "invalid cell value '{}' at ({}, {})", symbol, row, col)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GridError {}

/// A rectangular maze
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a grid from serialized symbol rows
    ///
    /// Shape is checked over every row before any symbol is looked at, so a
    /// jagged grid reports `Jagged` even if it also holds a bad symbol.
    pub fn from_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self, GridError> {
        let (row_count, col_count) = Self::check_shape(rows)?;

        let mut cells = Vec::with_capacity(row_count * col_count);
        for (r, row) in rows.iter().enumerate() {
            for (c, symbol) in row.iter().enumerate() {
                let symbol = symbol.as_ref();
                let cell = Cell::from_symbol(symbol).ok_or_else(|| GridError::InvalidSymbol {
                    row: r,
                    col: c,
                    symbol: symbol.to_string(),
                })?;
                cells.push(cell);
            }
        }

        Ok(Self {
            rows: row_count,
            cols: col_count,
            cells,
        })
    }

    /// A `rows × cols` grid where every cell is `cell`
    pub fn filled(rows: usize, cols: usize, cell: Cell) -> Self {
        Self {
            rows,
            cols,
            cells: alloc::vec![cell; rows * cols],
        }
    }

    /// Shape of a serialized grid, or why it is not rectangular
    pub fn check_shape<S>(rows: &[Vec<S>]) -> Result<(usize, usize), GridError> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if cols == 0 {
            return Err(GridError::Empty);
        }
        for (r, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(GridError::Jagged {
                    row: r,
                    expected: cols,
                    found: row.len(),
                });
            }
        }
        Ok((rows.len(), cols))
    }

    /// Parse newline-separated text rows, one character per cell
    ///
    /// Blank lines and whitespace inside a line are ignored.
    pub fn parse(text: &str) -> Result<Self, GridError> {
        let rows: Vec<Vec<String>> = text
            .lines()
            .map(|line| {
                line.chars()
                    .filter(|c| !c.is_whitespace())
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|row| !row.is_empty())
            .collect();
        Self::from_rows(&rows)
    }

    /// Serialized form: one single-character string per cell
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|cell| cell.symbol().to_string()).collect())
            .collect()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Cell at `pos`, or `None` when out of bounds
    pub fn get(&self, pos: Position) -> Option<Cell> {
        self.contains(pos).then(|| self.cells[self.index(pos)])
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    /// Overwrite a cell (used by the carver and by tests that mutate a maze)
    pub fn set(&mut self, pos: Position, cell: Cell) {
        if self.contains(pos) {
            let idx = self.index(pos);
            self.cells[idx] = cell;
        }
    }

    fn index(&self, pos: Position) -> usize {
        pos.row * self.cols + pos.col
    }

    /// All positions holding `cell`, row-major
    pub fn positions_of(&self, cell: Cell) -> impl Iterator<Item = Position> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, c)| **c == cell)
            .map(move |(i, _)| Position::new(i / cols, i % cols))
    }

    pub fn starts(&self) -> Vec<Position> {
        self.positions_of(Cell::Start).collect()
    }

    pub fn exits(&self) -> Vec<Position> {
        self.positions_of(Cell::Exit).collect()
    }

    /// The start cell, if there is exactly one
    pub fn start(&self) -> Option<Position> {
        let mut starts = self.positions_of(Cell::Start);
        match (starts.next(), starts.next()) {
            (Some(pos), None) => Some(pos),
            _ => None,
        }
    }

    /// In-bounds neighbours of `pos` in Up, Down, Left, Right order
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |dir| pos.step(dir, self.rows, self.cols))
    }

    /// Text frame with the current path (`*`) and explored cells (`+`) drawn in
    ///
    /// Start and exit markers are always kept so the frame stays readable.
    pub fn render_with(&self, path: &[Position], visited: &VisitedSet) -> String {
        let mut out = String::with_capacity(self.rows * (self.cols + 1));
        for row in 0..self.rows {
            for col in 0..self.cols {
                let pos = Position::new(row, col);
                let cell = self.cells[self.index(pos)];
                let c = match cell {
                    Cell::Start | Cell::Exit => cell.symbol(),
                    _ if path.contains(&pos) => '*',
                    _ if visited.contains(pos) => '+',
                    _ => cell.symbol(),
                };
                out.push(c);
            }
            if row + 1 < self.rows {
                out.push('\n');
            }
        }
        out
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.cells.chunks(self.cols).enumerate() {
            if r > 0 {
                writeln!(f)?;
            }
            for cell in row {
                write!(f, "{}", cell.symbol())?;
            }
        }
        Ok(())
    }
}

/// Dense bitmap of explored cells for one grid
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisitedSet {
    cols: usize,
    bits: Vec<bool>,
    len: usize,
}

impl VisitedSet {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            bits: alloc::vec![false; rows * cols],
            len: 0,
        }
    }

    pub fn for_grid(grid: &Grid) -> Self {
        Self::new(grid.rows(), grid.cols())
    }

    /// Mark `pos`; returns `false` if it was already marked
    pub fn insert(&mut self, pos: Position) -> bool {
        if pos.col >= self.cols {
            return false;
        }
        let idx = pos.row * self.cols + pos.col;
        match self.bits.get_mut(idx) {
            Some(bit) if !*bit => {
                *bit = true;
                self.len += 1;
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.col < self.cols && self.bits.get(pos.row * self.cols + pos.col).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.bits.iter_mut().for_each(|bit| *bit = false);
        self.len = 0;
    }

    /// Marked positions, row-major
    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        let cols = self.cols;
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, bit)| **bit)
            .map(move |(i, _)| Position::new(i / cols, i % cols))
    }
}
