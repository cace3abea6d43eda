use arrayvec::ArrayVec;

use super::shape::{Color, PieceKind, Shape};

pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

/// Row indices returned by line-clear detection, in ascending order.
pub type ClearedRows = ArrayVec<usize, BOARD_HEIGHT>;

/// A single cell of the board.
///
/// The attached [`Color`] is carried for renderers only; for game rules a cell
/// is simply occupied or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    /// Empty cell.
    #[default]
    Empty,
    /// Cell occupied by a locked piece.
    Filled(Color),
}

impl Cell {
    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    #[must_use]
    pub fn is_filled(self) -> bool {
        !self.is_empty()
    }

    #[must_use]
    pub fn color(self) -> Option<Color> {
        match self {
            Cell::Empty => None,
            Cell::Filled(color) => Some(color),
        }
    }
}

type Row = [Cell; BOARD_WIDTH];

const EMPTY_ROW: Row = [Cell::Empty; BOARD_WIDTH];

/// The fixed 20×10 playfield of locked cells.
///
/// Row 0 is the top of the board and column 0 is the left edge. The
/// dimensions never change after construction.
///
/// Board coordinates passed in from pieces are signed: a piece anchored
/// above the board (negative row) is legal as long as none of its filled
/// cells hit a wall, the floor, or an occupied cell. [`Board::collides`] is
/// the only place those rules are spelled out.
///
/// # Example
///
/// ```
/// use blockfall_engine::{Board, PieceKind};
///
/// let mut board = Board::new();
/// let shape = PieceKind::O.base_shape();
///
/// assert!(!board.collides(&shape, 0, 18));
/// assert!(board.collides(&shape, 0, 19)); // below the floor
/// assert!(board.collides(&shape, -1, 0)); // through the left wall
///
/// board.commit(&shape, 0, 18, PieceKind::O.color());
/// assert!(board.collides(&shape, 1, 17));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: [Row; BOARD_HEIGHT],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub const WIDTH: usize = BOARD_WIDTH;
    pub const HEIGHT: usize = BOARD_HEIGHT;

    pub const EMPTY: Self = Self {
        rows: [EMPTY_ROW; BOARD_HEIGHT],
    };

    /// Creates an all-empty board.
    #[must_use]
    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Returns the cell at `(x, y)`, or `None` outside the board.
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Returns an iterator over the rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell; BOARD_WIDTH]> {
        self.rows.iter()
    }

    #[must_use]
    pub fn is_row_full(&self, y: usize) -> bool {
        self.rows
            .get(y)
            .is_some_and(|row| row.iter().all(|cell| cell.is_filled()))
    }

    /// Checks whether `shape` anchored at `(origin_x, origin_y)` overlaps a wall,
    /// the floor, or an occupied cell.
    ///
    /// Filled cells above the board (negative row) never collide.
    #[must_use]
    pub fn collides(&self, shape: &Shape, origin_x: i32, origin_y: i32) -> bool {
        shape.filled_offsets().any(|(dx, dy)| {
            let Ok(x) = usize::try_from(origin_x + dx) else {
                return true;
            };
            if x >= BOARD_WIDTH {
                return true;
            }
            match usize::try_from(origin_y + dy) {
                Err(_) => false,
                Ok(y) if y >= BOARD_HEIGHT => true,
                Ok(y) => self.rows[y][x].is_filled(),
            }
        })
    }

    /// Writes the filled cells of `shape` into the board with the given color.
    ///
    /// Cells that fall outside the board are dropped.
    pub fn commit(&mut self, shape: &Shape, origin_x: i32, origin_y: i32, color: Color) {
        for (dx, dy) in shape.filled_offsets() {
            let (Ok(x), Ok(y)) = (
                usize::try_from(origin_x + dx),
                usize::try_from(origin_y + dy),
            ) else {
                continue;
            };
            if let Some(cell) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
                *cell = Cell::Filled(color);
            }
        }
    }

    /// Returns the indices of all fully occupied rows, ascending.
    #[must_use]
    pub fn full_rows(&self) -> ClearedRows {
        (0..BOARD_HEIGHT).filter(|&y| self.is_row_full(y)).collect()
    }

    /// Removes every full row and compacts the rows above it downwards.
    ///
    /// Empty rows are inserted at the top for each removed row, so the board
    /// keeps its height. Returns the removed row indices (as they were before
    /// removal), ascending. If no row is full the board is left untouched.
    pub fn clear_full_rows(&mut self) -> ClearedRows {
        let cleared = self.full_rows();
        if cleared.is_empty() {
            return cleared;
        }

        let mut count = 0;
        for y in (0..BOARD_HEIGHT).rev() {
            if self.is_row_full(y) {
                count += 1;
                continue;
            }
            if count > 0 {
                self.rows[y + count] = self.rows[y];
            }
        }
        self.rows[..count].fill(EMPTY_ROW);
        cleared
    }

    /// Creates a `Board` from ASCII art, for tests and fixtures.
    ///
    /// `.` is an empty cell, a piece letter (`I`, `J`, `L`, `O`, `S`, `T`, `Z`)
    /// is a cell with that kind's color, and `#` is a cell with the I color.
    /// Every row must be exactly 10 cells wide. Rows are aligned to the
    /// bottom of the board: the last line is row 19.
    ///
    /// # Panics
    ///
    /// Panics on malformed art.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let mut board = Self::EMPTY;
        let lines: Vec<&str> = art
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        assert!(
            lines.len() <= BOARD_HEIGHT,
            "Board art must have at most {BOARD_HEIGHT} rows, got {}",
            lines.len()
        );

        let top = BOARD_HEIGHT - lines.len();
        for (i, line) in lines.iter().enumerate() {
            let cells: Vec<Cell> = line
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| match c {
                    '.' => Cell::Empty,
                    '#' => Cell::Filled(PieceKind::I.color()),
                    _ => {
                        let kind = PieceKind::from_char(c)
                            .unwrap_or_else(|| panic!("invalid board cell '{c}' at row {i}"));
                        Cell::Filled(kind.color())
                    }
                })
                .collect();
            assert_eq!(
                cells.len(),
                BOARD_WIDTH,
                "Each row must have exactly {BOARD_WIDTH} cells, got {} at row {i}",
                cells.len()
            );
            board.rows[top + i].copy_from_slice(&cells);
        }
        board
    }

    /// Renders the board as ASCII art, `#` for occupied and `.` for empty cells.
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut art = String::with_capacity(BOARD_HEIGHT * (BOARD_WIDTH + 1));
        for row in &self.rows {
            for cell in row {
                art.push(if cell.is_filled() { '#' } else { '.' });
            }
            art.push('\n');
        }
        art
    }
}
