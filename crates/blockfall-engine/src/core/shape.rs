use std::fmt;

use rand::{
    Rng,
    distr::{Distribution, StandardUniform},
};
use serde::{Deserialize, Serialize, ser::SerializeSeq as _};

/// Largest extent of any shape matrix, in either direction.
pub const MAX_SHAPE_SIZE: usize = 4;

/// Enum representing the type of piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// J-piece.
    J = 1,
    /// L-piece.
    L = 2,
    /// O-piece.
    O = 3,
    /// S-piece.
    S = 4,
    /// T-piece.
    T = 5,
    /// Z-piece.
    Z = 6,
}

/// Uniform draw over the seven kinds.
///
/// Every draw is independent: there is no bag, so long droughts of a single
/// kind are possible.
impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        PieceKind::ALL[rng.random_range(0..PieceKind::LEN)]
    }
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    pub const ALL: [Self; Self::LEN] = [
        Self::I,
        Self::J,
        Self::L,
        Self::O,
        Self::S,
        Self::T,
        Self::Z,
    ];

    /// Picks a kind uniformly at random.
    pub fn pick_random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        StandardUniform.sample(rng)
    }

    /// Returns the canonical spawn orientation of this kind.
    #[must_use]
    pub const fn base_shape(self) -> Shape {
        BASE_SHAPES[self as usize]
    }

    /// Returns the color tag attached to cells of this kind.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            PieceKind::I => Color::Cyan,
            PieceKind::J => Color::Blue,
            PieceKind::L => Color::Orange,
            PieceKind::O => Color::Yellow,
            PieceKind::S => Color::Green,
            PieceKind::T => Color::Purple,
            PieceKind::Z => Color::Red,
        }
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::T => 'T',
            PieceKind::Z => 'Z',
        }
    }

    /// Parses a piece kind from a single character.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_char('L'), Some(PieceKind::L));
    /// assert_eq!(PieceKind::from_char('X'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            'O' => Some(PieceKind::O),
            'S' => Some(PieceKind::S),
            'T' => Some(PieceKind::T),
            'Z' => Some(PieceKind::Z),
            _ => None,
        }
    }
}

/// Opaque identity tag stored in occupied cells.
///
/// The engine never interprets it; renderers map it to whatever palette they use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Cyan,
    Blue,
    Orange,
    Yellow,
    Green,
    Purple,
    Red,
}

/// One orientation of a piece: a rectangular matrix of filled/empty cells.
///
/// Row 0 is the top of the matrix. Only the `rows × cols` top-left corner of
/// the backing array is meaningful; the rest is always empty.
///
/// # Example
///
/// ```
/// use blockfall_engine::PieceKind;
///
/// let t = PieceKind::T.base_shape();
/// assert_eq!((t.rows(), t.cols()), (2, 3));
///
/// let turned = t.rotated_clockwise();
/// assert_eq!((turned.rows(), turned.cols()), (3, 2));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    rows: u8,
    cols: u8,
    cells: [[bool; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE],
}

impl Shape {
    #[expect(clippy::cast_possible_truncation)]
    const fn from_matrix<const R: usize, const C: usize>(matrix: [[u8; C]; R]) -> Self {
        assert!(R > 0 && R <= MAX_SHAPE_SIZE);
        assert!(C > 0 && C <= MAX_SHAPE_SIZE);
        let mut cells = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        let mut r = 0;
        while r < R {
            let mut c = 0;
            while c < C {
                cells[r][c] = matrix[r][c] != 0;
                c += 1;
            }
            r += 1;
        }
        Self {
            rows: R as u8,
            cols: C as u8,
            cells,
        }
    }

    /// Builds a shape of the given size, asking `filled` for every cell.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero or larger than [`MAX_SHAPE_SIZE`].
    #[expect(clippy::cast_possible_truncation)]
    pub fn from_fn(rows: usize, cols: usize, mut filled: impl FnMut(usize, usize) -> bool) -> Self {
        assert!(
            (1..=MAX_SHAPE_SIZE).contains(&rows) && (1..=MAX_SHAPE_SIZE).contains(&cols),
            "shape must be between 1x1 and {MAX_SHAPE_SIZE}x{MAX_SHAPE_SIZE}, got {rows}x{cols}"
        );
        let mut cells = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for (r, row) in cells.iter_mut().enumerate().take(rows) {
            for (c, cell) in row.iter_mut().enumerate().take(cols) {
                *cell = filled(r, c);
            }
        }
        Self {
            rows: rows as u8,
            cols: cols as u8,
            cells,
        }
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows as usize
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols as usize
    }

    /// Width of the matrix as a signed board offset.
    pub(crate) fn col_span(self) -> i32 {
        i32::from(self.cols)
    }

    /// Returns whether the cell at `(row, col)` is filled. Out-of-matrix cells are empty.
    #[must_use]
    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        row < self.rows() && col < self.cols() && self.cells[row][col]
    }

    /// Iterates over filled cells as `(dx, dy)` offsets from the top-left anchor.
    pub fn filled_offsets(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (0..self.rows).flat_map(move |r| {
            (0..self.cols)
                .filter(move |&c| self.cells[usize::from(r)][usize::from(c)])
                .map(move |c| (i32::from(c), i32::from(r)))
        })
    }

    /// Returns the shape turned 90° clockwise.
    ///
    /// The transform is `rotated[c][rows - 1 - r] = shape[r][c]`: transpose,
    /// then reverse each row. Four applications give back the original matrix.
    #[must_use]
    pub const fn rotated_clockwise(&self) -> Self {
        let rows = self.rows as usize;
        let cols = self.cols as usize;
        let mut cells = [[false; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        let mut r = 0;
        while r < rows {
            let mut c = 0;
            while c < cols {
                cells[c][rows - 1 - r] = self.cells[r][c];
                c += 1;
            }
            r += 1;
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            cells,
        }
    }

    fn row_string(&self, row: usize) -> String {
        (0..self.cols())
            .map(|col| if self.cells[row][col] { '#' } else { '.' })
            .collect()
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<String> = (0..self.rows()).map(|r| self.row_string(r)).collect();
        write!(f, "Shape({})", rows.join("/"))
    }
}

impl Serialize for Shape {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Format: one string per row, '#' filled and '.' empty (e.g. [".#.", "###"])
        let mut seq = serializer.serialize_seq(Some(self.rows()))?;
        for row in 0..self.rows() {
            seq.serialize_element(&self.row_string(row))?;
        }
        seq.end()
    }
}

const BASE_SHAPES: [Shape; PieceKind::LEN] = [
    // I-piece
    Shape::from_matrix([[1, 1, 1, 1]]),
    // J-piece
    Shape::from_matrix([[1, 0, 0], [1, 1, 1]]),
    // L-piece
    Shape::from_matrix([[0, 0, 1], [1, 1, 1]]),
    // O-piece
    Shape::from_matrix([[1, 1], [1, 1]]),
    // S-piece
    Shape::from_matrix([[0, 1, 1], [1, 1, 0]]),
    // T-piece
    Shape::from_matrix([[0, 1, 0], [1, 1, 1]]),
    // Z-piece
    Shape::from_matrix([[1, 1, 0], [0, 1, 1]]),
];

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_base_shapes_have_four_cells() {
        for kind in PieceKind::ALL {
            let count = kind.base_shape().filled_offsets().count();
            assert_eq!(count, 4, "{kind:?} should have 4 cells, got {count}");
        }
    }

    #[test]
    fn test_four_rotations_are_identity() {
        for kind in PieceKind::ALL {
            let shape = kind.base_shape();
            let mut rotated = shape;
            for _ in 0..4 {
                rotated = rotated.rotated_clockwise();
            }
            assert_eq!(rotated, shape, "{kind:?} did not return to its base shape");
        }
    }

    #[test]
    fn test_rotate_i_piece_becomes_vertical() {
        let vertical = PieceKind::I.base_shape().rotated_clockwise();
        assert_eq!((vertical.rows(), vertical.cols()), (4, 1));
        assert!((0..4).all(|r| vertical.is_filled(r, 0)));
    }

    #[test]
    fn test_rotate_t_piece_clockwise() {
        // .#.      #.
        // ###  ->  ##
        //          #.
        let rotated = PieceKind::T.base_shape().rotated_clockwise();
        let expected = Shape::from_matrix([[1, 0], [1, 1], [1, 0]]);
        assert_eq!(rotated, expected);
    }

    #[test]
    fn test_rotate_l_piece_clockwise() {
        // ..#      #.
        // ###  ->  #.
        //          ##
        let rotated = PieceKind::L.base_shape().rotated_clockwise();
        let expected = Shape::from_matrix([[1, 0], [1, 0], [1, 1]]);
        assert_eq!(rotated, expected);
    }

    #[test]
    fn test_filled_offsets_order() {
        let offsets: Vec<_> = PieceKind::S.base_shape().filled_offsets().collect();
        assert_eq!(offsets, vec![(1, 0), (2, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn test_from_fn_matches_matrix() {
        let from_fn = Shape::from_fn(2, 3, |r, c| (r, c) != (0, 0) && (r, c) != (0, 2));
        assert_eq!(from_fn, PieceKind::T.base_shape());
    }

    #[test]
    #[should_panic(expected = "shape must be between")]
    fn test_from_fn_rejects_oversized_shape() {
        let _ = Shape::from_fn(5, 1, |_, _| true);
    }

    #[test]
    fn test_shape_serialization() {
        let serialized = serde_json::to_string(&PieceKind::J.base_shape()).unwrap();
        assert_eq!(serialized, "[\"#..\",\"###\"]");
    }

    #[test]
    fn test_pick_random_covers_all_kinds() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut counts = [0usize; PieceKind::LEN];
        for _ in 0..7000 {
            counts[PieceKind::pick_random(&mut rng) as usize] += 1;
        }
        for (kind, count) in PieceKind::ALL.iter().zip(counts) {
            assert!(
                (800..1200).contains(&count),
                "{kind:?} drawn {count} times out of 7000"
            );
        }
    }

    #[test]
    fn test_piece_kind_char_conversion() {
        for kind in PieceKind::ALL {
            assert_eq!(PieceKind::from_char(kind.as_char()), Some(kind));
        }
        assert_eq!(PieceKind::from_char('x'), None);
    }
}
