use serde::Serialize;

use super::{
    board::{BOARD_WIDTH, Board},
    shape::{Color, PieceKind, Shape},
};

/// Origin offsets tried, in order, when a rotation collides in place.
///
/// This is a small positional nudge (left, right, up), not a kick table. It
/// rejects some rotations a full rotation system would allow near walls and
/// the floor, and allows a few it would reject.
pub const ROTATION_NUDGES: [(i32, i32); 4] = [(0, 0), (-1, 0), (1, 0), (0, -1)];

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const SPAWN_CENTER_X: i32 = (BOARD_WIDTH / 2) as i32;

/// The falling piece: a kind, its current orientation, and the board
/// position of the orientation matrix's top-left corner.
///
/// `y` may be negative while the piece pokes out above the board.
///
/// Every `try_*` mutator either applies fully or leaves the piece untouched.
///
/// # Example
///
/// ```
/// use blockfall_engine::{Board, Piece, PieceKind};
///
/// let board = Board::new();
/// let mut piece = Piece::spawn(PieceKind::T);
/// assert_eq!((piece.x(), piece.y()), (4, 0));
///
/// assert!(piece.try_move(&board, -1, 0));
/// assert!(piece.try_rotate(&board));
///
/// let target = piece.hard_drop_target(&board);
/// assert_eq!(target.y(), 17);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Piece {
    kind: PieceKind,
    shape: Shape,
    x: i32,
    y: i32,
    color: Color,
}

impl Piece {
    /// Creates a piece of `kind` at the top of the board, horizontally centred.
    ///
    /// The spawn position is not checked for collisions.
    #[must_use]
    pub fn spawn(kind: PieceKind) -> Self {
        let shape = kind.base_shape();
        Self {
            kind,
            shape,
            x: SPAWN_CENTER_X - shape.col_span() / 2,
            y: 0,
            color: kind.color(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    #[must_use]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Returns the board coordinates of every filled cell, row-major.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .filled_offsets()
            .map(|(dx, dy)| (self.x + dx, self.y + dy))
    }

    #[must_use]
    pub fn collides(&self, board: &Board) -> bool {
        board.collides(&self.shape, self.x, self.y)
    }

    #[must_use]
    fn moved(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Moves the piece by `(dx, dy)` if the target position is free.
    pub fn try_move(&mut self, board: &Board, dx: i32, dy: i32) -> bool {
        let moved = self.moved(dx, dy);
        if moved.collides(board) {
            return false;
        }
        *self = moved;
        true
    }

    /// Rotates the piece 90° clockwise, trying each of [`ROTATION_NUDGES`] in
    /// order and keeping the first collision-free placement.
    pub fn try_rotate(&mut self, board: &Board) -> bool {
        let rotated = Self {
            shape: self.shape.rotated_clockwise(),
            ..*self
        };
        let Some(placed) = ROTATION_NUDGES
            .iter()
            .map(|&(dx, dy)| rotated.moved(dx, dy))
            .find(|candidate| !candidate.collides(board))
        else {
            return false;
        };
        *self = placed;
        true
    }

    /// Returns the lowest position reachable by moving straight down.
    #[must_use]
    pub fn hard_drop_target(&self, board: &Board) -> Self {
        let mut target = *self;
        while target.try_move(board, 0, 1) {}
        target
    }

    /// Returns the landing preview, or `None` when the piece is already
    /// resting and the preview would coincide with it.
    #[must_use]
    pub fn ghost(&self, board: &Board) -> Option<Self> {
        let target = self.hard_drop_target(board);
        (target.y != self.y).then_some(target)
    }

    /// Returns whether the piece cannot move down any further.
    #[must_use]
    pub fn is_resting(&self, board: &Board) -> bool {
        self.moved(0, 1).collides(board)
    }

    /// Writes the piece's cells into `board` in its color.
    pub fn lock_into(&self, board: &mut Board) {
        board.commit(&self.shape, self.x, self.y, self.color);
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_spawn_positions() {
        let expected = [
            (PieceKind::I, 3),
            (PieceKind::J, 4),
            (PieceKind::L, 4),
            (PieceKind::O, 4),
            (PieceKind::S, 4),
            (PieceKind::T, 4),
            (PieceKind::Z, 4),
        ];
        for (kind, x) in expected {
            let piece = Piece::spawn(kind);
            assert_eq!((piece.x(), piece.y()), (x, 0), "{kind:?}");
            assert_eq!(piece.color(), kind.color());
            assert_eq!(*piece.shape(), kind.base_shape());
        }
    }

    #[test]
    fn test_move_against_walls() {
        let board = Board::new();
        let mut piece = Piece::spawn(PieceKind::O);
        let mut steps = 0;
        while piece.try_move(&board, -1, 0) {
            steps += 1;
        }
        assert_eq!(steps, 4);
        assert_eq!(piece.x(), 0);

        while piece.try_move(&board, 1, 0) {}
        assert_eq!(piece.x(), 8);
    }

    #[test]
    fn test_failed_move_leaves_piece_unchanged() {
        let board = Board::from_ascii(
            "
            ..........
            ...ZZ.....
            ",
        );
        let mut piece = Piece::spawn(PieceKind::T);
        piece.y = 17;
        let before = piece;
        assert!(!piece.try_move(&board, 0, 1));
        assert_eq!(piece, before);
    }

    #[test]
    fn test_rotate_in_place() {
        let board = Board::new();
        let mut piece = Piece::spawn(PieceKind::T);
        piece.y = 5;
        assert!(piece.try_rotate(&board));
        assert_eq!((piece.x(), piece.y()), (4, 5));
        assert_eq!(*piece.shape(), PieceKind::T.base_shape().rotated_clockwise());
    }

    #[test]
    fn test_rotate_nudges_left_off_right_wall() {
        let board = Board::new();
        let mut piece = Piece::spawn(PieceKind::I);
        piece.try_rotate(&board);
        piece.y = 5;
        while piece.try_move(&board, 1, 0) {}
        assert_eq!(piece.x(), 9);

        // Horizontal I needs four columns; every nudge still crosses the wall.
        assert!(!piece.try_rotate(&board));
        assert_eq!(piece.x(), 9);

        let mut t = Piece::spawn(PieceKind::T);
        t.try_rotate(&board);
        t.y = 5;
        while t.try_move(&board, 1, 0) {}
        // Vertical T occupies columns 8..=9; rotating back needs three columns.
        assert_eq!(t.x(), 8);
        assert!(t.try_rotate(&board));
        assert_eq!(t.x(), 7);
        assert_eq!(t.y(), 5);
    }

    #[test]
    fn test_rotate_nudges_up() {
        let board = Board::from_ascii(
            "
            .....L....
            ..........
            ..........
            ..........
            ",
        );
        let mut piece = Piece::spawn(PieceKind::I);
        piece.shape = piece.shape.rotated_clockwise();
        piece.x = 4;
        piece.y = 16;
        assert!(piece.is_resting(&board));

        // In place, left and right all overlap the block at (5, 16).
        assert!(piece.try_rotate(&board));
        assert_eq!((piece.x(), piece.y()), (4, 15));
    }

    #[test]
    fn test_rotate_rejected_when_boxed_in() {
        let board = Board::from_ascii(
            "
            TTT.TTTTTT
            TTT.TTTTTT
            TTT.TTTTTT
            TTT.TTTTTT
            TTT.TTTTTT
            ",
        );
        let mut piece = Piece::spawn(PieceKind::I);
        piece.shape = piece.shape.rotated_clockwise();
        piece.x = 3;
        piece.y = 16;
        assert!(!piece.collides(&board));

        let before = piece;
        assert!(!piece.try_rotate(&board));
        assert_eq!(piece, before);
    }

    #[test]
    fn test_ghost_and_hard_drop_target() {
        let board = Board::from_ascii(
            "
            ..........
            ....O.....
            ",
        );
        let piece = Piece::spawn(PieceKind::T);
        let ghost = piece.ghost(&board).unwrap();
        assert_eq!((ghost.x(), ghost.y()), (4, 17));
        assert_eq!(ghost, piece.hard_drop_target(&board));
        assert!(ghost.is_resting(&board));
        assert!(ghost.ghost(&board).is_none());
    }

    #[test]
    fn test_lock_into_board() {
        let mut board = Board::new();
        let piece = Piece::spawn(PieceKind::S).hard_drop_target(&board);
        piece.lock_into(&mut board);
        let cells: Vec<_> = piece.occupied_cells().collect();
        assert_eq!(cells, vec![(5, 18), (6, 18), (4, 19), (5, 19)]);
        for (x, y) in cells {
            assert!(
                board
                    .cell(x as usize, y as usize)
                    .is_some_and(|cell| cell.color() == Some(Color::Green))
            );
        }
    }

    fn arb_kind() -> impl Strategy<Value = PieceKind> {
        prop::sample::select(PieceKind::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_mutators_are_atomic(
            kind in arb_kind(),
            filled in prop::collection::vec(prop::bool::weighted(0.4), BOARD_WIDTH * 6),
            x in -3i32..12,
            y in 10i32..20,
            ops in prop::collection::vec(0u8..4, 1..20),
        ) {
            let mut art = String::new();
            for row in filled.chunks(BOARD_WIDTH) {
                art.extend(row.iter().map(|&f| if f { '#' } else { '.' }));
                art.push('\n');
            }
            let board = Board::from_ascii(&art);
            let mut piece = Piece::spawn(kind);
            piece.x = x;
            piece.y = y;

            for op in ops {
                let before = piece;
                let ok = match op {
                    0 => piece.try_move(&board, -1, 0),
                    1 => piece.try_move(&board, 1, 0),
                    2 => piece.try_move(&board, 0, 1),
                    _ => piece.try_rotate(&board),
                };
                if ok {
                    prop_assert!(!piece.collides(&board));
                } else {
                    prop_assert_eq!(piece, before);
                }
            }
        }
    }
}
