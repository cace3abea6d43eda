use serde::Serialize;

use crate::{Color, Piece, PieceKind, PieceSeed, SessionState, Shape};

/// Read-only view of a session for renderers.
///
/// While paused the active piece and ghost are left out, so a paused
/// screen cannot be used to plan the next move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub state: SessionState,
    /// Board cells, row 0 at the top. `None` is an empty cell.
    pub board: Vec<Vec<Option<Color>>>,
    pub active_piece: Option<Piece>,
    pub next_piece: Option<PieceKind>,
    pub next_shape: Option<Shape>,
    pub ghost: Option<Piece>,
    /// Full rows waiting out the line-clear delay.
    pub clearing_rows: Vec<usize>,
    pub score: u32,
    pub level: u32,
    pub lines_cleared: u32,
    pub drop_interval_ms: f64,
    pub is_paused: bool,
    pub is_game_over: bool,
    pub high_score: u32,
    /// Seed that replays this session's pieces via `Session::with_seed`.
    pub seed: PieceSeed,
}

impl Snapshot {
    /// Returns the cell color at `(x, y)`, with the active piece drawn over
    /// the locked cells.
    #[must_use]
    pub fn composed_cell(&self, x: usize, y: usize) -> Option<Color> {
        let in_active = self.active_piece.as_ref().is_some_and(|piece| {
            piece.occupied_cells().any(|(px, py)| {
                usize::try_from(px).is_ok_and(|px| px == x)
                    && usize::try_from(py).is_ok_and(|py| py == y)
            })
        });
        if in_active {
            return self.active_piece.map(|piece| piece.color());
        }
        self.board.get(y).and_then(|row| row.get(x)).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BOARD_HEIGHT, BOARD_WIDTH, Board, MemoryHighScoreStore, Session, SessionConfig};

    fn snapshot_of(board: Board) -> Snapshot {
        let mut session = Session::with_seed(
            SessionConfig::default(),
            MemoryHighScoreStore::new(),
            PieceSeed::from_bytes([5; 16]),
        )
        .unwrap();
        session.start_with_board(board);
        session.snapshot()
    }

    #[test]
    fn test_composed_cell_draws_piece_over_locked_cells() {
        let mut snapshot = snapshot_of(Board::from_ascii(
            "
            ZZZZ......
            Z.........
            ",
        ));
        let mut piece = Piece::spawn(PieceKind::I);
        assert!(piece.try_move(&Board::new(), 0, 18));
        snapshot.active_piece = Some(piece);

        assert_eq!(snapshot.composed_cell(3, 18), Some(Color::Cyan));
        assert_eq!(snapshot.composed_cell(6, 18), Some(Color::Cyan));
        assert_eq!(snapshot.composed_cell(2, 18), Some(Color::Red));
        assert_eq!(snapshot.composed_cell(0, 19), Some(Color::Red));
        assert_eq!(snapshot.composed_cell(7, 18), None);
        assert_eq!(snapshot.composed_cell(BOARD_WIDTH, 18), None);
        assert_eq!(snapshot.composed_cell(0, BOARD_HEIGHT), None);

        snapshot.active_piece = None;
        assert_eq!(snapshot.composed_cell(3, 18), Some(Color::Red));
    }

    #[test]
    fn test_composed_cell_skips_cells_above_the_board() {
        let mut snapshot = snapshot_of(Board::new());
        let mut piece = Piece::spawn(PieceKind::I);
        assert!(piece.try_rotate(&Board::new()));
        assert!(piece.try_move(&Board::new(), 0, -2));
        assert_eq!((piece.x(), piece.y()), (3, -2));
        snapshot.active_piece = Some(piece);

        let column: Vec<_> = (0..BOARD_HEIGHT)
            .map(|y| snapshot.composed_cell(3, y))
            .collect();
        assert_eq!(column[..3], [Some(Color::Cyan), Some(Color::Cyan), None]);
        assert_eq!(column.iter().flatten().count(), 2);
    }
}
