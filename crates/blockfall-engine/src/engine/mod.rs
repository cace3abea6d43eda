//! Session orchestration on top of the core data model.
//!
//! - [`Session`] - The state machine: commands, gravity, locking and game over
//! - [`GameStats`] - Score, level and gravity interval
//! - [`Scheduler`] - Virtual-time gravity and line-clear timers
//! - [`PieceGenerator`] - Uniform, seedable piece draws
//! - [`Snapshot`] - Read-only view for renderers
//! - [`HighScoreStore`] - Persistence of the best score
//!
//! # Game Flow
//!
//! 1. [`Command::StartGame`] spawns the first piece and arms gravity
//! 2. Commands and gravity ticks move the active piece
//! 3. A piece that cannot move down locks into the board
//! 4. Full rows are marked, then removed after the settle delay and scored
//! 5. The next piece spawns; if it collides the game is over
//!
//! # Example
//!
//! ```
//! use blockfall_engine::{Command, MemoryHighScoreStore, Session, SessionConfig, SessionEvent};
//!
//! let mut session = Session::new(SessionConfig::default(), MemoryHighScoreStore::new()).unwrap();
//! session.handle(Command::StartGame);
//!
//! let events = session.handle(Command::HardDrop);
//! assert!(matches!(events[0], SessionEvent::PieceLocked { .. }));
//!
//! let snapshot = session.snapshot();
//! assert_eq!(snapshot.score, 0);
//! assert!(snapshot.active_piece.is_some());
//! ```

pub use self::{
    high_score::*, piece_generator::*, scoring::*, session::*, snapshot::*, timer::*,
};

mod high_score;
mod piece_generator;
mod scoring;
mod session;
mod snapshot;
mod timer;
