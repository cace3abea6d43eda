//! Engine for a single-player falling-block puzzle game.
//!
//! The crate holds the game rules only: board, pieces, line clears,
//! scoring, gravity timing and the session state machine. Rendering,
//! input devices and audio live outside and talk to a [`Session`]
//! through [`Command`]s, [`SessionEvent`]s and [`Snapshot`]s.

pub use self::{config::*, core::*, engine::*};

pub mod config;
pub mod core;
pub mod engine;
