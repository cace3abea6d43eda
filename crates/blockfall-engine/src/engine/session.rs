use std::time::Duration;

use serde::Serialize;

use crate::{
    Board, ClearedRows, ConfigError, Piece, PieceKind, SessionConfig,
    engine::{
        high_score::{HighScoreStore, MemoryHighScoreStore},
        piece_generator::{PieceGenerator, PieceSeed},
        scoring::GameStats,
        snapshot::Snapshot,
        timer::{Scheduler, TimerEvent, TimerId},
    },
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display, derive_more::IsVariant,
)]
pub enum SessionState {
    StartScreen,
    Playing,
    Paused,
    GameOver,
}

/// Abstract player intents, independent of the input device.
///
/// Parses from and displays as its variant name:
///
/// ```
/// use blockfall_engine::Command;
///
/// let command: Command = "HardDrop".parse().unwrap();
/// assert_eq!(command, Command::HardDrop);
/// assert_eq!(command.to_string(), "HardDrop");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, derive_more::FromStr,
)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDropStep,
    Rotate,
    HardDrop,
    TogglePause,
    StartGame,
    ResetGame,
    ShowStartScreen,
}

impl Command {
    /// Maps a keyboard key name to its default binding.
    ///
    /// Arrows move, down steps, up rotates, space hard-drops and escape
    /// toggles pause. Both `" "` and `"Space"` name the space bar.
    #[must_use]
    pub fn from_key_name(key: &str) -> Option<Self> {
        let command = match key {
            "ArrowLeft" => Self::MoveLeft,
            "ArrowRight" => Self::MoveRight,
            "ArrowDown" => Self::SoftDropStep,
            "ArrowUp" => Self::Rotate,
            " " | "Space" => Self::HardDrop,
            "Escape" => Self::TogglePause,
            _ => return None,
        };
        Some(command)
    }
}

/// Something observable that happened while handling a command or timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A fresh game began.
    Started,
    Paused,
    Resumed,
    /// Returned to the start screen; any game in progress was discarded.
    StartScreenShown,
    PieceLocked { kind: PieceKind },
    /// Full rows were found and will be removed after the settle delay.
    RowsMarked { rows: ClearedRows },
    RowsCleared { rows: ClearedRows, points: u32 },
    LevelUp { level: u32, drop_interval: Duration },
    GravityRearmed { period: Duration },
    GameOver { score: u32 },
    NewHighScore { score: u32 },
    HighScoreSaveFailed { reason: String },
}

/// One player's game: board, pieces, statistics and timers.
///
/// The session is a plain owned value. Input collaborators call
/// [`Session::handle`] with commands, the host clock calls
/// [`Session::advance`] with elapsed time, and renderers read
/// [`Session::snapshot`]. Every call runs to completion and reports what
/// happened as a list of [`SessionEvent`]s.
///
/// Commands that cannot apply (moving into a wall, rotating with no
/// piece, anything but resume while paused) are silent no-ops.
///
/// # Timers
///
/// Gravity is a periodic timer armed with the current drop interval. It
/// is re-armed, restarting its phase, whenever a piece spawns, play
/// resumes, or the level changes. It is disarmed while paused, during the
/// line-clear settle delay, and after game over. Time does not pass
/// outside [`SessionState::Playing`], so a pending settle delay keeps its
/// remaining time across a pause. Every timer callback carries the token
/// from its arming and is dropped if that arming has since been replaced
/// or cancelled.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use blockfall_engine::{Command, MemoryHighScoreStore, Session, SessionConfig, SessionState};
///
/// let mut session = Session::new(SessionConfig::default(), MemoryHighScoreStore::new()).unwrap();
/// assert!(session.state().is_start_screen());
///
/// session.handle(Command::StartGame);
/// assert!(session.state().is_playing());
/// let start_y = session.active_piece().unwrap().y();
///
/// // One gravity tick at the initial 800ms interval.
/// session.advance(Duration::from_millis(800));
/// assert_eq!(session.active_piece().unwrap().y(), start_y + 1);
///
/// session.handle(Command::TogglePause);
/// session.advance(Duration::from_secs(10));
/// assert_eq!(session.state(), SessionState::Paused);
/// assert_eq!(session.active_piece().unwrap().y(), start_y + 1);
/// ```
#[derive(Debug)]
pub struct Session<S = MemoryHighScoreStore> {
    config: SessionConfig,
    state: SessionState,
    board: Board,
    active: Option<Piece>,
    next: Option<PieceKind>,
    stats: GameStats,
    clearing_rows: ClearedRows,
    generator: PieceGenerator,
    scheduler: Scheduler,
    gravity_timer: Option<TimerId>,
    line_clear_timer: Option<TimerId>,
    high_score: u32,
    store: S,
}

impl<S> Session<S>
where
    S: HighScoreStore,
{
    /// Creates a session on the start screen, loading the best score from `store`.
    ///
    /// A store that fails to load counts as having no record.
    pub fn new(config: SessionConfig, store: S) -> Result<Self, ConfigError> {
        Self::with_generator(config, store, PieceGenerator::new())
    }

    /// Like [`Self::new`], but with a fixed piece sequence.
    pub fn with_seed(config: SessionConfig, store: S, seed: PieceSeed) -> Result<Self, ConfigError> {
        Self::with_generator(config, store, PieceGenerator::with_seed(seed))
    }

    fn with_generator(
        config: SessionConfig,
        mut store: S,
        generator: PieceGenerator,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let high_score = store.load().ok().flatten().unwrap_or(0);
        Ok(Self {
            stats: GameStats::new(&config),
            config,
            state: SessionState::StartScreen,
            board: Board::new(),
            active: None,
            next: None,
            clearing_rows: ClearedRows::new(),
            generator,
            scheduler: Scheduler::new(),
            gravity_timer: None,
            line_clear_timer: None,
            high_score,
            store,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn active_piece(&self) -> Option<&Piece> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn next_piece(&self) -> Option<PieceKind> {
        self.next
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.stats.score()
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.stats.level()
    }

    #[must_use]
    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Seed of the piece generator.
    ///
    /// A session built with [`Session::with_seed`] from this value draws the
    /// same pieces, in the same order, as this one has since it was created.
    #[must_use]
    pub fn seed(&self) -> PieceSeed {
        self.generator.seed()
    }

    /// Rows marked full and waiting for the settle delay to end.
    #[must_use]
    pub fn clearing_rows(&self) -> &[usize] {
        &self.clearing_rows
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Virtual time spent in [`SessionState::Playing`] since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.scheduler.now()
    }

    /// Time until the next armed timer fires, if one is armed.
    #[must_use]
    pub fn time_until_next_timer(&self) -> Option<Duration> {
        self.scheduler
            .next_due()
            .map(|due| due.saturating_sub(self.scheduler.now()))
    }

    /// Applies one command.
    pub fn handle(&mut self, command: Command) -> Vec<SessionEvent> {
        let mut events = vec![];
        match command {
            Command::StartGame => {
                if matches!(
                    self.state,
                    SessionState::StartScreen | SessionState::GameOver
                ) {
                    self.start_game(&mut events);
                }
            }
            Command::ResetGame => self.start_game(&mut events),
            Command::ShowStartScreen => self.show_start_screen(&mut events),
            Command::TogglePause => self.toggle_pause(&mut events),
            Command::MoveLeft => self.try_move(-1),
            Command::MoveRight => self.try_move(1),
            Command::Rotate => self.try_rotate(),
            Command::SoftDropStep => {
                if self.state.is_playing() {
                    self.step_down(&mut events);
                }
            }
            Command::HardDrop => self.hard_drop(&mut events),
        }
        events
    }

    /// Lets `elapsed` of play time pass, firing every timer that falls due.
    ///
    /// Outside [`SessionState::Playing`] this does nothing and the clock
    /// stays put.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<SessionEvent> {
        let mut events = vec![];
        if !self.state.is_playing() {
            return events;
        }
        let deadline = self.scheduler.now().saturating_add(elapsed);
        while let Some(event) = self.scheduler.pop_due(deadline) {
            self.on_timer(event, &mut events);
            if !self.state.is_playing() {
                break;
            }
        }
        self.scheduler.advance_to(deadline);
        events
    }

    /// Builds the read-only view for renderers.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let show_piece = !self.state.is_paused();
        let active_piece = self.active.filter(|_| show_piece);
        Snapshot {
            state: self.state,
            board: self
                .board
                .rows()
                .map(|row| row.iter().map(|cell| cell.color()).collect())
                .collect(),
            active_piece,
            next_piece: self.next,
            next_shape: self.next.map(PieceKind::base_shape),
            ghost: active_piece.and_then(|piece| piece.ghost(&self.board)),
            clearing_rows: self.clearing_rows.to_vec(),
            score: self.stats.score(),
            level: self.stats.level(),
            lines_cleared: self.stats.total_cleared_lines(),
            drop_interval_ms: self.stats.drop_interval().as_secs_f64() * 1000.0,
            is_paused: self.state.is_paused(),
            is_game_over: self.state.is_game_over(),
            high_score: self.high_score,
            seed: self.generator.seed(),
        }
    }

    fn on_timer(&mut self, event: TimerEvent, events: &mut Vec<SessionEvent>) {
        match event {
            TimerEvent::Gravity(id) => {
                if self.gravity_timer == Some(id) && self.state.is_playing() {
                    self.step_down(events);
                }
            }
            TimerEvent::LineClear(id) => {
                if self.line_clear_timer == Some(id) && self.state.is_playing() {
                    self.complete_line_clear(events);
                }
            }
        }
    }

    fn cancel_timers(&mut self) {
        self.scheduler.cancel_all();
        self.gravity_timer = None;
        self.line_clear_timer = None;
    }

    fn clear_game(&mut self) {
        self.cancel_timers();
        self.board = Board::new();
        self.active = None;
        self.next = None;
        self.clearing_rows.clear();
        self.stats = GameStats::new(&self.config);
    }

    /// Starts a fresh game on a preset board instead of an empty one.
    ///
    /// Full rows in `board` are left alone until the next lock. If the first
    /// piece cannot spawn the game is over immediately.
    pub fn start_with_board(&mut self, board: Board) -> Vec<SessionEvent> {
        let mut events = vec![];
        self.start_game_on(board, &mut events);
        events
    }

    fn start_game(&mut self, events: &mut Vec<SessionEvent>) {
        self.start_game_on(Board::new(), events);
    }

    fn start_game_on(&mut self, board: Board, events: &mut Vec<SessionEvent>) {
        self.clear_game();
        self.board = board;
        self.state = SessionState::Playing;
        self.next = Some(self.generator.next_kind());
        events.push(SessionEvent::Started);
        self.spawn_next(events);
    }

    fn show_start_screen(&mut self, events: &mut Vec<SessionEvent>) {
        self.clear_game();
        self.state = SessionState::StartScreen;
        events.push(SessionEvent::StartScreenShown);
    }

    fn toggle_pause(&mut self, events: &mut Vec<SessionEvent>) {
        match self.state {
            SessionState::Playing => {
                self.state = SessionState::Paused;
                self.scheduler.disarm_gravity();
                self.gravity_timer = None;
                events.push(SessionEvent::Paused);
            }
            SessionState::Paused => {
                self.state = SessionState::Playing;
                events.push(SessionEvent::Resumed);
                // During the settle delay gravity waits for the next spawn.
                if self.active.is_some() {
                    self.arm_gravity(events);
                }
            }
            SessionState::StartScreen | SessionState::GameOver => {}
        }
    }

    fn arm_gravity(&mut self, events: &mut Vec<SessionEvent>) {
        let period = self.stats.drop_interval();
        self.gravity_timer = Some(self.scheduler.arm_gravity(period));
        events.push(SessionEvent::GravityRearmed { period });
    }

    fn disarm_gravity(&mut self) {
        self.scheduler.disarm_gravity();
        self.gravity_timer = None;
    }

    fn try_move(&mut self, dx: i32) {
        if !self.state.is_playing() {
            return;
        }
        if let Some(piece) = &mut self.active {
            piece.try_move(&self.board, dx, 0);
        }
    }

    fn try_rotate(&mut self) {
        if !self.state.is_playing() {
            return;
        }
        if let Some(piece) = &mut self.active {
            piece.try_rotate(&self.board);
        }
    }

    fn step_down(&mut self, events: &mut Vec<SessionEvent>) {
        let Some(piece) = &mut self.active else {
            return;
        };
        if !piece.try_move(&self.board, 0, 1) {
            self.lock_active(events);
        }
    }

    fn hard_drop(&mut self, events: &mut Vec<SessionEvent>) {
        if !self.state.is_playing() {
            return;
        }
        let Some(piece) = &mut self.active else {
            return;
        };
        *piece = piece.hard_drop_target(&self.board);
        self.lock_active(events);
    }

    fn lock_active(&mut self, events: &mut Vec<SessionEvent>) {
        let Some(piece) = self.active.take() else {
            return;
        };
        self.disarm_gravity();
        piece.lock_into(&mut self.board);
        events.push(SessionEvent::PieceLocked { kind: piece.kind() });

        let rows = self.board.full_rows();
        if rows.is_empty() {
            self.stats.record_lock(0, &self.config);
            self.spawn_next(events);
            return;
        }

        self.clearing_rows = rows.clone();
        events.push(SessionEvent::RowsMarked { rows });
        if self.config.line_clear_delay.is_zero() {
            self.complete_line_clear(events);
        } else {
            let delay = self.config.line_clear_delay;
            self.line_clear_timer = Some(self.scheduler.arm_line_clear(delay));
        }
    }

    fn complete_line_clear(&mut self, events: &mut Vec<SessionEvent>) {
        self.scheduler.cancel_line_clear();
        self.line_clear_timer = None;
        self.clearing_rows.clear();

        let rows = self.board.clear_full_rows();
        let outcome = self.stats.record_lock(rows.len(), &self.config);
        events.push(SessionEvent::RowsCleared {
            rows,
            points: outcome.points,
        });
        if outcome.levels_gained > 0 {
            events.push(SessionEvent::LevelUp {
                level: self.stats.level(),
                drop_interval: self.stats.drop_interval(),
            });
        }
        self.spawn_next(events);
    }

    fn spawn_next(&mut self, events: &mut Vec<SessionEvent>) {
        let kind = self
            .next
            .take()
            .unwrap_or_else(|| self.generator.next_kind());
        self.next = Some(self.generator.next_kind());

        let piece = Piece::spawn(kind);
        if piece.collides(&self.board) {
            self.game_over(events);
            return;
        }
        self.active = Some(piece);
        self.arm_gravity(events);
    }

    fn game_over(&mut self, events: &mut Vec<SessionEvent>) {
        self.cancel_timers();
        self.active = None;
        self.state = SessionState::GameOver;
        let score = self.stats.score();
        events.push(SessionEvent::GameOver { score });

        if score > self.high_score {
            self.high_score = score;
            events.push(SessionEvent::NewHighScore { score });
            if let Err(e) = self.store.save(score) {
                events.push(SessionEvent::HighScoreSaveFailed {
                    reason: e.to_string(),
                });
            }
        }
    }
}
