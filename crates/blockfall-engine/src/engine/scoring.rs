use std::time::Duration;

use serde::Serialize;

use crate::SessionConfig;

/// What a single lock changed in the statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOutcome {
    pub points: u32,
    pub levels_gained: u32,
}

/// Score, level and gravity speed, plus a few counters for display.
///
/// # Scoring
///
/// Each lock awards `line_scores[rows cleared]` points (100/300/500/800 by
/// default). The level is `score / points_per_level + 1`; every level gained
/// multiplies the gravity interval by `speed_factor` once, so two levels
/// reached in one lock shrink it twice.
///
/// The interval only ever shrinks and has no floor. At the default factor
/// it drops below one millisecond around level 130, after which gravity
/// fires as fast as the scheduler allows.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use blockfall_engine::{GameStats, SessionConfig};
///
/// let config = SessionConfig::default();
/// let mut stats = GameStats::new(&config);
///
/// stats.record_lock(4, &config);
/// stats.record_lock(2, &config);
///
/// assert_eq!(stats.score(), 1100);
/// assert_eq!(stats.level(), 3);
/// assert_eq!(stats.drop_interval(), Duration::from_millis(800).mul_f64(0.95).mul_f64(0.95));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStats {
    score: u32,
    level: u32,
    drop_interval: Duration,
    pieces_locked: u32,
    total_cleared_lines: u32,
    line_cleared_counter: [u32; 5],
}

impl GameStats {
    /// Creates statistics for a fresh game: score 0, level 1.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            score: 0,
            level: 1,
            drop_interval: config.initial_drop_interval,
            pieces_locked: 0,
            total_cleared_lines: 0,
            line_cleared_counter: [0; 5],
        }
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Current gravity period.
    #[must_use]
    pub const fn drop_interval(&self) -> Duration {
        self.drop_interval
    }

    #[must_use]
    pub const fn pieces_locked(&self) -> u32 {
        self.pieces_locked
    }

    #[must_use]
    pub const fn total_cleared_lines(&self) -> u32 {
        self.total_cleared_lines
    }

    /// Histogram of locks by rows cleared; index 0 counts locks that cleared nothing.
    #[must_use]
    pub const fn line_cleared_counter(&self) -> &[u32; 5] {
        &self.line_cleared_counter
    }

    /// Records one locked piece that cleared `cleared_lines` rows.
    pub fn record_lock(&mut self, cleared_lines: usize, config: &SessionConfig) -> LockOutcome {
        let bucket = cleared_lines.min(self.line_cleared_counter.len() - 1);
        let points = config.line_scores[bucket.min(config.line_scores.len() - 1)];

        self.pieces_locked += 1;
        self.total_cleared_lines += u32::try_from(cleared_lines).unwrap_or(u32::MAX);
        self.line_cleared_counter[bucket] += 1;
        self.score = self.score.saturating_add(points);

        let levels_gained = self.catch_up_level(config);
        LockOutcome {
            points,
            levels_gained,
        }
    }

    fn catch_up_level(&mut self, config: &SessionConfig) -> u32 {
        let target = self.score / config.points_per_level + 1;
        if target <= self.level {
            return 0;
        }
        let gained = target - self.level;
        for _ in 0..gained {
            self.drop_interval = self.drop_interval.mul_f64(config.speed_factor);
        }
        self.level = target;
        gained
    }
}
