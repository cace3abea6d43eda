//! Tunable rules of a session.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Points awarded per lock, indexed by the number of rows it cleared.
pub const DEFAULT_LINE_SCORES: [u32; 5] = [0, 100, 300, 500, 800];

/// Gameplay parameters for a [`Session`](crate::Session).
///
/// Deserializes with every field optional; missing fields take their
/// defaults. Durations are written as milliseconds.
///
/// ```
/// use std::time::Duration;
///
/// use blockfall_engine::SessionConfig;
///
/// let config: SessionConfig = serde_json::from_str(r#"{ "initial_drop_interval": 1000 }"#).unwrap();
/// assert_eq!(config.initial_drop_interval, Duration::from_secs(1));
/// assert_eq!(config.points_per_level, 500);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Gravity period at level 1.
    #[serde(with = "duration_ms")]
    pub initial_drop_interval: Duration,
    /// Multiplier applied to the gravity period once per level gained.
    pub speed_factor: f64,
    /// Score needed per level; level is `score / points_per_level + 1`.
    pub points_per_level: u32,
    /// Settle window between marking full rows and removing them.
    #[serde(with = "duration_ms")]
    pub line_clear_delay: Duration,
    pub line_scores: [u32; 5],
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_drop_interval: Duration::from_millis(800),
            speed_factor: 0.95,
            points_per_level: 500,
            line_clear_delay: Duration::from_millis(300),
            line_scores: DEFAULT_LINE_SCORES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("initial drop interval must be positive")]
    ZeroDropInterval,
    #[display("speed factor must be in (0, 1], got {factor}")]
    SpeedFactorOutOfRange { factor: f64 },
    #[display("points per level must be positive")]
    ZeroPointsPerLevel,
}

impl SessionConfig {
    /// Checks that the configuration can drive a session.
    ///
    /// The speed factor may not exceed 1, so gravity never slows down.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_drop_interval.is_zero() {
            return Err(ConfigError::ZeroDropInterval);
        }
        if !(self.speed_factor > 0.0 && self.speed_factor <= 1.0) {
            return Err(ConfigError::SpeedFactorOutOfRange {
                factor: self.speed_factor,
            });
        }
        if self.points_per_level == 0 {
            return Err(ConfigError::ZeroPointsPerLevel);
        }
        Ok(())
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize as _, Deserializer, Serializer};

    #[expect(clippy::cast_possible_truncation)]
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
