use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};

/// Key under which the best score is stored.
pub const HIGH_SCORE_KEY: &str = "tetrisHighScore";

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum HighScoreError {
    #[display("high score store I/O failed: {_0}")]
    Io(io::Error),
    #[display("high score store is not valid JSON: {_0}")]
    Json(serde_json::Error),
}

/// Persistence for the single best score.
///
/// A session loads once when it is created and saves once per new record.
pub trait HighScoreStore: fmt::Debug {
    fn load(&mut self) -> Result<Option<u32>, HighScoreError>;
    fn save(&mut self, score: u32) -> Result<(), HighScoreError>;
}

/// In-memory store, also handy for counting saves in tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryHighScoreStore {
    value: Option<u32>,
    saves: usize,
}

impl MemoryHighScoreStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: None,
            saves: 0,
        }
    }

    #[must_use]
    pub const fn with_value(value: u32) -> Self {
        Self {
            value: Some(value),
            saves: 0,
        }
    }

    #[must_use]
    pub const fn value(&self) -> Option<u32> {
        self.value
    }

    /// Number of times [`HighScoreStore::save`] was called.
    #[must_use]
    pub const fn saves(&self) -> usize {
        self.saves
    }
}

impl HighScoreStore for MemoryHighScoreStore {
    fn load(&mut self) -> Result<Option<u32>, HighScoreError> {
        Ok(self.value)
    }

    fn save(&mut self, score: u32) -> Result<(), HighScoreError> {
        self.value = Some(score);
        self.saves += 1;
        Ok(())
    }
}

/// Stores the best score in a JSON object file as `{"tetrisHighScore": n}`.
///
/// Other keys in the file are preserved on save. A missing file, or a file
/// without the key, loads as no record.
#[derive(Debug, Clone)]
pub struct JsonHighScoreStore {
    path: PathBuf,
}

impl JsonHighScoreStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, HighScoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl HighScoreStore for JsonHighScoreStore {
    fn load(&mut self) -> Result<Option<u32>, HighScoreError> {
        let map = self.read_map()?;
        Ok(map
            .get(HIGH_SCORE_KEY)
            .and_then(Value::as_u64)
            .and_then(|score| u32::try_from(score).ok()))
    }

    fn save(&mut self, score: u32) -> Result<(), HighScoreError> {
        let mut map = self.read_map()?;
        map.insert(HIGH_SCORE_KEY.to_owned(), Value::from(score));
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&map)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}
