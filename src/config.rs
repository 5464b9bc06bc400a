use serde::Deserialize;
use std::path::PathBuf;

/// SQLite journal mode applied to every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    /// Engine default rollback journal.
    #[default]
    Delete,
    /// Write-ahead log.
    Wal,
}

impl JournalMode {
    /// Returns the `journal_mode` pragma value.
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Wal => "wal",
        }
    }
}

/// Storage configuration for a [`Database`](crate::Database).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Path to the SQLite database file
    pub path: PathBuf,
    #[serde(default)]
    pub journal_mode: JournalMode,
}

impl Config {
    /// Create a config for the given path with the default journal mode
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            journal_mode: JournalMode::default(),
        }
    }

    pub fn with_journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }
}
