use crate::config::Config;
use crate::error::Result;
use crate::schema::Record;
use crate::table::Table;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A storage location that hands out table bindings.
///
/// Holds no connection; each table operation opens its own.
#[derive(Debug, Clone)]
pub struct Database {
    config: Arc<Config>,
}

impl Database {
    /// Create a database handle from a config
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Database at `path` with default settings.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(Config::new(path))
    }

    /// Storage configuration of this handle
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the SQLite database file
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Binds `T` to its table, creating the table if it does not exist.
    pub fn table<T: Record>(&self) -> Result<Table<T>> {
        Table::bind(self.config.clone())
    }
}
