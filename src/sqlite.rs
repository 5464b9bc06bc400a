//! Storage connector: one short-lived SQLite connection per operation.
//!
//! Nothing is held between calls. A [`Session`] is opened at the start of
//! a table operation, runs that operation's statements in autocommit mode
//! and is closed before the operation returns, so no transaction ever
//! spans two calls.

use crate::config::{Config, JournalMode};
use crate::error::{Error, Result};
use crate::statement::Statement;
use crate::value::Value;
use rusqlite::{params_from_iter, Connection};
use std::collections::HashMap;
use tracing::{debug, trace};

/// One result row, keyed by column name.
pub type Row = HashMap<String, Value>;

pub struct Session {
    connection: Connection,
}

impl Session {
    pub fn open(config: &Config) -> Result<Self> {
        let connection = Connection::open(&config.path)?;
        if config.journal_mode != JournalMode::default() {
            connection.pragma_update_and_check(
                None,
                "journal_mode",
                config.journal_mode.pragma_value(),
                |row| row.get::<_, String>(0),
            )?;
        }
        trace!(path = %config.path.display(), "opened connection");
        Ok(Self { connection })
    }

    /// Executes one statement and collects whatever rows it yields.
    pub fn run(&self, statement: &Statement) -> Result<Vec<Row>> {
        let mut stmt = self.connection.prepare(&statement.sql)?;
        let params = params_from_iter(statement.params.iter());

        if stmt.column_count() == 0 {
            let affected = stmt.execute(params)?;
            debug!(sql = %statement.sql, params = statement.params.len(), affected, "executed statement");
            return Ok(Vec::new());
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(params)?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut map = Row::with_capacity(columns.len());
            for (i, name) in columns.iter().enumerate() {
                map.insert(name.clone(), row.get::<_, Value>(i)?);
            }
            result.push(map);
        }
        debug!(sql = %statement.sql, params = statement.params.len(), rows = result.len(), "executed query");
        Ok(result)
    }

    pub fn close(self) -> Result<()> {
        self.connection.close().map_err(|(_, err)| Error::Sqlite(err))?;
        trace!("closed connection");
        Ok(())
    }
}

/// Opens a session, hands it to `f`, and closes it again.
///
/// On error the connection is dropped without waiting for a clean close.
pub fn with_session<R>(config: &Config, f: impl FnOnce(&Session) -> Result<R>) -> Result<R> {
    let session = Session::open(config)?;
    let result = f(&session)?;
    session.close()?;
    Ok(result)
}
