use thiserror::Error;

/// Errors raised by table bindings and their operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The record type cannot be mapped to a table.
    #[error("invalid record type `{type_name}`: {reason}")]
    Schema { type_name: String, reason: String },

    #[error("unknown field: {0}")]
    UnknownField(String),

    /// An argument is neither a field map nor a usable instance of the bound type.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("id required for {0}")]
    MissingId(&'static str),

    /// Failures from the storage engine, passed through untouched.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn schema(type_name: &str, reason: impl Into<String>) -> Self {
        Error::Schema {
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
