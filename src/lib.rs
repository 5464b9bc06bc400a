//! Record-native SQLite. Zero boilerplate CRUD.
//!
//! # Intention
//!
//! - Bind a plain serde struct to one SQLite table and get create, read,
//!   update, delete and count for free.
//! - Manage `id`, `created_at`, `updated_at` and `deleted_at` automatically
//!   for types that declare them; `deleted_at` turns on soft delete.
//!
//! # Architectural Boundaries
//!
//! - Equality filters and pagination only. No joins, migrations or
//!   cross-call transactions.
//! - Every operation opens, uses and closes its own connection.
//!
//! ```ignore
//! use serde::{Deserialize, Serialize};
//! use sqlow::{Database, Input, Model, Query};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Component {
//!     #[serde(flatten)]
//!     model: Model,
//!     name: String,
//! }
//! sqlow::record!(Component: Model { name: String });
//!
//! let db = Database::open("app.db");
//! let components = db.table::<Component>()?;
//! let created = components.create([Input::fields(json!({"name": "button"}))?])?;
//! let found = components.read(&Query::new().where_eq("name", "button"))?;
//! ```

mod macros;

pub mod codec;
pub mod config;
pub mod database;
pub mod error;
pub mod schema;
pub mod sqlite;
pub mod statement;
pub mod table;
pub mod value;

pub use codec::FieldMap;
pub use config::{Config, JournalMode};
pub use database::Database;
pub use error::{Error, Result};
pub use schema::{FieldDecl, FieldSchema, FieldType, LogicalType, Model, Record, Schema, StorageType};
pub use table::{Count, Input, Query, Table};
pub use value::Value;
