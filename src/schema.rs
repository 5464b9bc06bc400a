//! Field schemas derived from a record type's declared fields.
//!
//! Rust has no runtime field reflection, so a record type registers its
//! fields once through [`Record::fields`] (usually via the [`record!`]
//! macro). [`Schema::of`] turns those declarations into the immutable
//! schema list the codec and statement builder consume.
//!
//! [`record!`]: crate::record

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const ID: &str = "id";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const DELETED_AT: &str = "deleted_at";

/// Fields populated by the table rather than by callers.
pub const AUTO_FIELDS: [&str; 4] = [ID, CREATED_AT, UPDATED_AT, DELETED_AT];

pub fn is_auto_field(name: &str) -> bool {
    AUTO_FIELDS.contains(&name)
}

/// Declared type of a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalType {
    Integer,
    Text,
    Real,
    Boolean,
    /// JSON object.
    Mapping,
    /// JSON array.
    Sequence,
    Optional(Box<LogicalType>),
    /// Anything else; stored as TEXT.
    Other(&'static str),
}

impl LogicalType {
    pub fn optional(inner: LogicalType) -> Self {
        LogicalType::Optional(Box::new(inner))
    }

    /// The type used for storage decisions, with optional wrappers removed.
    pub fn resolved(&self) -> &LogicalType {
        match self {
            LogicalType::Optional(inner) => inner.resolved(),
            other => other,
        }
    }

    pub fn storage_type(&self) -> StorageType {
        match self.resolved() {
            LogicalType::Integer | LogicalType::Boolean => StorageType::Integer,
            LogicalType::Real => StorageType::Real,
            _ => StorageType::Text,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.resolved(), LogicalType::Mapping | LogicalType::Sequence)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.resolved(), LogicalType::Boolean)
    }
}

/// SQLite column type affinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Integer,
    Text,
    Real,
}

impl StorageType {
    pub fn as_sql(self) -> &'static str {
        match self {
            StorageType::Integer => "INTEGER",
            StorageType::Text => "TEXT",
            StorageType::Real => "REAL",
        }
    }
}

/// Rust types usable as record fields.
pub trait FieldType {
    fn logical_type() -> LogicalType;
}

macro_rules! field_type {
    ($logical:expr => $($ty:ty),+) => {
        $(
            impl FieldType for $ty {
                fn logical_type() -> LogicalType {
                    $logical
                }
            }
        )+
    };
}

field_type!(LogicalType::Integer => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
field_type!(LogicalType::Real => f32, f64);
field_type!(LogicalType::Text => String, chrono::DateTime<chrono::Utc>);
field_type!(LogicalType::Boolean => bool);
field_type!(LogicalType::Mapping => serde_json::Map<String, serde_json::Value>);

impl<T> FieldType for Vec<T> {
    fn logical_type() -> LogicalType {
        LogicalType::Sequence
    }
}

impl<K, V, S> FieldType for HashMap<K, V, S> {
    fn logical_type() -> LogicalType {
        LogicalType::Mapping
    }
}

impl<K, V> FieldType for BTreeMap<K, V> {
    fn logical_type() -> LogicalType {
        LogicalType::Mapping
    }
}

impl<T: FieldType> FieldType for Option<T> {
    fn logical_type() -> LogicalType {
        LogicalType::optional(T::logical_type())
    }
}

/// One registered field: a name and its declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub logical_type: LogicalType,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
        }
    }

    pub fn of<T: FieldType>(name: impl Into<String>) -> Self {
        Self::new(name, T::logical_type())
    }
}

/// A structured type that can be bound to a table.
///
/// Instances travel through `serde_json`: they are serialized to a field
/// map on the way in and rebuilt from a decoded row on the way out, so the
/// serde field names must match the declared field names.
pub trait Record: Serialize + DeserializeOwned {
    /// Declared type name; the table is named after its lowercase form.
    fn type_name() -> &'static str;

    /// Declared fields, in declaration order.
    fn fields() -> Vec<FieldDecl>;
}

/// The four auto-managed fields. Flatten it into a record to opt into
/// generated ids, timestamps and soft delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Model {
    pub id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub deleted_at: Option<String>,
}

impl Model {
    pub fn fields() -> Vec<FieldDecl> {
        AUTO_FIELDS
            .iter()
            .map(|name| FieldDecl::of::<Option<String>>(*name))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub logical_type: LogicalType,
    pub storage_type: StorageType,
    pub is_json: bool,
    pub is_bool: bool,
}

impl FieldSchema {
    fn from_decl(decl: FieldDecl) -> Self {
        Self {
            storage_type: decl.logical_type.storage_type(),
            is_json: decl.logical_type.is_json(),
            is_bool: decl.logical_type.is_bool(),
            name: decl.name,
            logical_type: decl.logical_type,
        }
    }
}

/// Immutable field schema of one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    type_name: String,
    table: String,
    fields: Vec<FieldSchema>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn of<T: Record>() -> Result<Self> {
        Self::build(T::type_name(), T::fields())
    }

    pub fn build(type_name: &str, decls: Vec<FieldDecl>) -> Result<Self> {
        if !is_identifier(type_name) {
            return Err(Error::schema(type_name, "type name is not a valid identifier"));
        }
        if decls.is_empty() {
            return Err(Error::schema(type_name, "no fields declared"));
        }

        let mut fields = Vec::with_capacity(decls.len());
        let mut index = HashMap::with_capacity(decls.len());
        for decl in decls {
            if !is_identifier(&decl.name) {
                return Err(Error::schema(
                    type_name,
                    format!("field `{}` is not a valid identifier", decl.name),
                ));
            }
            if index.insert(decl.name.clone(), fields.len()).is_some() {
                return Err(Error::schema(
                    type_name,
                    format!("field `{}` declared twice", decl.name),
                ));
            }
            fields.push(FieldSchema::from_decl(decl));
        }

        match index.get(ID).map(|&i| &fields[i]) {
            None => return Err(Error::schema(type_name, "missing `id` field")),
            Some(id) if id.storage_type != StorageType::Text => {
                return Err(Error::schema(type_name, "`id` must be a text field"));
            }
            Some(_) => {}
        }

        Ok(Self {
            type_name: type_name.to_string(),
            table: type_name.to_lowercase(),
            fields,
            index,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Whether the type carries `deleted_at`.
    pub fn soft_delete(&self) -> bool {
        self.has(DELETED_AT)
    }
}

fn is_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decls() -> Vec<FieldDecl> {
        let mut fields = Model::fields();
        fields.extend([
            FieldDecl::of::<String>("name"),
            FieldDecl::of::<i64>("count"),
            FieldDecl::of::<f64>("ratio"),
            FieldDecl::of::<bool>("active"),
            FieldDecl::of::<HashMap<String, i64>>("meta"),
            FieldDecl::of::<Vec<String>>("tags"),
            FieldDecl::of::<Option<bool>>("flag"),
            FieldDecl::of::<Option<Vec<i64>>>("scores"),
        ]);
        fields
    }

    #[test]
    fn derives_storage_types_in_declaration_order() {
        let schema = Schema::build("Widget", decls()).unwrap();
        assert_eq!(schema.table(), "widget");
        let types: Vec<_> = schema
            .fields()
            .iter()
            .map(|f| (f.name.as_str(), f.storage_type))
            .collect();
        assert_eq!(
            types,
            vec![
                ("id", StorageType::Text),
                ("created_at", StorageType::Text),
                ("updated_at", StorageType::Text),
                ("deleted_at", StorageType::Text),
                ("name", StorageType::Text),
                ("count", StorageType::Integer),
                ("ratio", StorageType::Real),
                ("active", StorageType::Integer),
                ("meta", StorageType::Text),
                ("tags", StorageType::Text),
                ("flag", StorageType::Integer),
                ("scores", StorageType::Text),
            ]
        );
    }

    #[test]
    fn flags_json_and_bool_through_optional() {
        let schema = Schema::build("Widget", decls()).unwrap();
        assert!(schema.field("meta").unwrap().is_json);
        assert!(schema.field("scores").unwrap().is_json);
        assert!(schema.field("flag").unwrap().is_bool);
        assert!(!schema.field("count").unwrap().is_bool);
        assert!(schema.soft_delete());
    }

    #[test]
    fn unrecognized_types_store_as_text() {
        let opt = LogicalType::optional(LogicalType::Other("uuid"));
        assert_eq!(opt.storage_type(), StorageType::Text);
        assert!(!opt.is_json());
    }

    #[test]
    fn rejects_types_without_fields() {
        let err = Schema::build("Empty", Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn rejects_missing_or_non_text_id() {
        let err = Schema::build("NoId", vec![FieldDecl::of::<String>("name")]).unwrap_err();
        assert!(err.to_string().contains("missing `id`"));

        let err = Schema::build("IntId", vec![FieldDecl::of::<i64>("id")]).unwrap_err();
        assert!(err.to_string().contains("text field"));
    }

    #[test]
    fn rejects_bad_identifiers_and_duplicates() {
        let bad = vec![FieldDecl::of::<String>("id"), FieldDecl::of::<String>("na me")];
        assert!(Schema::build("Widget", bad).is_err());

        let dup = vec![FieldDecl::of::<String>("id"), FieldDecl::of::<String>("id")];
        assert!(Schema::build("Widget", dup).is_err());

        assert!(Schema::build("drop;table", Model::fields()).is_err());
    }

    #[test]
    fn soft_delete_requires_deleted_at() {
        let schema = Schema::build("Plain", vec![FieldDecl::of::<Option<String>>("id")]).unwrap();
        assert!(!schema.soft_delete());
        assert!(!schema.has(UPDATED_AT));
    }
}
