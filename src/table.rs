//! CRUD surface for one record type bound to one table.
//!
//! Every operation takes and returns lists so single-record and batch
//! calls read the same. Inputs are resolved and encoded up front; a bad
//! field name or a missing id aborts the call before anything is written.
//! Each call then runs on its own connection. Statements within a call
//! are not wrapped in a transaction, so an insert and its re-read (or a
//! delete and its preceding read) are not atomic together.
//!
//! Rows come back in the engine's natural order; no ORDER BY is applied.

use crate::codec::{decode_row, encode, encode_fields, FieldMap};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::schema::{is_auto_field, Record, Schema, CREATED_AT, DELETED_AT, ID, UPDATED_AT};
use crate::sqlite::{with_session, Row, Session};
use crate::statement::{Conditions, Pagination, StatementBuilder};
use crate::value::Value;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const DEFAULT_PER_PAGE: u64 = 10;

/// A record given to `create`, `update` or `delete`.
#[derive(Debug, Clone, PartialEq)]
pub enum Input<T> {
    Fields(FieldMap),
    Instance(T),
}

impl<T> Input<T> {
    /// Wraps a JSON object as a field map.
    pub fn fields(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(map) => Ok(Input::Fields(map)),
            other => Err(Error::InvalidInput(format!(
                "expected a field map, got {}",
                json_kind(&other)
            ))),
        }
    }
}

impl<T> From<FieldMap> for Input<T> {
    fn from(map: FieldMap) -> Self {
        Input::Fields(map)
    }
}

/// Equality filters plus visibility and paging options for `read` and
/// `count`.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    filters: FieldMap,
    include_deleted: bool,
    page: Option<u64>,
    per_page: u64,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            filters: FieldMap::new(),
            include_deleted: false,
            page: None,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(filters: FieldMap) -> Self {
        Self {
            filters,
            ..Self::default()
        }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<JsonValue>) -> Self {
        self.filters.insert(field.to_string(), value.into());
        self
    }

    /// Also match soft-deleted rows.
    pub fn include_deleted(mut self, include: bool) -> Self {
        self.include_deleted = include;
        self
    }

    /// 1-indexed page; `read` returns every match when unset.
    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn per_page(mut self, per_page: u64) -> Self {
        self.per_page = per_page;
        self
    }

    fn pagination(&self) -> Option<Pagination> {
        self.page.map(|page| Pagination {
            page,
            per_page: self.per_page,
        })
    }
}

/// Pagination info returned by [`Table::count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Count {
    pub total: u64,
    pub pages: u64,
    pub per_page: u64,
}

/// CRUD handle binding record type `T` to its table.
pub struct Table<T> {
    config: Arc<Config>,
    schema: Arc<Schema>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            schema: self.schema.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Record> Table<T> {
    /// Derives the schema of `T` and creates its table if missing.
    pub(crate) fn bind(config: Arc<Config>) -> Result<Self> {
        let schema = Schema::of::<T>()?;
        let stmt = StatementBuilder::new(&schema).create_table();
        with_session(&config, |session| session.run(&stmt))?;
        info!(
            table = schema.table(),
            fields = schema.fields().len(),
            soft_delete = schema.soft_delete(),
            "bound table"
        );
        Ok(Self {
            config,
            schema: Arc::new(schema),
            _marker: PhantomData,
        })
    }

    /// Table name, the lowercased type name
    pub fn name(&self) -> &str {
        self.schema.table()
    }

    /// Field schema derived from `T`
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Inserts records under fresh ids and returns them as stored.
    ///
    /// Auto-managed fields supplied by the caller are ignored.
    pub fn create<I>(&self, inputs: I) -> Result<Vec<T>>
    where
        I: IntoIterator<Item = Input<T>>,
    {
        let mut pending = Vec::new();
        for input in inputs {
            let fields: FieldMap = self
                .resolve(input)?
                .into_iter()
                .filter(|(name, _)| !is_auto_field(name))
                .collect();
            pending.push(encode_fields(&self.schema, &fields)?);
        }

        with_session(&self.config, |session| {
            let builder = self.builder();
            let mut created = Vec::with_capacity(pending.len());
            for fields in pending {
                let id = Uuid::new_v4().to_string();
                session.run(&builder.insert(&id, fields, &now()))?;
                if let Some(item) = self.fetch(session, &Value::from(id))? {
                    created.push(item);
                }
            }
            Ok(created)
        })
    }

    /// Returns matching records; soft-deleted ones only when asked for.
    pub fn read(&self, query: &Query) -> Result<Vec<T>> {
        let conditions = encode_fields(&self.schema, &query.filters)?;
        let stmt = self
            .builder()
            .select(&conditions, query.include_deleted, query.pagination());
        let rows = with_session(&self.config, |session| session.run(&stmt))?;
        rows.into_iter().map(|row| self.from_row(row)).collect()
    }

    /// Updates records by id, bumping `updated_at`, and returns them as
    /// stored. Records whose row is gone are left out of the result.
    pub fn update<I>(&self, inputs: I) -> Result<Vec<T>>
    where
        I: IntoIterator<Item = Input<T>>,
    {
        let mut pending = Vec::new();
        for input in inputs {
            let mut fields = self.resolve(input)?;
            let id = match fields.remove(ID) {
                Some(id) if !id.is_null() => self.encode_id(&id)?,
                _ => return Err(Error::MissingId("update")),
            };
            fields.retain(|name, _| !matches!(name.as_str(), CREATED_AT | DELETED_AT | UPDATED_AT));
            pending.push((id, encode_fields(&self.schema, &fields)?));
        }

        with_session(&self.config, |session| {
            let builder = self.builder();
            let mut updated = Vec::with_capacity(pending.len());
            for (id, fields) in pending {
                let Some(stmt) = builder.update(&id, fields, &now()) else {
                    continue;
                };
                session.run(&stmt)?;
                if let Some(item) = self.fetch(session, &id)? {
                    updated.push(item);
                }
            }
            Ok(updated)
        })
    }

    /// Deletes records and returns what was deleted.
    ///
    /// Each input is a filter (instances contribute only their id). With
    /// no inputs the whole table is affected. Types with `deleted_at` are
    /// soft-deleted unless `hard` is set; soft-deleted records come back
    /// with their new `deleted_at`, hard-deleted ones as they were.
    pub fn delete<I>(&self, inputs: I, hard: bool) -> Result<Vec<T>>
    where
        I: IntoIterator<Item = Input<T>>,
    {
        let mut filters = Vec::new();
        for input in inputs {
            let filter = match input {
                Input::Fields(map) => map,
                Input::Instance(item) => match self.instance_fields(&item)?.remove(ID) {
                    Some(id) if !id.is_null() => FieldMap::from_iter([(ID.to_string(), id)]),
                    _ => return Err(Error::MissingId("delete")),
                },
            };
            filters.push(encode_fields(&self.schema, &filter)?);
        }

        let soft = self.schema.soft_delete() && !hard;
        with_session(&self.config, |session| {
            if filters.is_empty() {
                return self.delete_matching(session, &[], soft, hard);
            }
            let mut deleted = Vec::new();
            for conditions in &filters {
                deleted.extend(self.delete_matching(session, conditions, soft, hard)?);
            }
            Ok(deleted)
        })
    }

    /// Counts matching records. `page` on the query is ignored.
    pub fn count(&self, query: &Query) -> Result<Count> {
        if query.per_page == 0 {
            return Err(Error::InvalidInput("per_page must be positive".to_string()));
        }
        let conditions = encode_fields(&self.schema, &query.filters)?;
        let stmt = self.builder().count(&conditions, query.include_deleted);
        let rows = with_session(&self.config, |session| session.run(&stmt))?;

        let total = match rows.first().and_then(|row| row.get("total")) {
            Some(Value::Integer(n)) => u64::try_from(*n).unwrap_or(0),
            _ => 0,
        };
        Ok(Count {
            total,
            pages: total.div_ceil(query.per_page),
            per_page: query.per_page,
        })
    }

    /// Drops the table and everything in it.
    pub fn drop(&self) -> Result<()> {
        let stmt = self.builder().drop_table();
        with_session(&self.config, |session| session.run(&stmt))?;
        info!(table = self.schema.table(), "dropped table");
        Ok(())
    }

    fn builder(&self) -> StatementBuilder<'_> {
        StatementBuilder::new(&self.schema)
    }

    fn resolve(&self, input: Input<T>) -> Result<FieldMap> {
        match input {
            Input::Fields(map) => Ok(map),
            Input::Instance(item) => self.instance_fields(&item),
        }
    }

    fn instance_fields(&self, item: &T) -> Result<FieldMap> {
        match serde_json::to_value(item)? {
            JsonValue::Object(map) => Ok(map),
            other => Err(Error::InvalidInput(format!(
                "expected {} to serialize as a field map, got {}",
                self.schema.type_name(),
                json_kind(&other)
            ))),
        }
    }

    fn encode_id(&self, id: &JsonValue) -> Result<Value> {
        let field = self
            .schema
            .field(ID)
            .ok_or_else(|| Error::UnknownField(ID.to_string()))?;
        encode(field, id)
    }

    fn fetch(&self, session: &Session, id: &Value) -> Result<Option<T>> {
        let stmt = self.builder().select_by_id(id);
        session
            .run(&stmt)?
            .into_iter()
            .next()
            .map(|row| self.from_row(row))
            .transpose()
    }

    fn delete_matching(
        &self,
        session: &Session,
        conditions: &Conditions,
        soft: bool,
        hard: bool,
    ) -> Result<Vec<T>> {
        let builder = self.builder();
        let rows = session.run(&builder.select(conditions, hard, None))?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut found = rows
            .into_iter()
            .map(|row| decode_row(&self.schema, row))
            .collect::<Result<Vec<_>>>()?;

        if soft {
            let now = now();
            session.run(&builder.soft_delete(conditions, &now))?;
            for fields in &mut found {
                fields.insert(DELETED_AT.to_string(), JsonValue::String(now.clone()));
            }
        } else {
            session.run(&builder.hard_delete(conditions))?;
        }
        found.into_iter().map(|fields| self.build(fields)).collect()
    }

    fn from_row(&self, row: Row) -> Result<T> {
        self.build(decode_row(&self.schema, row)?)
    }

    fn build(&self, fields: FieldMap) -> Result<T> {
        Ok(serde_json::from_value(JsonValue::Object(fields))?)
    }
}

/// Current UTC time, RFC 3339 with microseconds.
fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
