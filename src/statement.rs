//! Parameterized SQL for a bound table.
//!
//! Identifiers come from a validated [`Schema`] and are always quoted;
//! values are always bound as parameters.

use crate::schema::{is_auto_field, Schema, CREATED_AT, DELETED_AT, ID, UPDATED_AT};
use crate::value::Value;

/// SQL text with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    /// Create a statement with no parameters
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Attach positional parameters
    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }
}

/// 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

impl Pagination {
    /// Row offset; pages below 1 count as page 1.
    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1).saturating_mul(self.per_page)
    }
}

/// Equality conditions, AND-combined. A null value matches `IS NULL`.
pub type Conditions = [(String, Value)];

/// Builds the statements of one table from its schema.
pub struct StatementBuilder<'a> {
    schema: &'a Schema,
    table: String,
}

impl<'a> StatementBuilder<'a> {
    /// Create a builder for the table described by `schema`
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            table: quote(schema.table()),
            schema,
        }
    }

    pub fn create_table(&self) -> Statement {
        let columns: Vec<String> = self
            .schema
            .fields()
            .iter()
            .map(|f| {
                if f.name == ID {
                    format!("{} TEXT PRIMARY KEY", quote(ID))
                } else {
                    format!("{} {}", quote(&f.name), f.storage_type.as_sql())
                }
            })
            .collect();
        Statement::new(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table,
            columns.join(", ")
        ))
    }

    pub fn drop_table(&self) -> Statement {
        Statement::new(format!("DROP TABLE IF EXISTS {}", self.table))
    }

    /// Insert one record under a fresh `id`, stamping `created_at` and
    /// `updated_at` when the type has them. Auto-managed names in
    /// `fields` are ignored.
    pub fn insert(&self, id: &str, fields: Vec<(String, Value)>, now: &str) -> Statement {
        let mut row: Vec<(String, Value)> = vec![(ID.to_string(), Value::from(id))];
        for stamp in [CREATED_AT, UPDATED_AT] {
            if self.schema.has(stamp) {
                row.push((stamp.to_string(), Value::from(now)));
            }
        }
        row.extend(
            fields
                .into_iter()
                .filter(|(name, _)| !is_auto_field(name)),
        );

        let columns: Vec<String> = row.iter().map(|(name, _)| quote(name)).collect();
        let placeholders = vec!["?"; row.len()].join(", ");
        Statement::new(format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            self.table,
            columns.join(", ")
        ))
        .with_params(row.into_iter().map(|(_, value)| value).collect())
    }

    pub fn select(
        &self,
        conditions: &Conditions,
        include_deleted: bool,
        pagination: Option<Pagination>,
    ) -> Statement {
        let mut sql = format!("SELECT * FROM {}", self.table);
        let params = self.append_where(&mut sql, conditions, include_deleted);
        if let Some(p) = pagination {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", p.per_page, p.offset()));
        }
        Statement::new(sql).with_params(params)
    }

    pub fn select_by_id(&self, id: &Value) -> Statement {
        Statement::new(format!("SELECT * FROM {} WHERE {} = ?", self.table, quote(ID)))
            .with_params(vec![id.clone()])
    }

    /// `None` when nothing is left to set once the reserved fields are
    /// stripped and the type has no `updated_at` to bump.
    pub fn update(&self, id: &Value, fields: Vec<(String, Value)>, now: &str) -> Option<Statement> {
        let mut set: Vec<(String, Value)> = fields
            .into_iter()
            .filter(|(name, _)| !matches!(name.as_str(), ID | CREATED_AT | DELETED_AT | UPDATED_AT))
            .collect();
        if self.schema.has(UPDATED_AT) {
            set.push((UPDATED_AT.to_string(), Value::from(now)));
        }
        if set.is_empty() {
            return None;
        }

        let clause: Vec<String> = set.iter().map(|(name, _)| format!("{} = ?", quote(name))).collect();
        let mut params: Vec<Value> = set.into_iter().map(|(_, value)| value).collect();
        params.push(id.clone());
        Some(
            Statement::new(format!(
                "UPDATE {} SET {} WHERE {} = ?",
                self.table,
                clause.join(", "),
                quote(ID)
            ))
            .with_params(params),
        )
    }

    /// Marks matching live rows deleted. Only meaningful for types with
    /// `deleted_at`.
    pub fn soft_delete(&self, conditions: &Conditions, now: &str) -> Statement {
        let mut sql = format!("UPDATE {} SET {} = ?", self.table, quote(DELETED_AT));
        let mut params = vec![Value::from(now)];
        params.extend(self.append_where(&mut sql, conditions, false));
        Statement::new(sql).with_params(params)
    }

    pub fn hard_delete(&self, conditions: &Conditions) -> Statement {
        let mut sql = format!("DELETE FROM {}", self.table);
        let params = self.append_where(&mut sql, conditions, true);
        Statement::new(sql).with_params(params)
    }

    pub fn count(&self, conditions: &Conditions, include_deleted: bool) -> Statement {
        let mut sql = format!("SELECT COUNT(*) AS total FROM {}", self.table);
        let params = self.append_where(&mut sql, conditions, include_deleted);
        Statement::new(sql).with_params(params)
    }

    fn append_where(&self, sql: &mut String, conditions: &Conditions, include_deleted: bool) -> Vec<Value> {
        let mut clauses = Vec::with_capacity(conditions.len() + 1);
        let mut params = Vec::with_capacity(conditions.len());
        for (name, value) in conditions {
            if value.is_null() {
                clauses.push(format!("{} IS NULL", quote(name)));
            } else {
                clauses.push(format!("{} = ?", quote(name)));
                params.push(value.clone());
            }
        }
        if self.schema.soft_delete() && !include_deleted {
            clauses.push(format!("{} IS NULL", quote(DELETED_AT)));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        params
    }
}

fn quote(ident: &str) -> String {
    format!("\"{ident}\"")
}
