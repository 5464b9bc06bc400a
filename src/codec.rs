//! Conversion between logical field values and storage scalars.

use crate::error::{Error, Result};
use crate::schema::{FieldSchema, LogicalType, Schema};
use crate::sqlite::Row;
use crate::value::Value;
use serde_json::{Number, Value as JsonValue};

/// Field name to logical value.
pub type FieldMap = serde_json::Map<String, JsonValue>;

/// Encodes one logical value for storage.
///
/// The value must match the field's declared type, so anything written
/// can be decoded back. Booleans are bound as [`Value::Boolean`] and land
/// as INTEGER 0/1.
pub fn encode(field: &FieldSchema, value: &JsonValue) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let mismatch = |expected: &str| {
        Error::InvalidInput(format!("field `{}` expects {expected}", field.name))
    };
    match (field.logical_type.resolved(), value) {
        (LogicalType::Mapping, JsonValue::Object(_)) | (LogicalType::Sequence, JsonValue::Array(_)) => {
            Ok(Value::Text(serde_json::to_string(value)?))
        }
        (LogicalType::Mapping, _) => Err(mismatch("an object")),
        (LogicalType::Sequence, _) => Err(mismatch("an array")),
        (LogicalType::Integer, JsonValue::Number(n)) => {
            n.as_i64().map(Value::Integer).ok_or_else(|| mismatch("a 64-bit signed integer"))
        }
        (LogicalType::Integer, _) => Err(mismatch("an integer")),
        (LogicalType::Real, JsonValue::Number(n)) => match n.as_i64() {
            Some(i) => Ok(Value::Integer(i)),
            None => n.as_f64().map(Value::Real).ok_or_else(|| mismatch("a number")),
        },
        (LogicalType::Real, _) => Err(mismatch("a number")),
        (LogicalType::Text, JsonValue::String(s)) => Ok(Value::Text(s.clone())),
        (LogicalType::Text, _) => Err(mismatch("a string")),
        (LogicalType::Boolean, JsonValue::Bool(b)) => Ok(Value::Boolean(*b)),
        (LogicalType::Boolean, _) => Err(mismatch("a boolean")),
        (_, JsonValue::Bool(b)) => Ok(Value::Boolean(*b)),
        (_, JsonValue::Number(n)) => Ok(match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Real(n.as_f64().unwrap_or(f64::NAN)),
        }),
        (_, JsonValue::String(s)) => Ok(Value::Text(s.clone())),
        (_, JsonValue::Array(_) | JsonValue::Object(_)) => Err(mismatch("a scalar value")),
        (_, JsonValue::Null) => Ok(Value::Null),
    }
}

/// Decodes one stored scalar back into its logical value.
pub fn decode(field: &FieldSchema, value: Value) -> Result<JsonValue> {
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Text(s) if field.is_json => serde_json::from_str(&s)?,
        Value::Integer(i) if field.is_bool => JsonValue::Bool(i != 0),
        Value::Real(r) if field.is_bool => JsonValue::Bool(r != 0.0),
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::Integer(i) => JsonValue::Number(i.into()),
        Value::Real(r) => Number::from_f64(r).map_or(JsonValue::Null, JsonValue::Number),
        Value::Text(s) => JsonValue::String(s),
    })
}

/// Encodes a caller-supplied field map, rejecting names outside the schema.
pub fn encode_fields(schema: &Schema, fields: &FieldMap) -> Result<Vec<(String, Value)>> {
    fields
        .iter()
        .map(|(name, value)| {
            let field = schema
                .field(name)
                .ok_or_else(|| Error::UnknownField(name.clone()))?;
            Ok((name.clone(), encode(field, value)?))
        })
        .collect()
}

/// Decodes a row into a field map covering every schema field.
///
/// Columns missing from the row decode as null.
pub fn decode_row(schema: &Schema, mut row: Row) -> Result<FieldMap> {
    let mut map = FieldMap::new();
    for field in schema.fields() {
        let value = row.remove(&field.name).unwrap_or(Value::Null);
        map.insert(field.name.clone(), decode(field, value)?);
    }
    Ok(map)
}
