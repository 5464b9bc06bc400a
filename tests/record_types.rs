// Record declarations covering every field kind, driven through a real table.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlow::{Config, Database, Error, Input, JournalMode, Query, Record, StorageType};
use std::collections::HashMap;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct MyData {
    id: Option<String>,
    text_field: String,
    number_field: i32,
    boolean_field: bool,
    float_field: f64,
    vector_field: Vec<i32>,
    map_field: HashMap<String, i32>,
    maybe_flag: Option<bool>,
    maybe_tags: Option<Vec<String>>,
    seen_at: Option<DateTime<Utc>>,
}

sqlow::record!(MyData {
    id: Option<String>,
    text_field: String,
    number_field: i32,
    boolean_field: bool,
    float_field: f64,
    vector_field: Vec<i32>,
    map_field: HashMap<String, i32>,
    maybe_flag: Option<bool>,
    maybe_tags: Option<Vec<String>>,
    seen_at: Option<DateTime<Utc>>,
});

impl MyData {
    fn sample() -> Self {
        Self {
            id: None,
            text_field: "test".to_string(),
            number_field: 5,
            boolean_field: true,
            float_field: 1500.5,
            vector_field: vec![1, 2, 3],
            map_field: HashMap::from([("a".to_string(), 1), ("b".to_string(), 2)]),
            maybe_flag: Some(false),
            maybe_tags: None,
            seen_at: Some("2024-05-01T12:30:00Z".parse().unwrap()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Counter {
    id: Option<String>,
    hits: u64,
}

sqlow::record!(Counter { id: Option<String>, hits: u64 });

#[derive(Debug, Serialize, Deserialize)]
struct Headless {
    name: String,
}

sqlow::record!(Headless { name: String });

#[derive(Debug, Serialize, Deserialize)]
struct Empty {}

sqlow::record!(Empty {});

fn create_temp_db() -> (Database, TempDir) {
    let dir = TempDir::new().unwrap();
    let db = Database::open(dir.path().join("types.db"));
    (db, dir)
}

#[test]
fn test_declared_field_schema() {
    let schema = sqlow::Schema::of::<MyData>().unwrap();
    assert_eq!(schema.table(), "mydata");
    assert_eq!(MyData::fields().len(), schema.fields().len());

    let storage = |name: &str| schema.field(name).unwrap().storage_type;
    assert_eq!(storage("number_field"), StorageType::Integer);
    assert_eq!(storage("boolean_field"), StorageType::Integer);
    assert_eq!(storage("float_field"), StorageType::Real);
    assert_eq!(storage("vector_field"), StorageType::Text);
    assert_eq!(storage("map_field"), StorageType::Text);
    assert_eq!(storage("maybe_flag"), StorageType::Integer);
    assert_eq!(storage("seen_at"), StorageType::Text);
    assert!(!schema.soft_delete());
}

#[test]
fn test_every_field_kind_round_trips() -> Result<()> {
    let (db, _dir) = create_temp_db();
    let table = db.table::<MyData>()?;

    let created = table.create([Input::Instance(MyData::sample())])?;
    assert_eq!(created.len(), 1);
    let stored = &created[0];
    assert!(stored.id.is_some());
    assert_eq!(
        MyData {
            id: None,
            ..stored.clone()
        },
        MyData::sample()
    );

    let read = table.read(&Query::new().where_eq("boolean_field", true))?;
    assert_eq!(read, created);
    Ok(())
}

#[test]
fn test_empty_and_false_values_round_trip() -> Result<()> {
    let (db, _dir) = create_temp_db();
    let table = db.table::<MyData>()?;

    let created = table.create([Input::fields(json!({
        "text_field": "",
        "number_field": 0,
        "boolean_field": false,
        "float_field": 0.0,
        "vector_field": [],
        "map_field": {},
        "maybe_flag": null,
        "maybe_tags": [],
    }))?])?;
    let item = &created[0];
    assert_eq!(item.text_field, "");
    assert!(!item.boolean_field);
    assert!(item.vector_field.is_empty());
    assert!(item.map_field.is_empty());
    assert_eq!(item.maybe_flag, None);
    assert_eq!(item.maybe_tags, Some(Vec::new()));
    assert_eq!(item.seen_at, None);
    Ok(())
}

#[test]
fn test_json_field_filters_match_encoded_form() -> Result<()> {
    let (db, _dir) = create_temp_db();
    let table = db.table::<MyData>()?;
    table.create([Input::Instance(MyData::sample())])?;

    let hits = table.read(&Query::new().where_eq("vector_field", json!([1, 2, 3])))?;
    assert_eq!(hits.len(), 1);
    let misses = table.read(&Query::new().where_eq("vector_field", json!([3, 2, 1])))?;
    assert!(misses.is_empty());
    Ok(())
}

#[test]
fn test_scalar_field_rejects_structures() -> Result<()> {
    let (db, _dir) = create_temp_db();
    let table = db.table::<MyData>()?;
    let err = table
        .create([Input::fields(json!({"text_field": {"nested": true}}))?])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    Ok(())
}

#[test]
fn test_non_object_input_is_rejected() {
    let err = Input::<MyData>::fields(json!("text_field")).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn test_binding_rejects_invalid_record_types() {
    let (db, _dir) = create_temp_db();
    assert!(matches!(db.table::<Headless>(), Err(Error::Schema { .. })));
    assert!(matches!(db.table::<Empty>(), Err(Error::Schema { .. })));
}

#[test]
fn test_wal_database() -> Result<()> {
    let dir = TempDir::new()?;
    let db = Database::new(Config::new(dir.path().join("wal.db")).with_journal_mode(JournalMode::Wal));
    assert_eq!(db.config().journal_mode, JournalMode::Wal);

    let table = db.table::<MyData>()?;
    table.create([Input::Instance(MyData::sample())])?;
    assert_eq!(table.count(&Query::new())?.total, 1);
    Ok(())
}

#[test]
fn test_out_of_range_integer_is_rejected_before_write() -> Result<()> {
    let (db, _dir) = create_temp_db();
    let counters = db.table::<Counter>()?;
    counters.create([Input::fields(json!({"hits": 3}))?])?;

    let err = counters
        .create([Input::Instance(Counter { id: None, hits: u64::MAX })])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(counters.count(&Query::new())?.total, 1);
    assert_eq!(counters.read(&Query::new())?.len(), 1);
    Ok(())
}

#[test]
fn test_wrong_kind_of_value_is_rejected_before_write() -> Result<()> {
    let (db, _dir) = create_temp_db();
    let counters = db.table::<Counter>()?;
    let existing = counters.create([Input::fields(json!({"hits": 3}))?])?.remove(0);

    let err = counters.create([Input::fields(json!({"hits": "many"}))?]).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let err = counters
        .update([Input::fields(json!({"id": existing.id, "hits": "lots"}))?])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    assert_eq!(counters.count(&Query::new())?.total, 1);
    assert_eq!(counters.read(&Query::new())?, vec![existing]);
    Ok(())
}
