//! Relation schemas and version tables persisted through files.

use std::fs;

use anyhow::Result;
use ntest::timeout;
use tempfile::tempdir;

use odb_schema_core::codec::{ByteReader, ByteWriter};
use odb_schema_core::config::SchemaConfig;
use odb_schema_core::{
    DefaultFieldHandlerFactory, RelationSchema, RelationVersions, SchemaError,
};

use super::helpers::{order_schema_v1, order_schema_v2};

#[timeout(5000)]
#[test]
fn test_schema_file_round_trip() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("order.schema");
    let schema = order_schema_v2();
    fs::write(&path, schema.to_bytes())?;

    let bytes = fs::read(&path)?;
    let loaded = RelationSchema::from_bytes(
        &bytes,
        &DefaultFieldHandlerFactory::new(),
        &SchemaConfig::default(),
    )?;
    assert_eq!(loaded, schema);
    assert_eq!(loaded.secondary_key_index("byTotal")?, 2);
    Ok(())
}

#[timeout(5000)]
#[test]
fn test_version_table_survives_reload() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("order.versions");

    let mut versions = RelationVersions::new("order");
    versions.ensure_current(order_schema_v1())?;
    versions.ensure_current(order_schema_v2())?;
    let mut writer = ByteWriter::new();
    versions.save(&mut writer);
    fs::write(&path, writer.into_bytes())?;

    let bytes = fs::read(&path)?;
    let mut reloaded = RelationVersions::load(
        &mut ByteReader::new(&bytes),
        &DefaultFieldHandlerFactory::new(),
        &SchemaConfig::default(),
    )?;
    assert_eq!(reloaded.last_version(), Some(2));
    assert_eq!(reloaded.ensure_current(order_schema_v2())?, (2, false));
    Ok(())
}

#[test]
fn test_config_file_limits_apply_to_load() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("schema.json");
    fs::write(&path, r#"{ "max_fields": 2 }"#)?;

    let config = SchemaConfig::from_file(&path)?;
    assert_eq!(config.max_fields, 2);
    let err = RelationSchema::from_bytes(
        &order_schema_v1().to_bytes(),
        &DefaultFieldHandlerFactory::new(),
        &config,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SchemaError::LimitExceeded {
            what: "value field count",
            value: 3,
            limit: 2
        }
    ));
    Ok(())
}

#[test]
fn test_missing_config_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = SchemaConfig::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SchemaError::Io(_)));
}
