//! Reading rows written under an older relation version.

use anyhow::Result;
use ntest::timeout;

use odb_schema_core::codec::{ByteReader, ByteWriter};
use odb_schema_core::config::SchemaConfig;
use odb_schema_core::{
    plan_value_upgrade, DefaultFieldHandlerFactory, FieldSource, RelationSchema,
    RelationVersions, SchemaError, TableFieldInfo, TypeConversionRegistry,
};
use odb_types::{Decimal, Type, Value};

use super::helpers::{order_schema_v1, order_schema_v2};

#[timeout(5000)]
#[test]
fn test_rows_from_reloaded_old_version_upgrade() -> Result<()> {
    let mut versions = RelationVersions::new("order");
    versions.ensure_current(order_schema_v1())?;
    versions.ensure_current(order_schema_v2())?;
    let mut writer = ByteWriter::new();
    versions.save(&mut writer);
    let bytes = writer.into_bytes();

    let loaded = RelationVersions::load(
        &mut ByteReader::new(&bytes),
        &DefaultFieldHandlerFactory::new(),
        &SchemaConfig::default(),
    )?;
    let stored = loaded.get(1).expect("version 1");
    let current = loaded.current().expect("current version");

    let plan = plan_value_upgrade(stored, current, TypeConversionRegistry::global())?;
    assert_eq!(plan.dropped(), &["note".to_string()]);
    assert!(matches!(plan.sources()[2], FieldSource::Default));

    let row = plan.apply(vec![
        Value::I32(3),
        Value::I32(1250),
        Value::from("leave at door"),
    ])?;
    assert_eq!(
        row,
        vec![
            Some(Value::Decimal(Decimal::from(3))),
            Some(Value::I64(1250)),
            None
        ]
    );
    Ok(())
}

#[test]
fn test_narrowing_upgrade_truncates() -> Result<()> {
    let stored = RelationSchema::without_secondary_keys(
        Vec::new(),
        vec![TableFieldInfo::primitive("count", Type::I16)],
    );
    let current = RelationSchema::without_secondary_keys(
        Vec::new(),
        vec![TableFieldInfo::primitive("count", Type::I8)],
    );
    let plan = plan_value_upgrade(&stored, &current, TypeConversionRegistry::global())?;
    assert_eq!(plan.apply(vec![Value::I16(300)])?, vec![Some(Value::I8(44))]);
    Ok(())
}

#[test]
fn test_downgrade_to_older_version_is_rejected() {
    let err = plan_value_upgrade(
        &order_schema_v2(),
        &order_schema_v1(),
        TypeConversionRegistry::global(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SchemaError::IncompatibleFieldType { ref field, .. } if field == "status"
    ));
}

#[test]
fn test_value_of_wrong_type_fails_apply() -> Result<()> {
    let plan = plan_value_upgrade(
        &order_schema_v1(),
        &order_schema_v2(),
        TypeConversionRegistry::global(),
    )?;
    let err = plan
        .apply(vec![Value::I64(3), Value::I32(1), Value::from("x")])
        .unwrap_err();
    assert_eq!(
        err,
        SchemaError::ConversionTypeMismatch {
            expected: Type::I32,
            got: Type::I64
        }
    );
    Ok(())
}
