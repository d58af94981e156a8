//! Shared fixtures for integration tests.

use std::collections::BTreeMap;

use odb_schema_core::{RelationSchema, SecondaryKeyAttribute, TableFieldInfo};
use odb_types::Type;

/// Primary key fields of the `order` relation keyed by declared order.
pub fn order_primary_keys() -> BTreeMap<u32, TableFieldInfo> {
    let mut pks = BTreeMap::new();
    pks.insert(1, TableFieldInfo::primitive("customer_id", Type::U64));
    pks.insert(2, TableFieldInfo::primitive("order_id", Type::U64));
    pks
}

/// First shipped version of the `order` relation.
pub fn order_schema_v1() -> RelationSchema {
    let fields = vec![
        TableFieldInfo::primitive("status", Type::I32),
        TableFieldInfo::primitive("total", Type::I32),
        TableFieldInfo::primitive("note", Type::String),
    ];
    let mut annotations = BTreeMap::new();
    annotations.insert(
        0,
        vec![SecondaryKeyAttribute::new("byStatus", 0).include_primary_key(2)],
    );
    RelationSchema::new(order_primary_keys(), &annotations, fields, 1).unwrap()
}

/// Second version: `total` widened to i64, `status` became a decimal code,
/// `note` dropped and `shipped` added.
pub fn order_schema_v2() -> RelationSchema {
    let fields = vec![
        TableFieldInfo::primitive("status", Type::Decimal),
        TableFieldInfo::primitive("total", Type::I64),
        TableFieldInfo::primitive("shipped", Type::Bool),
    ];
    let mut annotations = BTreeMap::new();
    annotations.insert(
        0,
        vec![SecondaryKeyAttribute::new("byStatus", 0).include_primary_key(2)],
    );
    annotations.insert(1, vec![SecondaryKeyAttribute::new("byTotal", 0)]);
    RelationSchema::new(order_primary_keys(), &annotations, fields, 1).unwrap()
}
