//! Schema evolution core for an embedded object database.
//!
//! Provides the type conversion registry used when a stored field's type
//! differs from the type current code expects, field descriptors, the
//! versioned relation schema with secondary key derivation, its binary
//! encoding, and the per-relation version table.

pub mod codec;
pub mod config;
pub mod conversion;
pub mod error;
pub mod field;
pub mod relation;

pub use conversion::{Conversion, TypeConversionRegistry, TypeConvertor};
pub use error::SchemaError;
pub use field::{
    DefaultFieldHandlerFactory, FieldHandler, FieldHandlerFactory, PrimitiveFieldHandler,
    TableFieldInfo,
};
pub use relation::{
    plan_value_upgrade, FieldId, FieldSource, RelationSchema, RelationVersions,
    SecondaryKeyAttribute, SecondaryKeyInfo, UpgradePlan,
};
