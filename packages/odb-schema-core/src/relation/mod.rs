//! Relation schemas, their persisted versions and row upgrade planning.

mod key;
mod persist;
mod schema;
mod upgrade;
mod versions;

pub use key::{FieldId, SecondaryKeyAttribute, SecondaryKeyInfo};
pub use schema::RelationSchema;
pub use upgrade::{plan_value_upgrade, FieldSource, UpgradePlan};
pub use versions::RelationVersions;
