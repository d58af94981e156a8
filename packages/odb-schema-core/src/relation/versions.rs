//! Per-relation table of persisted schema versions.

use std::collections::BTreeMap;
use std::sync::Arc;

use crc32fast::Hasher;

use super::schema::RelationSchema;
use crate::codec::{ByteReader, ByteWriter};
use crate::config::SchemaConfig;
use crate::error::SchemaError;
use crate::field::FieldHandlerFactory;

/// Every schema version a relation has been stored under.
///
/// Versions are numbered from 1. Old versions stay loadable so rows written
/// under them can still be decoded after the code's schema has moved on.
#[derive(Debug, Clone, Default)]
pub struct RelationVersions {
    relation: String,
    versions: BTreeMap<u32, Arc<RelationSchema>>,
}

fn checksum(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

impl RelationVersions {
    /// Creates an empty version table for `relation`.
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            versions: BTreeMap::new(),
        }
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Highest version number, if any version exists.
    pub fn last_version(&self) -> Option<u32> {
        self.versions.keys().next_back().copied()
    }

    pub fn get(&self, version: u32) -> Option<&Arc<RelationSchema>> {
        self.versions.get(&version)
    }

    /// Schema of the highest version.
    pub fn current(&self) -> Option<&Arc<RelationSchema>> {
        self.versions.values().next_back()
    }

    /// Versions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Arc<RelationSchema>)> {
        self.versions.iter().map(|(&version, schema)| (version, schema))
    }

    /// Makes `schema` the current version.
    ///
    /// If it is structurally equal to the current version nothing is added and
    /// `(current_version, false)` is returned. Otherwise it is appended as the
    /// next version and `(new_version, true)` is returned.
    pub fn ensure_current(&mut self, schema: RelationSchema) -> Result<(u32, bool), SchemaError> {
        if let Some(last) = self.last_version() {
            if self.versions[&last].as_ref() == &schema {
                return Ok((last, false));
            }
        }
        let version = match self.last_version() {
            None => 1,
            Some(last) => last.checked_add(1).ok_or_else(|| {
                SchemaError::DataCorruption(format!(
                    "Relation '{}' ran out of version numbers",
                    self.relation
                ))
            })?,
        };
        self.versions.insert(version, Arc::new(schema));
        tracing::debug!(
            "Relation '{}' schema changed, stored as version {}",
            self.relation,
            version
        );
        Ok((version, true))
    }

    /// Appends every version, each framed with its byte length and a CRC32.
    pub fn save(&self, writer: &mut ByteWriter) {
        writer.write_string(&self.relation);
        writer.write_varint_u32(self.versions.len() as u32);
        for (&version, schema) in &self.versions {
            let blob = schema.to_bytes();
            writer.write_varint_u32(version);
            writer.write_varint_u64(blob.len() as u64);
            writer.write_u32_le(checksum(&blob));
            writer.write_bytes_raw(&blob);
        }
    }

    /// Reads a version table written by [`RelationVersions::save`].
    ///
    /// Fails on the first version whose checksum does not match or whose
    /// schema blob does not decode completely.
    pub fn load(
        reader: &mut ByteReader<'_>,
        factory: &dyn FieldHandlerFactory,
        config: &SchemaConfig,
    ) -> Result<Self, SchemaError> {
        let relation = reader.read_string(config.max_string_len)?;
        let count = reader.read_count("relation version count", config.max_versions)?;
        let mut versions = BTreeMap::new();
        for _ in 0..count {
            let offset = reader.position();
            let version = reader.read_varint_u32()?;
            let len = reader.read_varint_u64()?;
            if len > u64::from(config.max_schema_bytes) {
                return Err(SchemaError::LimitExceeded {
                    what: "relation schema bytes",
                    value: len,
                    limit: u64::from(config.max_schema_bytes),
                });
            }
            let expected = reader.read_u32_le()?;
            let blob = reader.read_raw(len as usize)?;
            let actual = checksum(blob);
            if actual != expected {
                tracing::warn!(
                    "Relation '{}' version {} failed checksum verification",
                    relation,
                    version
                );
                return Err(SchemaError::ChecksumMismatch {
                    version,
                    expected,
                    actual,
                });
            }
            let schema = RelationSchema::from_bytes(blob, factory, config)?;
            if versions.insert(version, Arc::new(schema)).is_some() {
                return Err(SchemaError::Malformed {
                    offset,
                    message: format!("duplicate relation version {}", version),
                });
            }
        }
        Ok(Self { relation, versions })
    }
}
