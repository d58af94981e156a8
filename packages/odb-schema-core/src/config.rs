//! Schema decoding configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Limits applied while decoding persisted relation schemas.
///
/// Every count and length read from a stream is checked against these before
/// anything is allocated, so a corrupted blob fails instead of exhausting memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Maximum primary key or value field count per schema
    pub max_fields: u32,
    /// Maximum secondary key count per schema
    pub max_secondary_keys: u32,
    /// Maximum field references inside one secondary key
    pub max_key_fields: u32,
    /// Maximum byte length of any persisted string
    pub max_string_len: u32,
    /// Maximum byte length of a field handler configuration blob
    pub max_handler_config_len: u32,
    /// Maximum number of persisted versions per relation
    pub max_versions: u32,
    /// Maximum byte length of one encoded relation schema
    pub max_schema_bytes: u32,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            max_fields: 4096,
            max_secondary_keys: 1024,
            max_key_fields: 256,
            max_string_len: 64 * 1024,
            max_handler_config_len: 1024 * 1024,
            max_versions: 65_536,
            max_schema_bytes: 16 * 1024 * 1024,
        }
    }
}

impl SchemaConfig {
    /// Parses a configuration from JSON. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(json).map_err(|e| SchemaError::Config(e.to_string()))
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SchemaError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }
}
