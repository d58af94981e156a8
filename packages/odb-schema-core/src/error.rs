//! Schema core error types.

use odb_types::Type;
use thiserror::Error;

/// Errors raised by conversion, schema derivation, and schema decoding.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Secondary key index not registered in the schema
    #[error("Unknown secondary key {index}")]
    UnknownSecondaryKey { index: u32 },

    /// Secondary key name not registered in the schema
    #[error("Unknown secondary key '{name}'")]
    UnknownSecondaryKeyName { name: String },

    /// Secondary key annotation refers to a primary key order that does not exist
    #[error("Secondary key '{index_name}' includes unknown primary key order {order}")]
    UnknownPrimaryKeyOrder { index_name: String, order: u32 },

    /// Secondary key annotation placed on a value field index out of range
    #[error("Value field index {index} out of range (value field count: {count})")]
    UnknownValueField { index: u32, count: usize },

    /// Secondary key numbering ran past `u32::MAX`
    #[error("Secondary key index overflow starting at {first_index}")]
    SecondaryKeyIndexOverflow { first_index: u32 },

    /// Stream ended before a complete value could be read
    #[error("Truncated input at offset {offset}: {needed} more byte(s) needed")]
    Truncated { offset: usize, needed: usize },

    /// Stream contained bytes that do not form a valid value
    #[error("Malformed input at offset {offset}: {message}")]
    Malformed { offset: usize, message: String },

    /// A decoded count or length exceeded the configured limit
    #[error("{what} {value} exceeds limit {limit}")]
    LimitExceeded {
        what: &'static str,
        value: u64,
        limit: u64,
    },

    /// Decoded schema violates a structural invariant
    #[error("Data corruption detected: {0}")]
    DataCorruption(String),

    /// Persisted relation version failed checksum verification
    #[error("Checksum mismatch for relation version {version}: stored {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch {
        version: u32,
        expected: u32,
        actual: u32,
    },

    /// Field handler name not known to the handler factory
    #[error("Unknown field handler '{name}'")]
    UnknownFieldHandler { name: String },

    /// Field handler name registered twice on one factory
    #[error("Field handler '{name}' already registered")]
    HandlerAlreadyRegistered { name: String },

    /// Conversion applied to a value of the wrong source type
    #[error("Conversion type mismatch: expected {expected}, got {got}")]
    ConversionTypeMismatch { expected: Type, got: Type },

    /// Conversion could not represent the value in the destination type
    #[error("Cannot convert {from} to {to}: {message}")]
    ConversionFailed {
        from: Type,
        to: Type,
        message: String,
    },

    /// Stored field cannot be read under the current field type
    #[error("Field '{field}' stored as {from} cannot be read as {to}")]
    IncompatibleFieldType {
        field: String,
        from: String,
        to: String,
    },

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error while reading or writing schema files
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SchemaError {
    fn from(error: std::io::Error) -> Self {
        SchemaError::Io(error.to_string())
    }
}
