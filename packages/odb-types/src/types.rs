//! Primitive field type definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a type name cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("unknown type name '{name}'")]
pub struct TypeParseError {
    /// The rejected name.
    pub name: String,
}

/// Primitive field types a stored relation field can be declared with.
///
/// Each variant names the Rust primitive (or library type) a field handler
/// decodes into. The type conversion registry is keyed by pairs of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    /// 8-bit signed integer
    I8,
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 128-bit signed integer
    I128,
    /// 8-bit unsigned integer
    U8,
    /// 16-bit unsigned integer
    U16,
    /// 32-bit unsigned integer
    U32,
    /// 64-bit unsigned integer
    U64,
    /// 128-bit unsigned integer
    U128,
    /// 32-bit floating point number
    F32,
    /// 64-bit floating point number
    F64,
    /// Boolean value
    Bool,
    /// UTF-8 string
    String,
    /// 96-bit fixed point decimal
    Decimal,
}

impl Type {
    /// Every primitive type, in declaration order.
    pub const ALL: [Type; 15] = [
        Type::I8,
        Type::I16,
        Type::I32,
        Type::I64,
        Type::I128,
        Type::U8,
        Type::U16,
        Type::U32,
        Type::U64,
        Type::U128,
        Type::F32,
        Type::F64,
        Type::Bool,
        Type::String,
        Type::Decimal,
    ];

    /// Returns the lowercase name used in handler names and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Type::I8 => "i8",
            Type::I16 => "i16",
            Type::I32 => "i32",
            Type::I64 => "i64",
            Type::I128 => "i128",
            Type::U8 => "u8",
            Type::U16 => "u16",
            Type::U32 => "u32",
            Type::U64 => "u64",
            Type::U128 => "u128",
            Type::F32 => "f32",
            Type::F64 => "f64",
            Type::Bool => "bool",
            Type::String => "string",
            Type::Decimal => "decimal",
        }
    }

    /// Returns `true` if this type is an integer type.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Type::I8
                | Type::I16
                | Type::I32
                | Type::I64
                | Type::I128
                | Type::U8
                | Type::U16
                | Type::U32
                | Type::U64
                | Type::U128
        )
    }

    /// Returns `true` if this type is a signed integer type.
    pub fn is_signed_integer(&self) -> bool {
        matches!(
            self,
            Type::I8 | Type::I16 | Type::I32 | Type::I64 | Type::I128
        )
    }

    /// Returns `true` if this type is a floating point type.
    pub fn is_float(&self) -> bool {
        matches!(self, Type::F32 | Type::F64)
    }

    /// Returns `true` if this type is numeric (integer or float).
    ///
    /// `Decimal` is not counted: it has its own conversion rules.
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Type {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Type::ALL
            .iter()
            .copied()
            .find(|ty| ty.name() == s)
            .ok_or_else(|| TypeParseError {
                name: s.to_string(),
            })
    }
}
