//! Dynamically typed field values.

use rust_decimal::Decimal;

use crate::types::Type;

/// Value representation for relation fields.
///
/// This enum can hold any value that corresponds to a [`Type`] variant.
/// Type conversions take a `Value` of the source type and produce a `Value`
/// of the destination type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 8-bit signed integer
    I8(i8),
    /// 16-bit signed integer
    I16(i16),
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer
    I64(i64),
    /// 128-bit signed integer
    I128(i128),
    /// 8-bit unsigned integer
    U8(u8),
    /// 16-bit unsigned integer
    U16(u16),
    /// 32-bit unsigned integer
    U32(u32),
    /// 64-bit unsigned integer
    U64(u64),
    /// 128-bit unsigned integer
    U128(u128),
    /// 32-bit floating point number
    F32(f32),
    /// 64-bit floating point number
    F64(f64),
    /// Boolean value
    Bool(bool),
    /// UTF-8 string
    String(String),
    /// Fixed point decimal
    Decimal(Decimal),
}

impl Value {
    /// Returns the type of this value.
    pub fn ty(&self) -> Type {
        match self {
            Value::I8(_) => Type::I8,
            Value::I16(_) => Type::I16,
            Value::I32(_) => Type::I32,
            Value::I64(_) => Type::I64,
            Value::I128(_) => Type::I128,
            Value::U8(_) => Type::U8,
            Value::U16(_) => Type::U16,
            Value::U32(_) => Type::U32,
            Value::U64(_) => Type::U64,
            Value::U128(_) => Type::U128,
            Value::F32(_) => Type::F32,
            Value::F64(_) => Type::F64,
            Value::Bool(_) => Type::Bool,
            Value::String(_) => Type::String,
            Value::Decimal(_) => Type::Decimal,
        }
    }
}

macro_rules! impl_from_primitive {
    ($($prim:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$prim> for Value {
                fn from(value: $prim) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_primitive! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    f32 => F32,
    f64 => F64,
    bool => Bool,
    String => String,
    Decimal => Decimal,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}
