//! Built-in conversion operations.
//!
//! Numeric conversions follow Rust's `as` cast rules: integer to integer
//! truncates or sign-reinterprets to the destination width, float to integer
//! saturates (NaN becomes 0), integer to float rounds to nearest.

use odb_types::{Decimal, Type, Value};
use rust_decimal::prelude::FromPrimitive;

use super::ConvertFn;
use crate::error::SchemaError;

/// Source types of the numeric conversion matrix.
pub const NUMERIC_SOURCE_TYPES: [Type; 10] = [
    Type::U8,
    Type::I8,
    Type::U16,
    Type::I16,
    Type::U32,
    Type::I32,
    Type::U64,
    Type::I64,
    Type::F32,
    Type::F64,
];

/// Destination types of the numeric matrix, in registration order.
pub const NUMERIC_TARGETS: [(Type, ConvertFn); 10] = [
    (Type::I64, to_i64),
    (Type::U64, to_u64),
    (Type::I32, to_i32),
    (Type::U32, to_u32),
    (Type::I16, to_i16),
    (Type::U16, to_u16),
    (Type::I8, to_i8),
    (Type::U8, to_u8),
    (Type::F64, to_f64),
    (Type::F32, to_f32),
];

/// A named single-argument conversion registered for exactly one type pair.
#[derive(Debug, Clone, Copy)]
pub struct NamedConversion {
    pub name: &'static str,
    pub from: Type,
    pub to: Type,
    pub op: ConvertFn,
}

/// Named conversions, registered after the numeric matrix in this order.
pub const NAMED_CONVERSIONS: [NamedConversion; 12] = [
    NamedConversion {
        name: "f64_to_string",
        from: Type::F64,
        to: Type::String,
        op: f64_to_string,
    },
    NamedConversion {
        name: "bool_to_string",
        from: Type::Bool,
        to: Type::String,
        op: bool_to_string,
    },
    NamedConversion {
        name: "i64_to_string",
        from: Type::I64,
        to: Type::String,
        op: i64_to_string,
    },
    NamedConversion {
        name: "u64_to_string",
        from: Type::U64,
        to: Type::String,
        op: u64_to_string,
    },
    NamedConversion {
        name: "decimal_to_string",
        from: Type::Decimal,
        to: Type::String,
        op: decimal_to_string,
    },
    NamedConversion {
        name: "i64_to_decimal",
        from: Type::I64,
        to: Type::Decimal,
        op: i64_to_decimal,
    },
    NamedConversion {
        name: "u64_to_decimal",
        from: Type::U64,
        to: Type::Decimal,
        op: u64_to_decimal,
    },
    NamedConversion {
        name: "i32_to_decimal",
        from: Type::I32,
        to: Type::Decimal,
        op: i32_to_decimal,
    },
    NamedConversion {
        name: "u32_to_decimal",
        from: Type::U32,
        to: Type::Decimal,
        op: u32_to_decimal,
    },
    NamedConversion {
        name: "f64_to_decimal",
        from: Type::F64,
        to: Type::Decimal,
        op: f64_to_decimal,
    },
    NamedConversion {
        name: "f32_to_decimal",
        from: Type::F32,
        to: Type::Decimal,
        op: f32_to_decimal,
    },
    NamedConversion {
        name: "i32_to_bool",
        from: Type::I32,
        to: Type::Bool,
        op: i32_to_bool,
    },
];

fn unexpected(value: &Value, to: Type) -> SchemaError {
    SchemaError::ConversionFailed {
        from: value.ty(),
        to,
        message: "unsupported source value".to_string(),
    }
}

macro_rules! numeric_cast {
    ($($name:ident => $target:ty, $variant:ident;)*) => {
        $(
            #[allow(clippy::unnecessary_cast)]
            fn $name(value: Value) -> Result<Value, SchemaError> {
                let converted = match value {
                    Value::U8(v) => v as $target,
                    Value::I8(v) => v as $target,
                    Value::U16(v) => v as $target,
                    Value::I16(v) => v as $target,
                    Value::U32(v) => v as $target,
                    Value::I32(v) => v as $target,
                    Value::U64(v) => v as $target,
                    Value::I64(v) => v as $target,
                    Value::F32(v) => v as $target,
                    Value::F64(v) => v as $target,
                    ref other => return Err(unexpected(other, Type::$variant)),
                };
                Ok(Value::$variant(converted))
            }
        )*
    };
}

numeric_cast! {
    to_i64 => i64, I64;
    to_u64 => u64, U64;
    to_i32 => i32, I32;
    to_u32 => u32, U32;
    to_i16 => i16, I16;
    to_u16 => u16, U16;
    to_i8 => i8, I8;
    to_u8 => u8, U8;
    to_f64 => f64, F64;
    to_f32 => f32, F32;
}

fn f64_to_string(value: Value) -> Result<Value, SchemaError> {
    match value {
        Value::F64(v) => Ok(Value::String(v.to_string())),
        ref other => Err(unexpected(other, Type::String)),
    }
}

fn bool_to_string(value: Value) -> Result<Value, SchemaError> {
    match value {
        Value::Bool(v) => Ok(Value::String(if v { "1" } else { "0" }.to_string())),
        ref other => Err(unexpected(other, Type::String)),
    }
}

fn i64_to_string(value: Value) -> Result<Value, SchemaError> {
    match value {
        Value::I64(v) => Ok(Value::String(v.to_string())),
        ref other => Err(unexpected(other, Type::String)),
    }
}

fn u64_to_string(value: Value) -> Result<Value, SchemaError> {
    match value {
        Value::U64(v) => Ok(Value::String(v.to_string())),
        ref other => Err(unexpected(other, Type::String)),
    }
}

fn decimal_to_string(value: Value) -> Result<Value, SchemaError> {
    match value {
        Value::Decimal(v) => Ok(Value::String(v.to_string())),
        ref other => Err(unexpected(other, Type::String)),
    }
}

fn i64_to_decimal(value: Value) -> Result<Value, SchemaError> {
    match value {
        Value::I64(v) => Ok(Value::Decimal(Decimal::from(v))),
        ref other => Err(unexpected(other, Type::Decimal)),
    }
}

fn u64_to_decimal(value: Value) -> Result<Value, SchemaError> {
    match value {
        Value::U64(v) => Ok(Value::Decimal(Decimal::from(v))),
        ref other => Err(unexpected(other, Type::Decimal)),
    }
}

fn i32_to_decimal(value: Value) -> Result<Value, SchemaError> {
    match value {
        Value::I32(v) => Ok(Value::Decimal(Decimal::from(v))),
        ref other => Err(unexpected(other, Type::Decimal)),
    }
}

fn u32_to_decimal(value: Value) -> Result<Value, SchemaError> {
    match value {
        Value::U32(v) => Ok(Value::Decimal(Decimal::from(v))),
        ref other => Err(unexpected(other, Type::Decimal)),
    }
}

fn float_out_of_range(from: Type, shown: String) -> SchemaError {
    SchemaError::ConversionFailed {
        from,
        to: Type::Decimal,
        message: format!("{} is not representable as a decimal", shown),
    }
}

fn f64_to_decimal(value: Value) -> Result<Value, SchemaError> {
    match value {
        Value::F64(v) => Decimal::from_f64(v)
            .map(Value::Decimal)
            .ok_or_else(|| float_out_of_range(Type::F64, v.to_string())),
        ref other => Err(unexpected(other, Type::Decimal)),
    }
}

fn f32_to_decimal(value: Value) -> Result<Value, SchemaError> {
    match value {
        Value::F32(v) => Decimal::from_f32(v)
            .map(Value::Decimal)
            .ok_or_else(|| float_out_of_range(Type::F32, v.to_string())),
        ref other => Err(unexpected(other, Type::Decimal)),
    }
}

fn i32_to_bool(value: Value) -> Result<Value, SchemaError> {
    match value {
        Value::I32(v) => Ok(Value::Bool(v != 0)),
        ref other => Err(unexpected(other, Type::Bool)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_conversions_never_target_matrix_pairs() {
        for named in NAMED_CONVERSIONS {
            let in_matrix = NUMERIC_SOURCE_TYPES.contains(&named.from)
                && NUMERIC_TARGETS.iter().any(|(to, _)| *to == named.to);
            assert!(!in_matrix, "{} overlaps the numeric matrix", named.name);
        }
    }

    #[test]
    fn test_cast_functions_reject_non_numeric() {
        assert!(to_i32(Value::Bool(true)).is_err());
        assert!(to_f64(Value::from("1")).is_err());
        assert!(to_u8(Value::I128(1)).is_err());
    }

    #[test]
    fn test_string_renderings() {
        assert_eq!(
            f64_to_string(Value::F64(1.5)).unwrap(),
            Value::from("1.5")
        );
        assert_eq!(
            f64_to_string(Value::F64(-0.25)).unwrap(),
            Value::from("-0.25")
        );
        assert_eq!(bool_to_string(Value::Bool(true)).unwrap(), Value::from("1"));
        assert_eq!(bool_to_string(Value::Bool(false)).unwrap(), Value::from("0"));
        assert_eq!(
            i64_to_string(Value::I64(i64::MIN)).unwrap(),
            Value::from("-9223372036854775808")
        );
        assert_eq!(
            u64_to_string(Value::U64(u64::MAX)).unwrap(),
            Value::from("18446744073709551615")
        );
        assert_eq!(
            decimal_to_string(Value::Decimal(Decimal::new(1050, 2))).unwrap(),
            Value::from("10.50")
        );
    }

    #[test]
    fn test_decimal_conversions() {
        assert_eq!(
            i32_to_decimal(Value::I32(-7)).unwrap(),
            Value::Decimal(Decimal::from(-7))
        );
        assert_eq!(
            u64_to_decimal(Value::U64(u64::MAX)).unwrap(),
            Value::Decimal(Decimal::from(u64::MAX))
        );
        assert_eq!(
            f64_to_decimal(Value::F64(2.5)).unwrap(),
            Value::Decimal(Decimal::new(25, 1))
        );
        assert!(matches!(
            f64_to_decimal(Value::F64(f64::NAN)),
            Err(SchemaError::ConversionFailed { from: Type::F64, to: Type::Decimal, .. })
        ));
        assert!(f32_to_decimal(Value::F32(f32::INFINITY)).is_err());
    }

    #[test]
    fn test_i32_to_bool_nonzero_is_true() {
        assert_eq!(i32_to_bool(Value::I32(0)).unwrap(), Value::Bool(false));
        assert_eq!(i32_to_bool(Value::I32(-3)).unwrap(), Value::Bool(true));
    }
}
