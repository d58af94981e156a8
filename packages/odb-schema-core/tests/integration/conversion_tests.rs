//! Conversion registry checked against Rust's own numeric casts.

use ntest::timeout;
use odb_schema_core::conversion::NUMERIC_SOURCE_TYPES;
use odb_schema_core::{TypeConversionRegistry, TypeConvertor};
use odb_types::{Type, Value};
use proptest::prelude::*;

fn convert(from: Type, to: Type, value: Value) -> Value {
    TypeConversionRegistry::global()
        .generate_conversion(from, to)
        .unwrap()
        .apply(value)
        .unwrap()
}

proptest! {
    #[test]
    fn prop_i32_narrowing_matches_cast(v in any::<i32>()) {
        prop_assert_eq!(convert(Type::I32, Type::U32, Value::I32(v)), Value::U32(v as u32));
        prop_assert_eq!(convert(Type::I32, Type::I8, Value::I32(v)), Value::I8(v as i8));
        prop_assert_eq!(convert(Type::I32, Type::U16, Value::I32(v)), Value::U16(v as u16));
        prop_assert_eq!(convert(Type::I32, Type::F32, Value::I32(v)), Value::F32(v as f32));
    }

    #[test]
    fn prop_u64_conversions_match_cast(v in any::<u64>()) {
        prop_assert_eq!(convert(Type::U64, Type::I64, Value::U64(v)), Value::I64(v as i64));
        prop_assert_eq!(convert(Type::U64, Type::U8, Value::U64(v)), Value::U8(v as u8));
        prop_assert_eq!(convert(Type::U64, Type::F64, Value::U64(v)), Value::F64(v as f64));
        prop_assert_eq!(convert(Type::U64, Type::String, Value::U64(v)), Value::String(v.to_string()));
    }

    #[test]
    fn prop_finite_f64_to_integers_saturate(v in -1.0e20f64..1.0e20f64) {
        prop_assert_eq!(convert(Type::F64, Type::I32, Value::F64(v)), Value::I32(v as i32));
        prop_assert_eq!(convert(Type::F64, Type::U16, Value::F64(v)), Value::U16(v as u16));
        prop_assert_eq!(convert(Type::F64, Type::I64, Value::F64(v)), Value::I64(v as i64));
    }

    #[test]
    fn prop_i32_to_bool_is_nonzero(v in any::<i32>()) {
        prop_assert_eq!(convert(Type::I32, Type::Bool, Value::I32(v)), Value::Bool(v != 0));
    }
}

#[timeout(1000)]
#[test]
fn test_every_type_converts_to_itself() {
    let registry = TypeConversionRegistry::global();
    for ty in Type::ALL {
        let conversion = registry.generate_conversion(ty, ty).unwrap();
        assert!(conversion.is_identity(), "{} is not identity", ty);
    }
}

#[test]
fn test_text_never_converts_out() {
    let registry = TypeConversionRegistry::global();
    for ty in Type::ALL {
        if ty != Type::String {
            assert!(registry.generate_conversion(Type::String, ty).is_none());
        }
    }
    assert!(registry.generate_conversion(Type::Decimal, Type::F64).is_none());
}

#[test]
fn test_numeric_sources_reach_all_numeric_targets() {
    let registry = TypeConversionRegistry::global();
    for from in NUMERIC_SOURCE_TYPES {
        for to in NUMERIC_SOURCE_TYPES {
            assert!(
                registry.generate_conversion(from, to).is_some(),
                "{} -> {}",
                from,
                to
            );
        }
        assert!(registry.generate_conversion(from, Type::I128).is_none());
    }
}

#[test]
fn test_reachable_through_trait_object() {
    let convertor: &dyn TypeConvertor = TypeConversionRegistry::global();
    assert_eq!(
        convertor.find_reachable_type(Type::U16, &|ty| ty == Type::Decimal),
        None
    );
    assert_eq!(
        convertor.find_reachable_type(Type::U32, &|ty| ty == Type::Decimal),
        Some(Type::Decimal)
    );
    assert_eq!(
        convertor.find_reachable_type(Type::Bool, &|ty| ty == Type::Bool),
        Some(Type::Bool)
    );
}
