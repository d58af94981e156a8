//! Type conversion resolution for reading stored fields under a new type.
//!
//! A value persisted as one primitive type may be read back by code that now
//! declares the field with another type. The registry decides whether that is
//! possible and hands the decode path a [`Conversion`] to apply.

mod builtin;
mod registry;

use std::fmt;

use odb_types::{Type, Value};

use crate::error::SchemaError;

pub use builtin::{NamedConversion, NAMED_CONVERSIONS, NUMERIC_SOURCE_TYPES, NUMERIC_TARGETS};
pub use registry::TypeConversionRegistry;

/// Signature of a single conversion operation.
pub type ConvertFn = fn(Value) -> Result<Value, SchemaError>;

/// A resolved conversion from one primitive type to another.
///
/// Cheap to copy; holds a plain function pointer. The identity conversion
/// carries no operation at all and hands the value through untouched.
#[derive(Clone, Copy)]
pub struct Conversion {
    from: Type,
    to: Type,
    op: Option<ConvertFn>,
}

impl Conversion {
    /// Creates a conversion that applies `op` to values of type `from`.
    pub fn new(from: Type, to: Type, op: ConvertFn) -> Self {
        Self {
            from,
            to,
            op: Some(op),
        }
    }

    /// The no-op conversion for `ty`.
    pub fn identity(ty: Type) -> Self {
        Self {
            from: ty,
            to: ty,
            op: None,
        }
    }

    pub fn from_type(&self) -> Type {
        self.from
    }

    pub fn to_type(&self) -> Type {
        self.to
    }

    /// Returns `true` for the pass-through conversion.
    pub fn is_identity(&self) -> bool {
        self.op.is_none()
    }

    /// Converts `value`, which must be of this conversion's source type.
    pub fn apply(&self, value: Value) -> Result<Value, SchemaError> {
        if value.ty() != self.from {
            return Err(SchemaError::ConversionTypeMismatch {
                expected: self.from,
                got: value.ty(),
            });
        }
        match self.op {
            None => Ok(value),
            Some(op) => op(value),
        }
    }
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversion")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("identity", &self.is_identity())
            .finish()
    }
}

/// Resolves conversions between primitive types.
///
/// The field decode path depends on this trait rather than on the concrete
/// registry so a relation can be opened with a custom conversion policy.
pub trait TypeConvertor: Send + Sync {
    /// Returns the conversion from `from` to `to`, or `None` if values of
    /// `from` cannot be read as `to`. Equal types always yield the identity.
    fn generate_conversion(&self, from: Type, to: Type) -> Option<Conversion>;

    /// Returns `from` if it satisfies `predicate`, otherwise the first type
    /// directly convertible from `from` that does. Follows a single hop only.
    fn find_reachable_type(&self, from: Type, predicate: &dyn Fn(Type) -> bool) -> Option<Type>;
}
