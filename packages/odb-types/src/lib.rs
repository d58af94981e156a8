//! Shared types for the object database schema core.
//!
//! This crate defines the primitive field types a stored value can carry and
//! the dynamically typed [`Value`] that type conversions operate on.

pub mod types;
pub mod value;

pub use types::{Type, TypeParseError};
pub use value::Value;

pub use rust_decimal::Decimal;
