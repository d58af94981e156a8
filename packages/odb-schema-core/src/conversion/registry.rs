use std::collections::HashMap;
use std::sync::OnceLock;

use odb_types::Type;

use super::builtin::{NAMED_CONVERSIONS, NUMERIC_SOURCE_TYPES, NUMERIC_TARGETS};
use super::{Conversion, TypeConvertor};

static GLOBAL_REGISTRY: OnceLock<TypeConversionRegistry> = OnceLock::new();

/// Registry of conversions between primitive types.
///
/// Keyed by `(from, to)` with at most one conversion per pair. Entries keep
/// their registration order, which is the order `find_reachable_type` scans.
/// Immutable once built; share it by reference across decode paths.
#[derive(Debug, Clone, Default)]
pub struct TypeConversionRegistry {
    conversions: Vec<Conversion>,
    index: HashMap<(Type, Type), usize>,
}

impl TypeConversionRegistry {
    /// Creates a registry holding the built-in conversion table.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for (to, op) in NUMERIC_TARGETS {
            for from in NUMERIC_SOURCE_TYPES {
                registry.insert(Conversion::new(from, to, op));
            }
        }
        for named in NAMED_CONVERSIONS {
            registry.insert(Conversion::new(named.from, named.to, named.op));
        }
        tracing::trace!(
            "Built type conversion registry with {} conversions",
            registry.len()
        );
        registry
    }

    /// Creates a registry with no conversions; only identities resolve.
    pub fn empty() -> Self {
        Self {
            conversions: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Returns the process-wide built-in registry, building it on first use.
    pub fn global() -> &'static TypeConversionRegistry {
        GLOBAL_REGISTRY.get_or_init(TypeConversionRegistry::new)
    }

    /// Adds a conversion, replacing any existing one for the same pair.
    #[must_use]
    pub fn with_conversion(mut self, conversion: Conversion) -> Self {
        self.insert(conversion);
        self
    }

    // A replaced pair keeps its original scan position.
    fn insert(&mut self, conversion: Conversion) {
        let key = (conversion.from_type(), conversion.to_type());
        match self.index.get(&key) {
            Some(&slot) => self.conversions[slot] = conversion,
            None => {
                self.index.insert(key, self.conversions.len());
                self.conversions.push(conversion);
            }
        }
    }

    /// Number of registered (non-identity) conversions.
    pub fn len(&self) -> usize {
        self.conversions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversions.is_empty()
    }

    /// Iterates registered conversions in registration order.
    pub fn conversions(&self) -> impl Iterator<Item = &Conversion> {
        self.conversions.iter()
    }

    /// Returns the conversion from `from` to `to`.
    ///
    /// Equal types yield the identity even when the type has no table entry.
    /// `None` means a value stored as `from` cannot be read as `to`; the
    /// caller decides whether that is fatal.
    pub fn generate_conversion(&self, from: Type, to: Type) -> Option<Conversion> {
        if from == to {
            return Some(Conversion::identity(from));
        }
        self.index
            .get(&(from, to))
            .map(|&slot| self.conversions[slot])
    }

    /// Returns `from` if it satisfies `predicate`; otherwise the destination of
    /// the first registered conversion out of `from` that satisfies it.
    ///
    /// Only direct conversions are considered. A type reachable solely through
    /// an intermediate type is not found.
    pub fn find_reachable_type<P>(&self, from: Type, predicate: P) -> Option<Type>
    where
        P: Fn(Type) -> bool,
    {
        if predicate(from) {
            return Some(from);
        }
        self.conversions
            .iter()
            .filter(|conversion| conversion.from_type() == from)
            .map(Conversion::to_type)
            .find(|&to| predicate(to))
    }
}

impl TypeConvertor for TypeConversionRegistry {
    fn generate_conversion(&self, from: Type, to: Type) -> Option<Conversion> {
        TypeConversionRegistry::generate_conversion(self, from, to)
    }

    fn find_reachable_type(&self, from: Type, predicate: &dyn Fn(Type) -> bool) -> Option<Type> {
        TypeConversionRegistry::find_reachable_type(self, from, predicate)
    }
}
