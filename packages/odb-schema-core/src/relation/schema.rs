//! Relation schema: field layout and secondary keys of one relation version.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::key::{FieldId, SecondaryKeyAttribute, SecondaryKeyInfo};
use crate::error::SchemaError;
use crate::field::TableFieldInfo;

/// Shape of one version of one relation.
///
/// Holds the primary key fields in key encoding order, the value fields, and
/// the secondary keys addressable both by numeric index and by name. Built
/// either from field annotations of the current code or by loading a
/// persisted version; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RelationSchema {
    pub(super) primary_key_fields: Vec<TableFieldInfo>,
    pub(super) fields: Vec<TableFieldInfo>,
    pub(super) secondary_keys: BTreeMap<u32, SecondaryKeyInfo>,
    pub(super) secondary_key_names: HashMap<String, u32>,
}

impl RelationSchema {
    /// Builds a schema from annotated fields.
    ///
    /// # Arguments
    /// * `primary_key_fields` - Primary key fields keyed by declared key order
    /// * `secondary_keys` - Secondary key annotations keyed by value field index
    /// * `fields` - Value fields
    /// * `first_index` - Numeric index given to the first derived secondary key
    ///
    /// Secondary keys are numbered consecutively from `first_index` in the
    /// order their names are first seen, walking value fields in ascending
    /// index order.
    pub fn new(
        primary_key_fields: BTreeMap<u32, TableFieldInfo>,
        secondary_keys: &BTreeMap<u32, Vec<SecondaryKeyAttribute>>,
        fields: Vec<TableFieldInfo>,
        first_index: u32,
    ) -> Result<Self, SchemaError> {
        let primary_key_orders: Vec<u32> = primary_key_fields.keys().copied().collect();
        let derived = derive_secondary_keys(
            secondary_keys,
            &primary_key_orders,
            fields.len(),
            first_index,
        )?;

        let mut schema = Self {
            primary_key_fields: primary_key_fields.into_values().collect(),
            fields,
            secondary_keys: BTreeMap::new(),
            secondary_key_names: HashMap::new(),
        };
        for info in derived {
            schema
                .secondary_key_names
                .insert(info.name().to_string(), info.index());
            schema.secondary_keys.insert(info.index(), info);
        }

        tracing::debug!(
            "Derived {} secondary keys starting at index {}",
            schema.secondary_keys.len(),
            first_index
        );
        Ok(schema)
    }

    /// Builds a schema without secondary keys.
    pub fn without_secondary_keys(
        primary_key_fields: Vec<TableFieldInfo>,
        fields: Vec<TableFieldInfo>,
    ) -> Self {
        Self {
            primary_key_fields,
            fields,
            secondary_keys: BTreeMap::new(),
            secondary_key_names: HashMap::new(),
        }
    }

    /// Looks a field up by name, value fields first, then primary key fields.
    pub fn field(&self, name: &str) -> Option<&TableFieldInfo> {
        self.fields
            .iter()
            .chain(self.primary_key_fields.iter())
            .find(|field| field.name() == name)
    }

    pub fn value_fields(&self) -> &[TableFieldInfo] {
        &self.fields
    }

    /// Primary key fields in key encoding order.
    pub fn primary_key_fields(&self) -> &[TableFieldInfo] {
        &self.primary_key_fields
    }

    /// Primary key fields followed by value fields.
    pub fn all_fields(&self) -> impl Iterator<Item = &TableFieldInfo> {
        self.primary_key_fields.iter().chain(self.fields.iter())
    }

    pub fn has_secondary_keys(&self) -> bool {
        !self.secondary_keys.is_empty()
    }

    /// Secondary keys with the index they are registered under, ascending.
    ///
    /// The registered index equals the descriptor's own index for derived
    /// schemas. A loaded schema may register a descriptor under another index;
    /// lookups by index use the registered one.
    pub fn secondary_keys(&self) -> impl Iterator<Item = (u32, &SecondaryKeyInfo)> {
        self.secondary_keys.iter().map(|(&index, info)| (index, info))
    }

    pub fn secondary_key(&self, index: u32) -> Option<&SecondaryKeyInfo> {
        self.secondary_keys.get(&index)
    }

    fn secondary_key_or_err(&self, index: u32) -> Result<&SecondaryKeyInfo, SchemaError> {
        self.secondary_keys
            .get(&index)
            .ok_or(SchemaError::UnknownSecondaryKey { index })
    }

    fn resolve(&self, field: FieldId) -> Result<&TableFieldInfo, SchemaError> {
        let list = if field.is_from_primary_key() {
            &self.primary_key_fields
        } else {
            &self.fields
        };
        list.get(field.index() as usize).ok_or_else(|| {
            SchemaError::DataCorruption(format!(
                "Field reference {:?} out of range",
                field
            ))
        })
    }

    /// Resolves every field reference of secondary key `index`, in key order.
    pub fn secondary_key_fields(&self, index: u32) -> Result<Vec<&TableFieldInfo>, SchemaError> {
        let info = self.secondary_key_or_err(index)?;
        info.fields()
            .iter()
            .map(|&field| self.resolve(field))
            .collect()
    }

    /// Primary key fields not embedded in secondary key `index`.
    ///
    /// These must be stored in the index entry's value so the full primary
    /// key can be rebuilt from an index lookup. Declaration order is kept.
    pub fn secondary_key_value_keys(
        &self,
        index: u32,
    ) -> Result<Vec<&TableFieldInfo>, SchemaError> {
        let info = self.secondary_key_or_err(index)?;
        Ok(self
            .primary_key_fields
            .iter()
            .enumerate()
            .filter(|(pk_index, _)| !info.contains_primary_key(*pk_index as u32))
            .map(|(_, field)| field)
            .collect())
    }

    /// Numeric index of the secondary key called `name`.
    pub fn secondary_key_index(&self, name: &str) -> Result<u32, SchemaError> {
        self.secondary_key_names
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::UnknownSecondaryKeyName {
                name: name.to_string(),
            })
    }

    /// Any value field's handler needs a decoding context.
    pub fn needs_context(&self) -> bool {
        self.fields.iter().any(|f| f.handler().needs_context())
    }

    /// Any value field's handler needs post-load initialization.
    pub fn needs_init(&self) -> bool {
        self.fields.iter().any(|f| f.handler().needs_init())
    }

    /// Any value field owns content that must be released on delete/overwrite.
    pub fn needs_free_content(&self) -> bool {
        self.fields.iter().any(|f| f.handler().needs_free_content())
    }

    /// Checks the invariants every schema must satisfy.
    ///
    /// Name and index maps agree with each other, descriptor indices are
    /// distinct, every secondary key has at least one field, and every field
    /// reference is in range.
    pub(super) fn validate(&self) -> Result<(), SchemaError> {
        if self.secondary_key_names.len() != self.secondary_keys.len() {
            return Err(SchemaError::DataCorruption(format!(
                "{} secondary key names for {} secondary keys",
                self.secondary_key_names.len(),
                self.secondary_keys.len()
            )));
        }
        for (name, index) in &self.secondary_key_names {
            match self.secondary_keys.get(index) {
                Some(info) if info.name() == name => {}
                Some(info) => {
                    return Err(SchemaError::DataCorruption(format!(
                        "Secondary key name '{}' maps to index {} named '{}'",
                        name,
                        index,
                        info.name()
                    )))
                }
                None => {
                    return Err(SchemaError::DataCorruption(format!(
                        "Secondary key name '{}' maps to missing index {}",
                        name, index
                    )))
                }
            }
        }
        let mut descriptor_indices = HashSet::with_capacity(self.secondary_keys.len());
        for info in self.secondary_keys.values() {
            if !descriptor_indices.insert(info.index()) {
                return Err(SchemaError::DataCorruption(format!(
                    "Secondary key '{}' reuses descriptor index {}",
                    info.name(),
                    info.index()
                )));
            }
            if info.fields().is_empty() {
                return Err(SchemaError::DataCorruption(format!(
                    "Secondary key '{}' has no fields",
                    info.name()
                )));
            }
            for &field in info.fields() {
                self.resolve(field)?;
            }
        }
        Ok(())
    }
}

/// Structural equality: primary key fields, secondary keys by index, and
/// value fields must all match in order.
impl PartialEq for RelationSchema {
    fn eq(&self, other: &Self) -> bool {
        self.primary_key_fields == other.primary_key_fields
            && self.secondary_keys == other.secondary_keys
            && self.fields == other.fields
    }
}

impl Eq for RelationSchema {}

/// Derives secondary key descriptors from per-field annotations.
///
/// Annotations sharing a name and an `order` keep ascending value field index
/// order (stable sort).
fn derive_secondary_keys(
    attributes: &BTreeMap<u32, Vec<SecondaryKeyAttribute>>,
    primary_key_orders: &[u32],
    value_field_count: usize,
    first_index: u32,
) -> Result<Vec<SecondaryKeyInfo>, SchemaError> {
    let mut names: Vec<&str> = Vec::new();
    for (&field_index, attrs) in attributes {
        if field_index as usize >= value_field_count {
            return Err(SchemaError::UnknownValueField {
                index: field_index,
                count: value_field_count,
            });
        }
        for attr in attrs {
            if !names.contains(&attr.name.as_str()) {
                names.push(&attr.name);
            }
        }
    }

    let mut derived = Vec::with_capacity(names.len());
    let mut next_index = Some(first_index);
    for name in names {
        let index = next_index.ok_or(SchemaError::SecondaryKeyIndexOverflow { first_index })?;
        next_index = index.checked_add(1);

        let mut members: Vec<(u32, &SecondaryKeyAttribute)> = attributes
            .iter()
            .filter_map(|(&field_index, attrs)| {
                attrs
                    .iter()
                    .find(|attr| attr.name == name)
                    .map(|attr| (field_index, attr))
            })
            .collect();
        members.sort_by_key(|(_, attr)| attr.order);

        let mut fields = Vec::with_capacity(members.len());
        for (field_index, attr) in members {
            fields.push(FieldId::value(field_index));
            if attr.include_primary_key_order != 0 {
                let position = primary_key_orders
                    .binary_search(&attr.include_primary_key_order)
                    .map_err(|_| SchemaError::UnknownPrimaryKeyOrder {
                        index_name: name.to_string(),
                        order: attr.include_primary_key_order,
                    })?;
                fields.push(FieldId::primary_key(position as u32));
            }
        }
        derived.push(SecondaryKeyInfo::new(name, index, fields));
    }
    Ok(derived)
}
