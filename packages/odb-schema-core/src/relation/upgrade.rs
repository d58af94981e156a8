//! Mapping rows stored under an older relation version onto the current one.

use odb_types::Value;

use super::schema::RelationSchema;
use crate::conversion::{Conversion, TypeConvertor};
use crate::error::SchemaError;
use crate::field::TableFieldInfo;

/// Where a current value field gets its data from when reading an old row.
#[derive(Debug, Clone, Copy)]
pub enum FieldSource {
    /// The stored field at `index`, passed through `conversion` if the type
    /// changed. Custom handlers with unchanged descriptors carry `None`.
    Stored {
        index: usize,
        conversion: Option<Conversion>,
    },
    /// No stored field with this name; the reader fills in a default.
    Default,
}

/// Per-field recipe for reading a stored row under the current schema.
#[derive(Debug, Clone)]
pub struct UpgradePlan {
    sources: Vec<FieldSource>,
    dropped: Vec<String>,
    stored_len: usize,
}

impl UpgradePlan {
    /// One source per current value field, in current field order.
    pub fn sources(&self) -> &[FieldSource] {
        &self.sources
    }

    /// Names of stored value fields the current schema no longer has.
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    /// Returns `true` when stored rows can be used as they are.
    pub fn is_identity(&self) -> bool {
        self.dropped.is_empty()
            && self.stored_len == self.sources.len()
            && self.sources.iter().enumerate().all(|(i, source)| match source {
                FieldSource::Stored { index, conversion } => {
                    *index == i && conversion.map_or(true, |c| c.is_identity())
                }
                FieldSource::Default => false,
            })
    }

    /// Rearranges and converts one decoded stored row into the current
    /// layout. `None` marks a field the caller must default.
    pub fn apply(&self, stored_values: Vec<Value>) -> Result<Vec<Option<Value>>, SchemaError> {
        if stored_values.len() != self.stored_len {
            return Err(SchemaError::DataCorruption(format!(
                "Stored row has {} values, schema expects {}",
                stored_values.len(),
                self.stored_len
            )));
        }
        let mut stored: Vec<Option<Value>> = stored_values.into_iter().map(Some).collect();
        let mut row = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            match *source {
                FieldSource::Default => row.push(None),
                FieldSource::Stored { index, conversion } => {
                    let value = stored[index].take().ok_or_else(|| {
                        SchemaError::DataCorruption(format!(
                            "Stored value {} consumed twice",
                            index
                        ))
                    })?;
                    let value = match conversion {
                        Some(conversion) => conversion.apply(value)?,
                        None => value,
                    };
                    row.push(Some(value));
                }
            }
        }
        Ok(row)
    }
}

/// Plans how rows written under `stored` are read under `current`.
///
/// Value fields are matched by name. Primitive fields may change type if
/// `convertor` knows a conversion; any other field must keep an identical
/// handler descriptor.
pub fn plan_value_upgrade(
    stored: &RelationSchema,
    current: &RelationSchema,
    convertor: &dyn TypeConvertor,
) -> Result<UpgradePlan, SchemaError> {
    let stored_fields = stored.value_fields();
    let mut used = vec![false; stored_fields.len()];
    let mut sources = Vec::with_capacity(current.value_fields().len());

    for field in current.value_fields() {
        let found = stored_fields
            .iter()
            .position(|stored_field| stored_field.name() == field.name());
        let source = match found {
            None => FieldSource::Default,
            Some(index) => {
                used[index] = true;
                let conversion = field_conversion(&stored_fields[index], field, convertor)?;
                FieldSource::Stored { index, conversion }
            }
        };
        sources.push(source);
    }

    let dropped: Vec<String> = stored_fields
        .iter()
        .zip(&used)
        .filter(|(_, used)| !**used)
        .map(|(field, _)| field.name().to_string())
        .collect();

    if !dropped.is_empty() {
        tracing::debug!("Upgrade drops stored fields {:?}", dropped);
    }

    Ok(UpgradePlan {
        sources,
        dropped,
        stored_len: stored_fields.len(),
    })
}

fn field_conversion(
    stored: &TableFieldInfo,
    current: &TableFieldInfo,
    convertor: &dyn TypeConvertor,
) -> Result<Option<Conversion>, SchemaError> {
    let incompatible = || SchemaError::IncompatibleFieldType {
        field: current.name().to_string(),
        from: stored.handler().name().to_string(),
        to: current.handler().name().to_string(),
    };
    match (stored.handler().handled_type(), current.handler().handled_type()) {
        (Some(from), Some(to)) => convertor
            .generate_conversion(from, to)
            .map(Some)
            .ok_or_else(incompatible),
        (None, None) if stored == current => Ok(None),
        _ => Err(incompatible()),
    }
}
