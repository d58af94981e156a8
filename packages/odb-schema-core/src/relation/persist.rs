//! Binary encoding of relation schemas.
//!
//! Layout, all counts and indices as varints:
//!
//! ```text
//! pk_count, pk_field[pk_count]
//! sk_count, { name, index }[sk_count]
//! { map_key, index, name, field_count, { is_primary_key: bool, index }[field_count] }[sk_count]
//! value_field_count, value_field[value_field_count]
//! ```

use std::collections::{BTreeMap, HashMap};

use super::key::{FieldId, SecondaryKeyInfo};
use super::schema::RelationSchema;
use crate::codec::{ByteReader, ByteWriter};
use crate::config::SchemaConfig;
use crate::error::SchemaError;
use crate::field::{FieldHandlerFactory, TableFieldInfo};

impl RelationSchema {
    /// Appends the encoded schema to `writer`.
    pub fn save(&self, writer: &mut ByteWriter) {
        writer.write_varint_u32(self.primary_key_fields.len() as u32);
        for field in &self.primary_key_fields {
            field.save(writer);
        }

        writer.write_varint_u32(self.secondary_keys.len() as u32);
        for (&map_key, info) in &self.secondary_keys {
            writer.write_string(info.name());
            writer.write_varint_u32(map_key);
        }
        for (&map_key, info) in &self.secondary_keys {
            writer.write_varint_u32(map_key);
            writer.write_varint_u32(info.index());
            writer.write_string(info.name());
            writer.write_varint_u32(info.fields().len() as u32);
            for field in info.fields() {
                writer.write_bool(field.is_from_primary_key());
                writer.write_varint_u32(field.index());
            }
        }

        writer.write_varint_u32(self.fields.len() as u32);
        for field in &self.fields {
            field.save(writer);
        }
    }

    /// Encodes the schema into a fresh buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        self.save(&mut writer);
        writer.into_bytes()
    }

    /// Reads a schema written by [`RelationSchema::save`] using default limits.
    pub fn load(
        reader: &mut ByteReader<'_>,
        factory: &dyn FieldHandlerFactory,
    ) -> Result<Self, SchemaError> {
        Self::load_with_config(reader, factory, &SchemaConfig::default())
    }

    /// Reads a schema, rejecting counts and lengths above `config`'s limits.
    ///
    /// The decoded schema is validated before it is returned; a truncated,
    /// malformed or inconsistent stream yields an error and no schema.
    pub fn load_with_config(
        reader: &mut ByteReader<'_>,
        factory: &dyn FieldHandlerFactory,
        config: &SchemaConfig,
    ) -> Result<Self, SchemaError> {
        let start = reader.position();
        let primary_key_fields = load_fields(reader, factory, config, "primary key field count")?;

        let sk_count = reader.read_count("secondary key count", config.max_secondary_keys)?;
        let mut secondary_key_names = HashMap::with_capacity(sk_count as usize);
        for _ in 0..sk_count {
            let offset = reader.position();
            let name = reader.read_string(config.max_string_len)?;
            let index = reader.read_varint_u32()?;
            if secondary_key_names.insert(name, index).is_some() {
                return Err(SchemaError::Malformed {
                    offset,
                    message: "duplicate secondary key name".to_string(),
                });
            }
        }

        let mut secondary_keys = BTreeMap::new();
        for _ in 0..sk_count {
            let offset = reader.position();
            let map_key = reader.read_varint_u32()?;
            let index = reader.read_varint_u32()?;
            let name = reader.read_string(config.max_string_len)?;
            let field_count = reader.read_count("secondary key field count", config.max_key_fields)?;
            let mut fields = Vec::with_capacity(field_count as usize);
            for _ in 0..field_count {
                let from_primary_key = reader.read_bool()?;
                let field_index = reader.read_varint_u32()?;
                fields.push(FieldId::new(from_primary_key, field_index));
            }
            if secondary_keys
                .insert(map_key, SecondaryKeyInfo::new(name, index, fields))
                .is_some()
            {
                return Err(SchemaError::Malformed {
                    offset,
                    message: format!("duplicate secondary key index {}", map_key),
                });
            }
        }

        let fields = load_fields(reader, factory, config, "value field count")?;

        let schema = Self {
            primary_key_fields,
            fields,
            secondary_keys,
            secondary_key_names,
        };
        schema.validate()?;

        tracing::debug!(
            "Loaded relation schema ({} bytes): {} primary key fields, {} value fields, {} secondary keys",
            reader.position() - start,
            schema.primary_key_fields.len(),
            schema.fields.len(),
            schema.secondary_keys.len()
        );
        Ok(schema)
    }

    /// Decodes a schema that must span all of `bytes`.
    pub fn from_bytes(
        bytes: &[u8],
        factory: &dyn FieldHandlerFactory,
        config: &SchemaConfig,
    ) -> Result<Self, SchemaError> {
        let mut reader = ByteReader::new(bytes);
        let schema = Self::load_with_config(&mut reader, factory, config)?;
        if !reader.is_at_end() {
            return Err(SchemaError::Malformed {
                offset: reader.position(),
                message: format!("{} trailing bytes after schema", reader.remaining()),
            });
        }
        Ok(schema)
    }
}

fn load_fields(
    reader: &mut ByteReader<'_>,
    factory: &dyn FieldHandlerFactory,
    config: &SchemaConfig,
    what: &'static str,
) -> Result<Vec<TableFieldInfo>, SchemaError> {
    let count = reader.read_count(what, config.max_fields)?;
    let mut fields = Vec::with_capacity(count as usize);
    for _ in 0..count {
        fields.push(TableFieldInfo::load(reader, factory, config)?);
    }
    Ok(fields)
}
