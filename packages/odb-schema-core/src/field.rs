//! Field descriptors and the field handler contract.
//!
//! A field handler is the per-type codec that encodes and decodes one field's
//! value. The schema core never runs a handler; it only persists a handler's
//! identity (name plus configuration bytes), reloads it through a factory, and
//! reads its capability flags.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use odb_types::Type;

use crate::codec::{ByteReader, ByteWriter};
use crate::config::SchemaConfig;
use crate::error::SchemaError;

/// Capability and identity surface of a field handler.
pub trait FieldHandler: Send + Sync + fmt::Debug {
    /// Stable handler name persisted with the schema.
    fn name(&self) -> &str;

    /// Handler specific configuration persisted next to the name.
    fn configuration(&self) -> &[u8] {
        &[]
    }

    /// Primitive type this handler decodes to, if it is a primitive handler.
    fn handled_type(&self) -> Option<Type> {
        None
    }

    /// Decoding needs a per-row decoding context.
    fn needs_context(&self) -> bool {
        false
    }

    /// Decoded values need post-load initialization.
    fn needs_init(&self) -> bool {
        false
    }

    /// The field owns nested content that must be released explicitly when a
    /// row is deleted or overwritten.
    fn needs_free_content(&self) -> bool {
        false
    }
}

/// Handler for a single primitive type. Its name is the type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveFieldHandler {
    ty: Type,
}

impl PrimitiveFieldHandler {
    pub fn new(ty: Type) -> Self {
        Self { ty }
    }
}

impl FieldHandler for PrimitiveFieldHandler {
    fn name(&self) -> &str {
        self.ty.name()
    }

    fn handled_type(&self) -> Option<Type> {
        Some(self.ty)
    }
}

/// Stand-in for a handler the factory does not know.
///
/// Keeps the persisted name and configuration so the descriptor still
/// compares and re-saves exactly as loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueFieldHandler {
    name: String,
    configuration: Vec<u8>,
}

impl FieldHandler for OpaqueFieldHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn configuration(&self) -> &[u8] {
        &self.configuration
    }
}

/// Recreates field handlers from their persisted identity.
pub trait FieldHandlerFactory {
    fn create(&self, name: &str, configuration: &[u8])
        -> Result<Arc<dyn FieldHandler>, SchemaError>;
}

/// Type alias for a custom handler constructor.
pub type HandlerConstructor =
    dyn Fn(&[u8]) -> Result<Arc<dyn FieldHandler>, SchemaError> + Send + Sync;

/// Factory resolving primitive handlers by type name plus registered custom
/// handlers.
#[derive(Default)]
pub struct DefaultFieldHandlerFactory {
    custom: HashMap<String, Arc<HandlerConstructor>>,
    lenient: bool,
}

impl fmt::Debug for DefaultFieldHandlerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.custom.keys().collect();
        names.sort();
        f.debug_struct("DefaultFieldHandlerFactory")
            .field("custom", &names)
            .field("lenient", &self.lenient)
            .finish()
    }
}

impl DefaultFieldHandlerFactory {
    /// Creates a factory that rejects unknown handler names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a factory that loads unknown handlers as [`OpaqueFieldHandler`].
    ///
    /// Used by tooling that inspects persisted schemas without the
    /// application's handler set.
    pub fn lenient() -> Self {
        Self {
            custom: HashMap::new(),
            lenient: true,
        }
    }

    /// Registers a custom handler constructor under `name`.
    ///
    /// Primitive type names are reserved.
    pub fn register(
        &mut self,
        name: &str,
        constructor: impl Fn(&[u8]) -> Result<Arc<dyn FieldHandler>, SchemaError>
            + Send
            + Sync
            + 'static,
    ) -> Result<(), SchemaError> {
        if self.custom.contains_key(name) || name.parse::<Type>().is_ok() {
            return Err(SchemaError::HandlerAlreadyRegistered {
                name: name.to_string(),
            });
        }
        self.custom.insert(name.to_string(), Arc::new(constructor));
        Ok(())
    }
}

impl FieldHandlerFactory for DefaultFieldHandlerFactory {
    fn create(
        &self,
        name: &str,
        configuration: &[u8],
    ) -> Result<Arc<dyn FieldHandler>, SchemaError> {
        if let Ok(ty) = name.parse::<Type>() {
            if !configuration.is_empty() {
                return Err(SchemaError::DataCorruption(format!(
                    "Primitive handler '{}' carries {} configuration bytes",
                    name,
                    configuration.len()
                )));
            }
            return Ok(Arc::new(PrimitiveFieldHandler::new(ty)));
        }
        if let Some(constructor) = self.custom.get(name) {
            return constructor(configuration);
        }
        if self.lenient {
            return Ok(Arc::new(OpaqueFieldHandler {
                name: name.to_string(),
                configuration: configuration.to_vec(),
            }));
        }
        Err(SchemaError::UnknownFieldHandler {
            name: name.to_string(),
        })
    }
}

/// One field of a relation: its name and the handler that codes its value.
#[derive(Debug, Clone)]
pub struct TableFieldInfo {
    name: String,
    handler: Arc<dyn FieldHandler>,
}

impl TableFieldInfo {
    pub fn new(name: impl Into<String>, handler: Arc<dyn FieldHandler>) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }

    /// Creates a field coded by the primitive handler for `ty`.
    pub fn primitive(name: impl Into<String>, ty: Type) -> Self {
        Self::new(name, Arc::new(PrimitiveFieldHandler::new(ty)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &Arc<dyn FieldHandler> {
        &self.handler
    }

    /// Writes field name, handler name and handler configuration.
    pub fn save(&self, writer: &mut ByteWriter) {
        writer.write_string(&self.name);
        writer.write_string(self.handler.name());
        writer.write_bytes(self.handler.configuration());
    }

    /// Reads a field written by [`TableFieldInfo::save`], recreating its
    /// handler through `factory`.
    pub fn load(
        reader: &mut ByteReader<'_>,
        factory: &dyn FieldHandlerFactory,
        config: &SchemaConfig,
    ) -> Result<Self, SchemaError> {
        let name = reader.read_string(config.max_string_len)?;
        let handler_name = reader.read_string(config.max_string_len)?;
        let configuration = reader.read_bytes(config.max_handler_config_len)?;
        let handler = factory.create(&handler_name, configuration)?;
        Ok(Self { name, handler })
    }
}

/// Descriptors are equal when field name, handler name and handler
/// configuration all match.
impl PartialEq for TableFieldInfo {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.handler.name() == other.handler.name()
            && self.handler.configuration() == other.handler.configuration()
    }
}

impl Eq for TableFieldInfo {}
