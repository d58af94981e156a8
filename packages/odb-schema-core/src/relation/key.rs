//! Secondary key building blocks.

/// Reference to a field of a relation schema, either by position in the
/// primary key list or by position in the value field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId {
    from_primary_key: bool,
    index: u32,
}

impl FieldId {
    pub fn new(from_primary_key: bool, index: u32) -> Self {
        Self {
            from_primary_key,
            index,
        }
    }

    /// Reference to the `index`-th primary key field.
    pub fn primary_key(index: u32) -> Self {
        Self::new(true, index)
    }

    /// Reference to the `index`-th value field.
    pub fn value(index: u32) -> Self {
        Self::new(false, index)
    }

    pub fn is_from_primary_key(&self) -> bool {
        self.from_primary_key
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Shape of one secondary index: its name, numeric handle and the ordered
/// field references that form the composite key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryKeyInfo {
    name: String,
    index: u32,
    fields: Vec<FieldId>,
}

impl SecondaryKeyInfo {
    pub fn new(name: impl Into<String>, index: u32, fields: Vec<FieldId>) -> Self {
        Self {
            name: name.into(),
            index,
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Field references in key order.
    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }

    /// Returns `true` if the key embeds the `pk_index`-th primary key field.
    pub fn contains_primary_key(&self, pk_index: u32) -> bool {
        self.fields
            .iter()
            .any(|field| field.is_from_primary_key() && field.index() == pk_index)
    }
}

/// Raw per-field annotation placing a value field into a named secondary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryKeyAttribute {
    /// Secondary key name
    pub name: String,
    /// Position of the annotated field within the key
    pub order: u32,
    /// Declared order of a primary key field appended right after this field,
    /// or 0 for none
    pub include_primary_key_order: u32,
}

impl SecondaryKeyAttribute {
    pub fn new(name: impl Into<String>, order: u32) -> Self {
        Self {
            name: name.into(),
            order,
            include_primary_key_order: 0,
        }
    }

    /// Appends the primary key field declared with `order` after this field.
    #[must_use]
    pub fn include_primary_key(mut self, order: u32) -> Self {
        self.include_primary_key_order = order;
        self
    }
}
