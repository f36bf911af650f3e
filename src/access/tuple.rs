use crate::access::value::{DataType, Field};
use crate::storage::page::RecordId;
use std::sync::Arc;

/// One named, typed column in a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: DataType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: DataType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// An ordered row schema. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleDesc {
    fields: Vec<FieldDef>,
}

impl TupleDesc {
    /// Creates a schema from an ordered field list.
    ///
    /// # Panics
    ///
    /// Panics if `fields` is empty; a schema must have at least one field.
    pub fn new(fields: Vec<FieldDef>) -> Self {
        assert!(!fields.is_empty(), "schema must have at least one field");
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn field(&self, i: usize) -> &FieldDef {
        &self.fields[i]
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Index of the field with the given name, if any.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Total serialized width of one row, in bytes.
    pub fn byte_size(&self) -> usize {
        self.fields.iter().map(|f| f.ty.byte_size()).sum()
    }
}

/// One row: an ordered sequence of optional field values matching a schema,
/// plus the record identity of its slot once it has been placed in a page.
///
/// An unset field is a distinguished "absent" value, not zero; absent fields
/// serialize as all-zero bytes.
#[derive(Debug, Clone)]
pub struct Tuple {
    desc: Arc<TupleDesc>,
    fields: Vec<Option<Field>>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Creates a tuple with all fields unset.
    pub fn new(desc: Arc<TupleDesc>) -> Self {
        let fields = vec![None; desc.len()];
        Self {
            desc,
            fields,
            record_id: None,
        }
    }

    /// Creates a tuple with every field set, in schema order.
    ///
    /// # Panics
    ///
    /// Panics if the value count or any value type does not match the schema.
    pub fn from_fields(desc: Arc<TupleDesc>, values: Vec<Field>) -> Self {
        assert_eq!(values.len(), desc.len(), "field count mismatch");
        for (i, value) in values.iter().enumerate() {
            assert_eq!(value.data_type(), desc.field(i).ty, "field type mismatch");
        }
        Self {
            desc,
            fields: values.into_iter().map(Some).collect(),
            record_id: None,
        }
    }

    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn field(&self, i: usize) -> Option<&Field> {
        self.fields[i].as_ref()
    }

    /// Sets field `i`, replacing any previous value.
    ///
    /// # Panics
    ///
    /// Panics if the value type does not match the schema.
    pub fn set_field(&mut self, i: usize, value: Field) {
        assert_eq!(
            value.data_type(),
            self.desc.field(i).ty,
            "field type mismatch"
        );
        self.fields[i] = Some(value);
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, rid: Option<RecordId>) {
        self.record_id = rid;
    }
}

/// Tuples compare by schema and field values; record identity is a location
/// tag, not part of the value.
impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.desc == other.desc && self.fields == other.fields
    }
}

impl Eq for Tuple {}

impl std::fmt::Display for Tuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            match field {
                Some(value) => write!(f, "{}", value)?,
                None => write!(f, "<absent>")?,
            }
        }
        Ok(())
    }
}
