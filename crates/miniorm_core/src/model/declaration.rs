//! Per-type mapping declarations.
//!
//! # Responsibility
//! - Let a record type state its storage mapping next to its definition.
//! - Capture typed field accessors once, erased into value-level closures.
//!
//! # Invariants
//! - Field order is the order of `EntityDeclaration::field` calls.
//! - A declaration is inert until the metadata resolver validates it.

use crate::model::value::{FieldAccessError, FieldType, FieldValue, ValueType};
use std::sync::Arc;

pub(crate) type FieldReader<T> = Arc<dyn Fn(&T) -> FieldValue + Send + Sync>;
pub(crate) type FieldWriter<T> =
    Arc<dyn Fn(&mut T, FieldValue) -> Result<(), FieldAccessError> + Send + Sync>;

/// Record types that can be mapped to one storage table.
///
/// `Default` supplies the zero-valued instance that row mapping fills in.
pub trait Entity: Default + Sized + 'static {
    fn declare() -> EntityDeclaration<Self>;
}

/// Mapping declaration for one field of `T`.
pub struct FieldDeclaration<T> {
    pub(crate) name: String,
    pub(crate) column: Option<String>,
    pub(crate) value_type: ValueType,
    pub(crate) is_id: bool,
    pub(crate) is_transient: bool,
    pub(crate) reader: FieldReader<T>,
    pub(crate) writer: FieldWriter<T>,
}

impl<T: 'static> FieldDeclaration<T> {
    /// Declares a field through its shared and mutable accessors.
    ///
    /// The declared `ValueType` comes from `V`.
    pub fn new<V: FieldType + 'static>(
        name: impl Into<String>,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        Self {
            name: name.into(),
            column: None,
            value_type: V::VALUE_TYPE,
            is_id: false,
            is_transient: false,
            reader: Arc::new(move |record: &T| get(record).to_field_value()),
            writer: Arc::new(move |record: &mut T, value: FieldValue| {
                *get_mut(record) = V::from_field_value(value)?;
                Ok(())
            }),
        }
    }

    /// Marks this field as the record identifier.
    pub fn id(mut self) -> Self {
        self.is_id = true;
        self
    }

    /// Excludes this field from persistence entirely.
    pub fn transient(mut self) -> Self {
        self.is_transient = true;
        self
    }

    /// Overrides the storage column name. An empty name keeps the default.
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.column = Some(name.into());
        self
    }
}

/// Mapping declaration for a whole record type.
pub struct EntityDeclaration<T> {
    pub(crate) type_name: String,
    pub(crate) mapped: bool,
    pub(crate) table: Option<String>,
    pub(crate) fields: Vec<FieldDeclaration<T>>,
}

impl<T: 'static> EntityDeclaration<T> {
    /// Starts an unmapped declaration named after `T`.
    pub fn new() -> Self {
        Self {
            type_name: short_type_name::<T>(),
            mapped: false,
            table: None,
            fields: Vec::new(),
        }
    }

    /// Overrides the type name used for table derivation and diagnostics.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.type_name = name.into();
        self
    }

    /// Marks the type as a storage entity with a derived table name.
    pub fn mapped(mut self) -> Self {
        self.mapped = true;
        self
    }

    /// Marks the type as a storage entity stored in `table`.
    pub fn mapped_to(mut self, table: impl Into<String>) -> Self {
        self.mapped = true;
        self.table = Some(table.into());
        self
    }

    /// Appends one field in declaration order.
    pub fn field(mut self, field: FieldDeclaration<T>) -> Self {
        self.fields.push(field);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl<T: 'static> Default for EntityDeclaration<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn short_type_name<T>() -> String {
    let full = std::any::type_name::<T>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::{short_type_name, EntityDeclaration, FieldDeclaration};
    use crate::model::value::{FieldValue, ValueType};

    #[derive(Default)]
    struct Invoice {
        number: i32,
    }

    #[allow(dead_code)]
    struct Wrapper<T>(T);

    #[test]
    fn type_name_strips_module_path_and_generics() {
        assert_eq!(short_type_name::<Invoice>(), "Invoice");
        assert_eq!(short_type_name::<Wrapper<Invoice>>(), "Wrapper");
        assert_eq!(EntityDeclaration::<Invoice>::new().type_name(), "Invoice");
    }

    #[test]
    fn field_accessors_round_trip_values() {
        let field = FieldDeclaration::new(
            "number",
            |invoice: &Invoice| &invoice.number,
            |invoice: &mut Invoice| &mut invoice.number,
        );
        assert_eq!(field.value_type, ValueType::I32);

        let mut invoice = Invoice::default();
        (field.writer)(&mut invoice, FieldValue::I32(12)).unwrap();
        assert_eq!((field.reader)(&invoice), FieldValue::I32(12));
        assert!((field.writer)(&mut invoice, FieldValue::Bool(true)).is_err());
    }
}
