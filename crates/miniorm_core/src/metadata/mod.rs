//! Metadata resolver: mapping declarations to storage descriptors.
//!
//! # Responsibility
//! - Validate one entity declaration and resolve table/column names.
//! - Produce the immutable `EntityMetadata` the repository layer runs on.
//!
//! # Invariants
//! - Exactly one identifier field per entity.
//! - `columns` excludes the identifier and transient fields and keeps
//!   declaration order; SQL column lists and parameter binding rely on it.
//! - Resolved names are plain SQL identifiers and unique per entity
//!   (compared case-insensitively, as SQLite does).
//! - Resolution performs no I/O.

use crate::model::declaration::{
    Entity, EntityDeclaration, FieldDeclaration, FieldReader, FieldWriter,
};
use crate::model::value::{FieldAccessError, FieldValue, ValueType};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

static SQL_IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

pub type MetadataResult<T> = Result<T, MetadataError>;

/// Malformed or missing mapping declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    NotAnEntity {
        type_name: String,
    },
    MissingId {
        type_name: String,
    },
    MultipleIds {
        type_name: String,
        fields: Vec<String>,
    },
    TransientId {
        type_name: String,
        field: String,
    },
    DuplicateColumn {
        type_name: String,
        column: String,
    },
    InvalidName {
        type_name: String,
        name: String,
    },
}

impl Display for MetadataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnEntity { type_name } => {
                write!(f, "type `{type_name}` is not declared as a storage entity")
            }
            Self::MissingId { type_name } => {
                write!(f, "entity `{type_name}` declares no identifier field")
            }
            Self::MultipleIds { type_name, fields } => write!(
                f,
                "entity `{type_name}` declares more than one identifier field: {}",
                fields.join(", ")
            ),
            Self::TransientId { type_name, field } => write!(
                f,
                "entity `{type_name}` marks identifier field `{field}` as transient"
            ),
            Self::DuplicateColumn { type_name, column } => write!(
                f,
                "entity `{type_name}` maps more than one field to column `{column}`"
            ),
            Self::InvalidName { type_name, name } => write!(
                f,
                "entity `{type_name}` uses `{name}` which is not a valid SQL identifier"
            ),
        }
    }
}

impl Error for MetadataError {}

/// Resolved mapping of one persisted field.
pub struct FieldDescriptor<T> {
    field_name: String,
    column_name: String,
    value_type: ValueType,
    reader: FieldReader<T>,
    writer: FieldWriter<T>,
}

impl<T> FieldDescriptor<T> {
    fn from_declaration(field: FieldDeclaration<T>) -> Self {
        let column_name = match field.column {
            Some(column) if !column.trim().is_empty() => column.trim().to_string(),
            _ => field.name.clone(),
        };
        Self {
            field_name: field.name,
            column_name,
            value_type: field.value_type,
            reader: field.reader,
            writer: field.writer,
        }
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Reads the current field value from `record`.
    pub fn read(&self, record: &T) -> FieldValue {
        (self.reader)(record)
    }

    /// Writes `value` into the field on `record`.
    pub fn write(&self, record: &mut T, value: FieldValue) -> Result<(), FieldAccessError> {
        (self.writer)(record, value)
    }
}

impl<T> Clone for FieldDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            field_name: self.field_name.clone(),
            column_name: self.column_name.clone(),
            value_type: self.value_type,
            reader: self.reader.clone(),
            writer: self.writer.clone(),
        }
    }
}

impl<T> Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("field_name", &self.field_name)
            .field("column_name", &self.column_name)
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}

/// Immutable storage description of one entity type.
pub struct EntityMetadata<T> {
    type_name: String,
    table_name: String,
    id_field: FieldDescriptor<T>,
    columns: Vec<FieldDescriptor<T>>,
}

impl<T> EntityMetadata<T> {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn id_field(&self) -> &FieldDescriptor<T> {
        &self.id_field
    }

    /// Persistable non-identifier columns in declaration order.
    pub fn columns(&self) -> &[FieldDescriptor<T>] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(FieldDescriptor::column_name).collect()
    }

    /// Returns whether `record` has not been persisted yet.
    ///
    /// Uses the zero-as-new identifier sentinel; see
    /// `FieldValue::is_unset_identifier`. A record stored under key 0 is
    /// always treated as new.
    pub fn is_new(&self, record: &T) -> bool {
        self.id_field.read(record).is_unset_identifier()
    }
}

impl<T> Clone for EntityMetadata<T> {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name.clone(),
            table_name: self.table_name.clone(),
            id_field: self.id_field.clone(),
            columns: self.columns.clone(),
        }
    }
}

impl<T> Debug for EntityMetadata<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMetadata")
            .field("type_name", &self.type_name)
            .field("table_name", &self.table_name)
            .field("id_field", &self.id_field)
            .field("columns", &self.columns)
            .finish()
    }
}

/// Resolves metadata from the declaration `T` provides.
pub fn resolve<T: Entity>() -> MetadataResult<EntityMetadata<T>> {
    resolve_declaration(T::declare())
}

/// Resolves metadata from an explicit declaration.
///
/// # Errors
/// - `NotAnEntity` when the declaration was never marked as mapped.
/// - `MissingId` / `MultipleIds` unless exactly one field is the identifier.
/// - `TransientId` when the identifier is also marked transient.
/// - `InvalidName` when a table or column name is not a plain identifier.
/// - `DuplicateColumn` when two persisted fields resolve to one column.
pub fn resolve_declaration<T>(
    declaration: EntityDeclaration<T>,
) -> MetadataResult<EntityMetadata<T>> {
    let EntityDeclaration {
        type_name,
        mapped,
        table,
        fields,
    } = declaration;

    if !mapped {
        return Err(MetadataError::NotAnEntity { type_name });
    }

    let table_name = match table {
        Some(table) if !table.trim().is_empty() => table.trim().to_string(),
        _ => format!("{}s", type_name.to_lowercase()),
    };
    ensure_sql_identifier(&type_name, &table_name)?;

    let mut id_fields = Vec::new();
    let mut columns = Vec::new();
    for field in fields {
        if field.is_id && field.is_transient {
            return Err(MetadataError::TransientId {
                type_name,
                field: field.name,
            });
        }
        if field.is_transient {
            continue;
        }
        let is_id = field.is_id;
        let descriptor = FieldDescriptor::from_declaration(field);
        if is_id {
            id_fields.push(descriptor);
        } else {
            columns.push(descriptor);
        }
    }

    if id_fields.len() > 1 {
        return Err(MetadataError::MultipleIds {
            type_name,
            fields: id_fields
                .iter()
                .map(|field| field.field_name().to_string())
                .collect(),
        });
    }
    let Some(id_field) = id_fields.pop() else {
        return Err(MetadataError::MissingId { type_name });
    };

    let mut seen = HashSet::new();
    for descriptor in std::iter::once(&id_field).chain(columns.iter()) {
        ensure_sql_identifier(&type_name, descriptor.column_name())?;
        if !seen.insert(descriptor.column_name().to_ascii_lowercase()) {
            return Err(MetadataError::DuplicateColumn {
                type_name,
                column: descriptor.column_name().to_string(),
            });
        }
    }

    debug!(
        "event=metadata_resolve module=metadata status=ok entity={} table={} id_column={} columns={}",
        type_name,
        table_name,
        id_field.column_name(),
        columns.len()
    );

    Ok(EntityMetadata {
        type_name,
        table_name,
        id_field,
        columns,
    })
}

fn ensure_sql_identifier(type_name: &str, name: &str) -> MetadataResult<()> {
    if SQL_IDENTIFIER_RE.is_match(name) {
        return Ok(());
    }
    Err(MetadataError::InvalidName {
        type_name: type_name.to_string(),
        name: name.to_string(),
    })
}
