//! Metadata-driven CRUD repository over SQLite.
//!
//! # Responsibility
//! - Run the five CRUD operations for any entity described by metadata.
//! - Map result rows back into freshly constructed entities.
//!
//! # Invariants
//! - Every operation acquires one connection and releases it before
//!   returning, on every exit path.
//! - Storage failures surface as `RepoError::Persistence`; declaration/data
//!   mismatches surface as `RepoError::Mapping`. Neither is retried or
//!   swallowed.
//! - An entity whose identifier is unset (`Null` or zero) is inserted; any
//!   other entity is updated in place.

use crate::db::{ConnectionProvider, DbError};
use crate::metadata::{resolve, EntityMetadata, FieldDescriptor, MetadataError};
use crate::model::declaration::Entity;
use crate::model::value::{FieldAccessError, FieldValue};
use crate::repo::sql::SqlStatements;
use log::{debug, error};
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository-level error covering creation and every CRUD operation.
#[derive(Debug)]
pub enum RepoError {
    /// Entity mapping declaration is malformed.
    Metadata(MetadataError),
    /// Repository contract or data-source setup is unusable.
    Configuration(String),
    /// A call name outside the five CRUD operations.
    UnsupportedOperation(String),
    /// A routed call carried the wrong argument shape.
    InvalidArguments {
        operation: String,
        expected: &'static str,
    },
    /// Connection acquisition or statement execution failed.
    Persistence(DbError),
    /// A field value does not fit the record's declared field.
    Mapping {
        entity: String,
        field: String,
        source: FieldAccessError,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Metadata(err) => write!(f, "{err}"),
            Self::Configuration(message) => {
                write!(f, "invalid repository configuration: {message}")
            }
            Self::UnsupportedOperation(name) => {
                write!(f, "unsupported repository operation: {name}")
            }
            Self::InvalidArguments {
                operation,
                expected,
            } => write!(f, "operation `{operation}` expects {expected}"),
            Self::Persistence(err) => write!(f, "persistence failure: {err}"),
            Self::Mapping {
                entity,
                field,
                source,
            } => write!(f, "cannot map field `{entity}.{field}`: {source}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Metadata(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::Mapping { source, .. } => Some(source),
            Self::Configuration(_)
            | Self::UnsupportedOperation(_)
            | Self::InvalidArguments { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<MetadataError> for RepoError {
    fn from(value: MetadataError) -> Self {
        Self::Metadata(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Persistence(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Persistence(DbError::Sqlite(value))
    }
}

/// Generic CRUD executor bound to one entity's metadata.
pub struct GenericRepository<T> {
    metadata: EntityMetadata<T>,
    statements: SqlStatements,
    provider: Arc<dyn ConnectionProvider>,
}

impl<T: Entity> GenericRepository<T> {
    /// Resolves `T`'s metadata and binds it to `provider`.
    pub fn for_entity(provider: Arc<dyn ConnectionProvider>) -> RepoResult<Self> {
        Ok(Self::new(resolve::<T>()?, provider))
    }

    pub fn new(metadata: EntityMetadata<T>, provider: Arc<dyn ConnectionProvider>) -> Self {
        let statements = SqlStatements::for_metadata(&metadata);
        Self {
            metadata,
            statements,
            provider,
        }
    }

    pub fn metadata(&self) -> &EntityMetadata<T> {
        &self.metadata
    }

    pub fn statements(&self) -> &SqlStatements {
        &self.statements
    }

    /// Inserts a new entity or updates an existing one.
    ///
    /// # Contract
    /// - Unset identifier: INSERT of all columns, then the generated row id
    ///   is written back when the identifier is an integer field. A row id
    ///   that does not fit the identifier's width rolls the INSERT back and
    ///   fails with `Mapping`.
    /// - Set identifier: UPDATE of all columns keyed by the identifier. An
    ///   identifier with no matching row updates nothing and still succeeds.
    pub fn save(&self, entity: T) -> RepoResult<T> {
        if self.metadata.is_new(&entity) {
            self.insert(entity)
        } else {
            self.update(entity)
        }
    }

    /// Loads the entity with identifier `id`, if any.
    pub fn find_by_id(&self, id: &FieldValue) -> RepoResult<Option<T>> {
        self.with_connection("find_by_id", &self.statements.select_by_id, |conn| {
            let mut stmt = conn.prepare(&self.statements.select_by_id)?;
            let mut rows = stmt.query([id])?;
            if let Some(row) = rows.next()? {
                return Ok(Some(self.map_row(row)?));
            }
            Ok(None)
        })
    }

    /// Loads every entity in storage cursor order.
    pub fn find_all(&self) -> RepoResult<Vec<T>> {
        self.with_connection("find_all", &self.statements.select_all, |conn| {
            let mut stmt = conn.prepare(&self.statements.select_all)?;
            let mut rows = stmt.query([])?;
            let mut entities = Vec::new();
            while let Some(row) = rows.next()? {
                entities.push(self.map_row(row)?);
            }
            Ok(entities)
        })
    }

    /// Deletes the entity with identifier `id`; a missing row is not an error.
    pub fn delete_by_id(&self, id: &FieldValue) -> RepoResult<()> {
        self.with_connection("delete_by_id", &self.statements.delete_by_id, |conn| {
            let changed = conn.execute(&self.statements.delete_by_id, [id])?;
            debug!(
                "event=sql_result module=repo op=delete_by_id table={} changed={}",
                self.metadata.table_name(),
                changed
            );
            Ok(())
        })
    }

    /// Counts stored entities; an absent aggregate counts as zero.
    pub fn count(&self) -> RepoResult<u64> {
        let total = self.with_connection("count", &self.statements.count, |conn| {
            let total = conn
                .query_row(&self.statements.count, [], |row| row.get::<_, Option<i64>>(0))
                .optional()?;
            Ok(total.flatten().unwrap_or(0))
        })?;

        u64::try_from(total).map_err(|_| {
            RepoError::InvalidData(format!(
                "negative row count {total} for table {}",
                self.metadata.table_name()
            ))
        })
    }

    fn insert(&self, mut entity: T) -> RepoResult<T> {
        let values = self.column_values(&entity);
        let id_field = self.metadata.id_field();
        let generated_id = self.with_connection("save", &self.statements.insert, |conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(&self.statements.insert, params_from_iter(values.iter()))?;
            let generated_id = if id_field.value_type().is_integer() {
                let raw_id = ValueRef::Integer(tx.last_insert_rowid());
                let id_value = FieldValue::from_raw(raw_id, id_field.value_type())
                    .map_err(|source| self.mapping_error(id_field, source))?;
                Some(id_value)
            } else {
                None
            };
            // Dropping `tx` on an early return rolls the insert back.
            tx.commit()?;
            Ok(generated_id)
        })?;

        if let Some(id_value) = generated_id {
            id_field
                .write(&mut entity, id_value)
                .map_err(|source| self.mapping_error(id_field, source))?;
        }
        Ok(entity)
    }

    fn update(&self, entity: T) -> RepoResult<T> {
        let Some(sql) = self.statements.update.as_deref() else {
            debug!(
                "event=sql_skip module=repo op=save table={} reason=no_columns",
                self.metadata.table_name()
            );
            return Ok(entity);
        };

        let mut values = self.column_values(&entity);
        values.push(self.metadata.id_field().read(&entity));
        self.with_connection("save", sql, |conn| {
            let changed = conn.execute(sql, params_from_iter(values.iter()))?;
            debug!(
                "event=sql_result module=repo op=save table={} changed={}",
                self.metadata.table_name(),
                changed
            );
            Ok(())
        })?;
        Ok(entity)
    }

    fn column_values(&self, entity: &T) -> Vec<FieldValue> {
        self.metadata
            .columns()
            .iter()
            .map(|column| column.read(entity))
            .collect()
    }

    /// Builds a zero-valued entity and fills it from one row.
    fn map_row(&self, row: &Row<'_>) -> RepoResult<T> {
        let mut entity = T::default();
        self.load_field(&mut entity, self.metadata.id_field(), row)?;
        for column in self.metadata.columns() {
            self.load_field(&mut entity, column, row)?;
        }
        Ok(entity)
    }

    fn load_field(
        &self,
        entity: &mut T,
        field: &FieldDescriptor<T>,
        row: &Row<'_>,
    ) -> RepoResult<()> {
        let raw = match row.get_ref(field.column_name()) {
            Ok(raw) => raw,
            Err(rusqlite::Error::InvalidColumnName(column)) => {
                let source = FieldAccessError::MissingColumn(column);
                return Err(self.mapping_error(field, source));
            }
            Err(err) => return Err(err.into()),
        };
        let value = FieldValue::from_raw(raw, field.value_type())
            .map_err(|source| self.mapping_error(field, source))?;
        field
            .write(entity, value)
            .map_err(|source| self.mapping_error(field, source))
    }

    fn mapping_error(&self, field: &FieldDescriptor<T>, source: FieldAccessError) -> RepoError {
        RepoError::Mapping {
            entity: self.metadata.type_name().to_string(),
            field: field.field_name().to_string(),
            source,
        }
    }

    /// Runs `work` on a freshly acquired connection and traces the statement.
    ///
    /// The connection is dropped before this returns.
    fn with_connection<R>(
        &self,
        op: &'static str,
        sql: &str,
        work: impl FnOnce(&Connection) -> RepoResult<R>,
    ) -> RepoResult<R> {
        let started_at = Instant::now();
        let table = self.metadata.table_name();
        debug!("event=sql_execute module=repo status=start op={op} table={table} sql={sql}");

        let result = self
            .provider
            .acquire()
            .map_err(RepoError::from)
            .and_then(|conn| work(&conn));

        match &result {
            Ok(_) => debug!(
                "event=sql_execute module=repo status=ok op={op} table={table} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=sql_execute module=repo status=error op={op} table={table} duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

impl<T> Debug for GenericRepository<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericRepository")
            .field("metadata", &self.metadata)
            .field("target", &self.provider.target())
            .finish()
    }
}
