//! Metadata-driven ORM core over SQLite.
//!
//! Record types declare their storage mapping once; the crate resolves it
//! into immutable metadata and serves CRUD repositories for any such type
//! through a single generic execution path.

pub mod config;
pub mod db;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod repo;

pub use config::{ConfigError, DataSourceConfig, DataSourceMode, LoggingConfig, OrmConfig};
pub use db::{ConnectionProvider, DbError, DbResult, SqliteConnectionProvider};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use metadata::{
    resolve, resolve_declaration, EntityMetadata, FieldDescriptor, MetadataError, MetadataResult,
};
pub use model::declaration::{Entity, EntityDeclaration, FieldDeclaration};
pub use model::value::{FieldAccessError, FieldType, FieldValue, ValueType};
pub use repo::contract::{
    ContractDeclaration, ContractKind, CrudRepository, Operation, RepositoryContract,
};
pub use repo::factory::RepositoryFactory;
pub use repo::generic_repo::{GenericRepository, RepoError, RepoResult};
pub use repo::proxy::{CallArg, CallOutcome, RepositoryProxy};
pub use repo::sql::SqlStatements;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
