//! Connection provider boundary.
//!
//! # Responsibility
//! - Define how repositories obtain one connection per operation.
//! - Classify storage failures into acquisition and execution errors.
//!
//! # Invariants
//! - A connection is owned by exactly one repository operation and released
//!   when that operation returns, on success and on failure.
//! - Providers never hand out a cached operation connection.
//! - Schema provisioning happens outside this crate.

use crate::config::ConfigError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod provider;

pub use provider::SqliteConnectionProvider;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// A connection could not be established.
    Connection {
        target: String,
        source: rusqlite::Error,
    },
    /// Statement preparation or execution failed.
    Sqlite(rusqlite::Error),
    /// The data-source settings cannot describe a connection target.
    Config(ConfigError),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection { target, source } => {
                write!(f, "failed to connect to `{target}`: {source}")
            }
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connection { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Source of per-operation connections.
///
/// Dropping the returned connection releases it.
pub trait ConnectionProvider: Send + Sync {
    fn acquire(&self) -> DbResult<Connection>;

    /// Human-readable target description for diagnostics.
    fn target(&self) -> String;
}
