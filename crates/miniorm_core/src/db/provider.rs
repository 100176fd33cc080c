//! SQLite connection provider.
//!
//! # Responsibility
//! - Open one configured SQLite connection per acquisition.
//! - Keep named in-memory databases alive between acquisitions.
//!
//! # Invariants
//! - Every acquired connection has `foreign_keys` and the busy timeout
//!   applied as configured.
//! - A memory provider holds one anchor connection for its whole lifetime;
//!   the database disappears when the provider is dropped.

use super::{ConnectionProvider, DbError, DbResult};
use crate::config::{DataSourceConfig, DataSourceMode};
use log::{debug, error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone)]
enum Target {
    File(PathBuf),
    SharedMemory { name: String, uri: String },
}

/// SQLite-backed `ConnectionProvider`.
#[derive(Debug)]
pub struct SqliteConnectionProvider {
    target: Target,
    busy_timeout: Duration,
    foreign_keys: bool,
    _anchor: Option<Mutex<Connection>>,
}

impl SqliteConnectionProvider {
    /// Builds a provider from data-source settings.
    ///
    /// # Errors
    /// - `Config` when the settings fail `DataSourceConfig::validate`.
    /// - `Connection` when the memory anchor connection cannot be opened.
    ///
    /// # Side effects
    /// - Memory mode opens the anchor connection immediately.
    /// - File mode touches nothing until the first acquisition.
    pub fn open(config: &DataSourceConfig) -> DbResult<Self> {
        config.validate().map_err(DbError::Config)?;
        let target = match &config.mode {
            DataSourceMode::File { path } => Target::File(path.clone()),
            DataSourceMode::Memory { name } => {
                let name = name
                    .clone()
                    .unwrap_or_else(|| format!("miniorm-{}", Uuid::new_v4().simple()));
                let uri = format!("file:{name}?mode=memory&cache=shared");
                Target::SharedMemory { name, uri }
            }
        };

        let mut provider = Self {
            target,
            busy_timeout: config.busy_timeout(),
            foreign_keys: config.foreign_keys,
            _anchor: None,
        };

        if matches!(provider.target, Target::SharedMemory { .. }) {
            let anchor = provider.acquire()?;
            provider._anchor = Some(Mutex::new(anchor));
        }

        info!(
            "event=provider_open module=db status=ok target={}",
            provider.target()
        );
        Ok(provider)
    }

    /// Provider for a SQLite database file.
    pub fn file(path: impl Into<PathBuf>) -> DbResult<Self> {
        Self::open(&DataSourceConfig::file(path))
    }

    /// Provider for a fresh, uniquely named in-memory database.
    pub fn in_memory() -> DbResult<Self> {
        Self::open(&DataSourceConfig::memory())
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = match &self.target {
            Target::File(path) => Connection::open(path)?,
            Target::SharedMemory { uri, .. } => Connection::open_with_flags(
                uri,
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?,
        };
        conn.busy_timeout(self.busy_timeout)?;
        let foreign_keys = if self.foreign_keys { "ON" } else { "OFF" };
        conn.execute_batch(&format!("PRAGMA foreign_keys = {foreign_keys};"))?;
        Ok(conn)
    }
}

impl ConnectionProvider for SqliteConnectionProvider {
    fn acquire(&self) -> DbResult<Connection> {
        let started_at = Instant::now();
        match self.connect() {
            Ok(conn) => {
                debug!(
                    "event=db_acquire module=db status=ok target={} duration_ms={}",
                    self.target(),
                    started_at.elapsed().as_millis()
                );
                Ok(conn)
            }
            Err(source) => {
                error!(
                    "event=db_acquire module=db status=error target={} duration_ms={} error_code=db_connect_failed error={}",
                    self.target(),
                    started_at.elapsed().as_millis(),
                    source
                );
                Err(DbError::Connection {
                    target: self.target(),
                    source,
                })
            }
        }
    }

    fn target(&self) -> String {
        match &self.target {
            Target::File(path) => format!("file:{}", path.display()),
            Target::SharedMemory { name, .. } => format!("memory:{name}"),
        }
    }
}
