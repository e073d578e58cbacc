// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caller-supplied connection factories.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mnemo_config::StorageConfig;
use mnemo_core::MnemoError;

use crate::connection::Connection;
use crate::error::StorageError;

pub type SqliteOpener = Arc<dyn Fn() -> rusqlite::Result<rusqlite::Connection> + Send + Sync>;
pub type ConnectionOpener =
    Arc<dyn Fn() -> Result<Box<dyn Connection>, StorageError> + Send + Sync>;

/// A zero-argument factory producing fresh connections.
///
/// Every component that needs its own handle (the write queue, each
/// augmentation payload) calls the factory independently.
#[derive(Clone)]
pub enum ConnectionFactory {
    Sqlite(SqliteOpener),
    /// Any other backend, tagged with the dialect name its driver is
    /// registered under (`postgresql`, `mysql`, ...).
    Custom {
        dialect: String,
        factory: ConnectionOpener,
    },
}

impl ConnectionFactory {
    pub fn sqlite<F>(open: F) -> Self
    where
        F: Fn() -> rusqlite::Result<rusqlite::Connection> + Send + Sync + 'static,
    {
        ConnectionFactory::Sqlite(Arc::new(open))
    }

    /// SQLite file with a busy timeout and, optionally, WAL journaling.
    pub fn sqlite_file(path: impl Into<PathBuf>, busy_timeout: Duration, wal_mode: bool) -> Self {
        let path = path.into();
        Self::sqlite(move || {
            let conn = rusqlite::Connection::open(&path)?;
            conn.busy_timeout(busy_timeout)?;
            if wal_mode {
                let _mode: String =
                    conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
            }
            conn.execute_batch("PRAGMA foreign_keys = ON")?;
            Ok(conn)
        })
    }

    pub fn custom<F>(dialect: impl Into<String>, open: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Connection>, StorageError> + Send + Sync + 'static,
    {
        ConnectionFactory::Custom {
            dialect: dialect.into(),
            factory: Arc::new(open),
        }
    }

    /// Build a factory from the `[storage]` section. Only SQLite can be
    /// described by configuration alone.
    pub fn from_config(config: &StorageConfig) -> Result<Self, MnemoError> {
        match config.backend.as_str() {
            "sqlite" => Ok(Self::sqlite_file(
                &config.database_path,
                config.busy_timeout(),
                config.wal_mode,
            )),
            other => Err(MnemoError::Config(format!(
                "storage.backend `{other}` needs a connection factory supplied in code"
            ))),
        }
    }

    /// Dialect this factory claims to produce.
    pub fn dialect(&self) -> &str {
        match self {
            ConnectionFactory::Sqlite(_) => "sqlite",
            ConnectionFactory::Custom { dialect, .. } => dialect,
        }
    }
}

impl fmt::Debug for ConnectionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionFactory")
            .field("dialect", &self.dialect())
            .finish_non_exhaustive()
    }
}
