// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapters: lazy, resettable ownership of one logical connection.

use std::sync::Arc;

use tracing::debug;

use crate::connection::Connection;
use crate::error::StorageError;
use crate::value::{Rows, Statement};

/// Connection lifecycle plus statement execution for one logical connection.
///
/// The underlying connection is opened on first use and cached. `close`
/// releases it; `reset` closes it and clears the cache so the next call
/// reopens it, which is how a broken connection is recovered without
/// rebuilding the adapter.
pub trait StorageAdapter: Send {
    fn execute(&mut self, stmt: &Statement) -> Result<Rows, StorageError>;

    fn commit(&mut self) -> Result<(), StorageError>;

    fn flush(&mut self) -> Result<(), StorageError>;

    fn rollback(&mut self) -> Result<(), StorageError>;

    fn close(&mut self) -> Result<(), StorageError>;

    fn reset(&mut self) -> Result<(), StorageError> {
        self.close()
    }

    /// Dialect name used to pick a driver.
    fn dialect(&self) -> &str;

    fn is_connected(&self) -> bool;
}

type Opener<C> = Arc<dyn Fn() -> Result<C, StorageError> + Send + Sync>;

/// Cached connection created on demand from a factory.
struct Lazy<C> {
    open: Opener<C>,
    conn: Option<C>,
}

impl<C: Connection> Lazy<C> {
    fn new(open: Opener<C>) -> Self {
        Self { open, conn: None }
    }

    fn get(&mut self) -> Result<&mut C, StorageError> {
        if self.conn.is_none() {
            self.conn = Some((self.open)()?);
        }
        self.conn.as_mut().ok_or(StorageError::Closed)
    }

    /// Commit/rollback/flush on a connection that was never opened is a no-op.
    fn with_open(
        &mut self,
        f: impl FnOnce(&mut C) -> Result<(), StorageError>,
    ) -> Result<(), StorageError> {
        match self.conn.as_mut() {
            Some(conn) => f(conn),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<(), StorageError> {
        match self.conn.take() {
            Some(mut conn) => conn.close(),
            None => Ok(()),
        }
    }
}

/// Adapter over `rusqlite` connections.
pub struct SqliteAdapter {
    inner: Lazy<rusqlite::Connection>,
}

impl SqliteAdapter {
    pub fn new(
        factory: Arc<dyn Fn() -> rusqlite::Result<rusqlite::Connection> + Send + Sync>,
    ) -> Self {
        Self {
            inner: Lazy::new(Arc::new(move || {
                debug!("opening sqlite connection");
                factory().map_err(StorageError::from)
            })),
        }
    }
}

impl StorageAdapter for SqliteAdapter {
    fn execute(&mut self, stmt: &Statement) -> Result<Rows, StorageError> {
        Connection::execute(self.inner.get()?, stmt)
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        self.inner.with_open(|c| Connection::commit(c))
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        self.inner.with_open(|c| Connection::flush(c))
    }

    fn rollback(&mut self) -> Result<(), StorageError> {
        self.inner.with_open(|c| Connection::rollback(c))
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.inner.close()
    }

    fn dialect(&self) -> &str {
        "sqlite"
    }

    fn is_connected(&self) -> bool {
        self.inner.conn.is_some()
    }
}

/// Adapter over any boxed [`Connection`] with a caller-declared dialect.
pub struct ConnectionAdapter {
    dialect: String,
    inner: Lazy<Box<dyn Connection>>,
}

impl ConnectionAdapter {
    pub fn new(
        dialect: impl Into<String>,
        factory: Arc<dyn Fn() -> Result<Box<dyn Connection>, StorageError> + Send + Sync>,
    ) -> Self {
        Self {
            dialect: dialect.into(),
            inner: Lazy::new(factory),
        }
    }
}

impl StorageAdapter for ConnectionAdapter {
    fn execute(&mut self, stmt: &Statement) -> Result<Rows, StorageError> {
        self.inner.get()?.execute(stmt)
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        self.inner.with_open(|c| c.commit())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        self.inner.with_open(|c| c.flush())
    }

    fn rollback(&mut self) -> Result<(), StorageError> {
        self.inner.with_open(|c| c.rollback())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.inner.close()
    }

    fn dialect(&self) -> &str {
        &self.dialect
    }

    fn is_connected(&self) -> bool {
        self.inner.conn.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_sqlite() -> (SqliteAdapter, Arc<AtomicUsize>) {
        let opened = Arc::new(AtomicUsize::new(0));
        let counter = opened.clone();
        let adapter = SqliteAdapter::new(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            rusqlite::Connection::open_in_memory()
        }));
        (adapter, opened)
    }

    #[test]
    fn connection_opens_lazily_and_is_cached() {
        let (mut adapter, opened) = counting_sqlite();
        assert!(!adapter.is_connected());
        assert_eq!(opened.load(Ordering::SeqCst), 0);

        adapter.execute(&Statement::new("SELECT 1")).unwrap();
        adapter.execute(&Statement::new("SELECT 2")).unwrap();
        assert!(adapter.is_connected());
        assert_eq!(opened.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reset_recreates_connection_on_next_use() {
        let (mut adapter, opened) = counting_sqlite();
        adapter.execute(&Statement::new("SELECT 1")).unwrap();
        adapter.reset().unwrap();
        assert!(!adapter.is_connected());

        adapter.execute(&Statement::new("SELECT 1")).unwrap();
        assert_eq!(opened.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn commit_before_open_does_not_connect() {
        let (mut adapter, opened) = counting_sqlite();
        adapter.commit().unwrap();
        adapter.rollback().unwrap();
        adapter.close().unwrap();
        assert_eq!(opened.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn factory_failure_surfaces_on_first_use() {
        let mut adapter = ConnectionAdapter::new(
            "postgresql",
            Arc::new(|| Err(StorageError::backend("postgresql", "connection refused"))),
        );
        let err = adapter.execute(&Statement::new("SELECT 1")).unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert!(!adapter.is_connected());
        assert_eq!(adapter.dialect(), "postgresql");
    }
}
