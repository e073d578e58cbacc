// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The low-level connection contract every backend implements.

use crate::error::StorageError;
use crate::value::{Rows, Statement, Value};

/// A live, single-owner database connection.
///
/// Implementations are not required to be `Sync`; the adapter that owns a
/// connection is only ever driven by one thread at a time.
pub trait Connection: Send {
    fn execute(&mut self, stmt: &Statement) -> Result<Rows, StorageError>;

    fn commit(&mut self) -> Result<(), StorageError>;

    fn rollback(&mut self) -> Result<(), StorageError>;

    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Release backend resources. The connection is dropped afterwards.
    fn close(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

impl Connection for Box<dyn Connection> {
    fn execute(&mut self, stmt: &Statement) -> Result<Rows, StorageError> {
        (**self).execute(stmt)
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<(), StorageError> {
        (**self).rollback()
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<(), StorageError> {
        (**self).close()
    }
}

/// SQLite runs in autocommit mode until told otherwise. A transaction is
/// opened lazily by the first write after a commit or rollback, so that
/// `commit` and `rollback` bracket exactly the writes issued since the last
/// one.
impl Connection for rusqlite::Connection {
    fn execute(&mut self, stmt: &Statement) -> Result<Rows, StorageError> {
        let readonly = self.prepare_cached(&stmt.sql)?.readonly();
        if !readonly && self.is_autocommit() {
            self.execute_batch("BEGIN")?;
        }

        let mut prepared = self.prepare_cached(&stmt.sql)?;
        let columns: Vec<String> = prepared
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        let mut cursor = prepared.query(rusqlite::params_from_iter(stmt.params.iter()))?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                values.push(Value::from(row.get_ref(idx)?));
            }
            rows.push(values);
        }
        drop(cursor);
        drop(prepared);

        let affected = if readonly { 0 } else { self.changes() };
        Ok(Rows {
            columns,
            rows,
            affected,
        })
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        if !self.is_autocommit() {
            self.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StorageError> {
        if !self.is_autocommit() {
            self.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.rollback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> rusqlite::Connection {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();
        conn
    }

    #[test]
    fn write_opens_transaction_and_commit_closes_it() {
        let mut conn = memory();
        let rows = Connection::execute(
            &mut conn,
            &Statement::new("INSERT INTO t (name) VALUES (?1)").bind("a"),
        )
        .unwrap();
        assert_eq!(rows.affected, 1);
        assert!(!conn.is_autocommit());

        Connection::commit(&mut conn).unwrap();
        assert!(conn.is_autocommit());
    }

    #[test]
    fn rollback_discards_uncommitted_writes() {
        let mut conn = memory();
        Connection::execute(&mut conn, &Statement::new("INSERT INTO t (name) VALUES ('x')"))
            .unwrap();
        Connection::rollback(&mut conn).unwrap();

        let rows =
            Connection::execute(&mut conn, &Statement::new("SELECT COUNT(*) AS n FROM t")).unwrap();
        assert_eq!(rows.first_i64("n").unwrap(), Some(0));
    }

    #[test]
    fn reads_do_not_open_transactions() {
        let mut conn = memory();
        let rows = Connection::execute(&mut conn, &Statement::new("SELECT id, name FROM t")).unwrap();
        assert!(rows.is_empty());
        assert_eq!(rows.columns, vec!["id", "name"]);
        assert!(conn.is_autocommit());
    }

    #[test]
    fn commit_without_writes_is_a_noop() {
        let mut conn = memory();
        Connection::commit(&mut conn).unwrap();
        Connection::rollback(&mut conn).unwrap();
    }

    #[test]
    fn blobs_round_trip_through_params() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        let rows = Connection::execute(
            &mut conn,
            &Statement::new("SELECT ?1 AS b").bind(vec![1u8, 2, 3]),
        )
        .unwrap();
        assert_eq!(rows.get(0, "b").unwrap(), Some(&Value::Blob(vec![1, 2, 3])));
    }
}
