// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted connection for driving the write queue without a database.
//!
//! Every connection produced by a [`MockBackend`] appends to the same
//! [`CallLog`], so a test can assert the exact sequence of executes,
//! commits, flushes, rollbacks and closes the storage layer issued.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mnemo_storage::{Connection, ConnectionFactory, Rows, Statement, StorageError, Value};

/// One recorded connection call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Execute(String),
    Commit,
    Flush,
    Rollback,
    Close,
}

/// Shared, append-only record of calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, call: Call) {
        self.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    /// SQL of every executed statement, in order.
    pub fn executed(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                Call::Execute(sql) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.lock().iter().filter(|c| *c == call).count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[derive(Default)]
struct Script {
    failures: Vec<String>,
    responses: Vec<(String, Rows)>,
    next_id: i64,
    opened: usize,
    /// Connections numbered at or below this have lost their link.
    lost_through: usize,
}

/// Factory-side handle for a family of mock connections.
///
/// Statements containing a registered failure needle fail; statements
/// matching a response needle return the canned rows. Otherwise any
/// `SELECT id` query returns a fresh sequential id and everything else
/// returns an empty result.
#[derive(Clone)]
pub struct MockBackend {
    dialect: String,
    log: CallLog,
    script: Arc<Mutex<Script>>,
}

impl MockBackend {
    pub fn new(dialect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            log: CallLog::default(),
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail every statement whose SQL contains `needle`.
    pub fn fail_on(&self, needle: impl Into<String>) -> &Self {
        self.script().failures.push(needle.into());
        self
    }

    pub fn clear_failures(&self) -> &Self {
        self.script().failures.clear();
        self
    }

    /// Return `rows` for every statement whose SQL contains `needle`.
    pub fn respond(&self, needle: impl Into<String>, rows: Rows) -> &Self {
        self.script().responses.push((needle.into(), rows));
        self
    }

    /// Sever every connection opened so far. They fail every call until
    /// closed; connections opened afterwards work normally.
    pub fn lose_connections(&self) -> &Self {
        let mut script = self.script();
        script.lost_through = script.opened;
        drop(script);
        self
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    /// Number of connections the factory has opened.
    pub fn opened(&self) -> usize {
        self.script().opened
    }

    pub fn factory(&self) -> ConnectionFactory {
        let backend = self.clone();
        ConnectionFactory::custom(self.dialect.clone(), move || {
            let number = {
                let mut script = backend.script();
                script.opened += 1;
                script.opened
            };
            Ok(Box::new(MockConnection {
                backend: backend.clone(),
                number,
            }) as Box<dyn Connection>)
        })
    }
}

struct MockConnection {
    backend: MockBackend,
    number: usize,
}

impl MockConnection {
    fn check_link(&self) -> Result<(), StorageError> {
        if self.number <= self.backend.script().lost_through {
            return Err(StorageError::backend(
                self.backend.dialect.clone(),
                "connection lost",
            ));
        }
        Ok(())
    }
}

impl Connection for MockConnection {
    fn execute(&mut self, stmt: &Statement) -> Result<Rows, StorageError> {
        self.backend.log.push(Call::Execute(stmt.sql.clone()));
        self.check_link()?;

        let mut script = self.backend.script();
        if let Some(needle) = script.failures.iter().find(|n| stmt.sql.contains(n.as_str())) {
            return Err(StorageError::backend(
                self.backend.dialect.clone(),
                format!("scripted failure on `{needle}`"),
            ));
        }
        if let Some((_, rows)) = script
            .responses
            .iter()
            .find(|(needle, _)| stmt.sql.contains(needle.as_str()))
        {
            return Ok(rows.clone());
        }
        if stmt.sql.trim_start().starts_with("SELECT id") {
            script.next_id += 1;
            return Ok(Rows {
                columns: vec!["id".into()],
                rows: vec![vec![Value::Integer(script.next_id)]],
                affected: 0,
            });
        }
        Ok(Rows::affected(1))
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        self.backend.log.push(Call::Commit);
        self.check_link()
    }

    fn rollback(&mut self) -> Result<(), StorageError> {
        self.backend.log.push(Call::Rollback);
        self.check_link()
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        self.backend.log.push(Call::Flush);
        self.check_link()
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.backend.log.push(Call::Close);
        Ok(())
    }
}
