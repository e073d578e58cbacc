// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transactions: ordered task lists submitted to the write queue as a unit.

use crate::error::StorageError;
use crate::handle::StorageHandle;
use crate::value::{Rows, Statement};
use crate::write::WriteDescriptor;

/// What an `execute` task runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Execute {
    Sql(Statement),
    Write(WriteDescriptor),
}

impl From<Statement> for Execute {
    fn from(stmt: Statement) -> Self {
        Execute::Sql(stmt)
    }
}

impl From<WriteDescriptor> for Execute {
    fn from(descriptor: WriteDescriptor) -> Self {
        Execute::Write(descriptor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Execute(Execute),
    Commit,
    Flush,
}

/// Result of a transaction: the output of its last `execute` task.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Output {
    Rows(Rows),
    Id(i64),
    #[default]
    None,
}

impl Output {
    pub fn id(&self) -> Option<i64> {
        match self {
            Output::Id(id) => Some(*id),
            _ => None,
        }
    }

    pub fn rows(self) -> Option<Rows> {
        match self {
            Output::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}

/// An ordered sequence of tasks applied with no other transaction's tasks
/// interleaved.
///
/// ```
/// use mnemo_storage::{Statement, Transaction};
///
/// let tx = Transaction::new()
///     .execute(Statement::new("INSERT INTO t VALUES (1)"))
///     .commit()
///     .flush();
/// assert_eq!(tx.tasks().len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    tasks: Vec<Task>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn execute(mut self, what: impl Into<Execute>) -> Self {
        self.tasks.push(Task::Execute(what.into()));
        self
    }

    pub fn commit(mut self) -> Self {
        self.tasks.push(Task::Commit);
        self
    }

    pub fn flush(mut self) -> Self {
        self.tasks.push(Task::Flush);
        self
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every task in order, stopping at the first failure.
    pub fn apply(&self, handle: &mut StorageHandle) -> Result<Output, StorageError> {
        let mut output = Output::None;
        for task in &self.tasks {
            match task {
                Task::Execute(Execute::Sql(stmt)) => output = Output::Rows(handle.execute(stmt)?),
                Task::Execute(Execute::Write(descriptor)) => {
                    output = descriptor.apply(handle)?.map_or(Output::None, Output::Id);
                }
                Task::Commit => handle.commit()?,
                Task::Flush => handle.flush()?,
            }
        }
        Ok(output)
    }
}

impl FromIterator<WriteDescriptor> for Transaction {
    /// One `execute` per descriptor followed by a single `commit`.
    fn from_iter<I: IntoIterator<Item = WriteDescriptor>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Transaction::new(), Transaction::execute)
            .commit()
    }
}
