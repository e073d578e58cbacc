// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage-level errors.

use mnemo_core::MnemoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Error reported by a non-SQLite backend.
    #[error("{dialect}: {message}")]
    Backend { dialect: String, message: String },

    /// A statement expected to return a row returned none.
    #[error("query returned no rows")]
    NoRows,

    /// A column was missing or held a value of the wrong type.
    #[error("column error: {0}")]
    Column(String),

    /// The connection factory failed or the adapter was closed mid-operation.
    #[error("connection closed")]
    Closed,
}

impl StorageError {
    pub fn backend(dialect: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::Backend {
            dialect: dialect.into(),
            message: message.into(),
        }
    }
}

impl From<StorageError> for MnemoError {
    fn from(err: StorageError) -> Self {
        MnemoError::storage(err)
    }
}
