// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temporary SQLite databases for integration tests.

use std::path::{Path, PathBuf};

use mnemo_config::StorageConfig;
use mnemo_core::MnemoError;
use mnemo_storage::{Builder, ConnectionFactory, ReadHandle, StorageHandle, StorageRegistry};

/// A SQLite database file in a temp directory that is removed on drop.
pub struct TestDatabase {
    _dir: tempfile::TempDir,
    path: PathBuf,
}

impl TestDatabase {
    pub fn new() -> Result<Self, MnemoError> {
        let dir = tempfile::TempDir::new().map_err(MnemoError::storage)?;
        let path = dir.path().join("mnemo-test.db");
        Ok(Self { _dir: dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `[storage]` section pointing at this database.
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            database_path: self.path.to_string_lossy().into_owned(),
            ..StorageConfig::default()
        }
    }

    pub fn factory(&self) -> Result<ConnectionFactory, MnemoError> {
        ConnectionFactory::from_config(&self.storage_config())
    }

    /// A handle on a schema brought up to the latest version.
    pub fn migrated_handle(&self) -> Result<StorageHandle, MnemoError> {
        let mut handle = StorageRegistry::default().handle(&self.factory()?)?;
        let version = Builder::new(&mut handle).execute()?;
        tracing::debug!(version, path = %self.path.display(), "test database migrated");
        Ok(handle)
    }

    /// A fresh read-only handle on its own connection.
    pub fn reader(&self) -> Result<ReadHandle, MnemoError> {
        Ok(ReadHandle::new(
            StorageRegistry::default().handle(&self.factory()?)?,
        ))
    }
}
