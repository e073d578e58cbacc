// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema migration runner.
//!
//! Reads the recorded schema version, applies every newer batch from the
//! driver in order, commits, and records the new version. A missing version
//! table reads as version 0.

use tracing::{debug, info};

use crate::error::StorageError;
use crate::handle::StorageHandle;
use crate::value::Statement;

pub struct Builder<'a> {
    handle: &'a mut StorageHandle,
}

impl<'a> Builder<'a> {
    pub fn new(handle: &'a mut StorageHandle) -> Self {
        Self { handle }
    }

    /// Bring the schema up to the driver's latest version and return it.
    pub fn execute(&mut self) -> Result<u32, StorageError> {
        let driver = self.handle.driver();
        let current = match self.handle.schema().version().read() {
            Ok(version) => version.unwrap_or(0),
            Err(err) => {
                debug!(error = %err, "no schema version recorded, starting from 0");
                if driver.requires_rollback_on_error {
                    self.handle.rollback()?;
                }
                0
            }
        };

        let mut latest = current;
        for (version, batch) in driver.migrations().range(current + 1..) {
            for migration in batch.iter() {
                debug!(version, description = migration.description, "applying migration");
                self.handle.execute(&Statement::new(migration.operation))?;
            }
            latest = *version;
        }

        if latest == current {
            debug!(version = current, dialect = driver.name, "schema up to date");
            return Ok(current);
        }

        {
            let mut version = self.handle.schema().version();
            if current > 0 {
                version.delete(current)?;
            }
            version.create(latest)?;
        }
        self.handle.commit()?;

        info!(from = current, to = latest, dialect = driver.name, "schema migrated");
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::ConnectionFactory;
    use crate::registry::StorageRegistry;

    fn memory_handle() -> StorageHandle {
        StorageRegistry::default()
            .handle(&ConnectionFactory::sqlite(rusqlite::Connection::open_in_memory))
            .unwrap()
    }

    #[tracing_test::traced_test]
    #[test]
    fn fresh_database_migrates_to_latest() {
        let mut handle = memory_handle();
        let latest = handle.driver().latest_version();
        assert_eq!(Builder::new(&mut handle).execute().unwrap(), latest);
        assert!(logs_contain("schema migrated"));
        assert!(logs_contain("no schema version recorded"));
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut handle = memory_handle();
        let first = Builder::new(&mut handle).execute().unwrap();
        let second = Builder::new(&mut handle).execute().unwrap();
        assert_eq!(first, second);
        assert_eq!(handle.schema().version().read().unwrap(), Some(first));
    }
}
