// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter and driver selection.
//!
//! Adapters are chosen by evaluating registered predicates against the
//! connection factory in registration order; the driver is then chosen by
//! the adapter's dialect name. Either lookup failing is a configuration
//! error raised immediately.

use mnemo_core::MnemoError;
use tracing::debug;

use crate::adapter::{ConnectionAdapter, SqliteAdapter, StorageAdapter};
use crate::driver::{self, Driver};
use crate::factory::ConnectionFactory;
use crate::handle::StorageHandle;

pub type AdapterPredicate = fn(&ConnectionFactory) -> bool;
pub type AdapterConstructor = fn(&ConnectionFactory) -> Option<Box<dyn StorageAdapter>>;

#[derive(Clone)]
struct AdapterEntry {
    name: &'static str,
    matches: AdapterPredicate,
    build: AdapterConstructor,
}

/// Ordered adapter and driver registrations.
#[derive(Clone)]
pub struct StorageRegistry {
    adapters: Vec<AdapterEntry>,
    drivers: Vec<&'static Driver>,
}

impl StorageRegistry {
    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            adapters: Vec::new(),
            drivers: Vec::new(),
        }
    }

    pub fn register_adapter(
        &mut self,
        name: &'static str,
        matches: AdapterPredicate,
        build: AdapterConstructor,
    ) -> &mut Self {
        self.adapters.push(AdapterEntry {
            name,
            matches,
            build,
        });
        self
    }

    pub fn register_driver(&mut self, driver: &'static Driver) -> &mut Self {
        self.drivers.push(driver);
        self
    }

    /// First adapter whose predicate accepts `factory`.
    pub fn adapter(
        &self,
        factory: &ConnectionFactory,
    ) -> Result<Box<dyn StorageAdapter>, MnemoError> {
        let entry = self
            .adapters
            .iter()
            .find(|entry| (entry.matches)(factory))
            .ok_or_else(|| MnemoError::AdapterNotFound {
                what: "storage adapter",
                name: factory.dialect().to_string(),
            })?;
        debug!(adapter = entry.name, dialect = factory.dialect(), "selected storage adapter");
        (entry.build)(factory).ok_or_else(|| {
            MnemoError::Internal(format!(
                "adapter `{}` accepted a factory it could not build",
                entry.name
            ))
        })
    }

    /// Driver registered under `dialect` or one of its aliases.
    pub fn driver(&self, dialect: &str) -> Result<&'static Driver, MnemoError> {
        self.drivers
            .iter()
            .copied()
            .find(|d| d.matches(dialect))
            .ok_or_else(|| MnemoError::AdapterNotFound {
                what: "storage driver",
                name: dialect.to_string(),
            })
    }

    /// Adapter plus the driver for its dialect. The connection itself is
    /// opened lazily on first use.
    pub fn handle(&self, factory: &ConnectionFactory) -> Result<StorageHandle, MnemoError> {
        let adapter = self.adapter(factory)?;
        let driver = self.driver(adapter.dialect())?;
        Ok(StorageHandle::new(adapter, driver))
    }
}

impl Default for StorageRegistry {
    /// SQLite and custom-connection adapters; sqlite, postgresql, mysql and
    /// oracle drivers.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register_adapter(
                "sqlite",
                |f| matches!(f, ConnectionFactory::Sqlite(_)),
                |f| match f {
                    ConnectionFactory::Sqlite(open) => {
                        Some(Box::new(SqliteAdapter::new(open.clone())) as Box<dyn StorageAdapter>)
                    }
                    _ => None,
                },
            )
            .register_adapter(
                "connection",
                |f| matches!(f, ConnectionFactory::Custom { .. }),
                |f| match f {
                    ConnectionFactory::Custom { dialect, factory } => Some(Box::new(
                        ConnectionAdapter::new(dialect.clone(), factory.clone()),
                    )
                        as Box<dyn StorageAdapter>),
                    _ => None,
                },
            )
            .register_driver(&driver::sqlite::DRIVER)
            .register_driver(&driver::postgres::DRIVER)
            .register_driver(&driver::mysql::DRIVER)
            .register_driver(&driver::oracle::DRIVER);
        registry
    }
}
