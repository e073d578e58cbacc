// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dialect drivers.
//!
//! A [`Driver`] is static data: its dialect, whether a failed statement
//! aborts the surrounding transaction, and its schema migrations. The
//! per-entity operations live in [`families`] and are shared by every
//! driver, rendered through the driver's [`Dialect`].

use std::collections::BTreeMap;

use crate::dialect::Dialect;

pub mod families;
pub mod mysql;
pub mod oracle;
pub mod postgres;
pub mod sqlite;

/// One schema change.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub description: &'static str,
    pub operation: &'static str,
}

/// Statement syntax, transaction-abort behaviour and schema for one backend.
#[derive(Debug)]
pub struct Driver {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// When true, any failed statement leaves the connection in an aborted
    /// transaction that rejects further statements until rolled back.
    pub requires_rollback_on_error: bool,
    pub dialect: Dialect,
    migrations: &'static [(u32, &'static [Migration])],
}

impl Driver {
    pub const fn new(
        name: &'static str,
        aliases: &'static [&'static str],
        requires_rollback_on_error: bool,
        dialect: Dialect,
        migrations: &'static [(u32, &'static [Migration])],
    ) -> Self {
        Self {
            name,
            aliases,
            requires_rollback_on_error,
            dialect,
            migrations,
        }
    }

    /// True if `dialect` names this driver or one of its aliases.
    pub fn matches(&self, dialect: &str) -> bool {
        self.name.eq_ignore_ascii_case(dialect)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(dialect))
    }

    /// Migration batches keyed by schema version.
    pub fn migrations(&self) -> BTreeMap<u32, &'static [Migration]> {
        self.migrations.iter().copied().collect()
    }

    pub fn latest_version(&self) -> u32 {
        self.migrations.iter().map(|(v, _)| *v).max().unwrap_or(0)
    }
}

/// Table names, shared by every dialect's DDL and the family queries.
pub(crate) mod tables {
    pub const SCHEMA_VERSION: &str = "mnemo_schema_version";
    pub const SESSION: &str = "mnemo_session";
    pub const PARENT: &str = "mnemo_parent";
    pub const ENTITY: &str = "mnemo_entity";
    pub const PROCESS: &str = "mnemo_process";
    pub const CONVERSATION: &str = "mnemo_conversation";
    pub const CONVERSATION_MESSAGE: &str = "mnemo_conversation_message";
    pub const ENTITY_FACT: &str = "mnemo_entity_fact";
    pub const PROCESS_ATTRIBUTE: &str = "mnemo_process_attribute";
    pub const SUBJECT: &str = "mnemo_subject";
    pub const PREDICATE: &str = "mnemo_predicate";
    pub const OBJECT: &str = "mnemo_object";
    pub const KNOWLEDGE_GRAPH: &str = "mnemo_knowledge_graph";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_match_case_insensitively() {
        assert!(postgres::DRIVER.matches("postgres"));
        assert!(postgres::DRIVER.matches("PostgreSQL"));
        assert!(mysql::DRIVER.matches("mariadb"));
        assert!(oracle::DRIVER.matches("ORACLE"));
        assert!(!sqlite::DRIVER.matches("mysql"));
    }

    #[test]
    fn rollback_flag_per_dialect() {
        assert!(!sqlite::DRIVER.requires_rollback_on_error);
        assert!(postgres::DRIVER.requires_rollback_on_error);
        assert!(!mysql::DRIVER.requires_rollback_on_error);
        assert!(oracle::DRIVER.requires_rollback_on_error);
    }

    #[test]
    fn every_driver_ships_the_same_schema_version() {
        let latest = sqlite::DRIVER.latest_version();
        assert!(latest >= 1);
        assert_eq!(postgres::DRIVER.latest_version(), latest);
        assert_eq!(mysql::DRIVER.latest_version(), latest);
        assert_eq!(oracle::DRIVER.latest_version(), latest);
    }

    #[test]
    fn first_migration_creates_version_table() {
        for driver in [&sqlite::DRIVER, &postgres::DRIVER, &mysql::DRIVER, &oracle::DRIVER] {
            let batches = driver.migrations();
            let first = batches.values().next().unwrap();
            assert!(first[0].operation.contains(tables::SCHEMA_VERSION));
        }
    }
}
