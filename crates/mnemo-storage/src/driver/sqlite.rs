// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite driver.

use super::{Driver, Migration};
use crate::dialect::{Dialect, Placeholder, Upsert};

pub static DRIVER: Driver = Driver::new(
    "sqlite",
    &["sqlite3"],
    false,
    Dialect {
        name: "sqlite",
        placeholder: Placeholder::Numbered,
        insert_ignore: "INSERT OR IGNORE INTO",
        ignore_suffix: "",
        upsert: Upsert::OnConflict,
    },
    MIGRATIONS,
);

const MIGRATIONS: &[(u32, &[Migration])] = &[
    (
        1,
        &[
            Migration {
                description: "create table mnemo_schema_version",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_schema_version (
                    num INTEGER NOT NULL PRIMARY KEY
                )",
            },
            Migration {
                description: "create table mnemo_parent",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_parent (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    external_id TEXT NOT NULL UNIQUE,
                    date_created DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
            },
            Migration {
                description: "create table mnemo_entity",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_entity (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    external_id TEXT NOT NULL UNIQUE,
                    date_created DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
            },
            Migration {
                description: "create table mnemo_process",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_process (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    external_id TEXT NOT NULL UNIQUE,
                    date_created DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
            },
            Migration {
                description: "create table mnemo_session",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_session (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    entity_id INTEGER REFERENCES mnemo_entity (id),
                    process_id INTEGER REFERENCES mnemo_process (id),
                    date_created DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
            },
            Migration {
                description: "create table mnemo_conversation",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_conversation (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    session_id INTEGER NOT NULL UNIQUE REFERENCES mnemo_session (id),
                    summary TEXT,
                    date_created DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    date_updated DATETIME
                )",
            },
            Migration {
                description: "create table mnemo_conversation_message",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_conversation_message (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    conversation_id INTEGER NOT NULL REFERENCES mnemo_conversation (id),
                    role TEXT NOT NULL,
                    type TEXT,
                    content TEXT NOT NULL,
                    date_created DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
            },
            Migration {
                description: "index mnemo_conversation_message by conversation",
                operation: "CREATE INDEX IF NOT EXISTS idx_mnemo_conversation_message_conversation
                    ON mnemo_conversation_message (conversation_id, id)",
            },
        ],
    ),
    (
        2,
        &[
            Migration {
                description: "create table mnemo_entity_fact",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_entity_fact (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    entity_id INTEGER NOT NULL REFERENCES mnemo_entity (id),
                    content TEXT NOT NULL,
                    vector BLOB,
                    num_times INTEGER NOT NULL DEFAULT 1,
                    date_last_time DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    uniq TEXT NOT NULL,
                    UNIQUE (entity_id, uniq)
                )",
            },
            Migration {
                description: "create table mnemo_process_attribute",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_process_attribute (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    process_id INTEGER NOT NULL REFERENCES mnemo_process (id),
                    content TEXT NOT NULL,
                    num_times INTEGER NOT NULL DEFAULT 1,
                    date_last_time DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    uniq TEXT NOT NULL,
                    UNIQUE (process_id, uniq)
                )",
            },
            Migration {
                description: "create table mnemo_subject",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_subject (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    type TEXT NOT NULL,
                    uniq TEXT NOT NULL UNIQUE
                )",
            },
            Migration {
                description: "create table mnemo_predicate",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_predicate (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    content TEXT NOT NULL,
                    uniq TEXT NOT NULL UNIQUE
                )",
            },
            Migration {
                description: "create table mnemo_object",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_object (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    type TEXT NOT NULL,
                    uniq TEXT NOT NULL UNIQUE
                )",
            },
            Migration {
                description: "create table mnemo_knowledge_graph",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_knowledge_graph (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    entity_id INTEGER NOT NULL REFERENCES mnemo_entity (id),
                    subject_id INTEGER NOT NULL REFERENCES mnemo_subject (id),
                    predicate_id INTEGER NOT NULL REFERENCES mnemo_predicate (id),
                    object_id INTEGER NOT NULL REFERENCES mnemo_object (id),
                    num_times INTEGER NOT NULL DEFAULT 1,
                    date_last_time DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    UNIQUE (entity_id, subject_id, predicate_id, object_id)
                )",
            },
        ],
    ),
];
