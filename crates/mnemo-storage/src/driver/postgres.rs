// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PostgreSQL driver.
//!
//! A failed statement puts the session into an aborted transaction that
//! rejects everything until `ROLLBACK`, hence `requires_rollback_on_error`.

use super::{Driver, Migration};
use crate::dialect::{Dialect, Placeholder, Upsert};

pub static DRIVER: Driver = Driver::new(
    "postgresql",
    &["postgres", "cockroachdb"],
    true,
    Dialect {
        name: "postgresql",
        placeholder: Placeholder::Dollar,
        insert_ignore: "INSERT INTO",
        ignore_suffix: " ON CONFLICT DO NOTHING",
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
                    num BIGINT NOT NULL PRIMARY KEY
                )",
            },
            Migration {
                description: "create table mnemo_parent",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_parent (
                    id BIGSERIAL PRIMARY KEY,
                    uuid VARCHAR(36) NOT NULL UNIQUE,
                    external_id VARCHAR(100) NOT NULL UNIQUE,
                    date_created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
            },
            Migration {
                description: "create table mnemo_entity",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_entity (
                    id BIGSERIAL PRIMARY KEY,
                    uuid VARCHAR(36) NOT NULL UNIQUE,
                    external_id VARCHAR(100) NOT NULL UNIQUE,
                    date_created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
            },
            Migration {
                description: "create table mnemo_process",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_process (
                    id BIGSERIAL PRIMARY KEY,
                    uuid VARCHAR(36) NOT NULL UNIQUE,
                    external_id VARCHAR(100) NOT NULL UNIQUE,
                    date_created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
            },
            Migration {
                description: "create table mnemo_session",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_session (
                    id BIGSERIAL PRIMARY KEY,
                    uuid VARCHAR(36) NOT NULL UNIQUE,
                    entity_id BIGINT REFERENCES mnemo_entity (id),
                    process_id BIGINT REFERENCES mnemo_process (id),
                    date_created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
            },
            Migration {
                description: "create table mnemo_conversation",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_conversation (
                    id BIGSERIAL PRIMARY KEY,
                    uuid VARCHAR(36) NOT NULL UNIQUE,
                    session_id BIGINT NOT NULL UNIQUE REFERENCES mnemo_session (id),
                    summary TEXT,
                    date_created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    date_updated TIMESTAMP
                )",
            },
            Migration {
                description: "create table mnemo_conversation_message",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_conversation_message (
                    id BIGSERIAL PRIMARY KEY,
                    uuid VARCHAR(36) NOT NULL UNIQUE,
                    conversation_id BIGINT NOT NULL REFERENCES mnemo_conversation (id),
                    role VARCHAR(255) NOT NULL,
                    type VARCHAR(255),
                    content TEXT NOT NULL,
                    date_created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
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
                    id BIGSERIAL PRIMARY KEY,
                    uuid VARCHAR(36) NOT NULL UNIQUE,
                    entity_id BIGINT NOT NULL REFERENCES mnemo_entity (id),
                    content TEXT NOT NULL,
                    vector BYTEA,
                    num_times BIGINT NOT NULL DEFAULT 1,
                    date_last_time TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    uniq CHAR(64) NOT NULL,
                    UNIQUE (entity_id, uniq)
                )",
            },
            Migration {
                description: "create table mnemo_process_attribute",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_process_attribute (
                    id BIGSERIAL PRIMARY KEY,
                    uuid VARCHAR(36) NOT NULL UNIQUE,
                    process_id BIGINT NOT NULL REFERENCES mnemo_process (id),
                    content TEXT NOT NULL,
                    num_times BIGINT NOT NULL DEFAULT 1,
                    date_last_time TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    uniq CHAR(64) NOT NULL,
                    UNIQUE (process_id, uniq)
                )",
            },
            Migration {
                description: "create table mnemo_subject",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_subject (
                    id BIGSERIAL PRIMARY KEY,
                    uuid VARCHAR(36) NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    type VARCHAR(255) NOT NULL,
                    uniq CHAR(64) NOT NULL UNIQUE
                )",
            },
            Migration {
                description: "create table mnemo_predicate",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_predicate (
                    id BIGSERIAL PRIMARY KEY,
                    uuid VARCHAR(36) NOT NULL UNIQUE,
                    content TEXT NOT NULL,
                    uniq CHAR(64) NOT NULL UNIQUE
                )",
            },
            Migration {
                description: "create table mnemo_object",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_object (
                    id BIGSERIAL PRIMARY KEY,
                    uuid VARCHAR(36) NOT NULL UNIQUE,
                    name TEXT NOT NULL,
                    type VARCHAR(255) NOT NULL,
                    uniq CHAR(64) NOT NULL UNIQUE
                )",
            },
            Migration {
                description: "create table mnemo_knowledge_graph",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_knowledge_graph (
                    id BIGSERIAL PRIMARY KEY,
                    uuid VARCHAR(36) NOT NULL UNIQUE,
                    entity_id BIGINT NOT NULL REFERENCES mnemo_entity (id),
                    subject_id BIGINT NOT NULL REFERENCES mnemo_subject (id),
                    predicate_id BIGINT NOT NULL REFERENCES mnemo_predicate (id),
                    object_id BIGINT NOT NULL REFERENCES mnemo_object (id),
                    num_times BIGINT NOT NULL DEFAULT 1,
                    date_last_time TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    UNIQUE (entity_id, subject_id, predicate_id, object_id)
                )",
            },
        ],
    ),
];
