// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MySQL / MariaDB driver.

use super::{Driver, Migration};
use crate::dialect::{Dialect, Placeholder, Upsert};

pub static DRIVER: Driver = Driver::new(
    "mysql",
    &["mariadb"],
    false,
    Dialect {
        name: "mysql",
        placeholder: Placeholder::Anonymous,
        insert_ignore: "INSERT IGNORE INTO",
        ignore_suffix: "",
        upsert: Upsert::OnDuplicateKey,
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
                    id BIGINT NOT NULL AUTO_INCREMENT,
                    uuid VARCHAR(36) NOT NULL,
                    external_id VARCHAR(100) NOT NULL,
                    date_created DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    PRIMARY KEY (id),
                    UNIQUE KEY (uuid),
                    UNIQUE KEY (external_id)
                )",
            },
            Migration {
                description: "create table mnemo_entity",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_entity (
                    id BIGINT NOT NULL AUTO_INCREMENT,
                    uuid VARCHAR(36) NOT NULL,
                    external_id VARCHAR(100) NOT NULL,
                    date_created DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    PRIMARY KEY (id),
                    UNIQUE KEY (uuid),
                    UNIQUE KEY (external_id)
                )",
            },
            Migration {
                description: "create table mnemo_process",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_process (
                    id BIGINT NOT NULL AUTO_INCREMENT,
                    uuid VARCHAR(36) NOT NULL,
                    external_id VARCHAR(100) NOT NULL,
                    date_created DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    PRIMARY KEY (id),
                    UNIQUE KEY (uuid),
                    UNIQUE KEY (external_id)
                )",
            },
            Migration {
                description: "create table mnemo_session",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_session (
                    id BIGINT NOT NULL AUTO_INCREMENT,
                    uuid VARCHAR(36) NOT NULL,
                    entity_id BIGINT DEFAULT NULL,
                    process_id BIGINT DEFAULT NULL,
                    date_created DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    PRIMARY KEY (id),
                    UNIQUE KEY (uuid),
                    CONSTRAINT fk_mnemo_session_entity FOREIGN KEY (entity_id) REFERENCES mnemo_entity (id),
                    CONSTRAINT fk_mnemo_session_process FOREIGN KEY (process_id) REFERENCES mnemo_process (id)
                )",
            },
            Migration {
                description: "create table mnemo_conversation",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_conversation (
                    id BIGINT NOT NULL AUTO_INCREMENT,
                    uuid VARCHAR(36) NOT NULL,
                    session_id BIGINT NOT NULL,
                    summary TEXT DEFAULT NULL,
                    date_created DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    date_updated DATETIME DEFAULT NULL ON UPDATE CURRENT_TIMESTAMP,
                    PRIMARY KEY (id),
                    UNIQUE KEY (session_id),
                    UNIQUE KEY (uuid),
                    CONSTRAINT fk_mnemo_conversation_session FOREIGN KEY (session_id) REFERENCES mnemo_session (id)
                )",
            },
            Migration {
                description: "create table mnemo_conversation_message",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_conversation_message (
                    id BIGINT NOT NULL AUTO_INCREMENT,
                    uuid VARCHAR(36) NOT NULL,
                    conversation_id BIGINT NOT NULL,
                    role VARCHAR(255) NOT NULL,
                    type VARCHAR(255) DEFAULT NULL,
                    content TEXT NOT NULL,
                    date_created DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    PRIMARY KEY (id),
                    UNIQUE KEY (conversation_id, id),
                    UNIQUE KEY (uuid),
                    CONSTRAINT fk_mnemo_conversation_message_conversation FOREIGN KEY (conversation_id) REFERENCES mnemo_conversation (id)
                )",
            },
        ],
    ),
    (
        2,
        &[
            Migration {
                description: "create table mnemo_entity_fact",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_entity_fact (
                    id BIGINT NOT NULL AUTO_INCREMENT,
                    uuid VARCHAR(36) NOT NULL,
                    entity_id BIGINT NOT NULL,
                    content TEXT NOT NULL,
                    vector LONGBLOB DEFAULT NULL,
                    num_times BIGINT NOT NULL DEFAULT 1,
                    date_last_time DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    uniq CHAR(64) NOT NULL,
                    PRIMARY KEY (id),
                    UNIQUE KEY (uuid),
                    UNIQUE KEY (entity_id, uniq),
                    CONSTRAINT fk_mnemo_entity_fact_entity FOREIGN KEY (entity_id) REFERENCES mnemo_entity (id)
                )",
            },
            Migration {
                description: "create table mnemo_process_attribute",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_process_attribute (
                    id BIGINT NOT NULL AUTO_INCREMENT,
                    uuid VARCHAR(36) NOT NULL,
                    process_id BIGINT NOT NULL,
                    content TEXT NOT NULL,
                    num_times BIGINT NOT NULL DEFAULT 1,
                    date_last_time DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    uniq CHAR(64) NOT NULL,
                    PRIMARY KEY (id),
                    UNIQUE KEY (uuid),
                    UNIQUE KEY (process_id, uniq),
                    CONSTRAINT fk_mnemo_process_attribute_process FOREIGN KEY (process_id) REFERENCES mnemo_process (id)
                )",
            },
            Migration {
                description: "create table mnemo_subject",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_subject (
                    id BIGINT NOT NULL AUTO_INCREMENT,
                    uuid VARCHAR(36) NOT NULL,
                    name VARCHAR(255) NOT NULL,
                    type VARCHAR(255) NOT NULL,
                    uniq CHAR(64) NOT NULL,
                    PRIMARY KEY (id),
                    UNIQUE KEY (uuid),
                    UNIQUE KEY (uniq)
                )",
            },
            Migration {
                description: "create table mnemo_predicate",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_predicate (
                    id BIGINT NOT NULL AUTO_INCREMENT,
                    uuid VARCHAR(36) NOT NULL,
                    content VARCHAR(255) NOT NULL,
                    uniq CHAR(64) NOT NULL,
                    PRIMARY KEY (id),
                    UNIQUE KEY (uuid),
                    UNIQUE KEY (uniq)
                )",
            },
            Migration {
                description: "create table mnemo_object",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_object (
                    id BIGINT NOT NULL AUTO_INCREMENT,
                    uuid VARCHAR(36) NOT NULL,
                    name VARCHAR(255) NOT NULL,
                    type VARCHAR(255) NOT NULL,
                    uniq CHAR(64) NOT NULL,
                    PRIMARY KEY (id),
                    UNIQUE KEY (uuid),
                    UNIQUE KEY (uniq)
                )",
            },
            Migration {
                description: "create table mnemo_knowledge_graph",
                operation: "CREATE TABLE IF NOT EXISTS mnemo_knowledge_graph (
                    id BIGINT NOT NULL AUTO_INCREMENT,
                    uuid VARCHAR(36) NOT NULL,
                    entity_id BIGINT NOT NULL,
                    subject_id BIGINT NOT NULL,
                    predicate_id BIGINT NOT NULL,
                    object_id BIGINT NOT NULL,
                    num_times BIGINT NOT NULL DEFAULT 1,
                    date_last_time DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    PRIMARY KEY (id),
                    UNIQUE KEY (uuid),
                    UNIQUE KEY (entity_id, subject_id, predicate_id, object_id),
                    CONSTRAINT fk_mnemo_knowledge_graph_entity FOREIGN KEY (entity_id) REFERENCES mnemo_entity (id),
                    CONSTRAINT fk_mnemo_knowledge_graph_subject FOREIGN KEY (subject_id) REFERENCES mnemo_subject (id),
                    CONSTRAINT fk_mnemo_knowledge_graph_predicate FOREIGN KEY (predicate_id) REFERENCES mnemo_predicate (id),
                    CONSTRAINT fk_mnemo_knowledge_graph_object FOREIGN KEY (object_id) REFERENCES mnemo_object (id)
                )",
            },
        ],
    ),
];
