// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Oracle driver.
//!
//! Oracle has no `CREATE TABLE IF NOT EXISTS` before 23ai, so each DDL
//! statement runs inside a PL/SQL block that swallows ORA-00955 (name
//! already used). Inserts-if-absent and upserts are `MERGE` statements.

use super::{Driver, Migration};
use crate::dialect::{Dialect, Placeholder, Upsert};

/// Wrap one DDL statement so re-running it is a no-op. The statement must
/// not contain single quotes.
macro_rules! once {
    ($ddl:literal) => {
        concat!(
            "BEGIN EXECUTE IMMEDIATE '",
            $ddl,
            "'; EXCEPTION WHEN OTHERS THEN IF SQLCODE = -955 THEN NULL; ELSE RAISE; END IF; END;"
        )
    };
}

pub static DRIVER: Driver = Driver::new(
    "oracle",
    &[],
    true,
    Dialect {
        name: "oracle",
        placeholder: Placeholder::Colon,
        insert_ignore: "",
        ignore_suffix: "",
        upsert: Upsert::Merge,
    },
    MIGRATIONS,
);

const MIGRATIONS: &[(u32, &[Migration])] = &[
    (
        1,
        &[
            Migration {
                description: "create table mnemo_schema_version",
                operation: once!("CREATE TABLE mnemo_schema_version (
                    num NUMBER(19) NOT NULL PRIMARY KEY
                )"),
            },
            Migration {
                description: "create table mnemo_parent",
                operation: once!("CREATE TABLE mnemo_parent (
                    id NUMBER(19) GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                    uuid VARCHAR2(36) NOT NULL UNIQUE,
                    external_id VARCHAR2(100) NOT NULL UNIQUE,
                    date_created TIMESTAMP DEFAULT SYSTIMESTAMP NOT NULL
                )"),
            },
            Migration {
                description: "create table mnemo_entity",
                operation: once!("CREATE TABLE mnemo_entity (
                    id NUMBER(19) GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                    uuid VARCHAR2(36) NOT NULL UNIQUE,
                    external_id VARCHAR2(100) NOT NULL UNIQUE,
                    date_created TIMESTAMP DEFAULT SYSTIMESTAMP NOT NULL
                )"),
            },
            Migration {
                description: "create table mnemo_process",
                operation: once!("CREATE TABLE mnemo_process (
                    id NUMBER(19) GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                    uuid VARCHAR2(36) NOT NULL UNIQUE,
                    external_id VARCHAR2(100) NOT NULL UNIQUE,
                    date_created TIMESTAMP DEFAULT SYSTIMESTAMP NOT NULL
                )"),
            },
            Migration {
                description: "create table mnemo_session",
                operation: once!("CREATE TABLE mnemo_session (
                    id NUMBER(19) GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                    uuid VARCHAR2(36) NOT NULL UNIQUE,
                    entity_id NUMBER(19) REFERENCES mnemo_entity (id),
                    process_id NUMBER(19) REFERENCES mnemo_process (id),
                    date_created TIMESTAMP DEFAULT SYSTIMESTAMP NOT NULL
                )"),
            },
            Migration {
                description: "create table mnemo_conversation",
                operation: once!("CREATE TABLE mnemo_conversation (
                    id NUMBER(19) GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                    uuid VARCHAR2(36) NOT NULL UNIQUE,
                    session_id NUMBER(19) NOT NULL UNIQUE REFERENCES mnemo_session (id),
                    summary CLOB,
                    date_created TIMESTAMP DEFAULT SYSTIMESTAMP NOT NULL,
                    date_updated TIMESTAMP
                )"),
            },
            Migration {
                description: "create table mnemo_conversation_message",
                operation: once!("CREATE TABLE mnemo_conversation_message (
                    id NUMBER(19) GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                    uuid VARCHAR2(36) NOT NULL UNIQUE,
                    conversation_id NUMBER(19) NOT NULL REFERENCES mnemo_conversation (id),
                    role VARCHAR2(255) NOT NULL,
                    type VARCHAR2(255),
                    content CLOB NOT NULL,
                    date_created TIMESTAMP DEFAULT SYSTIMESTAMP NOT NULL
                )"),
            },
            Migration {
                description: "index mnemo_conversation_message by conversation",
                operation: once!("CREATE INDEX idx_mnemo_conv_msg_conv
                    ON mnemo_conversation_message (conversation_id, id)"),
            },
        ],
    ),
    (
        2,
        &[
            Migration {
                description: "create table mnemo_entity_fact",
                operation: once!("CREATE TABLE mnemo_entity_fact (
                    id NUMBER(19) GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                    uuid VARCHAR2(36) NOT NULL UNIQUE,
                    entity_id NUMBER(19) NOT NULL REFERENCES mnemo_entity (id),
                    content CLOB NOT NULL,
                    vector BLOB,
                    num_times NUMBER(19) DEFAULT 1 NOT NULL,
                    date_last_time TIMESTAMP DEFAULT SYSTIMESTAMP NOT NULL,
                    uniq CHAR(64) NOT NULL,
                    UNIQUE (entity_id, uniq)
                )"),
            },
            Migration {
                description: "create table mnemo_process_attribute",
                operation: once!("CREATE TABLE mnemo_process_attribute (
                    id NUMBER(19) GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                    uuid VARCHAR2(36) NOT NULL UNIQUE,
                    process_id NUMBER(19) NOT NULL REFERENCES mnemo_process (id),
                    content CLOB NOT NULL,
                    num_times NUMBER(19) DEFAULT 1 NOT NULL,
                    date_last_time TIMESTAMP DEFAULT SYSTIMESTAMP NOT NULL,
                    uniq CHAR(64) NOT NULL,
                    UNIQUE (process_id, uniq)
                )"),
            },
            Migration {
                description: "create table mnemo_subject",
                operation: once!("CREATE TABLE mnemo_subject (
                    id NUMBER(19) GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                    uuid VARCHAR2(36) NOT NULL UNIQUE,
                    name VARCHAR2(4000) NOT NULL,
                    type VARCHAR2(255) NOT NULL,
                    uniq CHAR(64) NOT NULL UNIQUE
                )"),
            },
            Migration {
                description: "create table mnemo_predicate",
                operation: once!("CREATE TABLE mnemo_predicate (
                    id NUMBER(19) GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                    uuid VARCHAR2(36) NOT NULL UNIQUE,
                    content VARCHAR2(4000) NOT NULL,
                    uniq CHAR(64) NOT NULL UNIQUE
                )"),
            },
            Migration {
                description: "create table mnemo_object",
                operation: once!("CREATE TABLE mnemo_object (
                    id NUMBER(19) GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                    uuid VARCHAR2(36) NOT NULL UNIQUE,
                    name VARCHAR2(4000) NOT NULL,
                    type VARCHAR2(255) NOT NULL,
                    uniq CHAR(64) NOT NULL UNIQUE
                )"),
            },
            Migration {
                description: "create table mnemo_knowledge_graph",
                operation: once!("CREATE TABLE mnemo_knowledge_graph (
                    id NUMBER(19) GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
                    uuid VARCHAR2(36) NOT NULL UNIQUE,
                    entity_id NUMBER(19) NOT NULL REFERENCES mnemo_entity (id),
                    subject_id NUMBER(19) NOT NULL REFERENCES mnemo_subject (id),
                    predicate_id NUMBER(19) NOT NULL REFERENCES mnemo_predicate (id),
                    object_id NUMBER(19) NOT NULL REFERENCES mnemo_object (id),
                    num_times NUMBER(19) DEFAULT 1 NOT NULL,
                    date_last_time TIMESTAMP DEFAULT SYSTIMESTAMP NOT NULL,
                    UNIQUE (entity_id, subject_id, predicate_id, object_id)
                )"),
            },
        ],
    ),
];
