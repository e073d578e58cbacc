// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-entity operations shared by every driver.
//!
//! Each family is a short-lived view borrowing an adapter and a dialect.
//! None of them commit: the surrounding transaction decides when writes
//! become durable.

use mnemo_core::{Message, SemanticTriple, content_key, vec_to_blob};
use uuid::Uuid;

use super::tables;
use crate::adapter::StorageAdapter;
use crate::dialect::Dialect;
use crate::error::StorageError;
use crate::value::{Rows, Statement, Value};

/// An adapter paired with the dialect its statements are rendered in.
pub struct Db<'a> {
    adapter: &'a mut dyn StorageAdapter,
    dialect: &'a Dialect,
}

impl<'a> Db<'a> {
    pub fn new(adapter: &'a mut dyn StorageAdapter, dialect: &'a Dialect) -> Self {
        Self { adapter, dialect }
    }

    fn run(&mut self, sql: &str, params: Vec<Value>) -> Result<Rows, StorageError> {
        self.adapter.execute(&Statement {
            sql: sql.to_string(),
            params,
        })
    }

    /// Render a `?`-template for this dialect and run it.
    fn query(&mut self, template: &str, params: Vec<Value>) -> Result<Rows, StorageError> {
        let sql = self.dialect.render(template);
        self.run(&sql, params)
    }

    fn id_where(
        &mut self,
        table: &str,
        column: &str,
        value: impl Into<Value>,
    ) -> Result<i64, StorageError> {
        self.query(
            &format!("SELECT id FROM {table} WHERE {column} = ?"),
            vec![value.into()],
        )?
        .first_i64("id")?
        .ok_or(StorageError::NoRows)
    }

    /// Insert-if-absent keyed on a unique `column`, then return the row id.
    fn ensure(
        &mut self,
        table: &str,
        columns: &[&str],
        params: Vec<Value>,
        key_column: &str,
        key: Value,
    ) -> Result<i64, StorageError> {
        let sql = self.dialect.insert_if_absent(table, columns, &[key_column]);
        self.run(&sql, params)?;
        self.id_where(table, key_column, key)
    }
}

fn new_uuid() -> Value {
    Value::Text(Uuid::new_v4().to_string())
}

/// A stored conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationRecord {
    pub id: i64,
    pub uuid: String,
    pub session_id: i64,
    pub summary: Option<String>,
}

/// A content-addressed fact or attribute with its observation count.
#[derive(Debug, Clone, PartialEq)]
pub struct CountedContent {
    pub content: String,
    pub num_times: i64,
}

/// A stored knowledge-graph edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub triple: SemanticTriple,
    pub num_times: i64,
}

pub struct Conversation<'a>(pub(crate) Db<'a>);

impl<'a> Conversation<'a> {
    /// One conversation per session; returns the existing id when present.
    pub fn create(&mut self, session_id: i64) -> Result<i64, StorageError> {
        self.0.ensure(
            tables::CONVERSATION,
            &["uuid", "session_id"],
            vec![new_uuid(), Value::Integer(session_id)],
            "session_id",
            Value::Integer(session_id),
        )
    }

    pub fn read(&mut self, id: i64) -> Result<Option<ConversationRecord>, StorageError> {
        let rows = self.0.query(
            &format!(
                "SELECT id, uuid, session_id, summary FROM {} WHERE id = ?",
                tables::CONVERSATION
            ),
            vec![Value::Integer(id)],
        )?;
        let Some(row) = rows.iter().next() else {
            return Ok(None);
        };
        Ok(Some(ConversationRecord {
            id,
            uuid: row.text("uuid")?,
            session_id: row
                .get("session_id")
                .and_then(Value::as_i64)
                .ok_or_else(|| StorageError::Column("session_id".into()))?,
            summary: row.opt_text("summary"),
        }))
    }

    /// A `None` summary leaves the row untouched.
    pub fn update(&mut self, id: i64, summary: Option<&str>) -> Result<(), StorageError> {
        let Some(summary) = summary else {
            return Ok(());
        };
        self.0.query(
            &format!(
                "UPDATE {} SET summary = ?, date_updated = CURRENT_TIMESTAMP WHERE id = ?",
                tables::CONVERSATION
            ),
            vec![summary.into(), Value::Integer(id)],
        )?;
        Ok(())
    }

    pub fn message(self) -> ConversationMessage<'a> {
        ConversationMessage(self.0)
    }

    pub fn messages(self) -> ConversationMessages<'a> {
        ConversationMessages(self.0)
    }
}

pub struct ConversationMessage<'a>(Db<'a>);

impl ConversationMessage<'_> {
    /// Append one message. Messages are never updated or deleted.
    pub fn create(
        &mut self,
        conversation_id: i64,
        role: &str,
        kind: Option<&str>,
        content: &str,
    ) -> Result<(), StorageError> {
        self.0.query(
            &format!(
                "INSERT INTO {} (uuid, conversation_id, role, type, content) VALUES (?, ?, ?, ?, ?)",
                tables::CONVERSATION_MESSAGE
            ),
            vec![
                new_uuid(),
                Value::Integer(conversation_id),
                role.into(),
                kind.into(),
                content.into(),
            ],
        )?;
        Ok(())
    }
}

pub struct ConversationMessages<'a>(Db<'a>);

impl ConversationMessages<'_> {
    /// All messages of a conversation in creation order.
    pub fn read(&mut self, conversation_id: i64) -> Result<Vec<Message>, StorageError> {
        let rows = self.0.query(
            &format!(
                "SELECT role, content FROM {} WHERE conversation_id = ? ORDER BY id",
                tables::CONVERSATION_MESSAGE
            ),
            vec![Value::Integer(conversation_id)],
        )?;
        rows.iter()
            .map(|row| Ok(Message::new(row.text("role")?, row.text("content")?)))
            .collect()
    }
}

/// Families keyed by an external id: entity, process, parent.
pub struct External<'a> {
    db: Db<'a>,
    table: &'static str,
}

impl External<'_> {
    /// Insert-if-absent by external id; returns the internal id.
    pub fn create(&mut self, external_id: &str) -> Result<i64, StorageError> {
        self.db.ensure(
            self.table,
            &["uuid", "external_id"],
            vec![new_uuid(), external_id.into()],
            "external_id",
            external_id.into(),
        )
    }

    /// Internal id for `external_id`, without creating it.
    pub fn read(&mut self, external_id: &str) -> Result<Option<i64>, StorageError> {
        match self.db.id_where(self.table, "external_id", external_id) {
            Ok(id) => Ok(Some(id)),
            Err(StorageError::NoRows) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

pub fn entity(db: Db<'_>) -> External<'_> {
    External {
        db,
        table: tables::ENTITY,
    }
}

pub fn process(db: Db<'_>) -> External<'_> {
    External {
        db,
        table: tables::PROCESS,
    }
}

pub fn parent(db: Db<'_>) -> External<'_> {
    External {
        db,
        table: tables::PARENT,
    }
}

pub struct Session<'a>(pub(crate) Db<'a>);

impl Session<'_> {
    pub fn create(
        &mut self,
        uuid: &str,
        entity_id: Option<i64>,
        process_id: Option<i64>,
    ) -> Result<i64, StorageError> {
        self.0.ensure(
            tables::SESSION,
            &["uuid", "entity_id", "process_id"],
            vec![uuid.into(), entity_id.into(), process_id.into()],
            "uuid",
            uuid.into(),
        )
    }
}

/// Recurring content owned by an entity or process.
pub struct Counted<'a> {
    db: Db<'a>,
    table: &'static str,
    owner: &'static str,
}

impl Counted<'_> {
    /// Repeated content increments `num_times` instead of adding a row.
    pub fn create(
        &mut self,
        owner_id: i64,
        contents: &[String],
        embeddings: Option<&[Vec<f32>]>,
    ) -> Result<(), StorageError> {
        let with_vector = self.table == tables::ENTITY_FACT;
        let mut columns = vec!["uuid", self.owner, "content"];
        if with_vector {
            columns.push("vector");
        }
        columns.push("uniq");
        let sql = self
            .db
            .dialect
            .insert_or_increment(self.table, &columns, &[self.owner, "uniq"]);

        for (i, content) in contents.iter().enumerate() {
            let mut params = vec![new_uuid(), Value::Integer(owner_id), content.as_str().into()];
            if with_vector {
                let vector = embeddings
                    .and_then(|e| e.get(i))
                    .map(|v| Value::Blob(vec_to_blob(v)))
                    .unwrap_or(Value::Null);
                params.push(vector);
            }
            params.push(content_key(&[content]).into());
            self.db.run(&sql, params)?;
        }
        Ok(())
    }

    pub fn read(&mut self, owner_id: i64) -> Result<Vec<CountedContent>, StorageError> {
        let rows = self.db.query(
            &format!(
                "SELECT content, num_times FROM {} WHERE {} = ? ORDER BY id",
                self.table, self.owner
            ),
            vec![Value::Integer(owner_id)],
        )?;
        rows.iter()
            .map(|row| {
                Ok(CountedContent {
                    content: row.text("content")?,
                    num_times: row.get("num_times").and_then(Value::as_i64).unwrap_or(0),
                })
            })
            .collect()
    }
}

pub fn entity_fact(db: Db<'_>) -> Counted<'_> {
    Counted {
        db,
        table: tables::ENTITY_FACT,
        owner: "entity_id",
    }
}

pub fn process_attribute(db: Db<'_>) -> Counted<'_> {
    Counted {
        db,
        table: tables::PROCESS_ATTRIBUTE,
        owner: "process_id",
    }
}

pub struct KnowledgeGraph<'a>(pub(crate) Db<'a>);

impl KnowledgeGraph<'_> {
    /// Subject, predicate and object are inserted if absent by content key;
    /// the edge between them is an insert-or-increment.
    pub fn create(&mut self, entity_id: i64, triples: &[SemanticTriple]) -> Result<(), StorageError> {
        let edge_sql = self.0.dialect.insert_or_increment(
            tables::KNOWLEDGE_GRAPH,
            &["uuid", "entity_id", "subject_id", "predicate_id", "object_id"],
            &["entity_id", "subject_id", "predicate_id", "object_id"],
        );

        for triple in triples {
            let subject_id = self.node(
                tables::SUBJECT,
                &triple.subject_name,
                &triple.subject_type,
            )?;
            let uniq = content_key(&[&triple.predicate]);
            let predicate_id = self.0.ensure(
                tables::PREDICATE,
                &["uuid", "content", "uniq"],
                vec![new_uuid(), triple.predicate.as_str().into(), uniq.clone().into()],
                "uniq",
                uniq.into(),
            )?;
            let object_id = self.node(tables::OBJECT, &triple.object_name, &triple.object_type)?;

            self.0.run(
                &edge_sql,
                vec![
                    new_uuid(),
                    Value::Integer(entity_id),
                    Value::Integer(subject_id),
                    Value::Integer(predicate_id),
                    Value::Integer(object_id),
                ],
            )?;
        }
        Ok(())
    }

    fn node(&mut self, table: &str, name: &str, kind: &str) -> Result<i64, StorageError> {
        let uniq = content_key(&[name, kind]);
        self.0.ensure(
            table,
            &["uuid", "name", "type", "uniq"],
            vec![new_uuid(), name.into(), kind.into(), uniq.clone().into()],
            "uniq",
            uniq.into(),
        )
    }

    pub fn read(&mut self, entity_id: i64) -> Result<Vec<Edge>, StorageError> {
        let rows = self.0.query(
            &format!(
                "SELECT s.name AS subject_name, s.type AS subject_type, p.content AS predicate, \
                        o.name AS object_name, o.type AS object_type, kg.num_times AS num_times \
                   FROM {kg} kg \
                   JOIN {s} s ON s.id = kg.subject_id \
                   JOIN {p} p ON p.id = kg.predicate_id \
                   JOIN {o} o ON o.id = kg.object_id \
                  WHERE kg.entity_id = ? \
                  ORDER BY kg.id",
                kg = tables::KNOWLEDGE_GRAPH,
                s = tables::SUBJECT,
                p = tables::PREDICATE,
                o = tables::OBJECT,
            ),
            vec![Value::Integer(entity_id)],
        )?;
        rows.iter()
            .map(|row| {
                Ok(Edge {
                    triple: SemanticTriple::new(
                        (&row.text("subject_name")?, &row.text("subject_type")?),
                        &row.text("predicate")?,
                        (&row.text("object_name")?, &row.text("object_type")?),
                    ),
                    num_times: row.get("num_times").and_then(Value::as_i64).unwrap_or(0),
                })
            })
            .collect()
    }
}

pub struct Schema<'a>(pub(crate) Db<'a>);

impl<'a> Schema<'a> {
    pub fn version(self) -> SchemaVersion<'a> {
        SchemaVersion(self.0)
    }
}

pub struct SchemaVersion<'a>(Db<'a>);

impl SchemaVersion<'_> {
    pub fn create(&mut self, num: u32) -> Result<(), StorageError> {
        self.0.query(
            &format!("INSERT INTO {} (num) VALUES (?)", tables::SCHEMA_VERSION),
            vec![num.into()],
        )?;
        Ok(())
    }

    /// Current schema version, `None` on an empty version table.
    pub fn read(&mut self) -> Result<Option<u32>, StorageError> {
        let rows = self.0.query(
            &format!("SELECT MAX(num) AS num FROM {}", tables::SCHEMA_VERSION),
            vec![],
        )?;
        rows.first_i64("num")?
            .map(|n| u32::try_from(n).map_err(|_| StorageError::Column(format!("bad schema version {n}"))))
            .transpose()
    }

    pub fn delete(&mut self, num: u32) -> Result<(), StorageError> {
        self.0.query(
            &format!("DELETE FROM {} WHERE num = ?", tables::SCHEMA_VERSION),
            vec![num.into()],
        )?;
        Ok(())
    }
}
