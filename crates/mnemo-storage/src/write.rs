// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deferred write descriptors.
//!
//! A descriptor names one driver operation and carries its arguments. Entity
//! and process references are external ids; they are resolved
//! (insert-if-absent) when the descriptor is applied, so whoever builds a
//! descriptor never needs write access.

use mnemo_core::SemanticTriple;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::handle::StorageHandle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WriteDescriptor {
    SessionCreate {
        uuid: String,
        entity_external_id: Option<String>,
        process_external_id: Option<String>,
    },
    ParentCreate {
        external_id: String,
    },
    ConversationCreate {
        session_id: i64,
    },
    ConversationUpdate {
        conversation_id: i64,
        summary: Option<String>,
    },
    ConversationMessageCreate {
        conversation_id: i64,
        role: String,
        kind: Option<String>,
        content: String,
    },
    EntityFacts {
        external_id: String,
        facts: Vec<String>,
        embeddings: Option<Vec<Vec<f32>>>,
    },
    KnowledgeGraph {
        external_id: String,
        triples: Vec<SemanticTriple>,
    },
    ProcessAttributes {
        external_id: String,
        attributes: Vec<String>,
    },
}

impl WriteDescriptor {
    /// Dotted driver operation this descriptor targets.
    pub fn target_operation(&self) -> &'static str {
        match self {
            WriteDescriptor::SessionCreate { .. } => "session.create",
            WriteDescriptor::ParentCreate { .. } => "parent.create",
            WriteDescriptor::ConversationCreate { .. } => "conversation.create",
            WriteDescriptor::ConversationUpdate { .. } => "conversation.update",
            WriteDescriptor::ConversationMessageCreate { .. } => "conversation.message.create",
            WriteDescriptor::EntityFacts { .. } => "entity_fact.create",
            WriteDescriptor::KnowledgeGraph { .. } => "knowledge_graph.create",
            WriteDescriptor::ProcessAttributes { .. } => "process_attribute.create",
        }
    }

    /// Apply against `handle`. Returns the id of the created row for the
    /// `*Create` descriptors that produce one.
    pub fn apply(&self, handle: &mut StorageHandle) -> Result<Option<i64>, StorageError> {
        match self {
            WriteDescriptor::SessionCreate {
                uuid,
                entity_external_id,
                process_external_id,
            } => {
                let entity_id = entity_external_id
                    .as_deref()
                    .map(|id| handle.entity().create(id))
                    .transpose()?;
                let process_id = process_external_id
                    .as_deref()
                    .map(|id| handle.process().create(id))
                    .transpose()?;
                handle.session().create(uuid, entity_id, process_id).map(Some)
            }
            WriteDescriptor::ParentCreate { external_id } => {
                handle.parent().create(external_id).map(Some)
            }
            WriteDescriptor::ConversationCreate { session_id } => {
                handle.conversation().create(*session_id).map(Some)
            }
            WriteDescriptor::ConversationUpdate {
                conversation_id,
                summary,
            } => {
                handle
                    .conversation()
                    .update(*conversation_id, summary.as_deref())?;
                Ok(None)
            }
            WriteDescriptor::ConversationMessageCreate {
                conversation_id,
                role,
                kind,
                content,
            } => {
                handle.conversation().message().create(
                    *conversation_id,
                    role,
                    kind.as_deref(),
                    content,
                )?;
                Ok(None)
            }
            WriteDescriptor::EntityFacts {
                external_id,
                facts,
                embeddings,
            } => {
                if facts.is_empty() {
                    return Ok(None);
                }
                let entity_id = handle.entity().create(external_id)?;
                handle
                    .entity_fact()
                    .create(entity_id, facts, embeddings.as_deref())?;
                Ok(None)
            }
            WriteDescriptor::KnowledgeGraph {
                external_id,
                triples,
            } => {
                if triples.is_empty() {
                    return Ok(None);
                }
                let entity_id = handle.entity().create(external_id)?;
                handle.knowledge_graph().create(entity_id, triples)?;
                Ok(None)
            }
            WriteDescriptor::ProcessAttributes {
                external_id,
                attributes,
            } => {
                if attributes.is_empty() {
                    return Ok(None);
                }
                let process_id = handle.process().create(external_id)?;
                handle
                    .process_attribute()
                    .create(process_id, attributes, None)?;
                Ok(None)
            }
        }
    }
}
