// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in `knowledge` augmentation.
//!
//! Sends the exchange to an [`ExtractionBackend`] and turns the answer into
//! entity facts, knowledge-graph triples, process attributes and an updated
//! conversation summary.

use std::sync::Arc;

use async_trait::async_trait;
use mnemo_core::{MnemoError, SemanticTriple};
use mnemo_storage::{ReadHandle, WriteDescriptor};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::AugmentationContext;
use crate::extractor::{ExtractionBackend, ExtractionRequest};
use crate::plugin::Augmentation;

pub const NAME: &str = "knowledge";

/// Knowledge derived from one exchange.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Memories {
    pub summary: Option<String>,
    pub facts: Vec<String>,
    pub fact_embeddings: Option<Vec<Vec<f32>>>,
    pub triples: Vec<SemanticTriple>,
    pub process_attributes: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Response {
    conversation: Option<ConversationSection>,
    entity: Option<EntitySection>,
    process: Option<ProcessSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConversationSection {
    summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EntitySection {
    facts: Vec<String>,
    fact_embeddings: Option<Vec<Vec<f32>>>,
    semantic_triples: Vec<RawTriple>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTriple {
    subject: Option<RawNode>,
    predicate: Option<String>,
    object: Option<RawNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawNode {
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProcessSection {
    attributes: Vec<String>,
}

impl RawTriple {
    fn complete(&self) -> Option<SemanticTriple> {
        let subject = self.subject.as_ref()?;
        let object = self.object.as_ref()?;
        Some(SemanticTriple::new(
            (subject.name.as_deref()?, subject.kind.as_deref()?),
            self.predicate.as_deref()?,
            (object.name.as_deref()?, object.kind.as_deref()?),
        ))
    }
}

impl Memories {
    /// Parse an extraction response. Missing sections are empty and
    /// triples missing any part are dropped.
    pub fn from_response(value: serde_json::Value) -> Result<Self, MnemoError> {
        let response: Response =
            serde_json::from_value(value).map_err(|e| MnemoError::Extraction {
                message: format!("malformed extraction response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let entity = response.entity.unwrap_or_default();
        Ok(Self {
            summary: response
                .conversation
                .and_then(|c| c.summary)
                .filter(|s| !s.trim().is_empty()),
            triples: entity
                .semantic_triples
                .iter()
                .filter_map(RawTriple::complete)
                .collect(),
            facts: entity.facts,
            fact_embeddings: entity.fact_embeddings,
            process_attributes: response.process.unwrap_or_default().attributes,
        })
    }
}

pub struct KnowledgeAugmentation {
    backend: Arc<dyn ExtractionBackend>,
}

impl KnowledgeAugmentation {
    pub fn new(backend: Arc<dyn ExtractionBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Augmentation for KnowledgeAugmentation {
    fn name(&self) -> &str {
        NAME
    }

    async fn process(
        &self,
        mut ctx: AugmentationContext,
        storage: &mut ReadHandle,
    ) -> Result<AugmentationContext, MnemoError> {
        let payload = ctx.payload();
        let (Some(entity_id), Some(conversation_id)) =
            (payload.entity_id(), payload.conversation_id())
        else {
            debug!("payload has no entity or conversation, skipping knowledge extraction");
            return Ok(ctx);
        };
        let entity_id = entity_id.to_string();
        let process_id = payload.process_id().map(str::to_string);

        let summary = match storage.conversation(conversation_id) {
            Ok(record) => record.and_then(|c| c.summary).unwrap_or_default(),
            Err(err) => {
                debug!(conversation_id, error = %err, "could not read summary, sending none");
                String::new()
            }
        };

        let request = ExtractionRequest {
            summary,
            messages: payload.messages(),
        };
        let memories = Memories::from_response(self.backend.extract(&request).await?)?;
        debug!(
            facts = memories.facts.len(),
            triples = memories.triples.len(),
            attributes = memories.process_attributes.len(),
            "knowledge extracted"
        );

        let data = serde_json::to_value(&memories).map_err(|e| MnemoError::Internal(e.to_string()))?;
        ctx.insert_data(NAME, data);

        if !memories.facts.is_empty() {
            ctx.add_write(WriteDescriptor::EntityFacts {
                external_id: entity_id.clone(),
                facts: memories.facts,
                embeddings: memories.fact_embeddings,
            });
        }
        if !memories.triples.is_empty() {
            ctx.add_write(WriteDescriptor::KnowledgeGraph {
                external_id: entity_id,
                triples: memories.triples,
            });
        }
        if let Some(process_id) = process_id
            && !memories.process_attributes.is_empty()
        {
            ctx.add_write(WriteDescriptor::ProcessAttributes {
                external_id: process_id,
                attributes: memories.process_attributes,
            });
        }
        if let Some(summary) = memories.summary {
            ctx.add_write(WriteDescriptor::ConversationUpdate {
                conversation_id,
                summary: Some(summary),
            });
        }
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_full_response() {
        let memories = Memories::from_response(json!({
            "conversation": {"summary": "commute costs"},
            "entity": {
                "facts": ["user carpools"],
                "fact_embeddings": [[0.5, 1.0]],
                "semantic_triples": [{
                    "subject": {"name": "user", "type": "PERSON"},
                    "predicate": "is interested in",
                    "object": {"name": "carpooling", "type": "EVENT"}
                }]
            },
            "process": {"attributes": ["Cost-saving strategies"]}
        }))
        .unwrap();

        assert_eq!(memories.summary.as_deref(), Some("commute costs"));
        assert_eq!(memories.facts, vec!["user carpools"]);
        assert_eq!(memories.fact_embeddings, Some(vec![vec![0.5, 1.0]]));
        assert_eq!(memories.triples.len(), 1);
        assert_eq!(memories.triples[0].subject_type, "person");
        assert_eq!(memories.triples[0].object_type, "event");
        assert_eq!(memories.process_attributes, vec!["Cost-saving strategies"]);
    }

    #[test]
    fn incomplete_triples_are_dropped() {
        let memories = Memories::from_response(json!({
            "entity": {
                "semantic_triples": [
                    {"subject": {"name": "user"}, "predicate": "likes", "object": {"name": "tea", "type": "FOOD"}},
                    {"subject": {"name": "user", "type": "PERSON"}, "object": {"name": "tea", "type": "FOOD"}},
                    {"subject": {"name": "user", "type": "PERSON"}, "predicate": "likes"},
                    {"subject": {"name": "user", "type": "PERSON"}, "predicate": "likes", "object": {"name": "tea", "type": "FOOD"}}
                ]
            }
        }))
        .unwrap();
        assert_eq!(memories.triples.len(), 1);
        assert_eq!(memories.triples[0].predicate, "likes");
    }

    #[test]
    fn empty_response_is_empty_memories() {
        let memories = Memories::from_response(json!({})).unwrap();
        assert_eq!(memories, Memories::default());
    }

    #[test]
    fn blank_summary_is_ignored() {
        let memories = Memories::from_response(json!({"conversation": {"summary": "  "}})).unwrap();
        assert_eq!(memories.summary, None);
    }

    #[test]
    fn wrong_shape_is_extraction_error() {
        let err = Memories::from_response(json!({"entity": {"facts": "not a list"}})).unwrap_err();
        assert!(matches!(err, MnemoError::Extraction { .. }));
    }
}
