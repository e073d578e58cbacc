// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge augmentation against a mock extraction endpoint.

use std::sync::Arc;
use std::time::Duration;

use mnemo_augment::{
    Augmentation, AugmentationContext, AugmentationRuntime, ExtractionBackend, ExtractionRequest,
    HttpExtractionBackend, KnowledgeAugmentation,
};
use mnemo_config::{AugmentationConfig, ExtractionConfig};
use mnemo_core::{Exchange, Message, MnemoError, Payload};
use mnemo_storage::{StorageRegistry, Transaction, WriteDescriptor, WriteQueue};
use mnemo_test_utils::TestDatabase;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn extraction_response() -> serde_json::Value {
    json!({
        "conversation": {"summary": "User wants cheaper commuting."},
        "entity": {
            "facts": ["user is interested in carpooling"],
            "fact_embeddings": [[0.1, 0.2, 0.3]],
            "semantic_triples": [{
                "subject": {"name": "user", "type": "PERSON"},
                "predicate": "is interested in",
                "object": {"name": "carpooling", "type": "EVENT"}
            }]
        },
        "process": {"attributes": ["Cost-saving strategies"]}
    })
}

fn config_for(server: &MockServer) -> ExtractionConfig {
    ExtractionConfig {
        endpoint: format!("{}/v1/augment", server.uri()),
        api_key: Some("test-key".into()),
        timeout_ms: 5_000,
    }
}

fn payload(conversation_id: Option<i64>) -> Payload {
    Payload::new(
        Some("user-1".into()),
        Some("agent-1".into()),
        conversation_id,
        Exchange::new(
            vec![Message::user("How do I save on my commute?")],
            vec![Message::assistant("Try carpooling.")],
        ),
    )
}

/// Database with one session and conversation; returns the conversation id.
async fn seeded(db: &TestDatabase) -> i64 {
    let queue = WriteQueue::new(db.migrated_handle().unwrap());
    queue.start().unwrap();
    let session_id = queue
        .enqueue_async(
            Transaction::new()
                .execute(WriteDescriptor::SessionCreate {
                    uuid: "00000000-0000-4000-8000-00000000abcd".into(),
                    entity_external_id: Some("user-1".into()),
                    process_external_id: Some("agent-1".into()),
                })
                .commit(),
        )
        .await
        .unwrap()
        .id()
        .unwrap();
    queue
        .enqueue_async(
            Transaction::new()
                .execute(WriteDescriptor::ConversationCreate { session_id })
                .commit(),
        )
        .await
        .unwrap()
        .id()
        .unwrap()
}

#[tokio::test]
async fn http_backend_posts_request_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/augment"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"summary": "earlier"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(extraction_response()))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpExtractionBackend::new(&config_for(&server)).unwrap();
    let value = backend
        .extract(&ExtractionRequest {
            summary: "earlier".into(),
            messages: vec![Message::user("hi")],
        })
        .await
        .unwrap();
    assert_eq!(value["conversation"]["summary"], "User wants cheaper commuting.");
}

#[tokio::test]
async fn http_backend_retries_once_on_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let backend = HttpExtractionBackend::new(&config_for(&server))
        .unwrap()
        .with_retry_delay(Duration::from_millis(10));
    let request = ExtractionRequest {
        summary: String::new(),
        messages: vec![],
    };
    assert_eq!(backend.extract(&request).await.unwrap(), json!({}));
}

#[tokio::test]
async fn http_backend_reports_client_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpExtractionBackend::new(&config_for(&server)).unwrap();
    let err = backend
        .extract(&ExtractionRequest {
            summary: String::new(),
            messages: vec![],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, MnemoError::Extraction { .. }));
    assert!(err.to_string().contains("401"));
}

#[tokio::test(flavor = "multi_thread")]
async fn knowledge_plugin_proposes_writes_from_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(extraction_response()))
        .mount(&server)
        .await;

    let db = TestDatabase::new().unwrap();
    let conversation_id = seeded(&db).await;
    let plugin = KnowledgeAugmentation::new(Arc::new(
        HttpExtractionBackend::new(&config_for(&server)).unwrap(),
    ));

    let mut reader = db.reader().unwrap();
    let ctx = plugin
        .process(AugmentationContext::new(payload(Some(conversation_id))), &mut reader)
        .await
        .unwrap();

    let ops: Vec<_> = ctx.writes().iter().map(|w| w.target_operation()).collect();
    assert_eq!(
        ops,
        vec![
            "entity_fact.create",
            "knowledge_graph.create",
            "process_attribute.create",
            "conversation.update",
        ]
    );
    assert_eq!(
        ctx.data("knowledge").unwrap()["facts"][0],
        "user is interested in carpooling"
    );
}

#[tokio::test]
async fn knowledge_plugin_skips_payload_without_conversation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(extraction_response()))
        .expect(0)
        .mount(&server)
        .await;

    let db = TestDatabase::new().unwrap();
    let plugin = KnowledgeAugmentation::new(Arc::new(
        HttpExtractionBackend::new(&config_for(&server)).unwrap(),
    ));
    let mut reader = db.reader().unwrap();
    let ctx = plugin
        .process(AugmentationContext::new(payload(None)), &mut reader)
        .await
        .unwrap();
    assert!(ctx.writes().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn runtime_persists_extracted_knowledge() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(extraction_response()))
        .mount(&server)
        .await;

    let db = TestDatabase::new().unwrap();
    let conversation_id = seeded(&db).await;
    let factory = db.factory().unwrap();
    let registry = StorageRegistry::default();

    let queue = Arc::new(WriteQueue::new(registry.handle(&factory).unwrap()));
    queue.start().unwrap();
    let plugin = KnowledgeAugmentation::new(Arc::new(
        HttpExtractionBackend::new(&config_for(&server)).unwrap(),
    ));
    let runtime = AugmentationRuntime::new(
        vec![Arc::new(plugin)],
        queue.clone(),
        &AugmentationConfig::default(),
    );
    runtime.start(&registry, factory).unwrap();
    runtime.enqueue(payload(Some(conversation_id))).unwrap();

    tokio::task::spawn_blocking(move || {
        runtime.stop();
        queue.stop();
    })
    .await
    .unwrap();

    let mut reader = db.reader().unwrap();
    let facts = reader.entity_facts("user-1").unwrap();
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].content, "user is interested in carpooling");

    let edges = reader.knowledge_graph("user-1").unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].triple.subject_type, "person");

    let attributes = reader.process_attributes("agent-1").unwrap();
    assert_eq!(attributes[0].content, "Cost-saving strategies");

    let conversation = reader.conversation(conversation_id).unwrap().unwrap();
    assert_eq!(
        conversation.summary.as_deref(),
        Some("User wants cheaper commuting.")
    );
}
