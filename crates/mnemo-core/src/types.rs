// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payload and message types passed from the interception layer into the pipeline.

use serde::{Deserialize, Serialize};

/// One normalized conversation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Speaker role as reported by the vendor (`user`, `assistant`, `system`, ...).
    pub role: String,
    /// Flattened text content.
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// A normalized request/response exchange captured from an LLM client call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    /// Messages sent to the model.
    pub request: Vec<Message>,
    /// Messages returned by the model.
    pub response: Vec<Message>,
}

impl Exchange {
    pub fn new(request: Vec<Message>, response: Vec<Message>) -> Self {
        Self { request, response }
    }

    /// Request messages followed by response messages, in conversation order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.request.iter().chain(self.response.iter())
    }
}

/// Immutable snapshot of one exchange handed to the augmentation runtime.
///
/// Built once per recorded exchange and consumed exactly once by the runtime.
/// Fields are private so a payload cannot change after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    entity_id: Option<String>,
    process_id: Option<String>,
    conversation_id: Option<i64>,
    exchange: Exchange,
}

impl Payload {
    pub fn new(
        entity_id: Option<String>,
        process_id: Option<String>,
        conversation_id: Option<i64>,
        exchange: Exchange,
    ) -> Self {
        Self {
            entity_id,
            process_id,
            conversation_id,
            exchange,
        }
    }

    /// External id of the entity (end user) the exchange is attributed to.
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// External id of the process (agent/program) the exchange is attributed to.
    pub fn process_id(&self) -> Option<&str> {
        self.process_id.as_deref()
    }

    /// Internal conversation key; `None` until the first message is persisted.
    pub fn conversation_id(&self) -> Option<i64> {
        self.conversation_id
    }

    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    /// All messages of the exchange in conversation order.
    pub fn messages(&self) -> Vec<Message> {
        self.exchange.messages().cloned().collect()
    }
}
