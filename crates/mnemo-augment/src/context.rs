// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-payload augmentation context.

use std::collections::HashMap;

use mnemo_core::Payload;
use mnemo_storage::WriteDescriptor;

/// State threaded through every enabled plugin for one payload.
///
/// Owned by the single task processing that payload. Plugins may read
/// what earlier plugins stored under their name and append writes; appended
/// writes cannot be modified or removed.
#[derive(Debug, Clone)]
pub struct AugmentationContext {
    payload: Payload,
    data: HashMap<String, serde_json::Value>,
    writes: Vec<WriteDescriptor>,
}

impl AugmentationContext {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            data: HashMap::new(),
            writes: Vec::new(),
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Store auxiliary output under a plugin name, replacing any previous value.
    pub fn insert_data(&mut self, plugin: impl Into<String>, value: serde_json::Value) {
        self.data.insert(plugin.into(), value);
    }

    pub fn data(&self, plugin: &str) -> Option<&serde_json::Value> {
        self.data.get(plugin)
    }

    pub fn add_write(&mut self, write: WriteDescriptor) {
        self.writes.push(write);
    }

    pub fn writes(&self) -> &[WriteDescriptor] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<WriteDescriptor> {
        self.writes
    }
}

#[cfg(test)]
mod tests {
    use mnemo_core::{Exchange, Message};

    use super::*;

    fn payload() -> Payload {
        Payload::new(
            Some("user-1".into()),
            None,
            Some(3),
            Exchange::new(vec![Message::user("hi")], vec![]),
        )
    }

    #[test]
    fn writes_keep_append_order() {
        let mut ctx = AugmentationContext::new(payload());
        ctx.add_write(WriteDescriptor::ParentCreate {
            external_id: "a".into(),
        });
        ctx.add_write(WriteDescriptor::ConversationUpdate {
            conversation_id: 3,
            summary: None,
        });
        let ops: Vec<_> = ctx.writes().iter().map(|w| w.target_operation()).collect();
        assert_eq!(ops, vec!["parent.create", "conversation.update"]);
        assert_eq!(ctx.into_writes().len(), 2);
    }

    #[test]
    fn data_is_keyed_by_plugin() {
        let mut ctx = AugmentationContext::new(payload());
        ctx.insert_data("knowledge", serde_json::json!({"facts": 2}));
        assert_eq!(ctx.data("knowledge").unwrap()["facts"], 2);
        assert!(ctx.data("other").is_none());
    }
}
