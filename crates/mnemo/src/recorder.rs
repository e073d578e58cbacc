// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Primary conversation record.
//!
//! A [`Recorder`] writes every exchange it sees through the write queue
//! before handing it to the augmentation runtime, so augmentation always
//! runs against a conversation that already exists.

use std::sync::{Mutex, PoisonError};

use mnemo_core::{Exchange, MnemoError, Payload};
use mnemo_storage::{Transaction, WriteDescriptor};
use tracing::debug;
use uuid::Uuid;

use crate::Mnemo;

/// Longest accepted entity or process id.
pub const MAX_EXTERNAL_ID_LEN: usize = 100;

#[derive(Debug, Default, Clone, Copy)]
struct Ids {
    session: Option<i64>,
    conversation: Option<i64>,
}

pub struct Recorder<'a> {
    mnemo: &'a Mnemo,
    entity_id: Option<String>,
    process_id: Option<String>,
    session_uuid: String,
    ids: Mutex<Ids>,
}

fn checked(kind: &str, id: Option<&str>) -> Result<Option<String>, MnemoError> {
    match id {
        Some(id) if id.chars().count() > MAX_EXTERNAL_ID_LEN => Err(MnemoError::Config(format!(
            "{kind} id must be at most {MAX_EXTERNAL_ID_LEN} characters, got {}",
            id.chars().count()
        ))),
        other => Ok(other.map(str::to_string)),
    }
}

impl<'a> Recorder<'a> {
    pub(crate) fn new(
        mnemo: &'a Mnemo,
        entity_id: Option<&str>,
        process_id: Option<&str>,
    ) -> Result<Self, MnemoError> {
        Ok(Self {
            mnemo,
            entity_id: checked("entity", entity_id)?,
            process_id: checked("process", process_id)?,
            session_uuid: Uuid::new_v4().to_string(),
            ids: Mutex::new(Ids::default()),
        })
    }

    pub fn session_uuid(&self) -> &str {
        &self.session_uuid
    }

    /// Conversation id, once the first exchange has been recorded.
    pub fn conversation_id(&self) -> Option<i64> {
        self.cached().conversation
    }

    fn cached(&self) -> Ids {
        *self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remember(&self, update: impl FnOnce(&mut Ids)) {
        update(&mut self.ids.lock().unwrap_or_else(PoisonError::into_inner));
    }

    fn session_create(&self) -> Transaction {
        Transaction::new()
            .execute(WriteDescriptor::SessionCreate {
                uuid: self.session_uuid.clone(),
                entity_external_id: self.entity_id.clone(),
                process_external_id: self.process_id.clone(),
            })
            .commit()
    }

    fn messages(conversation_id: i64, exchange: &Exchange) -> Transaction {
        exchange
            .messages()
            .map(|message| WriteDescriptor::ConversationMessageCreate {
                conversation_id,
                role: message.role.clone(),
                kind: None,
                content: message.content.clone(),
            })
            .collect()
    }

    fn payload(&self, conversation_id: i64, exchange: Exchange) -> Payload {
        Payload::new(
            self.entity_id.clone(),
            self.process_id.clone(),
            Some(conversation_id),
            exchange,
        )
    }

    /// Persist `exchange` and schedule it for augmentation. Returns the
    /// conversation id.
    ///
    /// Blocks the calling thread until the writes are committed; inside an
    /// async runtime prefer [`Recorder::record_async`].
    pub fn record(&self, exchange: Exchange) -> Result<i64, MnemoError> {
        let queue = self.mnemo.queue();
        let ids = self.cached();

        let session_id = match ids.session {
            Some(id) => id,
            None => {
                let id = created_id(queue.enqueue(self.session_create())?.id(), "session")?;
                self.remember(|ids| ids.session = Some(id));
                id
            }
        };
        let conversation_id = match ids.conversation {
            Some(id) => id,
            None => {
                let tx = Transaction::new()
                    .execute(WriteDescriptor::ConversationCreate { session_id })
                    .commit();
                let id = created_id(queue.enqueue(tx)?.id(), "conversation")?;
                self.remember(|ids| ids.conversation = Some(id));
                id
            }
        };

        queue.enqueue(Self::messages(conversation_id, &exchange))?;
        debug!(conversation_id, session = %self.session_uuid, "exchange recorded");

        self.mnemo
            .runtime()
            .enqueue(self.payload(conversation_id, exchange))?;
        Ok(conversation_id)
    }

    /// Async form of [`Recorder::record`].
    pub async fn record_async(&self, exchange: Exchange) -> Result<i64, MnemoError> {
        let queue = self.mnemo.queue();
        let ids = self.cached();

        let session_id = match ids.session {
            Some(id) => id,
            None => {
                let output = queue.enqueue_async(self.session_create()).await?;
                let id = created_id(output.id(), "session")?;
                self.remember(|ids| ids.session = Some(id));
                id
            }
        };
        let conversation_id = match ids.conversation {
            Some(id) => id,
            None => {
                let tx = Transaction::new()
                    .execute(WriteDescriptor::ConversationCreate { session_id })
                    .commit();
                let id = created_id(queue.enqueue_async(tx).await?.id(), "conversation")?;
                self.remember(|ids| ids.conversation = Some(id));
                id
            }
        };

        queue
            .enqueue_async(Self::messages(conversation_id, &exchange))
            .await?;
        debug!(conversation_id, session = %self.session_uuid, "exchange recorded");

        self.mnemo
            .runtime()
            .enqueue(self.payload(conversation_id, exchange))?;
        Ok(conversation_id)
    }
}

fn created_id(id: Option<i64>, what: &str) -> Result<i64, MnemoError> {
    id.ok_or_else(|| MnemoError::Internal(format!("{what} create returned no id")))
}
