// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! An adapter paired with its driver.

use mnemo_core::Message;

use crate::adapter::StorageAdapter;
use crate::driver::Driver;
use crate::driver::families::{
    self, Conversation, ConversationRecord, CountedContent, Counted, Db, Edge, External,
    KnowledgeGraph, Schema, Session,
};
use crate::error::StorageError;
use crate::value::{Rows, Statement};

/// One adapter and the driver selected for it.
///
/// A handle owns its connection. The write queue holds one for its whole
/// life; the augmentation runtime builds a fresh one per payload.
pub struct StorageHandle {
    adapter: Box<dyn StorageAdapter>,
    driver: &'static Driver,
}

impl StorageHandle {
    pub fn new(adapter: Box<dyn StorageAdapter>, driver: &'static Driver) -> Self {
        Self { adapter, driver }
    }

    pub fn driver(&self) -> &'static Driver {
        self.driver
    }

    pub fn adapter(&mut self) -> &mut dyn StorageAdapter {
        self.adapter.as_mut()
    }

    fn db(&mut self) -> Db<'_> {
        Db::new(self.adapter.as_mut(), &self.driver.dialect)
    }

    pub fn execute(&mut self, stmt: &Statement) -> Result<Rows, StorageError> {
        self.adapter.execute(stmt)
    }

    pub fn commit(&mut self) -> Result<(), StorageError> {
        self.adapter.commit()
    }

    pub fn flush(&mut self) -> Result<(), StorageError> {
        self.adapter.flush()
    }

    pub fn rollback(&mut self) -> Result<(), StorageError> {
        self.adapter.rollback()
    }

    pub fn close(&mut self) -> Result<(), StorageError> {
        self.adapter.close()
    }

    pub fn reset(&mut self) -> Result<(), StorageError> {
        self.adapter.reset()
    }

    pub fn conversation(&mut self) -> Conversation<'_> {
        Conversation(self.db())
    }

    pub fn entity(&mut self) -> External<'_> {
        families::entity(self.db())
    }

    pub fn entity_fact(&mut self) -> Counted<'_> {
        families::entity_fact(self.db())
    }

    pub fn knowledge_graph(&mut self) -> KnowledgeGraph<'_> {
        KnowledgeGraph(self.db())
    }

    pub fn process(&mut self) -> External<'_> {
        families::process(self.db())
    }

    pub fn process_attribute(&mut self) -> Counted<'_> {
        families::process_attribute(self.db())
    }

    pub fn parent(&mut self) -> External<'_> {
        families::parent(self.db())
    }

    pub fn session(&mut self) -> Session<'_> {
        Session(self.db())
    }

    pub fn schema(&mut self) -> Schema<'_> {
        Schema(self.db())
    }
}

impl std::fmt::Debug for StorageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageHandle")
            .field("dialect", &self.adapter.dialect())
            .field("driver", &self.driver.name)
            .field("connected", &self.adapter.is_connected())
            .finish()
    }
}

/// Read-only view of a [`StorageHandle`] handed to augmentation plugins.
///
/// Plugins never write directly; they return write descriptors that go
/// through the write queue.
#[derive(Debug)]
pub struct ReadHandle {
    inner: StorageHandle,
}

impl ReadHandle {
    pub fn new(inner: StorageHandle) -> Self {
        Self { inner }
    }

    pub fn dialect(&self) -> &'static str {
        self.inner.driver.name
    }

    pub fn conversation(&mut self, id: i64) -> Result<Option<ConversationRecord>, StorageError> {
        self.inner.conversation().read(id)
    }

    pub fn messages(&mut self, conversation_id: i64) -> Result<Vec<Message>, StorageError> {
        self.inner.conversation().messages().read(conversation_id)
    }

    pub fn entity_facts(&mut self, external_id: &str) -> Result<Vec<CountedContent>, StorageError> {
        match self.inner.entity().read(external_id)? {
            Some(id) => self.inner.entity_fact().read(id),
            None => Ok(Vec::new()),
        }
    }

    pub fn knowledge_graph(&mut self, external_id: &str) -> Result<Vec<Edge>, StorageError> {
        match self.inner.entity().read(external_id)? {
            Some(id) => self.inner.knowledge_graph().read(id),
            None => Ok(Vec::new()),
        }
    }

    pub fn process_attributes(
        &mut self,
        external_id: &str,
    ) -> Result<Vec<CountedContent>, StorageError> {
        match self.inner.process().read(external_id)? {
            Some(id) => self.inner.process_attribute().read(id),
            None => Ok(Vec::new()),
        }
    }

    pub fn schema_version(&mut self) -> Result<Option<u32>, StorageError> {
        self.inner.schema().version().read()
    }

    /// Release the connection; also done when the handle is dropped.
    pub fn close(mut self) -> Result<(), StorageError> {
        self.inner.close()
    }
}
