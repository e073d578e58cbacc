// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage for Mnemo.
//!
//! Connections are wrapped by a [`StorageAdapter`] chosen from the
//! [`StorageRegistry`], paired with the [`Driver`] for the adapter's dialect
//! into a [`StorageHandle`]. All writes are funnelled through a single
//! [`WriteQueue`] consumer; reads for augmentation use per-payload
//! [`ReadHandle`]s.

pub mod adapter;
pub mod connection;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod factory;
pub mod handle;
pub mod migrations;
pub mod queue;
pub mod registry;
pub mod transaction;
pub mod value;
pub mod write;

pub use adapter::{ConnectionAdapter, SqliteAdapter, StorageAdapter};
pub use connection::Connection;
pub use dialect::{Dialect, Placeholder, Upsert};
pub use driver::families::{ConversationRecord, CountedContent, Edge};
pub use driver::{Driver, Migration};
pub use error::StorageError;
pub use factory::ConnectionFactory;
pub use handle::{ReadHandle, StorageHandle};
pub use migrations::Builder;
pub use queue::{QueueState, WriteQueue};
pub use registry::StorageRegistry;
pub use transaction::{Execute, Output, Task, Transaction};
pub use value::{RowRef, Rows, Statement, Value};
pub use write::WriteDescriptor;
