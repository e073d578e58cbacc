// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Mnemo conversation augmentation pipeline.
//!
//! This crate provides the error type and the data model shared by the
//! storage, write-queue, and augmentation crates: captured exchanges, the
//! immutable [`Payload`] handed to the augmentation runtime, and the
//! derived-knowledge types persisted by the storage drivers.

pub mod error;
pub mod knowledge;
pub mod types;

pub use error::MnemoError;
pub use knowledge::{SemanticTriple, blob_to_vec, content_key, vec_to_blob};
pub use types::{Exchange, Message, Payload};
