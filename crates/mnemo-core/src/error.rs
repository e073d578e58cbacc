// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Mnemo augmentation pipeline.

use std::time::Duration;

use thiserror::Error;

/// The primary error type shared by the storage, write-queue, and augmentation crates.
#[derive(Debug, Error)]
pub enum MnemoError {
    /// Configuration errors (invalid values, unknown plugins, bad attribution).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (connection failure, statement failure, decoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No registered adapter or driver matched the supplied connection.
    #[error("no {what} registered for `{name}`")]
    AdapterNotFound { what: &'static str, name: String },

    /// A background component did not become ready within its readiness window.
    #[error("{component} failed to start within {timeout:?}")]
    NotReady {
        component: &'static str,
        timeout: Duration,
    },

    /// A background component has been stopped and no longer accepts work.
    #[error("{component} is stopped")]
    Stopped { component: &'static str },

    /// An augmentation plugin failed while processing a payload.
    #[error("augmentation `{plugin}` failed: {message}")]
    Augmentation { plugin: String, message: String },

    /// The knowledge extraction backend failed or returned an unusable response.
    #[error("extraction error: {message}")]
    Extraction {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MnemoError {
    /// Wraps any error as a storage error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        MnemoError::Storage {
            source: Box::new(err),
        }
    }

    /// Returns true for errors raised at setup time that a caller must fix.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            MnemoError::Config(_) | MnemoError::AdapterNotFound { .. } | MnemoError::NotReady { .. }
        )
    }
}
