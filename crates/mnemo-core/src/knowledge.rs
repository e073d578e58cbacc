// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Derived-knowledge types shared by the extraction plugins and the storage drivers.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A subject/predicate/object relationship extracted from a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SemanticTriple {
    pub subject_name: String,
    /// Lower-cased entity type (`person`, `event`, ...).
    pub subject_type: String,
    pub predicate: String,
    pub object_name: String,
    /// Lower-cased entity type.
    pub object_type: String,
}

impl SemanticTriple {
    pub fn new(
        subject: (&str, &str),
        predicate: &str,
        object: (&str, &str),
    ) -> Self {
        Self {
            subject_name: subject.0.to_string(),
            subject_type: subject.1.to_lowercase(),
            predicate: predicate.to_string(),
            object_name: object.0.to_string(),
            object_type: object.1.to_lowercase(),
        }
    }
}

/// Deduplication key for content-addressed rows (facts, attributes, graph nodes).
///
/// Parts are trimmed and lower-cased, then joined with the ASCII unit separator
/// before hashing, so `["a b", "c"]` and `["a", "b c"]` never collide.
pub fn content_key<S: AsRef<str>>(parts: &[S]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([0x1f]);
        }
        hasher.update(part.as_ref().trim().to_lowercase().as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Convert an f32 vector to little-endian bytes for BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert a BLOB back to an f32 vector. Trailing bytes that do not form a full
/// f32 are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
