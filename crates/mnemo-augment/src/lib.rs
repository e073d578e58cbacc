// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Augmentation for Mnemo.
//!
//! Plugins implementing [`Augmentation`] derive knowledge from a captured
//! exchange and propose writes; the [`AugmentationRuntime`] runs them off
//! the caller's thread with bounded concurrency and forwards their writes
//! to the write queue.

pub mod context;
pub mod extractor;
pub mod knowledge;
pub mod plugin;
pub mod runtime;

use std::sync::Arc;

use mnemo_config::ExtractionConfig;
use mnemo_core::MnemoError;

pub use context::AugmentationContext;
pub use extractor::{ExtractionBackend, ExtractionRequest, HttpExtractionBackend};
pub use knowledge::{KnowledgeAugmentation, Memories};
pub use plugin::{Augmentation, AugmentationRegistry};
pub use runtime::AugmentationRuntime;

/// Registry holding the built-in plugins, with `knowledge` backed by the
/// configured HTTP extraction endpoint.
pub fn builtin_registry(extraction: &ExtractionConfig) -> Result<AugmentationRegistry, MnemoError> {
    let backend = HttpExtractionBackend::new(extraction)?;
    let mut registry = AugmentationRegistry::new();
    registry.register(Arc::new(KnowledgeAugmentation::new(Arc::new(backend))));
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_include_knowledge() {
        let registry = builtin_registry(&ExtractionConfig::default()).unwrap();
        assert_eq!(registry.names(), vec![knowledge::NAME]);
    }
}
