// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin contract and registry.

use std::sync::Arc;

use async_trait::async_trait;
use mnemo_core::MnemoError;
use mnemo_storage::ReadHandle;

use crate::context::AugmentationContext;

/// A unit of knowledge derivation run once per payload.
///
/// Plugins read through the [`ReadHandle`] and propose writes by appending
/// descriptors to the context. They never write to storage themselves.
#[async_trait]
pub trait Augmentation: Send + Sync {
    /// Registry key, matched against `[augmentation].enabled`.
    fn name(&self) -> &str;

    async fn process(
        &self,
        ctx: AugmentationContext,
        storage: &mut ReadHandle,
    ) -> Result<AugmentationContext, MnemoError>;
}

/// Registered plugins in registration order.
#[derive(Clone, Default)]
pub struct AugmentationRegistry {
    plugins: Vec<Arc<dyn Augmentation>>,
}

impl AugmentationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin. A plugin registered under an existing name
    /// replaces it in place.
    pub fn register(&mut self, plugin: Arc<dyn Augmentation>) -> &mut Self {
        match self.plugins.iter_mut().find(|p| p.name() == plugin.name()) {
            Some(slot) => *slot = plugin,
            None => self.plugins.push(plugin),
        }
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// The plugins named in `enabled`, in registration order.
    ///
    /// Naming a plugin that is not registered is a configuration error.
    pub fn enabled(&self, enabled: &[String]) -> Result<Vec<Arc<dyn Augmentation>>, MnemoError> {
        if let Some(unknown) = enabled
            .iter()
            .find(|name| !self.plugins.iter().any(|p| p.name() == name.as_str()))
        {
            return Err(MnemoError::AdapterNotFound {
                what: "augmentation",
                name: unknown.clone(),
            });
        }
        Ok(self
            .plugins
            .iter()
            .filter(|p| enabled.iter().any(|name| name == p.name()))
            .cloned()
            .collect())
    }
}

impl std::fmt::Debug for AugmentationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AugmentationRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}
