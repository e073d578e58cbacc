// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mnemo records LLM exchanges and augments them with derived knowledge.
//!
//! [`Mnemo`] owns the serialized write queue and the augmentation runtime
//! for one storage backend. A [`Recorder`] persists each exchange through the
//! queue and hands it to the runtime, which extracts facts, triples and
//! attributes in the background.
//!
//! ```no_run
//! use mnemo::{Exchange, Message, Mnemo, MnemoConfig};
//!
//! # fn main() -> Result<(), mnemo::MnemoError> {
//! let config = MnemoConfig::default();
//! mnemo::init_tracing_from(&config.logging)?;
//! let mnemo = Mnemo::open(&config)?;
//! let recorder = mnemo.recorder(Some("user-1"), Some("support-bot"))?;
//! recorder.record(Exchange::new(
//!     vec![Message::user("How do I save on my commute?")],
//!     vec![Message::assistant("Try carpooling.")],
//! ))?;
//! mnemo.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod recorder;
pub mod telemetry;

use std::sync::Arc;

use mnemo_augment::{AugmentationRegistry, AugmentationRuntime, builtin_registry};
use mnemo_config::validation::validate_config;
use mnemo_storage::{Builder, WriteQueue};
use tracing::info;

pub use mnemo_config::MnemoConfig;
pub use mnemo_core::{Exchange, Message, MnemoError, Payload};
pub use mnemo_storage::{ConnectionFactory, StorageRegistry};
pub use recorder::Recorder;
pub use telemetry::{init_tracing, init_tracing_from};

/// One write queue and one augmentation runtime over a single backend.
pub struct Mnemo {
    runtime: AugmentationRuntime,
    queue: Arc<WriteQueue>,
}

impl Mnemo {
    /// Build from configuration alone: the `[storage]` section selects the
    /// backend and the default registry supplies adapters and drivers.
    pub fn open(config: &MnemoConfig) -> Result<Self, MnemoError> {
        let factory = ConnectionFactory::from_config(&config.storage)?;
        Self::new(config, factory, &StorageRegistry::default())
    }

    /// Validate `config`, run migrations, then start the queue and the
    /// runtime with the built-in augmentations named in
    /// `[augmentation].enabled`.
    pub fn new(
        config: &MnemoConfig,
        factory: ConnectionFactory,
        registry: &StorageRegistry,
    ) -> Result<Self, MnemoError> {
        validate(config)?;
        let augmentations = builtin_registry(&config.extraction)?;
        Self::start(config, factory, registry, &augmentations)
    }

    /// Like [`Mnemo::new`] but choosing from a caller-built plugin registry.
    pub fn with_augmentations(
        config: &MnemoConfig,
        factory: ConnectionFactory,
        registry: &StorageRegistry,
        augmentations: &AugmentationRegistry,
    ) -> Result<Self, MnemoError> {
        validate(config)?;
        Self::start(config, factory, registry, augmentations)
    }

    fn start(
        config: &MnemoConfig,
        factory: ConnectionFactory,
        registry: &StorageRegistry,
        augmentations: &AugmentationRegistry,
    ) -> Result<Self, MnemoError> {
        let plugins = augmentations.enabled(&config.augmentation.enabled)?;
        let mut handle = registry.handle(&factory)?;
        let version = Builder::new(&mut handle).execute()?;
        let dialect = handle.driver().name;

        let queue = Arc::new(WriteQueue::from_config(handle, &config.write_queue));
        queue.start()?;

        let plugin_names: Vec<&str> = plugins.iter().map(|p| p.name()).collect();
        info!(dialect, schema_version = version, plugins = ?plugin_names, "mnemo starting");

        let runtime = AugmentationRuntime::new(plugins, queue.clone(), &config.augmentation);
        if let Err(err) = runtime.start(registry, factory) {
            queue.stop();
            return Err(err);
        }
        Ok(Self { runtime, queue })
    }

    /// A recorder attributing exchanges to `entity_id` and `process_id`.
    /// Each recorder owns one session and one conversation.
    pub fn recorder(
        &self,
        entity_id: Option<&str>,
        process_id: Option<&str>,
    ) -> Result<Recorder<'_>, MnemoError> {
        Recorder::new(self, entity_id, process_id)
    }

    pub fn queue(&self) -> &Arc<WriteQueue> {
        &self.queue
    }

    pub fn runtime(&self) -> &AugmentationRuntime {
        &self.runtime
    }

    /// Stop the runtime, draining in-flight payloads into the queue, then
    /// stop the queue. Safe to call more than once.
    pub fn shutdown(&self) {
        self.runtime.stop();
        self.queue.stop();
    }
}

/// Reject configurations the loader would have refused, for callers that
/// build [`MnemoConfig`] by hand.
fn validate(config: &MnemoConfig) -> Result<(), MnemoError> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        MnemoError::Config(messages.join("; "))
    })
}

impl Drop for Mnemo {
    fn drop(&mut self) {
        self.shutdown();
    }
}
