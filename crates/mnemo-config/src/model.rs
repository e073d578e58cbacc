// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of being silently ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Mnemo configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MnemoConfig {
    /// Storage backend used by both the write queue and the augmentation runtime.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Serialized write queue settings.
    #[serde(default)]
    pub write_queue: WriteQueueConfig,

    /// Augmentation runtime settings.
    #[serde(default)]
    pub augmentation: AugmentationConfig,

    /// Remote knowledge extraction endpoint.
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Registered adapter name. Only `sqlite` can be built from configuration
    /// alone; other backends are supplied as a connection factory in code.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journaling so augmentation reads do not block the writer.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StorageConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

fn default_backend() -> String {
    "sqlite".to_string()
}

fn default_database_path() -> String {
    "mnemo.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Serialized write queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WriteQueueConfig {
    /// How long `enqueue` waits for the consumer to become ready.
    #[serde(default = "default_queue_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
}

impl Default for WriteQueueConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: default_queue_ready_timeout_ms(),
        }
    }
}

impl WriteQueueConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

fn default_queue_ready_timeout_ms() -> u64 {
    10_000
}

/// Augmentation runtime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AugmentationConfig {
    /// Maximum number of payloads extracted concurrently.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// How long `enqueue` waits for the scheduler loop to become ready.
    #[serde(default = "default_augmentation_ready_timeout_ms")]
    pub ready_timeout_ms: u64,

    /// Enabled plugins by name. Plugins run in registration order, not list order.
    #[serde(default = "default_enabled")]
    pub enabled: Vec<String>,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            ready_timeout_ms: default_augmentation_ready_timeout_ms(),
            enabled: default_enabled(),
        }
    }
}

impl AugmentationConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

fn default_max_workers() -> usize {
    50
}

fn default_augmentation_ready_timeout_ms() -> u64 {
    1_000
}

fn default_enabled() -> Vec<String> {
    vec!["knowledge".to_string()]
}

/// Knowledge extraction endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractionConfig {
    /// URL the conversation is posted to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token. `None` sends no Authorization header.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_extraction_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            timeout_ms: default_extraction_timeout_ms(),
        }
    }
}

impl ExtractionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8787/v1/augment".to_string()
}

fn default_extraction_timeout_ms() -> u64 {
    30_000
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level for mnemo crates (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = MnemoConfig::default();
        assert_eq!(config.storage.backend, "sqlite");
        assert_eq!(config.augmentation.max_workers, 50);
        assert_eq!(config.augmentation.ready_timeout(), Duration::from_secs(1));
        assert_eq!(config.write_queue.ready_timeout(), Duration::from_secs(10));
        assert_eq!(config.augmentation.enabled, vec!["knowledge"]);
        assert!(config.extraction.api_key.is_none());
    }

    #[test]
    fn storage_busy_timeout_converts_to_duration() {
        let storage = StorageConfig {
            busy_timeout_ms: 250,
            ..StorageConfig::default()
        };
        assert_eq!(storage.busy_timeout(), Duration::from_millis(250));
    }
}
