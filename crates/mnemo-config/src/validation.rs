// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::MnemoConfig;

/// Validate a deserialized configuration, collecting every failure instead of
/// stopping at the first one.
pub fn validate_config(config: &MnemoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.backend.trim().is_empty() {
        errors.push(ConfigError::validation("storage.backend must not be empty"));
    }

    if config.storage.backend == "sqlite" && config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty for the sqlite backend",
        ));
    }

    if config.augmentation.max_workers == 0 {
        errors.push(ConfigError::validation(
            "augmentation.max_workers must be at least 1",
        ));
    }

    for (key, value) in [
        ("write_queue.ready_timeout_ms", config.write_queue.ready_timeout_ms),
        ("augmentation.ready_timeout_ms", config.augmentation.ready_timeout_ms),
        ("extraction.timeout_ms", config.extraction.timeout_ms),
    ] {
        if value == 0 {
            errors.push(ConfigError::validation(format!(
                "{key} must be greater than 0"
            )));
        }
    }

    let mut seen = HashSet::new();
    for name in &config.augmentation.enabled {
        if !seen.insert(name.as_str()) {
            errors.push(ConfigError::validation(format!(
                "augmentation.enabled lists `{name}` more than once"
            )));
        }
    }

    if seen.contains("knowledge") {
        let endpoint = config.extraction.endpoint.trim();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            errors.push(ConfigError::validation(format!(
                "extraction.endpoint `{endpoint}` must start with http:// or https:// \
                 when the knowledge plugin is enabled"
            )));
        }
    }

    if !matches!(
        config.logging.level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        errors.push(ConfigError::validation(format!(
            "logging.level `{}` is not one of trace, debug, info, warn, error",
            config.logging.level
        )));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&MnemoConfig::default()).is_ok());
    }

    #[test]
    fn zero_workers_rejected() {
        let mut config = MnemoConfig::default();
        config.augmentation.max_workers = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("max_workers"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = MnemoConfig::default();
        config.augmentation.max_workers = 0;
        config.write_queue.ready_timeout_ms = 0;
        config.storage.database_path = "  ".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn duplicate_plugin_rejected() {
        let mut config = MnemoConfig::default();
        config.augmentation.enabled = vec!["knowledge".into(), "knowledge".into()];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("more than once"));
    }

    #[test]
    fn endpoint_checked_only_when_knowledge_enabled() {
        let mut config = MnemoConfig::default();
        config.extraction.endpoint = "ftp://example".into();
        assert!(validate_config(&config).is_err());

        config.augmentation.enabled.clear();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn non_sqlite_backend_may_omit_path() {
        let mut config = MnemoConfig::default();
        config.storage.backend = "postgresql".into();
        config.storage.database_path.clear();
        assert!(validate_config(&config).is_ok());
    }
}
