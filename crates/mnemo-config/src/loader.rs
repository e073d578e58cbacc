// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order (later overrides earlier): compiled defaults,
//! `/etc/mnemo/mnemo.toml`, `~/.config/mnemo/mnemo.toml`, `./mnemo.toml`,
//! then `MNEMO_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MnemoConfig;

/// Config section names, used to map `MNEMO_<SECTION>_<KEY>` to `section.key`.
const SECTIONS: &[&str] = &[
    "write_queue",
    "augmentation",
    "extraction",
    "storage",
    "logging",
];

pub(crate) const SYSTEM_CONFIG: &str = "/etc/mnemo/mnemo.toml";
pub(crate) const LOCAL_CONFIG: &str = "mnemo.toml";

pub(crate) fn user_config() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("mnemo/mnemo.toml"))
        .unwrap_or_default()
}

/// Build the full Figment (files + env) without extracting.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MnemoConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<MnemoConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of the defaults (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<MnemoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MnemoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MnemoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MnemoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment provider mapping `MNEMO_WRITE_QUEUE_READY_TIMEOUT_MS` to
/// `write_queue.ready_timeout_ms`.
///
/// Section names contain underscores too, so the longest matching section
/// prefix wins instead of splitting on every `_`.
fn env_provider() -> Env {
    Env::prefixed("MNEMO_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    let mapped = SECTIONS
        .iter()
        .filter_map(|section| {
            key.strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|field| (section, field))
        })
        .max_by_key(|(section, _)| section.len())
        .map(|(section, field)| format!("{section}.{field}"));
    mapped.unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(
            map_env_key("write_queue_ready_timeout_ms"),
            "write_queue.ready_timeout_ms"
        );
        assert_eq!(
            map_env_key("augmentation_max_workers"),
            "augmentation.max_workers"
        );
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("extraction_api_key"), "extraction.api_key");
    }

    #[test]
    fn env_keys_arrive_upper_case() {
        assert_eq!(
            map_env_key("STORAGE_DATABASE_PATH"),
            "storage.database_path"
        );
        assert_eq!(
            map_env_key("WRITE_QUEUE_READY_TIMEOUT_MS"),
            "write_queue.ready_timeout_ms"
        );
    }

    #[test]
    fn unknown_env_keys_pass_through() {
        assert_eq!(map_env_key("something_else"), "something_else");
    }

    #[test]
    fn env_override_through_figment_jail() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("mnemo.toml", "[augmentation]\nmax_workers = 4\n")?;
            jail.set_env("MNEMO_AUGMENTATION_MAX_WORKERS", "8");
            jail.set_env("MNEMO_WRITE_QUEUE_READY_TIMEOUT_MS", "250");
            jail.set_env("MNEMO_STORAGE_DATABASE_PATH", "/tmp/override.db");

            let config = load_config_from_path(Path::new("mnemo.toml"))?;
            assert_eq!(config.augmentation.max_workers, 8);
            assert_eq!(config.write_queue.ready_timeout_ms, 250);
            assert_eq!(config.storage.database_path, "/tmp/override.db");
            Ok(())
        });
    }
}
