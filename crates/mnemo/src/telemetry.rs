// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracing subscriber setup for applications embedding Mnemo.

use mnemo_config::LoggingConfig;
use mnemo_core::MnemoError;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset: `level` for mnemo crates, warn
/// for everything else.
pub fn default_filter(level: &str) -> String {
    format!("mnemo={level},warn")
}

/// Install a global fmt subscriber. `RUST_LOG` overrides `level`.
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(level: &str) -> Result<(), MnemoError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| MnemoError::Internal(format!("tracing already initialized: {e}")))
}

/// [`init_tracing`] at the level set by the `[logging]` section.
pub fn init_tracing_from(logging: &LoggingConfig) -> Result<(), MnemoError> {
    init_tracing(&logging.level)
}
