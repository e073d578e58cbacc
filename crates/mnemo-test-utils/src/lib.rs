// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Mnemo integration tests.
//!
//! # Components
//!
//! - [`MockBackend`] - scripted in-memory connection that records every call
//! - [`TestDatabase`] - temporary SQLite file with the schema applied

pub mod harness;
pub mod mock_connection;

pub use harness::TestDatabase;
pub use mock_connection::{Call, CallLog, MockBackend};
