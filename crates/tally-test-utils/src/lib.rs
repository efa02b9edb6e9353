// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tally integration tests.
//!
//! Provides a mock channel and a harness that wires the conversation engine
//! to a temporary SQLite ledger, so conversations can be driven end to end
//! without a Telegram connection.
//!
//! # Components
//!
//! - [`MockChannel`] - Mock messaging channel with event injection and capture
//! - [`TestHarness`] - Seeded ledger, registry and engine in a temp directory

pub mod harness;
pub mod mock_channel;

pub use harness::{TestHarness, event, messages};
pub use mock_channel::MockChannel;
