// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tally sales bot.

use thiserror::Error;

/// The primary error type shared by the ledger, the conversation engine and
/// every adapter.
///
/// The first four domain variants are recoverable inside a conversation:
/// the state machine turns them into a user-facing message and moves the
/// session to a safe step. The remaining variants are operational.
#[derive(Debug, Error)]
pub enum TallyError {
    /// Bad user input (non-numeric quantity, price ordering, empty text).
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A unique constraint was violated on creation.
    #[error("{entity} already exists: {key}")]
    Conflict { entity: &'static str, key: String },

    /// A multi-write ledger operation could not be applied as a whole.
    #[error("integrity error: {message}")]
    Integrity { message: String },

    /// Configuration errors (missing credentials, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport errors (delivery failure, polling failure, closed channel).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Uptime monitor API errors.
    #[error("monitor error: {message}")]
    Monitor {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TallyError {
    /// Returns `true` for errors caused by user input rather than by the
    /// system, i.e. the ones a conversation recovers from by re-prompting.
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            TallyError::Validation(_) | TallyError::NotFound { .. } | TallyError::Conflict { .. }
        )
    }
}
