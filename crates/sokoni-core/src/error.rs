// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Sokoni commerce-agent service.

use thiserror::Error;

/// The primary error type used across all Sokoni adapter traits and core operations.
///
/// Catalog resolution failures (product not found, missing variants) are *not*
/// represented here: they are expected, user-correctable states returned as
/// data so the AI responder can relay them conversationally.
#[derive(Debug, Error)]
pub enum SokoniError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat transport errors (connection failure, frame format, send failure).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// AI responder errors (API failure, malformed response).
    #[error("responder error: {message}")]
    Responder {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A send was attempted on a session that is not in the `connected` state.
    #[error("session for agent {agent_id} is not connected")]
    NotConnected { agent_id: String },

    /// The transport reported a logout: persisted credentials have been
    /// invalidated and the agent must re-pair.
    #[error("credentials invalidated for agent {agent_id}")]
    CredentialsInvalidated { agent_id: String },

    /// The owner's credit balance cannot cover the requested deduction.
    #[error("insufficient credits for user {user_id}")]
    InsufficientCredits { user_id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
