// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket transport adapter for the Sokoni agent service.
//!
//! Implements [`sokoni_core::ChatTransport`] against the external
//! bridge process that owns the actual messaging-provider protocol.

pub mod frames;
pub mod transport;

pub use transport::BridgeTransport;
