// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test doubles and fixtures for Sokoni crates.
//!
//! Not part of the production dependency graph; only dev-dependencies
//! point here.

pub mod fixtures;
pub mod mock_responder;
pub mod mock_transport;

pub use mock_responder::{MockResponder, MockSpeech};
pub use mock_transport::{MockTransport, SentItem};
