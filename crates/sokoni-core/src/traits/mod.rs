// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the pluggable seams of the service.

pub mod handler;
pub mod responder;
pub mod speech;
pub mod store;
pub mod transport;

pub use handler::InboundHandler;
pub use responder::Responder;
pub use speech::SpeechService;
pub use store::Store;
pub use transport::{ChatTransport, Presence, RawInbound, RawPayload, TransportEvent};
