// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI backends for the Sokoni agent service.
//!
//! [`OpenAiClient`] is the low-level HTTP client; [`OpenAiResponder`]
//! and [`OpenAiSpeech`] implement the service traits from
//! `sokoni-core` on top of it.

pub mod client;
pub mod responder;
pub mod speech;
pub mod types;

pub use client::OpenAiClient;
pub use responder::OpenAiResponder;
pub use speech::OpenAiSpeech;
