// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message-processing pipeline for the Sokoni agent service.
//!
//! Implements [`sokoni_core::InboundHandler`]: each normalized inbound
//! message runs through media handling, persistence, the AI turn with
//! an optional tool round, reply delivery, credit metering, and
//! periodic lead classification.

pub mod handler;
pub mod prompt;

pub use handler::MessagePipeline;
