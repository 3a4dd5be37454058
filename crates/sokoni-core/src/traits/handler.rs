// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound message handler trait, the seam between the session layer
//! and the processing pipeline.

use async_trait::async_trait;

use crate::types::NormalizedMessage;

/// Consumer of normalized inbound messages.
///
/// Implementations own their error handling: a failed turn is logged
/// and swallowed so the session event loop never dies on one message.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    async fn handle(&self, agent_id: &str, message: NormalizedMessage);
}
