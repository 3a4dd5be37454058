// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI responder trait: turns conversation context into replies and tool calls.

use async_trait::async_trait;

use crate::error::SokoniError;
use crate::types::{LeadAnalysis, ResponderReply, ResponderRequest, ToolCall, ToolResult};

/// Conversational AI backend.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Produces a reply for one conversation turn. When
    /// `request.offer_tools` is set the reply may carry tool calls
    /// instead of (or alongside) text.
    async fn respond(
        &self,
        request: &ResponderRequest,
        tools: &[serde_json::Value],
    ) -> Result<ResponderReply, SokoniError>;

    /// Second-phase call after tool execution: given the tool calls the
    /// model made and their results, produces the customer-facing
    /// phrasing. Tools are not offered again on this call.
    async fn respond_after_tools(
        &self,
        request: &ResponderRequest,
        tool_calls: &[ToolCall],
        results: &[ToolResult],
    ) -> Result<ResponderReply, SokoniError>;

    /// Classifies lead quality from a conversation transcript.
    async fn classify_lead(&self, transcript: &str) -> Result<LeadAnalysis, SokoniError>;
}
