// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock AI responder and speech service with scripted replies.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use sokoni_core::{
    LeadAnalysis, Responder, ResponderReply, ResponderRequest, SokoniError, SpeechService,
    ToolCall, ToolResult,
};

/// A mock responder that returns scripted replies in order.
///
/// When the script runs out, a plain "D'accord !" text reply is
/// returned. All requests are captured for assertion.
#[derive(Default)]
pub struct MockResponder {
    replies: Mutex<VecDeque<ResponderReply>>,
    requests: Mutex<Vec<ResponderRequest>>,
    after_tools: Mutex<Vec<(Vec<ToolCall>, Vec<ToolResult>)>>,
    lead: Mutex<Option<LeadAnalysis>>,
    lead_requests: Mutex<Vec<String>>,
    fail: Mutex<bool>,
}

impl MockResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a text reply.
    pub async fn push_text(&self, text: &str) {
        self.push_reply(ResponderReply {
            content: Some(text.to_string()),
            ..Default::default()
        })
        .await;
    }

    /// Queues a reply carrying tool calls.
    pub async fn push_tool_calls(&self, calls: Vec<ToolCall>) {
        self.push_reply(ResponderReply {
            content: None,
            tool_calls: calls,
            ..Default::default()
        })
        .await;
    }

    pub async fn push_reply(&self, reply: ResponderReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Sets the lead analysis returned by `classify_lead`.
    pub async fn set_lead(&self, analysis: LeadAnalysis) {
        *self.lead.lock().await = Some(analysis);
    }

    /// Makes all calls fail with a responder error.
    pub async fn fail_all(&self, fail: bool) {
        *self.fail.lock().await = fail;
    }

    /// All first-phase requests seen so far.
    pub async fn requests(&self) -> Vec<ResponderRequest> {
        self.requests.lock().await.clone()
    }

    /// Tool-call/result pairs passed to `respond_after_tools`.
    pub async fn after_tools_calls(&self) -> Vec<(Vec<ToolCall>, Vec<ToolResult>)> {
        self.after_tools.lock().await.clone()
    }

    /// Transcripts passed to `classify_lead`.
    pub async fn lead_requests(&self) -> Vec<String> {
        self.lead_requests.lock().await.clone()
    }

    async fn next_reply(&self) -> Result<ResponderReply, SokoniError> {
        if *self.fail.lock().await {
            return Err(SokoniError::Responder {
                message: "mock responder failure".into(),
                source: None,
            });
        }
        Ok(self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| ResponderReply {
                content: Some("D'accord !".to_string()),
                ..Default::default()
            }))
    }
}

#[async_trait]
impl Responder for MockResponder {
    async fn respond(
        &self,
        request: &ResponderRequest,
        _tools: &[serde_json::Value],
    ) -> Result<ResponderReply, SokoniError> {
        self.requests.lock().await.push(request.clone());
        self.next_reply().await
    }

    async fn respond_after_tools(
        &self,
        _request: &ResponderRequest,
        tool_calls: &[ToolCall],
        results: &[ToolResult],
    ) -> Result<ResponderReply, SokoniError> {
        self.after_tools
            .lock()
            .await
            .push((tool_calls.to_vec(), results.to_vec()));
        self.next_reply().await
    }

    async fn classify_lead(&self, transcript: &str) -> Result<LeadAnalysis, SokoniError> {
        self.lead_requests.lock().await.push(transcript.to_string());
        Ok(self.lead.lock().await.clone().unwrap_or(LeadAnalysis {
            score: 5,
            status: "warm".to_string(),
            reasoning: "intérêt réel".to_string(),
        }))
    }
}

/// A mock speech service with fixed transcription text.
pub struct MockSpeech {
    pub transcription: Mutex<Result<String, ()>>,
}

impl Default for MockSpeech {
    fn default() -> Self {
        Self {
            transcription: Mutex::new(Ok("bonjour".to_string())),
        }
    }
}

impl MockSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transcription(text: &str) -> Self {
        Self {
            transcription: Mutex::new(Ok(text.to_string())),
        }
    }

    pub fn failing() -> Self {
        Self {
            transcription: Mutex::new(Err(())),
        }
    }
}

#[async_trait]
impl SpeechService for MockSpeech {
    async fn transcribe(
        &self,
        _audio_base64: &str,
        _mime_type: &str,
    ) -> Result<String, SokoniError> {
        self.transcription
            .lock()
            .await
            .clone()
            .map_err(|_| SokoniError::Responder {
                message: "mock transcription failure".into(),
                source: None,
            })
    }

    async fn synthesize(
        &self,
        _text: &str,
        _voice_id: Option<&str>,
    ) -> Result<Vec<u8>, SokoniError> {
        Ok(vec![0x4f, 0x67, 0x67, 0x53])
    }
}
