// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`SpeechService`] implementation: Whisper transcription and TTS synthesis.

use async_trait::async_trait;
use base64::Engine;
use tracing::debug;

use sokoni_core::{SokoniError, SpeechService};

use crate::client::OpenAiClient;

/// Voice used when the agent has no voice configured.
const DEFAULT_VOICE: &str = "alloy";

/// Customer voice notes arrive in French.
const TRANSCRIPTION_LANGUAGE: &str = "fr";

pub struct OpenAiSpeech {
    client: OpenAiClient,
}

impl OpenAiSpeech {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SpeechService for OpenAiSpeech {
    async fn transcribe(&self, audio_base64: &str, mime_type: &str) -> Result<String, SokoniError> {
        let audio = base64::engine::general_purpose::STANDARD
            .decode(audio_base64)
            .map_err(|e| SokoniError::Responder {
                message: format!("invalid base64 audio payload: {e}"),
                source: Some(Box::new(e)),
            })?;
        debug!(bytes = audio.len(), mime_type, "transcribing voice note");
        self.client
            .transcribe(audio, mime_type, TRANSCRIPTION_LANGUAGE)
            .await
    }

    async fn synthesize(&self, text: &str, voice_id: Option<&str>) -> Result<Vec<u8>, SokoniError> {
        let voice = voice_id.unwrap_or(DEFAULT_VOICE);
        self.client.speech(text, voice).await
    }
}
