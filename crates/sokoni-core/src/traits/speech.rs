// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech services: audio transcription and voice synthesis.

use async_trait::async_trait;

use crate::error::SokoniError;

/// Speech-to-text and text-to-speech backend.
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Transcribes an audio clip to text.
    async fn transcribe(
        &self,
        audio_base64: &str,
        mime_type: &str,
    ) -> Result<String, SokoniError>;

    /// Synthesizes speech audio (OGG/Opus) from text.
    async fn synthesize(
        &self,
        text: &str,
        voice_id: Option<&str>,
    ) -> Result<Vec<u8>, SokoniError>;
}
