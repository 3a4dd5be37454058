// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI API.
//!
//! Provides [`OpenAiClient`] which handles request construction,
//! authentication, and transient error retry for chat completions,
//! audio transcription, and speech synthesis.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use sokoni_core::SokoniError;
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse, TranscriptionResponse};

/// Base URL for the OpenAI API.
const API_BASE_URL: &str = "https://api.openai.com/v1";

/// TTS rejects inputs beyond this length.
const SPEECH_INPUT_LIMIT: usize = 4000;

/// HTTP client for OpenAI API communication.
///
/// Manages the bearer-token header, connection pooling, and retry logic
/// for transient errors (429, 500, 503).
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    transcription_model: String,
    speech_model: String,
}

impl OpenAiClient {
    pub fn new(
        api_key: &str,
        transcription_model: String,
        speech_model: String,
    ) -> Result<Self, SokoniError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| SokoniError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert("authorization", auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| SokoniError::Responder {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: API_BASE_URL.to_string(),
            max_retries: 1,
            transcription_model,
            speech_model,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Sends a chat-completions request.
    ///
    /// On transient errors (429, 500, 503), retries once after a
    /// 1-second delay.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, SokoniError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying chat request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .json(request)
                .send()
                .await
                .map_err(|e| SokoniError::Responder {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "chat response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| SokoniError::Responder {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                let chat: ChatResponse =
                    serde_json::from_str(&body).map_err(|e| SokoniError::Responder {
                        message: format!("failed to parse API response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return Ok(chat);
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(api_error(status, &body));
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        Err(last_error.unwrap_or_else(|| SokoniError::Responder {
            message: "chat request failed after retries".into(),
            source: None,
        }))
    }

    /// Transcribes an audio clip via the transcriptions endpoint.
    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        mime_type: &str,
        language: &str,
    ) -> Result<String, SokoniError> {
        let url = format!("{}/audio/transcriptions", self.base_url);
        let file_name = if mime_type.contains("mp4") {
            "audio.mp4"
        } else {
            "audio.ogg"
        };
        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(file_name)
            .mime_str(mime_type)
            .map_err(|e| SokoniError::Responder {
                message: format!("invalid audio mime type: {e}"),
                source: Some(Box::new(e)),
            })?;
        let form = reqwest::multipart::Form::new()
            .text("model", self.transcription_model.clone())
            .text("language", language.to_string())
            .part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SokoniError::Responder {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(api_error(status, &body));
        }
        let parsed: TranscriptionResponse =
            serde_json::from_str(&body).map_err(|e| SokoniError::Responder {
                message: format!("failed to parse transcription response: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(parsed.text)
    }

    /// Synthesizes speech audio from text. Input is truncated to the
    /// endpoint limit.
    pub async fn speech(&self, text: &str, voice: &str) -> Result<Vec<u8>, SokoniError> {
        let url = format!("{}/audio/speech", self.base_url);
        let input: String = text.chars().take(SPEECH_INPUT_LIMIT).collect();
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "model": self.speech_model,
                "voice": voice,
                "input": input,
            }))
            .send()
            .await
            .map_err(|e| SokoniError::Responder {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }
        let bytes = response.bytes().await.map_err(|e| SokoniError::Responder {
            message: format!("failed to read audio body: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(bytes.to_vec())
    }
}

fn api_error(status: reqwest::StatusCode, body: &str) -> SokoniError {
    let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(body) {
        format!(
            "OpenAI API error ({}): {}",
            api_err.error.type_.as_deref().unwrap_or("unknown"),
            api_err.error.message
        )
    } else {
        format!("API returned {status}: {body}")
    };
    SokoniError::Responder {
        message,
        source: None,
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}
