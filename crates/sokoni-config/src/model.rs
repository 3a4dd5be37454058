// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Sokoni commerce-agent service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Sokoni configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SokoniConfig {
    /// Service identity and web-app settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Messaging-bridge connection settings.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Session lifecycle settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// OpenAI API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Credit metering settings.
    #[serde(default)]
    pub credits: CreditsConfig,

    /// Message-pipeline tuning.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Service identity and web-app configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Public base URL of the companion web app, used to build payment links.
    #[serde(default = "default_app_url")]
    pub app_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            app_url: default_app_url(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Directory holding per-agent session credential blobs.
    #[serde(default = "default_credentials_dir")]
    pub credentials_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            credentials_dir: default_credentials_dir(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("sokoni").join("sokoni.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("sokoni.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_credentials_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("sokoni").join("sessions"))
        .unwrap_or_else(|| std::path::PathBuf::from("sessions"))
        .to_string_lossy()
        .into_owned()
}

/// Messaging-bridge connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// WebSocket URL of the messaging bridge.
    #[serde(default = "default_bridge_url")]
    pub url: String,

    /// Optional bearer token presented when connecting to the bridge.
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: default_bridge_url(),
            auth_token: None,
        }
    }
}

fn default_bridge_url() -> String {
    "ws://127.0.0.1:8765".to_string()
}

/// Session lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Seconds to wait between reconnect attempts after a transient close.
    #[serde(default = "default_reconnect_backoff_secs")]
    pub reconnect_backoff_secs: u64,

    /// Grace period in seconds after teardown of a previous session for
    /// the same agent, letting the provider release the binding.
    #[serde(default = "default_pairing_grace_secs")]
    pub pairing_grace_secs: u64,

    /// Seconds `init_session` waits for a pairing artifact before
    /// returning a still-connecting snapshot.
    #[serde(default = "default_pairing_wait_secs")]
    pub pairing_wait_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_backoff_secs: default_reconnect_backoff_secs(),
            pairing_grace_secs: default_pairing_grace_secs(),
            pairing_wait_secs: default_pairing_wait_secs(),
        }
    }
}

fn default_reconnect_backoff_secs() -> u64 {
    3
}

fn default_pairing_grace_secs() -> u64 {
    2
}

fn default_pairing_wait_secs() -> u64 {
    15
}

/// OpenAI API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// OpenAI API key. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Fallback chat model when an agent does not specify one.
    #[serde(default = "default_chat_model")]
    pub default_model: String,

    /// Model used for audio transcription.
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,

    /// Model used for speech synthesis.
    #[serde(default = "default_speech_model")]
    pub speech_model: String,

    /// Model used for lead classification.
    #[serde(default = "default_lead_model")]
    pub lead_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: default_chat_model(),
            transcription_model: default_transcription_model(),
            speech_model: default_speech_model(),
            lead_model: default_lead_model(),
        }
    }
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_speech_model() -> String {
    "tts-1".to_string()
}

fn default_lead_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Credit metering configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreditsConfig {
    /// Base credit cost of one processed message.
    #[serde(default = "default_message_cost")]
    pub message_cost: i64,

    /// Extra credits charged when the reply is synthesized as voice.
    #[serde(default = "default_voice_surcharge")]
    pub voice_surcharge: i64,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            message_cost: default_message_cost(),
            voice_surcharge: default_voice_surcharge(),
        }
    }
}

fn default_message_cost() -> i64 {
    1
}

fn default_voice_surcharge() -> i64 {
    4
}

/// Message-pipeline tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Number of history turns loaded as AI context.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// Run lead classification every N customer messages.
    #[serde(default = "default_lead_analysis_interval")]
    pub lead_analysis_interval: i64,

    /// Replies longer than this are sent as text even when the agent
    /// has voice enabled.
    #[serde(default = "default_voice_max_chars")]
    pub voice_max_chars: usize,

    /// Overall timeout in seconds for one pipeline turn, covering the AI
    /// calls and tool round-trips.
    #[serde(default = "default_turn_timeout_secs")]
    pub turn_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            lead_analysis_interval: default_lead_analysis_interval(),
            voice_max_chars: default_voice_max_chars(),
            turn_timeout_secs: default_turn_timeout_secs(),
        }
    }
}

fn default_turn_timeout_secs() -> u64 {
    120
}

fn default_history_limit() -> u32 {
    50
}

fn default_lead_analysis_interval() -> i64 {
    5
}

fn default_voice_max_chars() -> usize {
    500
}
