// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat transport trait for messaging-provider integrations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SokoniError;

/// Presence indicator shown to the remote contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Composing,
    Paused,
}

/// Raw message payload as delivered by the provider, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawPayload {
    Text {
        body: String,
    },
    Image {
        #[serde(default)]
        caption: Option<String>,
        /// Media bytes, base64. Carried inline so no separate download
        /// round-trip is needed.
        data_base64: String,
        mime_type: String,
    },
    Audio {
        data_base64: String,
        mime_type: String,
    },
    Video {
        #[serde(default)]
        caption: Option<String>,
    },
    Document {
        #[serde(default)]
        filename: Option<String>,
    },
    Sticker,
}

/// One raw inbound message from the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInbound {
    /// Provider message id.
    pub id: String,
    /// Full sender jid, e.g. `22501020304@s.whatsapp.net`.
    pub remote_jid: String,
    /// True for messages authored by the account itself.
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub push_name: Option<String>,
    pub timestamp: String,
    pub payload: RawPayload,
}

/// Lifecycle and message events surfaced by a transport.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A QR pairing challenge is available; `data` is the raw string to
    /// render as a QR image.
    PairingChallenge { data: String },
    /// A linking code arrived in response to `request_pairing_code`.
    PairingCode { code: String },
    /// Updated session credentials to persist for later restoration.
    CredentialsUpdate { blob: String },
    /// The session is open and bound to `jid`.
    Open { jid: String },
    /// The session closed. `logged_out` means the credentials were
    /// invalidated remotely and must not be reused.
    Closed { reason: String, logged_out: bool },
    /// An inbound message.
    Message(RawInbound),
}

/// Bidirectional chat transport for one agent session.
///
/// All methods take `&self`: implementations route through internal
/// channels so the session event loop and concurrent senders coexist.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Establishes the provider connection, resuming from persisted
    /// credentials when given.
    async fn connect(&self, credentials: Option<String>) -> Result<(), SokoniError>;

    /// Returns the next transport event, or `None` once the transport
    /// has shut down for good.
    async fn next_event(&self) -> Option<TransportEvent>;

    /// Asks the provider for a phone-linking code instead of a QR scan.
    /// The code arrives later as a [`TransportEvent::PairingCode`].
    async fn request_pairing_code(&self, phone_number: &str) -> Result<(), SokoniError>;

    /// Sends a text message. Returns the provider message id.
    async fn send_text(&self, jid: &str, text: &str) -> Result<String, SokoniError>;

    /// Sends an image by URL with an optional caption.
    async fn send_image(
        &self,
        jid: &str,
        url: &str,
        caption: Option<&str>,
    ) -> Result<String, SokoniError>;

    /// Sends an audio clip as a push-to-talk voice note.
    async fn send_voice(&self, jid: &str, audio_base64: &str) -> Result<String, SokoniError>;

    /// Updates the presence indicator shown to `jid`.
    async fn send_presence(&self, jid: &str, presence: Presence) -> Result<(), SokoniError>;

    /// Signs the account out, invalidating credentials provider-side.
    async fn logout(&self) -> Result<(), SokoniError>;

    /// Tears down the connection without invalidating credentials.
    async fn disconnect(&self) -> Result<(), SokoniError>;
}
