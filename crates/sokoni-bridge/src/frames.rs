// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON frame formats exchanged with the bridge process.
//!
//! Client -> Bridge (JSON):
//! ```json
//! {"op": "connect", "credentials": "<blob or null>"}
//! {"op": "send_text", "id": "req-1", "jid": "2250102@s.whatsapp.net", "text": "Bonjour"}
//! ```
//!
//! Bridge -> Client (JSON):
//! ```json
//! {"op": "open", "jid": "2250102@s.whatsapp.net"}
//! {"op": "sent", "id": "req-1", "message_id": "3EB0..."}
//! {"op": "message", "message": {"id": "...", "remote_jid": "...", ...}}
//! ```

use serde::{Deserialize, Serialize};

use sokoni_core::{Presence, RawInbound};

/// Frame sent from this service to the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Opens (or resumes) the provider session.
    Connect {
        #[serde(default)]
        credentials: Option<String>,
    },
    /// Requests a phone-linking code instead of a QR scan.
    RequestPairingCode { phone_number: String },
    SendText {
        /// Request id, echoed back in the `sent` acknowledgement.
        id: String,
        jid: String,
        text: String,
    },
    SendImage {
        id: String,
        jid: String,
        url: String,
        #[serde(default)]
        caption: Option<String>,
    },
    SendVoice {
        id: String,
        jid: String,
        audio_base64: String,
    },
    Presence {
        jid: String,
        presence: Presence,
    },
    Logout,
    Disconnect,
}

/// Frame received from the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ServerFrame {
    PairingChallenge {
        data: String,
    },
    PairingCode {
        code: String,
    },
    CredentialsUpdate {
        blob: String,
    },
    Open {
        jid: String,
    },
    Closed {
        reason: String,
        #[serde(default)]
        logged_out: bool,
    },
    Message {
        message: RawInbound,
    },
    /// Acknowledges a send request with the provider message id.
    Sent {
        id: String,
        message_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use sokoni_core::RawPayload;

    #[test]
    fn send_text_frame_shape() {
        let frame = ClientFrame::SendText {
            id: "req-1".into(),
            jid: "22501020304@s.whatsapp.net".into(),
            text: "Bonjour".into(),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["op"], "send_text");
        assert_eq!(json["id"], "req-1");
        assert_eq!(json["text"], "Bonjour");
    }

    #[test]
    fn connect_frame_carries_optional_credentials() {
        let json = serde_json::to_value(ClientFrame::Connect { credentials: None }).unwrap();
        assert_eq!(json["op"], "connect");
        assert_eq!(json["credentials"], serde_json::Value::Null);
    }

    #[test]
    fn presence_frame_uses_snake_case() {
        let frame = ClientFrame::Presence {
            jid: "x@s.whatsapp.net".into(),
            presence: Presence::Composing,
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["presence"], "composing");
    }

    #[test]
    fn message_frame_decodes_inbound_payload() {
        let raw = r#"{
            "op": "message",
            "message": {
                "id": "ABCD",
                "remote_jid": "22501020304@s.whatsapp.net",
                "push_name": "Mariam",
                "timestamp": "2026-08-23T10:00:00Z",
                "payload": {"kind": "text", "body": "je veux une bougie"}
            }
        }"#;
        let frame: ServerFrame = serde_json::from_str(raw).unwrap();
        match frame {
            ServerFrame::Message { message } => {
                assert_eq!(message.remote_jid, "22501020304@s.whatsapp.net");
                assert!(!message.from_me);
                assert!(matches!(message.payload, RawPayload::Text { .. }));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn closed_frame_defaults_logged_out_to_false() {
        let frame: ServerFrame =
            serde_json::from_str(r#"{"op": "closed", "reason": "stream error"}"#).unwrap();
        match frame {
            ServerFrame::Closed { logged_out, .. } => assert!(!logged_out),
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}
