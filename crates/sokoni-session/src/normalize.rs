// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound message normalization.
//!
//! Converts raw transport events into [`NormalizedMessage`] records:
//! protocol suffixes stripped from the sender, kind classified, caption
//! or filename substituted as display text. Own messages, group chats,
//! and empty payloads are discarded.

use sokoni_core::{MessageKind, NormalizedMessage, RawInbound, RawPayload};

/// Strips the protocol suffix and device part from a jid.
///
/// `22501020304:12@s.whatsapp.net` becomes `22501020304`.
pub fn bare_phone(jid: &str) -> String {
    let without_server = jid.split('@').next().unwrap_or(jid);
    without_server
        .split(':')
        .next()
        .unwrap_or(without_server)
        .to_string()
}

/// True for jids that do not belong to a one-to-one customer chat.
fn is_non_customer_jid(jid: &str) -> bool {
    jid.ends_with("@g.us") || jid.ends_with("@broadcast") || jid.ends_with("@newsletter")
}

/// Normalizes one raw inbound message, or returns `None` when the
/// message should be ignored.
pub fn normalize_inbound(raw: RawInbound) -> Option<NormalizedMessage> {
    if raw.from_me || is_non_customer_jid(&raw.remote_jid) {
        return None;
    }

    let (kind, text, media_base64) = match raw.payload {
        RawPayload::Text { body } => {
            if body.trim().is_empty() {
                return None;
            }
            (MessageKind::Text, body, None)
        }
        RawPayload::Image {
            caption,
            data_base64,
            mime_type: _,
        } => (
            MessageKind::Image,
            caption.unwrap_or_else(|| "(image)".to_string()),
            Some(data_base64),
        ),
        RawPayload::Audio {
            data_base64,
            mime_type: _,
        } => (MessageKind::Audio, String::new(), Some(data_base64)),
        RawPayload::Video { caption } => (
            MessageKind::Video,
            caption.unwrap_or_else(|| "(vidéo)".to_string()),
            None,
        ),
        RawPayload::Document { filename } => (
            MessageKind::Document,
            filename
                .map(|name| format!("(document: {name})"))
                .unwrap_or_else(|| "(document)".to_string()),
            None,
        ),
        RawPayload::Sticker => (MessageKind::Sticker, "(sticker)".to_string(), None),
    };

    Some(NormalizedMessage {
        id: raw.id,
        sender: bare_phone(&raw.remote_jid),
        sender_jid: raw.remote_jid,
        push_name: raw.push_name,
        kind,
        text,
        media_base64,
        timestamp: raw.timestamp,
    })
}
