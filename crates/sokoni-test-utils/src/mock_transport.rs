// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat transport for deterministic testing.
//!
//! `MockTransport` implements `ChatTransport` with injectable transport
//! events and captured outbound sends for assertion in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use sokoni_core::{ChatTransport, Presence, SokoniError, TransportEvent};

/// One captured outbound operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentItem {
    Text {
        jid: String,
        text: String,
    },
    Image {
        jid: String,
        url: String,
        caption: Option<String>,
    },
    Voice {
        jid: String,
        audio_base64: String,
    },
    Presence {
        jid: String,
        presence: Presence,
    },
}

/// A mock chat transport for testing.
///
/// Provides two queues:
/// - **events**: injected via `inject_event()`, returned by `next_event()`
/// - **sent**: everything passed to the send methods, retrievable via `sent()`
#[derive(Default)]
pub struct MockTransport {
    events: Mutex<VecDeque<TransportEvent>>,
    sent: Mutex<Vec<SentItem>>,
    notify: Notify,
    connect_calls: AtomicUsize,
    last_credentials: Mutex<Option<String>>,
    pairing_code_requests: Mutex<Vec<String>>,
    logged_out: AtomicBool,
    disconnected: AtomicBool,
    fail_sends: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues an event for the next `next_event()` call.
    pub async fn inject_event(&self, event: TransportEvent) {
        self.events.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// All captured outbound operations, in order.
    pub async fn sent(&self) -> Vec<SentItem> {
        self.sent.lock().await.clone()
    }

    /// Captured text sends only.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|item| match item {
                SentItem::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub async fn last_credentials(&self) -> Option<String> {
        self.last_credentials.lock().await.clone()
    }

    pub async fn pairing_code_requests(&self) -> Vec<String> {
        self.pairing_code_requests.lock().await.clone()
    }

    pub fn was_logged_out(&self) -> bool {
        self.logged_out.load(Ordering::SeqCst)
    }

    pub fn was_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    /// Makes subsequent send methods fail with a transport error.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    fn check_send(&self) -> Result<(), SokoniError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(SokoniError::Transport {
                message: "mock transport send failure".into(),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn connect(&self, credentials: Option<String>) -> Result<(), SokoniError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_credentials.lock().await = credentials;
        Ok(())
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        loop {
            if let Some(event) = self.events.lock().await.pop_front() {
                return Some(event);
            }
            self.notify.notified().await;
        }
    }

    async fn request_pairing_code(&self, phone_number: &str) -> Result<(), SokoniError> {
        self.pairing_code_requests
            .lock()
            .await
            .push(phone_number.to_string());
        Ok(())
    }

    async fn send_text(&self, jid: &str, text: &str) -> Result<String, SokoniError> {
        self.check_send()?;
        self.sent.lock().await.push(SentItem::Text {
            jid: jid.to_string(),
            text: text.to_string(),
        });
        Ok(format!("mock-{}", uuid::Uuid::new_v4()))
    }

    async fn send_image(
        &self,
        jid: &str,
        url: &str,
        caption: Option<&str>,
    ) -> Result<String, SokoniError> {
        self.check_send()?;
        self.sent.lock().await.push(SentItem::Image {
            jid: jid.to_string(),
            url: url.to_string(),
            caption: caption.map(str::to_string),
        });
        Ok(format!("mock-{}", uuid::Uuid::new_v4()))
    }

    async fn send_voice(&self, jid: &str, audio_base64: &str) -> Result<String, SokoniError> {
        self.check_send()?;
        self.sent.lock().await.push(SentItem::Voice {
            jid: jid.to_string(),
            audio_base64: audio_base64.to_string(),
        });
        Ok(format!("mock-{}", uuid::Uuid::new_v4()))
    }

    async fn send_presence(&self, jid: &str, presence: Presence) -> Result<(), SokoniError> {
        self.sent.lock().await.push(SentItem::Presence {
            jid: jid.to_string(),
            presence,
        });
        Ok(())
    }

    async fn logout(&self) -> Result<(), SokoniError> {
        self.logged_out.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), SokoniError> {
        self.disconnected.store(true, Ordering::SeqCst);
        Ok(())
    }
}
