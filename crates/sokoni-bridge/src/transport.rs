// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`ChatTransport`] implementation over a WebSocket to the bridge process.
//!
//! The bridge owns the actual provider protocol; this side speaks the
//! JSON frames from [`crate::frames`]. A reader task forwards server
//! frames into an event channel, and send acknowledgements are matched
//! back to their requests by id.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use uuid::Uuid;

use sokoni_core::{ChatTransport, Presence, SokoniError, TransportEvent};

use crate::frames::{ClientFrame, ServerFrame};

/// How long to wait for the bridge to acknowledge a send.
const ACK_TIMEOUT: Duration = Duration::from_secs(30);

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// WebSocket transport for one agent session.
pub struct BridgeTransport {
    url: String,
    auth_token: Option<String>,
    writer: Mutex<Option<WsSink>>,
    event_tx: mpsc::Sender<TransportEvent>,
    event_rx: Mutex<mpsc::Receiver<TransportEvent>>,
    pending_acks: Arc<DashMap<String, oneshot::Sender<String>>>,
    reader_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl BridgeTransport {
    pub fn new(url: String, auth_token: Option<String>) -> Self {
        let (event_tx, event_rx) = mpsc::channel(100);
        Self {
            url,
            auth_token,
            writer: Mutex::new(None),
            event_tx,
            event_rx: Mutex::new(event_rx),
            pending_acks: Arc::new(DashMap::new()),
            reader_handle: Mutex::new(None),
        }
    }

    async fn send_frame(&self, frame: &ClientFrame) -> Result<(), SokoniError> {
        let json = serde_json::to_string(frame).map_err(|e| SokoniError::Transport {
            message: format!("failed to encode frame: {e}"),
            source: Some(Box::new(e)),
        })?;
        let mut writer = self.writer.lock().await;
        let sink = writer.as_mut().ok_or_else(|| SokoniError::Transport {
            message: "bridge connection is not open".into(),
            source: None,
        })?;
        sink.send(Message::text(json))
            .await
            .map_err(|e| SokoniError::Transport {
                message: format!("failed to send frame: {e}"),
                source: Some(Box::new(e)),
            })
    }

    /// Sends a frame and waits for the matching `sent` acknowledgement.
    async fn send_with_ack(&self, id: String, frame: ClientFrame) -> Result<String, SokoniError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.pending_acks.insert(id.clone(), ack_tx);

        if let Err(e) = self.send_frame(&frame).await {
            self.pending_acks.remove(&id);
            return Err(e);
        }

        match tokio::time::timeout(ACK_TIMEOUT, ack_rx).await {
            Ok(Ok(message_id)) => Ok(message_id),
            Ok(Err(_)) => Err(SokoniError::Transport {
                message: "bridge closed before acknowledging send".into(),
                source: None,
            }),
            Err(_) => {
                self.pending_acks.remove(&id);
                Err(SokoniError::Timeout {
                    duration: ACK_TIMEOUT,
                })
            }
        }
    }
}

/// Forwards server frames into the event channel until the stream ends.
async fn read_loop(
    mut stream: futures::stream::SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    event_tx: mpsc::Sender<TransportEvent>,
    pending_acks: Arc<DashMap<String, oneshot::Sender<String>>>,
) {
    let mut closed_seen = false;
    while let Some(next) = stream.next().await {
        let message = match next {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "bridge stream error");
                break;
            }
        };
        match message {
            Message::Text(text) => {
                let frame: ServerFrame = match serde_json::from_str(text.as_str()) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(error = %e, "invalid bridge frame");
                        continue;
                    }
                };
                let event = match frame {
                    ServerFrame::Sent { id, message_id } => {
                        if let Some((_, ack)) = pending_acks.remove(&id) {
                            let _ = ack.send(message_id);
                        } else {
                            debug!(id = %id, "ack for unknown request");
                        }
                        continue;
                    }
                    ServerFrame::PairingChallenge { data } => {
                        TransportEvent::PairingChallenge { data }
                    }
                    ServerFrame::PairingCode { code } => TransportEvent::PairingCode { code },
                    ServerFrame::CredentialsUpdate { blob } => {
                        TransportEvent::CredentialsUpdate { blob }
                    }
                    ServerFrame::Open { jid } => TransportEvent::Open { jid },
                    ServerFrame::Closed { reason, logged_out } => {
                        closed_seen = true;
                        TransportEvent::Closed { reason, logged_out }
                    }
                    ServerFrame::Message { message } => TransportEvent::Message(message),
                };
                if event_tx.send(event).await.is_err() {
                    return;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    if !closed_seen {
        let _ = event_tx
            .send(TransportEvent::Closed {
                reason: "bridge connection lost".into(),
                logged_out: false,
            })
            .await;
    }
}

#[async_trait]
impl ChatTransport for BridgeTransport {
    async fn connect(&self, credentials: Option<String>) -> Result<(), SokoniError> {
        let mut request =
            self.url
                .as_str()
                .into_client_request()
                .map_err(|e| SokoniError::Transport {
                    message: format!("invalid bridge url: {e}"),
                    source: Some(Box::new(e)),
                })?;
        if let Some(token) = &self.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                SokoniError::Transport {
                    message: format!("invalid auth token: {e}"),
                    source: Some(Box::new(e)),
                }
            })?;
            request.headers_mut().insert("authorization", value);
        }

        let (stream, _) = connect_async(request)
            .await
            .map_err(|e| SokoniError::Transport {
                message: format!("bridge connection failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        debug!(url = %self.url, "bridge connected");

        let (sink, source) = stream.split();
        *self.writer.lock().await = Some(sink);

        let handle = tokio::spawn(read_loop(
            source,
            self.event_tx.clone(),
            self.pending_acks.clone(),
        ));
        if let Some(old) = self.reader_handle.lock().await.replace(handle) {
            old.abort();
        }

        self.send_frame(&ClientFrame::Connect { credentials }).await
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        self.event_rx.lock().await.recv().await
    }

    async fn request_pairing_code(&self, phone_number: &str) -> Result<(), SokoniError> {
        self.send_frame(&ClientFrame::RequestPairingCode {
            phone_number: phone_number.to_string(),
        })
        .await
    }

    async fn send_text(&self, jid: &str, text: &str) -> Result<String, SokoniError> {
        let id = Uuid::new_v4().to_string();
        self.send_with_ack(
            id.clone(),
            ClientFrame::SendText {
                id,
                jid: jid.to_string(),
                text: text.to_string(),
            },
        )
        .await
    }

    async fn send_image(
        &self,
        jid: &str,
        url: &str,
        caption: Option<&str>,
    ) -> Result<String, SokoniError> {
        let id = Uuid::new_v4().to_string();
        self.send_with_ack(
            id.clone(),
            ClientFrame::SendImage {
                id,
                jid: jid.to_string(),
                url: url.to_string(),
                caption: caption.map(str::to_string),
            },
        )
        .await
    }

    async fn send_voice(&self, jid: &str, audio_base64: &str) -> Result<String, SokoniError> {
        let id = Uuid::new_v4().to_string();
        self.send_with_ack(
            id.clone(),
            ClientFrame::SendVoice {
                id,
                jid: jid.to_string(),
                audio_base64: audio_base64.to_string(),
            },
        )
        .await
    }

    async fn send_presence(&self, jid: &str, presence: Presence) -> Result<(), SokoniError> {
        self.send_frame(&ClientFrame::Presence {
            jid: jid.to_string(),
            presence,
        })
        .await
    }

    async fn logout(&self) -> Result<(), SokoniError> {
        self.send_frame(&ClientFrame::Logout).await
    }

    async fn disconnect(&self) -> Result<(), SokoniError> {
        // A send failure here is fine, the connection may already be gone.
        if let Err(e) = self.send_frame(&ClientFrame::Disconnect).await {
            debug!(error = %e, "disconnect frame not delivered");
        }
        *self.writer.lock().await = None;
        if let Some(handle) = self.reader_handle.lock().await.take() {
            handle.abort();
        }
        Ok(())
    }
}
