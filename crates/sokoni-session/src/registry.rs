// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-agent session registry and lifecycle state machine.
//!
//! The registry owns at most one live session per agent id. Each session
//! runs one event-loop task that consumes transport events sequentially,
//! mirrors status onto the agent row, and hands normalized inbound
//! messages to the registered [`InboundHandler`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, info, warn};

use sokoni_config::SessionConfig;
use sokoni_core::{
    ChatTransport, InboundHandler, Presence, SessionSnapshot, SessionStatus, SokoniError, Store,
    TransportEvent,
};

use crate::credentials::{
    credentials_exist, load_credentials, save_credentials, wipe_credentials,
};
use crate::normalize::{bare_phone, normalize_inbound};
use crate::qr::render_qr;

/// Produces a fresh transport for each new session.
pub trait TransportFactory: Send + Sync {
    fn create(&self) -> Arc<dyn ChatTransport>;
}

/// How a new session should pair when no credentials exist yet.
#[derive(Debug, Clone, Default)]
pub struct PairingOptions {
    /// Request a short linking code instead of a QR challenge.
    pub use_linking_code: bool,
    /// Phone number to bind, required for linking-code pairing.
    pub phone_number: Option<String>,
}

struct Session {
    transport: Arc<dyn ChatTransport>,
    snapshot: Arc<watch::Sender<SessionSnapshot>>,
    closing: Arc<AtomicBool>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

/// Owns all live agent sessions.
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Session>>,
    factory: Arc<dyn TransportFactory>,
    store: Arc<dyn Store>,
    handler: Arc<RwLock<Option<Arc<dyn InboundHandler>>>>,
    config: SessionConfig,
    credentials_dir: PathBuf,
}

impl SessionRegistry {
    pub fn new(
        store: Arc<dyn Store>,
        factory: Arc<dyn TransportFactory>,
        config: SessionConfig,
        credentials_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            factory,
            store,
            handler: Arc::new(RwLock::new(None)),
            config,
            credentials_dir: credentials_dir.into(),
        }
    }

    /// Registers the consumer of normalized inbound messages.
    pub async fn set_inbound_handler(&self, handler: Arc<dyn InboundHandler>) {
        *self.handler.write().await = Some(handler);
    }

    /// Opens (or replaces) the session for an agent.
    ///
    /// Returns once a pairing artifact or a settled status is available,
    /// or after the configured wait elapses with the session still
    /// connecting.
    pub async fn init_session(
        &self,
        agent_id: &str,
        options: PairingOptions,
    ) -> Result<SessionSnapshot, SokoniError> {
        if let Some((_, old)) = self.sessions.remove(agent_id) {
            info!(agent_id, "superseding existing session");
            teardown(&old).await;
            // Let the provider release the previous binding.
            tokio::time::sleep(Duration::from_secs(self.config.pairing_grace_secs)).await;
        }

        let credentials = load_credentials(&self.credentials_dir, agent_id).await;
        let transport = self.factory.create();
        let (snapshot_tx, mut snapshot_rx) = watch::channel(SessionSnapshot {
            status: SessionStatus::Connecting,
            qr_code: None,
            linking_code: None,
            phone_number: None,
        });
        let snapshot_tx = Arc::new(snapshot_tx);
        let session = Arc::new(Session {
            transport: transport.clone(),
            snapshot: snapshot_tx.clone(),
            closing: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        });
        self.sessions.insert(agent_id.to_string(), session.clone());

        self.store
            .update_agent_connection(agent_id, SessionStatus::Connecting, None)
            .await?;

        transport.connect(credentials.clone()).await?;
        if options.use_linking_code && credentials.is_none() {
            let phone = options.phone_number.as_deref().ok_or_else(|| {
                SokoniError::Config("phone_number is required for linking-code pairing".into())
            })?;
            transport.request_pairing_code(phone).await?;
        }

        let task = tokio::spawn(run_event_loop(LoopContext {
            agent_id: agent_id.to_string(),
            transport,
            store: self.store.clone(),
            handler: self.handler.clone(),
            snapshot: snapshot_tx,
            closing: session.closing.clone(),
            credentials_dir: self.credentials_dir.clone(),
            backoff: Duration::from_secs(self.config.reconnect_backoff_secs),
        }));
        *session.task.lock().await = Some(task);

        let wait = Duration::from_secs(self.config.pairing_wait_secs);
        let snapshot = match tokio::time::timeout(wait, settled(&mut snapshot_rx)).await {
            Ok(snapshot) => snapshot,
            Err(_) => snapshot_rx.borrow().clone(),
        };
        Ok(snapshot)
    }

    /// Current state of an agent's session, if one exists.
    pub fn snapshot(&self, agent_id: &str) -> Option<SessionSnapshot> {
        self.sessions
            .get(agent_id)
            .map(|session| session.snapshot.borrow().clone())
    }

    /// Whether credential material exists on disk for this agent,
    /// without opening a connection.
    pub fn session_exists(&self, agent_id: &str) -> bool {
        credentials_exist(&self.credentials_dir, agent_id)
    }

    fn connected(&self, agent_id: &str) -> Result<Arc<Session>, SokoniError> {
        let session = self
            .sessions
            .get(agent_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SokoniError::NotConnected {
                agent_id: agent_id.to_string(),
            })?;
        if session.snapshot.borrow().status != SessionStatus::Connected {
            return Err(SokoniError::NotConnected {
                agent_id: agent_id.to_string(),
            });
        }
        Ok(session)
    }

    pub async fn send_text(
        &self,
        agent_id: &str,
        jid: &str,
        text: &str,
    ) -> Result<String, SokoniError> {
        let session = self.connected(agent_id)?;
        session.transport.send_text(jid, text).await
    }

    /// Composing presence, a UX delay, the text, then paused presence.
    /// Presence failures never block the send.
    pub async fn send_with_typing(
        &self,
        agent_id: &str,
        jid: &str,
        text: &str,
        delay: Duration,
    ) -> Result<String, SokoniError> {
        let session = self.connected(agent_id)?;
        if let Err(e) = session.transport.send_presence(jid, Presence::Composing).await {
            debug!(agent_id, error = %e, "composing presence failed");
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let message_id = session.transport.send_text(jid, text).await?;
        if let Err(e) = session.transport.send_presence(jid, Presence::Paused).await {
            debug!(agent_id, error = %e, "paused presence failed");
        }
        Ok(message_id)
    }

    pub async fn send_image(
        &self,
        agent_id: &str,
        jid: &str,
        url: &str,
        caption: Option<&str>,
    ) -> Result<String, SokoniError> {
        let session = self.connected(agent_id)?;
        session.transport.send_image(jid, url, caption).await
    }

    pub async fn send_voice(
        &self,
        agent_id: &str,
        jid: &str,
        audio_base64: &str,
    ) -> Result<String, SokoniError> {
        let session = self.connected(agent_id)?;
        session.transport.send_voice(jid, audio_base64).await
    }

    /// Ends the session, keeping credentials for later restoration.
    pub async fn close(&self, agent_id: &str) -> Result<(), SokoniError> {
        if let Some((_, session)) = self.sessions.remove(agent_id) {
            teardown(&session).await;
            self.store
                .update_agent_connection(agent_id, SessionStatus::Disconnected, None)
                .await?;
        }
        Ok(())
    }

    /// Ends the session and wipes credentials; the agent must re-pair.
    pub async fn logout(&self, agent_id: &str) -> Result<(), SokoniError> {
        if let Some((_, session)) = self.sessions.remove(agent_id) {
            session.closing.store(true, Ordering::SeqCst);
            if let Err(e) = session.transport.logout().await {
                warn!(agent_id, error = %e, "transport logout failed");
            }
            teardown(&session).await;
            self.store
                .update_agent_connection(agent_id, SessionStatus::Disconnected, None)
                .await?;
        }
        wipe_credentials(&self.credentials_dir, agent_id).await;
        Ok(())
    }

    /// Closes every live session, for process shutdown.
    pub async fn close_all(&self) {
        let agent_ids: Vec<String> = self
            .sessions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for agent_id in agent_ids {
            if let Err(e) = self.close(&agent_id).await {
                warn!(agent_id = %agent_id, error = %e, "failed to close session");
            }
        }
    }
}

async fn teardown(session: &Arc<Session>) {
    session.closing.store(true, Ordering::SeqCst);
    if let Err(e) = session.transport.disconnect().await {
        debug!(error = %e, "transport disconnect failed");
    }
    if let Some(task) = session.task.lock().await.take() {
        task.abort();
    }
}

/// Waits until the snapshot shows a pairing artifact or a settled status.
async fn settled(rx: &mut watch::Receiver<SessionSnapshot>) -> SessionSnapshot {
    loop {
        let snapshot = rx.borrow_and_update().clone();
        match snapshot.status {
            SessionStatus::QrReady | SessionStatus::Connected | SessionStatus::Disconnected => {
                return snapshot;
            }
            SessionStatus::Connecting => {}
        }
        if rx.changed().await.is_err() {
            return rx.borrow().clone();
        }
    }
}

struct LoopContext {
    agent_id: String,
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn Store>,
    handler: Arc<RwLock<Option<Arc<dyn InboundHandler>>>>,
    snapshot: Arc<watch::Sender<SessionSnapshot>>,
    closing: Arc<AtomicBool>,
    credentials_dir: PathBuf,
    backoff: Duration,
}

impl LoopContext {
    async fn mirror_status(&self, status: SessionStatus, phone: Option<&str>) {
        if let Err(e) = self
            .store
            .update_agent_connection(&self.agent_id, status, phone)
            .await
        {
            warn!(agent_id = %self.agent_id, error = %e, "failed to mirror connection status");
        }
    }
}

async fn run_event_loop(ctx: LoopContext) {
    while let Some(event) = ctx.transport.next_event().await {
        match event {
            TransportEvent::PairingChallenge { data } => match render_qr(&data) {
                Ok(art) => {
                    info!(agent_id = %ctx.agent_id, "pairing challenge received");
                    ctx.snapshot.send_modify(|s| {
                        s.status = SessionStatus::QrReady;
                        s.qr_code = Some(art);
                    });
                    ctx.mirror_status(SessionStatus::QrReady, None).await;
                }
                Err(e) => warn!(agent_id = %ctx.agent_id, error = %e, "unrenderable pairing challenge"),
            },
            TransportEvent::PairingCode { code } => {
                info!(agent_id = %ctx.agent_id, "linking code received");
                ctx.snapshot.send_modify(|s| {
                    s.status = SessionStatus::QrReady;
                    s.linking_code = Some(code);
                });
                ctx.mirror_status(SessionStatus::QrReady, None).await;
            }
            TransportEvent::CredentialsUpdate { blob } => {
                if let Err(e) = save_credentials(&ctx.credentials_dir, &ctx.agent_id, &blob).await
                {
                    warn!(agent_id = %ctx.agent_id, error = %e, "failed to persist credentials");
                }
            }
            TransportEvent::Open { jid } => {
                let phone = bare_phone(&jid);
                info!(agent_id = %ctx.agent_id, phone = %phone, "session connected");
                ctx.snapshot.send_modify(|s| {
                    s.status = SessionStatus::Connected;
                    s.qr_code = None;
                    s.linking_code = None;
                    s.phone_number = Some(phone.clone());
                });
                ctx.mirror_status(SessionStatus::Connected, Some(&phone)).await;
            }
            TransportEvent::Closed { reason, logged_out } => {
                ctx.snapshot
                    .send_modify(|s| s.status = SessionStatus::Disconnected);
                ctx.mirror_status(SessionStatus::Disconnected, None).await;

                if logged_out {
                    warn!(agent_id = %ctx.agent_id, reason = %reason, "logged out remotely, wiping credentials");
                    wipe_credentials(&ctx.credentials_dir, &ctx.agent_id).await;
                    break;
                }
                if ctx.closing.load(Ordering::SeqCst) {
                    break;
                }
                warn!(agent_id = %ctx.agent_id, reason = %reason, "session closed, will reconnect");
                // Fixed-interval retry, unbounded: the network is assumed
                // transient. The interval is configurable.
                loop {
                    tokio::time::sleep(ctx.backoff).await;
                    if ctx.closing.load(Ordering::SeqCst) {
                        return;
                    }
                    ctx.snapshot
                        .send_modify(|s| s.status = SessionStatus::Connecting);
                    let credentials =
                        load_credentials(&ctx.credentials_dir, &ctx.agent_id).await;
                    match ctx.transport.connect(credentials).await {
                        Ok(()) => break,
                        Err(e) => {
                            warn!(agent_id = %ctx.agent_id, error = %e, "reconnect attempt failed");
                        }
                    }
                }
            }
            TransportEvent::Message(raw) => {
                let Some(message) = normalize_inbound(raw) else {
                    continue;
                };
                let handler = ctx.handler.read().await.clone();
                match handler {
                    Some(handler) => handler.handle(&ctx.agent_id, message).await,
                    None => debug!(agent_id = %ctx.agent_id, "no inbound handler registered"),
                }
            }
        }
    }
    debug!(agent_id = %ctx.agent_id, "session event loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sokoni_core::NormalizedMessage;
    use sokoni_storage::SqliteStore;
    use sokoni_test_utils::fixtures;
    use sokoni_test_utils::MockTransport;
    use tokio::sync::Notify;

    struct FixedFactory(Arc<MockTransport>);

    impl TransportFactory for FixedFactory {
        fn create(&self) -> Arc<dyn ChatTransport> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct CapturingHandler {
        seen: Mutex<Vec<(String, NormalizedMessage)>>,
        notify: Notify,
    }

    #[async_trait]
    impl InboundHandler for CapturingHandler {
        async fn handle(&self, agent_id: &str, message: NormalizedMessage) {
            self.seen
                .lock()
                .await
                .push((agent_id.to_string(), message));
            self.notify.notify_one();
        }
    }

    fn fast_config() -> SessionConfig {
        SessionConfig {
            reconnect_backoff_secs: 0,
            pairing_grace_secs: 0,
            pairing_wait_secs: 2,
        }
    }

    async fn registry_with(
        transport: Arc<MockTransport>,
    ) -> (SessionRegistry, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("test.db").to_str().unwrap(), false)
            .await
            .unwrap();
        let registry = SessionRegistry::new(
            Arc::new(store),
            Arc::new(FixedFactory(transport)),
            fast_config(),
            dir.path().join("creds"),
        );
        (registry, dir)
    }

    #[tokio::test]
    async fn pairing_challenge_yields_qr_ready_snapshot() {
        let transport = MockTransport::new();
        transport
            .inject_event(TransportEvent::PairingChallenge {
                data: "2@pairing-data".into(),
            })
            .await;
        let (registry, _dir) = registry_with(transport).await;

        let snapshot = registry
            .init_session("a1", PairingOptions::default())
            .await
            .unwrap();
        assert_eq!(snapshot.status, SessionStatus::QrReady);
        assert!(snapshot.qr_code.is_some());
        assert!(snapshot.linking_code.is_none());
    }

    #[tokio::test]
    async fn open_event_connects_and_binds_phone() {
        let transport = MockTransport::new();
        transport
            .inject_event(TransportEvent::Open {
                jid: "22501020304:3@s.whatsapp.net".into(),
            })
            .await;
        let (registry, _dir) = registry_with(transport.clone()).await;

        let snapshot = registry
            .init_session("a1", PairingOptions::default())
            .await
            .unwrap();
        assert_eq!(snapshot.status, SessionStatus::Connected);
        assert_eq!(snapshot.phone_number.as_deref(), Some("22501020304"));

        let id = registry
            .send_text("a1", "22507070707@s.whatsapp.net", "Bonjour")
            .await
            .unwrap();
        assert!(id.starts_with("mock-"));
        assert_eq!(transport.sent_texts().await, vec!["Bonjour".to_string()]);
    }

    #[tokio::test]
    async fn sending_without_a_connected_session_fails() {
        let transport = MockTransport::new();
        let (registry, _dir) = registry_with(transport).await;
        let err = registry
            .send_text("missing", "x@s.whatsapp.net", "salut")
            .await;
        assert!(matches!(err, Err(SokoniError::NotConnected { .. })));
    }

    #[tokio::test]
    async fn linking_code_pairing_requests_a_code() {
        let transport = MockTransport::new();
        transport
            .inject_event(TransportEvent::PairingCode {
                code: "ABCD-1234".into(),
            })
            .await;
        let (registry, _dir) = registry_with(transport.clone()).await;

        let snapshot = registry
            .init_session(
                "a1",
                PairingOptions {
                    use_linking_code: true,
                    phone_number: Some("22501020304".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(snapshot.status, SessionStatus::QrReady);
        assert_eq!(snapshot.linking_code.as_deref(), Some("ABCD-1234"));
        assert_eq!(
            transport.pairing_code_requests().await,
            vec!["22501020304".to_string()]
        );
    }

    #[tokio::test]
    async fn transient_close_reconnects() {
        let transport = MockTransport::new();
        transport
            .inject_event(TransportEvent::Open {
                jid: "22501020304@s.whatsapp.net".into(),
            })
            .await;
        let (registry, _dir) = registry_with(transport.clone()).await;
        registry
            .init_session("a1", PairingOptions::default())
            .await
            .unwrap();
        assert_eq!(transport.connect_calls(), 1);

        transport
            .inject_event(TransportEvent::Closed {
                reason: "stream error".into(),
                logged_out: false,
            })
            .await;

        for _ in 0..50 {
            if transport.connect_calls() >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(transport.connect_calls() >= 2, "no reconnect happened");
    }

    #[tokio::test]
    async fn logout_close_wipes_credentials_and_stays_down() {
        let transport = MockTransport::new();
        transport
            .inject_event(TransportEvent::CredentialsUpdate {
                blob: "{\"noise_key\":\"abc\"}".into(),
            })
            .await;
        transport
            .inject_event(TransportEvent::Open {
                jid: "22501020304@s.whatsapp.net".into(),
            })
            .await;
        let (registry, _dir) = registry_with(transport.clone()).await;
        registry
            .init_session("a1", PairingOptions::default())
            .await
            .unwrap();

        for _ in 0..50 {
            if registry.session_exists("a1") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(registry.session_exists("a1"));

        transport
            .inject_event(TransportEvent::Closed {
                reason: "logged out".into(),
                logged_out: true,
            })
            .await;

        for _ in 0..50 {
            if !registry.session_exists("a1") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!registry.session_exists("a1"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(transport.connect_calls(), 1, "logout must not reconnect");
    }

    #[tokio::test]
    async fn inbound_messages_reach_the_handler_normalized() {
        let transport = MockTransport::new();
        transport
            .inject_event(TransportEvent::Open {
                jid: "22501020304@s.whatsapp.net".into(),
            })
            .await;
        let (registry, _dir) = registry_with(transport.clone()).await;
        let handler = Arc::new(CapturingHandler::default());
        registry.set_inbound_handler(handler.clone()).await;
        registry
            .init_session("a1", PairingOptions::default())
            .await
            .unwrap();

        transport
            .inject_event(TransportEvent::Message(fixtures::raw_text(
                "MSG1",
                "22507070707@s.whatsapp.net",
                "je veux une bougie",
            )))
            .await;

        tokio::time::timeout(Duration::from_secs(2), handler.notify.notified())
            .await
            .unwrap();
        let seen = handler.seen.lock().await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "a1");
        assert_eq!(seen[0].1.sender, "22507070707");
        assert_eq!(seen[0].1.text, "je veux une bougie");
    }

    #[tokio::test]
    async fn logout_removes_session_and_credentials() {
        let transport = MockTransport::new();
        transport
            .inject_event(TransportEvent::CredentialsUpdate {
                blob: "blob".into(),
            })
            .await;
        transport
            .inject_event(TransportEvent::Open {
                jid: "22501020304@s.whatsapp.net".into(),
            })
            .await;
        let (registry, _dir) = registry_with(transport.clone()).await;
        registry
            .init_session("a1", PairingOptions::default())
            .await
            .unwrap();
        for _ in 0..50 {
            if registry.session_exists("a1") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        registry.logout("a1").await.unwrap();
        assert!(transport.was_logged_out());
        assert!(!registry.session_exists("a1"));
        assert!(registry.snapshot("a1").is_none());
    }
}
