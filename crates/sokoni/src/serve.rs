// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sokoni serve` command implementation.
//!
//! Wires storage, the bridge transport factory, the OpenAI backends,
//! the session registry, and the message pipeline together, restores
//! previously connected sessions, then runs until a shutdown signal.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use sokoni_bridge::BridgeTransport;
use sokoni_config::SokoniConfig;
use sokoni_core::{ChatTransport, SokoniError, Store};
use sokoni_openai::{OpenAiClient, OpenAiResponder, OpenAiSpeech};
use sokoni_pipeline::MessagePipeline;
use sokoni_session::{PairingOptions, SessionRegistry, TransportFactory};
use sokoni_storage::SqliteStore;

use crate::shutdown;

/// Produces one bridge connection per session.
struct BridgeFactory {
    url: String,
    auth_token: Option<String>,
}

impl TransportFactory for BridgeFactory {
    fn create(&self) -> Arc<dyn ChatTransport> {
        Arc::new(BridgeTransport::new(
            self.url.clone(),
            self.auth_token.clone(),
        ))
    }
}

/// Runs the `sokoni serve` command.
pub async fn run_serve(config: SokoniConfig) -> Result<(), SokoniError> {
    info!("starting sokoni serve");

    let store: Arc<dyn Store> = Arc::new(
        SqliteStore::open(&config.storage.database_path, config.storage.wal_mode).await?,
    );
    tokio::fs::create_dir_all(&config.storage.credentials_dir)
        .await
        .map_err(|e| SokoniError::Storage {
            source: Box::new(e),
        })?;

    let factory = Arc::new(BridgeFactory {
        url: config.bridge.url.clone(),
        auth_token: config.bridge.auth_token.clone(),
    });
    let registry = Arc::new(SessionRegistry::new(
        store.clone(),
        factory,
        config.session.clone(),
        &config.storage.credentials_dir,
    ));

    let api_key = config
        .openai
        .api_key
        .as_deref()
        .ok_or_else(|| SokoniError::Config("openai.api_key is not set".to_string()))?;
    let client = OpenAiClient::new(
        api_key,
        config.openai.transcription_model.clone(),
        config.openai.speech_model.clone(),
    )?;
    let responder = Arc::new(OpenAiResponder::new(
        client.clone(),
        config.openai.lead_model.clone(),
    ));
    let speech = Arc::new(OpenAiSpeech::new(client));

    let pipeline = Arc::new(MessagePipeline::new(
        store.clone(),
        registry.clone(),
        responder,
        speech,
        config.service.app_url.clone(),
        config.pipeline.clone(),
        config.credits.clone(),
    ));
    registry.set_inbound_handler(pipeline).await;

    restore_sessions(&registry, store.as_ref()).await;

    let cancel = shutdown::install_signal_handler();
    cancel.cancelled().await;

    info!("shutting down, closing sessions");
    registry.close_all().await;
    info!("sokoni serve shutdown complete");
    Ok(())
}

/// Reopens sessions for agents that were connected when the process
/// last ran and still have credentials on disk.
async fn restore_sessions(registry: &SessionRegistry, store: &dyn Store) {
    let agents = match store.list_restorable_agents().await {
        Ok(agents) => agents,
        Err(e) => {
            error!(error = %e, "session restoration query failed");
            return;
        }
    };
    if agents.is_empty() {
        info!("no sessions to restore");
        return;
    }

    for agent in agents {
        if !registry.session_exists(&agent.id) {
            debug!(agent_id = %agent.id, "no stored credentials, skipping restore");
            continue;
        }
        match registry
            .init_session(&agent.id, PairingOptions::default())
            .await
        {
            Ok(snapshot) => {
                info!(agent_id = %agent.id, status = %snapshot.status, "session restored");
            }
            Err(e) => {
                warn!(agent_id = %agent.id, error = %e, "session restoration failed");
            }
        }
    }
}
