// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end pipeline tests against a real SQLite store, a mock
//! transport, and a scripted mock responder.

use std::sync::Arc;

use serde_json::json;

use sokoni_config::{CreditsConfig, PipelineConfig, SessionConfig};
use sokoni_core::{
    Agent, ChatTransport, InboundHandler, MessageRole, SessionStatus, Store, ToolCall,
    ToolFunction, TransportEvent,
};
use sokoni_pipeline::MessagePipeline;
use sokoni_session::{PairingOptions, SessionRegistry, TransportFactory};
use sokoni_storage::{queries, SqliteStore};
use sokoni_test_utils::fixtures;
use sokoni_test_utils::{MockResponder, MockSpeech, MockTransport, SentItem};

const SENDER: &str = "22507070707";
const SENDER_JID: &str = "22507070707@s.whatsapp.net";

struct FixedFactory(Arc<MockTransport>);

impl TransportFactory for FixedFactory {
    fn create(&self) -> Arc<dyn ChatTransport> {
        self.0.clone()
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    store: Arc<SqliteStore>,
    transport: Arc<MockTransport>,
    responder: Arc<MockResponder>,
    pipeline: MessagePipeline,
}

impl Harness {
    async fn conversation_id(&self) -> String {
        self.store
            .find_or_create_conversation("a1", "u1", SENDER)
            .await
            .unwrap()
            .id
    }

    async fn balance(&self) -> i64 {
        self.store
            .credit_balance("u1")
            .await
            .unwrap()
            .map(|c| c.balance)
            .unwrap_or(0)
    }
}

async fn harness_with(agent: Agent, balance: i64, speech: MockSpeech) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        SqliteStore::open(dir.path().join("sokoni.db").to_str().unwrap(), true)
            .await
            .unwrap(),
    );
    queries::agents::insert_agent(store.database(), &agent)
        .await
        .unwrap();
    queries::catalog::insert_product(store.database(), &fixtures::bougie())
        .await
        .unwrap();
    queries::profiles::upsert_profile(store.database(), "u1", balance)
        .await
        .unwrap();

    let transport = MockTransport::new();
    let registry = Arc::new(SessionRegistry::new(
        store.clone() as Arc<dyn Store>,
        Arc::new(FixedFactory(transport.clone())),
        SessionConfig::default(),
        dir.path().join("credentials"),
    ));
    transport
        .inject_event(TransportEvent::Open {
            jid: "22500000001:1@s.whatsapp.net".to_string(),
        })
        .await;
    let snapshot = registry
        .init_session("a1", PairingOptions::default())
        .await
        .unwrap();
    assert_eq!(snapshot.status, SessionStatus::Connected);

    let responder = Arc::new(MockResponder::new());
    let pipeline = MessagePipeline::new(
        store.clone() as Arc<dyn Store>,
        registry,
        responder.clone(),
        Arc::new(speech),
        "https://app.example".to_string(),
        PipelineConfig::default(),
        CreditsConfig::default(),
    );

    Harness {
        _dir: dir,
        store,
        transport,
        responder,
        pipeline,
    }
}

async fn harness(balance: i64) -> Harness {
    harness_with(fixtures::agent(), balance, MockSpeech::new()).await
}

fn tool_call(name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        id: "call_1".to_string(),
        function: ToolFunction {
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
    }
}

#[tokio::test]
async fn text_turn_replies_and_meters_credits() {
    let h = harness(10).await;
    h.responder.push_text("Bonjour Mariam !").await;

    h.pipeline
        .handle("a1", fixtures::normalized_text("m1", SENDER, "Bonjour"))
        .await;

    assert_eq!(h.transport.sent_texts().await, vec!["Bonjour Mariam !"]);

    let conversation_id = h.conversation_id().await;
    assert_eq!(h.store.count_messages(&conversation_id).await.unwrap(), 2);
    assert_eq!(h.balance().await, 9);

    let agent = h.store.get_agent("a1").await.unwrap().unwrap();
    assert_eq!(agent.total_messages, 2);

    // The prompt carried the catalog; the first turn had no history.
    let requests = h.responder.requests().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].system_prompt.contains("Bougie parfumée"));
    assert!(requests[0].history.is_empty());
    assert_eq!(requests[0].user_text, "Bonjour");
}

#[tokio::test]
async fn second_turn_carries_history() {
    let h = harness(10).await;
    h.responder.push_text("Bonjour !").await;
    h.pipeline
        .handle("a1", fixtures::normalized_text("m1", SENDER, "Salut"))
        .await;
    h.responder.push_text("Avec plaisir.").await;
    h.pipeline
        .handle("a1", fixtures::normalized_text("m2", SENDER, "Le prix ?"))
        .await;

    let requests = h.responder.requests().await;
    assert_eq!(requests.len(), 2);
    let history = &requests[1].history;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, MessageRole::User);
    assert_eq!(history[0].content, "Salut");
    assert_eq!(history[1].role, MessageRole::Assistant);
    assert_eq!(history[1].content, "Bonjour !");
}

#[tokio::test]
async fn paused_conversation_only_persists_inbound() {
    let h = harness(10).await;
    let conversation_id = h.conversation_id().await;
    queries::conversations::set_bot_paused(h.store.database(), &conversation_id, true)
        .await
        .unwrap();

    h.pipeline
        .handle("a1", fixtures::normalized_text("m1", SENDER, "Allô ?"))
        .await;

    assert_eq!(h.store.count_messages(&conversation_id).await.unwrap(), 1);
    assert!(h.responder.requests().await.is_empty());
    assert!(h.transport.sent().await.is_empty());
    assert_eq!(h.balance().await, 10);
}

#[tokio::test]
async fn zero_balance_aborts_silently_after_persisting_inbound() {
    let h = harness(0).await;

    h.pipeline
        .handle("a1", fixtures::normalized_text("m1", SENDER, "Bonjour"))
        .await;

    let conversation_id = h.conversation_id().await;
    assert_eq!(h.store.count_messages(&conversation_id).await.unwrap(), 1);
    assert!(h.responder.requests().await.is_empty());
    assert!(h.transport.sent().await.is_empty());
}

#[tokio::test]
async fn inactive_agent_drops_message() {
    let mut agent = fixtures::agent();
    agent.is_active = false;
    let h = harness_with(agent, 10, MockSpeech::new()).await;

    h.pipeline
        .handle("a1", fixtures::normalized_text("m1", SENDER, "Bonjour"))
        .await;

    assert!(h.responder.requests().await.is_empty());
    assert!(h.transport.sent().await.is_empty());
    let conversation_id = h.conversation_id().await;
    // The conversation above was created by the assertion itself.
    assert_eq!(h.store.count_messages(&conversation_id).await.unwrap(), 0);
}

#[tokio::test]
async fn tool_call_creates_order_and_sends_followup() {
    let h = harness(10).await;
    h.responder
        .push_tool_calls(vec![tool_call(
            "create_order",
            json!({
                "customer_name": "Mariam",
                "delivery_address": "Cocody, Abidjan",
                "payment_method": "cod",
                "items": [{
                    "product_name": "Bougie",
                    "quantity": 1,
                    "selected_variants": {"Taille": "Grande (200g)"}
                }]
            }),
        )])
        .await;
    h.responder.push_text("Commande enregistrée ✅").await;

    h.pipeline
        .handle("a1", fixtures::normalized_text("m1", SENDER, "Je prends la grande"))
        .await;

    let orders = h
        .store
        .recent_orders_for_phone("a1", SENDER, 5)
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].total, 2000);

    let after = h.responder.after_tools_calls().await;
    assert_eq!(after.len(), 1);
    let payload: serde_json::Value = serde_json::from_str(&after[0].1[0].content).unwrap();
    assert_eq!(payload["success"], true);

    assert_eq!(h.transport.sent_texts().await, vec!["Commande enregistrée ✅"]);
}

#[tokio::test]
async fn missing_variant_selection_creates_no_order() {
    let h = harness(10).await;
    h.responder
        .push_tool_calls(vec![tool_call(
            "create_order",
            json!({
                "customer_name": "Mariam",
                "payment_method": "cod",
                "items": [{"product_name": "Bougie", "quantity": 1}]
            }),
        )])
        .await;
    h.responder
        .push_text("Quelle taille souhaitez-vous ?")
        .await;

    h.pipeline
        .handle("a1", fixtures::normalized_text("m1", SENDER, "Je commande"))
        .await;

    let orders = h
        .store
        .recent_orders_for_phone("a1", SENDER, 5)
        .await
        .unwrap();
    assert!(orders.is_empty());

    let after = h.responder.after_tools_calls().await;
    let payload: serde_json::Value = serde_json::from_str(&after[0].1[0].content).unwrap();
    assert_eq!(payload["success"], false);

    // The rejection still reaches the customer through the follow-up.
    assert_eq!(
        h.transport.sent_texts().await,
        vec!["Quelle taille souhaitez-vous ?"]
    );
}

#[tokio::test]
async fn send_image_action_delivers_product_image() {
    let h = harness(10).await;
    h.responder
        .push_tool_calls(vec![tool_call(
            "send_image",
            json!({"product_name": "Bougie"}),
        )])
        .await;
    h.responder.push_text("Voici notre bougie !").await;

    h.pipeline
        .handle("a1", fixtures::normalized_text("m1", SENDER, "Montre-moi la bougie"))
        .await;

    let image = h
        .transport
        .sent()
        .await
        .into_iter()
        .find_map(|item| match item {
            SentItem::Image { jid, url, caption } => Some((jid, url, caption)),
            _ => None,
        })
        .expect("an image send");
    assert_eq!(image.0, SENDER_JID);
    assert_eq!(image.1, "https://cdn.example/bougie.jpg");
    assert_eq!(image.2.as_deref(), Some("Voici Bougie parfumée !"));
}

#[tokio::test]
async fn voice_reply_is_sent_with_surcharge() {
    let mut agent = fixtures::agent();
    agent.voice_enabled = true;
    let h = harness_with(agent, 10, MockSpeech::new()).await;
    h.responder.push_text("Bonjour !").await;

    h.pipeline
        .handle("a1", fixtures::normalized_text("m1", SENDER, "Salut"))
        .await;

    let sent = h.transport.sent().await;
    assert!(sent
        .iter()
        .any(|item| matches!(item, SentItem::Voice { jid, .. } if jid == SENDER_JID)));
    // 1 message credit + 4 voice surcharge.
    assert_eq!(h.balance().await, 5);
}

#[tokio::test]
async fn long_reply_stays_text_even_with_voice_enabled() {
    let mut agent = fixtures::agent();
    agent.voice_enabled = true;
    let h = harness_with(agent, 10, MockSpeech::new()).await;
    h.responder.push_text(&"Bonjour ! ".repeat(60)).await;

    h.pipeline
        .handle("a1", fixtures::normalized_text("m1", SENDER, "Salut"))
        .await;

    let sent = h.transport.sent().await;
    assert!(!sent.iter().any(|item| matches!(item, SentItem::Voice { .. })));
    assert_eq!(h.balance().await, 9);
}

#[tokio::test]
async fn voice_note_is_transcribed_before_the_ai_turn() {
    let h = harness_with(
        fixtures::agent(),
        10,
        MockSpeech::with_transcription("je veux une bougie"),
    )
    .await;

    h.pipeline
        .handle("a1", fixtures::normalized_audio("m1", SENDER))
        .await;

    let requests = h.responder.requests().await;
    assert_eq!(requests[0].user_text, "[Note vocale] je veux une bougie");

    let conversation_id = h.conversation_id().await;
    let records = h.store.recent_messages(&conversation_id, 50).await.unwrap();
    assert_eq!(records[0].content, "[Note vocale] je veux une bougie");
}

#[tokio::test]
async fn failed_transcription_becomes_a_marker() {
    let h = harness_with(fixtures::agent(), 10, MockSpeech::failing()).await;

    h.pipeline
        .handle("a1", fixtures::normalized_audio("m1", SENDER))
        .await;

    let requests = h.responder.requests().await;
    assert_eq!(requests[0].user_text, "(note vocale illisible)");
}

#[tokio::test]
async fn responder_failure_sends_fallback_text() {
    let h = harness(10).await;
    h.responder.fail_all(true).await;

    h.pipeline
        .handle("a1", fixtures::normalized_text("m1", SENDER, "Bonjour"))
        .await;

    let texts = h.transport.sent_texts().await;
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with("Désolé, je rencontre un problème technique"));

    // No assistant turn was persisted and nothing was charged.
    let conversation_id = h.conversation_id().await;
    assert_eq!(h.store.count_messages(&conversation_id).await.unwrap(), 1);
    assert_eq!(h.balance().await, 10);
}

#[tokio::test]
async fn lead_analysis_runs_every_fifth_turn() {
    let h = harness(100).await;

    for n in 0..5 {
        h.pipeline
            .handle(
                "a1",
                fixtures::normalized_text(&format!("m{n}"), SENDER, "Encore une question"),
            )
            .await;
        let expected = if n < 4 { 0 } else { 1 };
        assert_eq!(h.responder.lead_requests().await.len(), expected);
    }

    let transcript = &h.responder.lead_requests().await[0];
    assert!(transcript.contains("Client: Encore une question"));
    assert!(transcript.contains("Vendeur:"));

    let conversation = h
        .store
        .find_or_create_conversation("a1", "u1", SENDER)
        .await
        .unwrap();
    assert_eq!(conversation.lead_score, Some(5));
    assert_eq!(conversation.lead_status.as_deref(), Some("warm"));
}

#[tokio::test]
async fn contact_name_is_recorded_from_push_name() {
    let h = harness(10).await;

    h.pipeline
        .handle("a1", fixtures::normalized_text("m1", SENDER, "Bonjour"))
        .await;

    let conversation = h
        .store
        .find_or_create_conversation("a1", "u1", SENDER)
        .await
        .unwrap();
    assert_eq!(conversation.contact_name.as_deref(), Some("Mariam"));
}
