// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-message conversation pipeline.
//!
//! One inbound normalized message becomes zero or more outbound side
//! effects: media pre-processing, the AI turn, a bounded tool loop, the
//! reply send, persistence, credit metering, and periodic lead scoring.
//! Everything runs under one timeout and one error boundary; a failed
//! turn is logged and swallowed so the session loop stays alive.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use sokoni_config::{CreditsConfig, PipelineConfig};
use sokoni_core::{
    Agent, Conversation, DeliveryStatus, HistoryMessage, InboundHandler, MessageKind,
    MessageRecord, MessageRole, NormalizedMessage, Responder, ResponderRequest, SokoniError,
    SpeechService, Store, ToolResult,
};
use sokoni_session::SessionRegistry;
use sokoni_tools::{tool_definitions, ToolContext, ToolExecutor};

use crate::prompt::build_system_prompt;

/// Sent when the AI responder is unreachable or returns nothing usable.
const TECHNICAL_FALLBACK: &str = "Désolé, je rencontre un problème technique momentané. \
     Veuillez réessayer dans quelques instants.";

/// Substituted for a voice note that could not be transcribed.
const UNREADABLE_VOICE: &str = "(note vocale illisible)";

/// Placeholder question for a captionless image.
const IMAGE_QUESTION: &str = "Que penses-tu de cette image ?";

/// Vision-capable model used whenever the message carries an image.
const IMAGE_MODEL: &str = "gpt-4o";

/// How many of the customer's past orders are surfaced as AI context.
const RECENT_ORDERS_LIMIT: u32 = 5;

/// Turns inbound messages into replies. Registered on the session
/// registry as the [`InboundHandler`].
pub struct MessagePipeline {
    store: Arc<dyn Store>,
    registry: Arc<SessionRegistry>,
    responder: Arc<dyn Responder>,
    speech: Arc<dyn SpeechService>,
    executor: ToolExecutor,
    pipeline: PipelineConfig,
    credits: CreditsConfig,
}

impl MessagePipeline {
    pub fn new(
        store: Arc<dyn Store>,
        registry: Arc<SessionRegistry>,
        responder: Arc<dyn Responder>,
        speech: Arc<dyn SpeechService>,
        app_url: String,
        pipeline: PipelineConfig,
        credits: CreditsConfig,
    ) -> Self {
        let executor = ToolExecutor::new(store.clone(), app_url);
        Self {
            store,
            registry,
            responder,
            speech,
            executor,
            pipeline,
            credits,
        }
    }

    async fn process(
        &self,
        agent_id: &str,
        message: &NormalizedMessage,
    ) -> Result<(), SokoniError> {
        let Some(agent) = self.store.get_agent(agent_id).await? else {
            warn!(agent_id, "inbound message for unknown agent, dropping");
            return Ok(());
        };
        if !agent.is_active {
            warn!(agent_id, "agent inactive, dropping message");
            return Ok(());
        }

        let (content, image_data_url) = self.prepare_content(message).await;

        let conversation = self
            .store
            .find_or_create_conversation(agent_id, &agent.user_id, &message.sender)
            .await?;
        if let Some(name) = &message.push_name {
            if conversation.contact_name.as_deref() != Some(name.as_str()) {
                self.store
                    .update_contact_name(&conversation.id, name)
                    .await?;
            }
        }

        // Human takeover: record the message, spend nothing, say nothing.
        if conversation.bot_paused {
            info!(
                agent_id,
                conversation_id = %conversation.id,
                "conversation paused, persisting inbound only"
            );
            self.persist_inbound(&conversation, message, &content).await?;
            return Ok(());
        }

        self.persist_inbound(&conversation, message, &content).await?;

        let records = self
            .store
            .recent_messages(&conversation.id, self.pipeline.history_limit)
            .await?;
        let history: Vec<HistoryMessage> = records
            .iter()
            .filter(|record| record.provider_message_id.as_deref() != Some(message.id.as_str()))
            .map(|record| HistoryMessage {
                role: record.role,
                content: record.content.clone(),
            })
            .collect();

        let balance = self
            .store
            .credit_balance(&agent.user_id)
            .await?
            .map(|credit| credit.balance)
            .unwrap_or(0);
        if balance < self.credits.message_cost {
            warn!(
                agent_id,
                user_id = %agent.user_id,
                balance,
                "insufficient credits, aborting turn silently"
            );
            return Ok(());
        }

        let products = self.store.available_products(&agent.user_id).await?;
        let recent_orders = self
            .store
            .recent_orders_for_phone(agent_id, &message.sender, RECENT_ORDERS_LIMIT)
            .await
            .unwrap_or_default();

        let request = ResponderRequest {
            model: if image_data_url.is_some() {
                IMAGE_MODEL.to_string()
            } else {
                agent.model.clone()
            },
            temperature: agent.temperature,
            max_tokens: agent.max_tokens,
            system_prompt: build_system_prompt(&agent, &products, &recent_orders),
            history,
            user_text: content.clone(),
            image_data_url,
            offer_tools: true,
        };

        let tools = tool_definitions();
        let reply = match self.responder.respond(&request, &tools).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(agent_id, error = %e, "AI responder failed");
                self.send_fallback(agent_id, &agent, &message.sender_jid).await;
                return Ok(());
            }
        };

        // One tool round at most: execute every call from this turn,
        // then one follow-up call phrases the customer-facing text.
        let final_reply = if reply.tool_calls.is_empty() {
            reply
        } else {
            let ctx = ToolContext {
                agent: &agent,
                customer_phone: &message.sender,
                conversation_id: &conversation.id,
                products: &products,
            };
            let mut results = Vec::with_capacity(reply.tool_calls.len());
            for call in &reply.tool_calls {
                let result = self.executor.execute(call, &ctx).await;
                self.apply_tool_side_effects(agent_id, &message.sender_jid, &result)
                    .await;
                results.push(result);
            }
            match self
                .responder
                .respond_after_tools(&request, &reply.tool_calls, &results)
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    error!(agent_id, error = %e, "post-tool AI call failed");
                    self.send_fallback(agent_id, &agent, &message.sender_jid).await;
                    return Ok(());
                }
            }
        };

        let final_text = final_reply
            .content
            .clone()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| TECHNICAL_FALLBACK.to_string());

        let delay = Duration::from_secs(agent.response_delay_seconds);
        let (status, provider_message_id) = match self
            .registry
            .send_with_typing(agent_id, &message.sender_jid, &final_text, delay)
            .await
        {
            Ok(id) => (DeliveryStatus::Sent, Some(id)),
            Err(e) => {
                error!(agent_id, error = %e, "reply send failed");
                (DeliveryStatus::Failed, None)
            }
        };

        let voice_sent = status == DeliveryStatus::Sent
            && self
                .try_voice_reply(agent_id, &agent, &message.sender_jid, &final_text, balance)
                .await;

        let outbound = MessageRecord {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation.id.clone(),
            agent_id: agent_id.to_string(),
            role: MessageRole::Assistant,
            content: final_text.clone(),
            message_kind: if voice_sent {
                MessageKind::Audio
            } else {
                MessageKind::Text
            },
            provider_message_id,
            tokens_used: Some(final_reply.tokens_used),
            response_time_ms: Some(final_reply.response_time_ms),
            model_used: Some(final_reply.model.clone()),
            status,
            created_at: Utc::now().to_rfc3339(),
        };
        self.store.insert_message(&outbound).await?;

        let amount = self.credits.message_cost
            + if voice_sent {
                self.credits.voice_surcharge
            } else {
                0
            };
        if !self.store.deduct_credits(&agent.user_id, amount).await? {
            warn!(
                user_id = %agent.user_id,
                amount,
                "credit deduction failed after reply"
            );
        }

        // One increment per stored turn (inbound + outbound).
        self.store.increment_agent_messages(agent_id).await?;
        self.store.increment_agent_messages(agent_id).await?;

        self.maybe_classify_lead(&conversation, &records, &message.id, &content, &final_text)
            .await;

        Ok(())
    }

    /// Transcribes voice notes and prepares image payloads.
    async fn prepare_content(&self, message: &NormalizedMessage) -> (String, Option<String>) {
        match message.kind {
            MessageKind::Audio => {
                let transcript = match &message.media_base64 {
                    Some(audio) => match self.speech.transcribe(audio, "audio/ogg").await {
                        Ok(text) if !text.trim().is_empty() => Some(text),
                        Ok(_) => None,
                        Err(e) => {
                            warn!(error = %e, "voice transcription failed");
                            None
                        }
                    },
                    None => None,
                };
                let content = match transcript {
                    Some(text) => format!("[Note vocale] {text}"),
                    None => UNREADABLE_VOICE.to_string(),
                };
                (content, None)
            }
            MessageKind::Image => {
                let image_data_url = message
                    .media_base64
                    .as_ref()
                    .map(|data| format!("data:image/jpeg;base64,{data}"));
                let content = if message.text == "(image)" {
                    IMAGE_QUESTION.to_string()
                } else {
                    message.text.clone()
                };
                (content, image_data_url)
            }
            _ => (message.text.clone(), None),
        }
    }

    async fn persist_inbound(
        &self,
        conversation: &Conversation,
        message: &NormalizedMessage,
        content: &str,
    ) -> Result<(), SokoniError> {
        let record = MessageRecord {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation.id.clone(),
            agent_id: conversation.agent_id.clone(),
            role: MessageRole::User,
            content: content.to_string(),
            message_kind: message.kind,
            provider_message_id: Some(message.id.clone()),
            tokens_used: None,
            response_time_ms: None,
            model_used: None,
            status: DeliveryStatus::Received,
            created_at: Utc::now().to_rfc3339(),
        };
        self.store.insert_message(&record).await
    }

    async fn send_fallback(&self, agent_id: &str, agent: &Agent, jid: &str) {
        let delay = Duration::from_secs(agent.response_delay_seconds);
        if let Err(e) = self
            .registry
            .send_with_typing(agent_id, jid, TECHNICAL_FALLBACK, delay)
            .await
        {
            error!(agent_id, error = %e, "fallback send failed");
        }
    }

    /// Interprets executor payloads that require outbound side effects.
    async fn apply_tool_side_effects(&self, agent_id: &str, jid: &str, result: &ToolResult) {
        let Ok(payload) = serde_json::from_str::<serde_json::Value>(&result.content) else {
            return;
        };
        if payload["action"] == "send_image" {
            let Some(url) = payload["image_url"].as_str() else {
                return;
            };
            let caption = payload["caption"].as_str();
            match self.registry.send_image(agent_id, jid, url, caption).await {
                Ok(_) => debug!(agent_id, url, "product image sent"),
                Err(e) => warn!(agent_id, error = %e, "product image send failed"),
            }
        }
    }

    /// Sends the reply as a voice note when the agent and balance allow it.
    /// Failures degrade silently: the text is already delivered.
    async fn try_voice_reply(
        &self,
        agent_id: &str,
        agent: &Agent,
        jid: &str,
        text: &str,
        balance: i64,
    ) -> bool {
        if !agent.voice_enabled || text.chars().count() > self.pipeline.voice_max_chars {
            return false;
        }
        if balance < self.credits.message_cost + self.credits.voice_surcharge {
            debug!(agent_id, balance, "balance too low for voice surcharge");
            return false;
        }
        let audio = match self.speech.synthesize(text, agent.voice_id.as_deref()).await {
            Ok(bytes) => base64::engine::general_purpose::STANDARD.encode(bytes),
            Err(e) => {
                warn!(agent_id, error = %e, "speech synthesis failed");
                return false;
            }
        };
        match self.registry.send_voice(agent_id, jid, &audio).await {
            Ok(_) => true,
            Err(e) => {
                warn!(agent_id, error = %e, "voice send failed, text already delivered");
                false
            }
        }
    }

    /// Runs lead classification on every Nth message of the conversation.
    async fn maybe_classify_lead(
        &self,
        conversation: &Conversation,
        records: &[MessageRecord],
        inbound_id: &str,
        inbound_text: &str,
        reply_text: &str,
    ) {
        let interval = self.pipeline.lead_analysis_interval;
        if interval <= 0 {
            return;
        }
        let count = match self.store.count_messages(&conversation.id).await {
            Ok(count) => count,
            Err(e) => {
                warn!(conversation_id = %conversation.id, error = %e, "message count failed");
                return;
            }
        };
        if count % interval != 0 {
            return;
        }

        let mut lines: Vec<String> = records
            .iter()
            .filter(|record| record.provider_message_id.as_deref() != Some(inbound_id))
            .map(|record| {
                let speaker = match record.role {
                    MessageRole::User => "Client",
                    MessageRole::Assistant => "Vendeur",
                    MessageRole::Tool => "Outil",
                };
                format!("{speaker}: {}", record.content)
            })
            .collect();
        lines.push(format!("Client: {inbound_text}"));
        lines.push(format!("Vendeur: {reply_text}"));
        let transcript = lines.join("\n");

        match self.responder.classify_lead(&transcript).await {
            Ok(analysis) => {
                info!(
                    conversation_id = %conversation.id,
                    score = analysis.score,
                    status = %analysis.status,
                    "lead classified"
                );
                if let Err(e) = self.store.update_lead(&conversation.id, &analysis).await {
                    warn!(conversation_id = %conversation.id, error = %e, "lead update failed");
                }
            }
            Err(e) => warn!(conversation_id = %conversation.id, error = %e, "lead analysis failed"),
        }
    }
}

#[async_trait]
impl InboundHandler for MessagePipeline {
    async fn handle(&self, agent_id: &str, message: NormalizedMessage) {
        let timeout = Duration::from_secs(self.pipeline.turn_timeout_secs);
        match tokio::time::timeout(timeout, self.process(agent_id, &message)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(agent_id, message_id = %message.id, error = %e, "message pipeline failed");
            }
            Err(_) => {
                error!(agent_id, message_id = %message.id, "message pipeline timed out");
            }
        }
    }
}
