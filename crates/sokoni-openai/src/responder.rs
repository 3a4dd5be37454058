// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`Responder`] implementation backed by the chat-completions API.

use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use sokoni_core::{
    LeadAnalysis, MessageRole, Responder, ResponderReply, ResponderRequest, SokoniError, ToolCall,
    ToolFunction, ToolResult,
};

use crate::client::OpenAiClient;
use crate::types::{
    ApiContent, ApiFunctionCall, ApiMessage, ApiToolCall, ChatRequest, ChatResponse, ContentPart,
    ImageUrl,
};

/// Prompt for lead-quality classification. The model must answer with a
/// JSON object carrying `status`, `score`, and `reasoning`.
const LEAD_ANALYSIS_PROMPT: &str = "Tu es un expert en qualification de leads commerciaux. \
Analyse cette conversation WhatsApp entre un client et un vendeur. \
Évalue l'intérêt d'achat du client et réponds UNIQUEMENT en JSON avec ce format exact: \
{\"status\": \"cold\" | \"warm\" | \"hot\", \"score\": <nombre de 1 à 10>, \
\"reasoning\": \"<explication courte en français>\"}. \
cold = simple curiosité, warm = intérêt réel, hot = prêt à acheter.";

/// Conversational responder backed by OpenAI chat completions.
pub struct OpenAiResponder {
    client: OpenAiClient,
    lead_model: String,
}

impl OpenAiResponder {
    pub fn new(client: OpenAiClient, lead_model: String) -> Self {
        Self { client, lead_model }
    }

    fn base_messages(request: &ResponderRequest) -> Vec<ApiMessage> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(ApiMessage::text("system", request.system_prompt.clone()));
        for entry in &request.history {
            let role = match entry.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
                MessageRole::Tool => "tool",
            };
            messages.push(ApiMessage::text(role, entry.content.clone()));
        }
        messages.push(user_message(request));
        messages
    }

    fn reply_from(response: ChatResponse, model: &str, started: Instant) -> ResponderReply {
        let choice = response.choices.into_iter().next();
        let (content, tool_calls) = match choice {
            Some(choice) => {
                let calls = choice
                    .message
                    .tool_calls
                    .unwrap_or_default()
                    .into_iter()
                    .map(|call| ToolCall {
                        id: call.id,
                        function: ToolFunction {
                            name: call.function.name,
                            arguments: call.function.arguments,
                        },
                    })
                    .collect();
                (choice.message.content, calls)
            }
            None => (None, Vec::new()),
        };
        ResponderReply {
            content,
            tool_calls,
            tokens_used: response.usage.map(|u| u.total_tokens).unwrap_or(0),
            response_time_ms: started.elapsed().as_millis() as i64,
            model: response.model.unwrap_or_else(|| model.to_string()),
        }
    }
}

fn user_message(request: &ResponderRequest) -> ApiMessage {
    match &request.image_data_url {
        Some(url) => ApiMessage {
            role: "user".to_string(),
            content: Some(ApiContent::Parts(vec![
                ContentPart::Text {
                    text: request.user_text.clone(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: url.clone() },
                },
            ])),
            tool_calls: None,
            tool_call_id: None,
        },
        None => ApiMessage::text("user", request.user_text.clone()),
    }
}

#[derive(Deserialize)]
struct LeadPayload {
    status: String,
    score: i64,
    #[serde(default)]
    reasoning: String,
}

#[async_trait]
impl Responder for OpenAiResponder {
    async fn respond(
        &self,
        request: &ResponderRequest,
        tools: &[serde_json::Value],
    ) -> Result<ResponderReply, SokoniError> {
        let started = Instant::now();
        let offer = request.offer_tools && !tools.is_empty();
        let chat = ChatRequest {
            model: request.model.clone(),
            messages: Self::base_messages(request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: offer.then(|| tools.to_vec()),
            tool_choice: offer.then(|| "auto".to_string()),
            response_format: None,
        };
        let response = self.client.chat(&chat).await?;
        let reply = Self::reply_from(response, &request.model, started);
        debug!(
            model = %reply.model,
            tool_calls = reply.tool_calls.len(),
            tokens = reply.tokens_used,
            "responder reply"
        );
        Ok(reply)
    }

    async fn respond_after_tools(
        &self,
        request: &ResponderRequest,
        tool_calls: &[ToolCall],
        results: &[ToolResult],
    ) -> Result<ResponderReply, SokoniError> {
        let started = Instant::now();
        let mut messages = Self::base_messages(request);
        messages.push(ApiMessage {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(
                tool_calls
                    .iter()
                    .map(|call| ApiToolCall {
                        id: call.id.clone(),
                        kind: "function".to_string(),
                        function: ApiFunctionCall {
                            name: call.function.name.clone(),
                            arguments: call.function.arguments.clone(),
                        },
                    })
                    .collect(),
            ),
            tool_call_id: None,
        });
        for result in results {
            messages.push(ApiMessage {
                role: "tool".to_string(),
                content: Some(ApiContent::Text(result.content.clone())),
                tool_calls: None,
                tool_call_id: Some(result.call_id.clone()),
            });
        }

        let chat = ChatRequest {
            model: request.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: None,
            tool_choice: None,
            response_format: None,
        };
        let response = self.client.chat(&chat).await?;
        Ok(Self::reply_from(response, &request.model, started))
    }

    async fn classify_lead(&self, transcript: &str) -> Result<LeadAnalysis, SokoniError> {
        let chat = ChatRequest {
            model: self.lead_model.clone(),
            messages: vec![
                ApiMessage::text("system", LEAD_ANALYSIS_PROMPT),
                ApiMessage::text("user", transcript),
            ],
            max_tokens: 200,
            temperature: 0.0,
            tools: None,
            tool_choice: None,
            response_format: Some(serde_json::json!({ "type": "json_object" })),
        };
        let response = self.client.chat(&chat).await?;
        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        let payload: LeadPayload =
            serde_json::from_str(&content).map_err(|e| {
                warn!(error = %e, body = %content, "unparseable lead analysis");
                SokoniError::Responder {
                    message: format!("failed to parse lead analysis: {e}"),
                    source: Some(Box::new(e)),
                }
            })?;
        Ok(LeadAnalysis {
            score: payload.score.clamp(1, 10),
            status: payload.status,
            reasoning: payload.reasoning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sokoni_core::HistoryMessage;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn responder(base_url: &str) -> OpenAiResponder {
        let client = OpenAiClient::new("test-key", "whisper-1".into(), "tts-1".into())
            .unwrap()
            .with_base_url(base_url.to_string());
        OpenAiResponder::new(client, "gpt-4o-mini".into())
    }

    fn request() -> ResponderRequest {
        ResponderRequest {
            model: "gpt-4o-mini".into(),
            temperature: 0.7,
            max_tokens: 500,
            system_prompt: "Tu es un vendeur.".into(),
            history: vec![HistoryMessage {
                role: MessageRole::User,
                content: "Bonjour".into(),
            }],
            user_text: "Je veux une bougie".into(),
            image_data_url: None,
            offer_tools: true,
        }
    }

    #[tokio::test]
    async fn respond_offers_tools_and_maps_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "tool_choice": "auto"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [{
                            "id": "call_7",
                            "type": "function",
                            "function": {"name": "create_order", "arguments": "{\"items\":[]}"}
                        }]
                    }
                }],
                "usage": {"total_tokens": 90},
                "model": "gpt-4o-mini"
            })))
            .mount(&server)
            .await;

        let tools = vec![serde_json::json!({"type": "function"})];
        let reply = responder(&server.uri())
            .respond(&request(), &tools)
            .await
            .unwrap();
        assert!(reply.content.is_none());
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].function.name, "create_order");
        assert_eq!(reply.tokens_used, 90);
    }

    #[tokio::test]
    async fn respond_after_tools_echoes_calls_and_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Commande créée !", "tool_calls": null}}],
                "usage": {"total_tokens": 40}
            })))
            .mount(&server)
            .await;

        let calls = vec![ToolCall {
            id: "call_7".into(),
            function: ToolFunction {
                name: "create_order".into(),
                arguments: "{}".into(),
            },
        }];
        let results = vec![ToolResult {
            call_id: "call_7".into(),
            content: "{\"success\":true}".into(),
        }];
        let reply = responder(&server.uri())
            .respond_after_tools(&request(), &calls, &results)
            .await
            .unwrap();
        assert_eq!(reply.content.as_deref(), Some("Commande créée !"));

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("tools").is_none());
        let messages = body["messages"].as_array().unwrap();
        let assistant = &messages[messages.len() - 2];
        assert_eq!(assistant["tool_calls"][0]["id"], "call_7");
        let tool = &messages[messages.len() - 1];
        assert_eq!(tool["role"], "tool");
        assert_eq!(tool["tool_call_id"], "call_7");
    }

    #[tokio::test]
    async fn image_requests_send_multimodal_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "messages": [
                    {},
                    {},
                    {"content": [
                        {"type": "text"},
                        {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,abcd"}}
                    ]}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Belle photo !", "tool_calls": null}}]
            })))
            .mount(&server)
            .await;

        let mut request = request();
        request.image_data_url = Some("data:image/jpeg;base64,abcd".into());
        let reply = responder(&server.uri()).respond(&request, &[]).await.unwrap();
        assert_eq!(reply.content.as_deref(), Some("Belle photo !"));
    }

    #[tokio::test]
    async fn lead_classification_parses_json_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "temperature": 0.0,
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {
                    "content": "{\"status\": \"hot\", \"score\": 9, \"reasoning\": \"Demande le prix et la livraison\"}",
                    "tool_calls": null
                }}]
            })))
            .mount(&server)
            .await;

        let analysis = responder(&server.uri())
            .classify_lead("Client: je veux commander maintenant")
            .await
            .unwrap();
        assert_eq!(analysis.status, "hot");
        assert_eq!(analysis.score, 9);
    }
}
