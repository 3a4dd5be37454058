// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Sokoni workspace.
//!
//! Monetary amounts are integers in the owner's minor currency unit
//! (e.g. FCFA). Timestamps are RFC 3339 strings, matching what the
//! storage layer persists.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// --- Session types ---

/// Connection status of an agent's messaging session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Connecting,
    QrReady,
    Connected,
    Disconnected,
}

/// Point-in-time view of a session handed back to callers of `init_session`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    /// Rendered QR pairing artifact, if a pairing challenge is outstanding.
    pub qr_code: Option<String>,
    /// Short alphanumeric linking code, if one was requested instead of a QR.
    pub linking_code: Option<String>,
    /// Phone number bound to the session once connected.
    pub phone_number: Option<String>,
}

// --- Inbound message types ---

/// Kind of an inbound message after normalization.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Image,
    Audio,
    Video,
    Document,
    Sticker,
}

/// One inbound message, normalized from a raw transport event.
///
/// `sender` is the bare phone number with protocol suffixes stripped.
#[derive(Debug, Clone)]
pub struct NormalizedMessage {
    /// Provider message id.
    pub id: String,
    /// Bare sender phone number.
    pub sender: String,
    /// Raw sender jid, kept for replies.
    pub sender_jid: String,
    /// Display name advertised by the sender, if any.
    pub push_name: Option<String>,
    pub kind: MessageKind,
    /// Display text: body, caption, filename, or a placeholder marker.
    pub text: String,
    /// Raw media bytes (base64) for image and audio messages.
    pub media_base64: Option<String>,
    pub timestamp: String,
}

// --- Agent configuration (read-only to the core) ---

/// How an agent collects payment for online orders.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    CinetpayLink,
    MobileMoneyDirect,
}

/// Business agent configuration, owned by the CRUD layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub is_active: bool,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
    pub use_emojis: bool,
    /// Conversational tone hint (e.g. "amical", "professionnel").
    pub tone: Option<String>,
    pub language: String,
    pub business_address: Option<String>,
    pub business_hours: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub payment_mode: PaymentMode,
    pub mobile_money_orange: Option<String>,
    pub mobile_money_mtn: Option<String>,
    pub mobile_money_wave: Option<String>,
    pub voice_enabled: bool,
    pub voice_id: Option<String>,
    pub response_delay_seconds: u64,
    pub total_messages: i64,
    /// Last known connection status string, mirrored for the dashboard.
    pub connection_status: Option<String>,
    /// Whether the agent was connected when the process last saw it.
    pub connected: bool,
    /// Phone number the session is bound to, once paired.
    pub phone_number: Option<String>,
}

// --- Conversation and message records ---

/// One thread between an agent and a customer phone number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub agent_id: String,
    pub user_id: String,
    pub contact_phone: String,
    pub contact_name: Option<String>,
    /// Human takeover flag: when true the bot must not reply.
    pub bot_paused: bool,
    pub lead_score: Option<i64>,
    pub lead_status: Option<String>,
    pub lead_notes: Option<String>,
    pub created_at: String,
}

/// Role of one conversation turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    Tool,
}

/// Delivery status of a persisted message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Received,
    Sent,
    Failed,
}

/// Immutable record of one conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub conversation_id: String,
    pub agent_id: String,
    pub role: MessageRole,
    pub content: String,
    pub message_kind: MessageKind,
    pub provider_message_id: Option<String>,
    pub tokens_used: Option<i64>,
    pub response_time_ms: Option<i64>,
    pub model_used: Option<String>,
    pub status: DeliveryStatus,
    pub created_at: String,
}

// --- Catalog types ---

/// Product category, mostly relevant for order-vs-booking routing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Physical,
    Digital,
    Service,
    Good,
    Virtual,
}

/// Whether a matched option's price replaces or adds to the base price.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VariantPricing {
    Fixed,
    Additive,
}

/// One selectable value within a variant group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOption {
    pub value: String,
    /// Price contribution in minor units. Bare labels load as 0.
    #[serde(default)]
    pub price: i64,
    /// Option-specific image URL, if the catalog carries one.
    #[serde(default)]
    pub image: Option<String>,
}

/// A named axis of product customization with its selectable values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantGroup {
    pub name: String,
    #[serde(rename = "type")]
    pub pricing: VariantPricing,
    pub options: Vec<VariantOption>,
}

/// A catalog product. Read-only to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Base price in minor units.
    pub price: i64,
    pub description: Option<String>,
    pub ai_instructions: Option<String>,
    pub product_type: ProductType,
    pub image_url: Option<String>,
    pub is_available: bool,
    #[serde(default)]
    pub variants: Vec<VariantGroup>,
}

// --- Orders and bookings ---

/// Payment method chosen for an order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Online,
    Cod,
    MobileMoneyDirect,
}

/// Order lifecycle status. Transitions past creation belong to the
/// payment-webhook collaborator, never to this core.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    PendingDelivery,
    Paid,
    Delivered,
    Cancelled,
}

/// A customer order created by the `create_order` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub agent_id: String,
    pub conversation_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,
    pub delivery_address: Option<String>,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    /// Total in minor units, Σ unit price × quantity.
    pub total: i64,
    pub notes: Option<String>,
    pub created_at: String,
}

/// One line of an order. `unit_price` is a snapshot taken at order time:
/// historical orders are immune to later catalog price changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: String,
    /// Resolved product name annotated with matched variant values.
    pub product_name: String,
    pub product_description: Option<String>,
    pub quantity: i64,
    pub unit_price: i64,
}

/// A scheduled service booking created by the `create_booking` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub agent_id: String,
    pub conversation_id: Option<String>,
    pub service_id: String,
    pub service_name: String,
    pub price: i64,
    pub customer_phone: String,
    pub customer_name: Option<String>,
    pub preferred_date: String,
    pub preferred_time: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: String,
}

// --- Credits ---

/// Prepaid credit balance on the owning user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBalance {
    pub user_id: String,
    pub balance: i64,
    pub used_this_month: i64,
}

// --- AI responder exchange types ---

/// One history turn passed to the AI responder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: MessageRole,
    pub content: String,
}

/// A structured tool invocation request emitted by the AI responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub function: ToolFunction,
}

/// Named function and raw JSON arguments of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFunction {
    pub name: String,
    /// JSON-encoded argument object, exactly as the model produced it.
    pub arguments: String,
}

/// Machine-readable result of one executed tool call, fed back to the
/// responder for the final customer-facing phrasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub call_id: String,
    /// JSON payload string produced by the tool executor.
    pub content: String,
}

/// Request to the AI responder for one conversation turn.
#[derive(Debug, Clone)]
pub struct ResponderRequest {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub system_prompt: String,
    /// Bounded history, chronological, excluding the new user message.
    pub history: Vec<HistoryMessage>,
    pub user_text: String,
    /// Base64 data URL for multimodal image input.
    pub image_data_url: Option<String>,
    /// Whether tool definitions should be offered on this call.
    pub offer_tools: bool,
}

/// Reply from the AI responder: text plus zero or more tool calls.
#[derive(Debug, Clone, Default)]
pub struct ResponderReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub tokens_used: i64,
    pub response_time_ms: i64,
    pub model: String,
}

/// Lead-quality classification produced every few messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadAnalysis {
    /// 1-10 score.
    pub score: i64,
    /// `cold | warm | hot`.
    pub status: String,
    pub reasoning: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn session_status_round_trips_through_strings() {
        for status in [
            SessionStatus::Connecting,
            SessionStatus::QrReady,
            SessionStatus::Connected,
            SessionStatus::Disconnected,
        ] {
            let s = status.to_string();
            assert_eq!(SessionStatus::from_str(&s).unwrap(), status);
        }
        assert_eq!(SessionStatus::QrReady.to_string(), "qr_ready");
    }

    #[test]
    fn message_kind_serializes_snake_case() {
        let json = serde_json::to_string(&MessageKind::Document).unwrap();
        assert_eq!(json, "\"document\"");
    }

    #[test]
    fn variant_group_deserializes_catalog_json() {
        let json = r#"{
            "name": "Taille",
            "type": "fixed",
            "options": [
                {"value": "Petite (50g)", "price": 1000},
                {"value": "Grande (200g)", "price": 2000, "image": "https://x/grande.jpg"}
            ]
        }"#;
        let group: VariantGroup = serde_json::from_str(json).unwrap();
        assert_eq!(group.pricing, VariantPricing::Fixed);
        assert_eq!(group.options.len(), 2);
        assert_eq!(group.options[0].price, 1000);
        assert!(group.options[0].image.is_none());
        assert!(group.options[1].image.is_some());
    }

    #[test]
    fn bare_option_labels_default_to_zero_price() {
        let json = r#"{"value": "Rouge"}"#;
        let opt: VariantOption = serde_json::from_str(json).unwrap();
        assert_eq!(opt.price, 0);
    }

    #[test]
    fn order_status_string_forms() {
        assert_eq!(OrderStatus::PendingDelivery.to_string(), "pending_delivery");
        assert_eq!(
            OrderStatus::from_str("cancelled").unwrap(),
            OrderStatus::Cancelled
        );
    }
}
