// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence trait for agents, conversations, catalog, orders, and credits.

use async_trait::async_trait;

use crate::error::SokoniError;
use crate::types::{
    Agent, Booking, Conversation, CreditBalance, LeadAnalysis, MessageRecord, Order, OrderItem,
    Product, SessionStatus,
};

/// Persistence backend.
///
/// All mutating operations are atomic per call. Multi-row writes
/// (order plus items) run inside one transaction.
#[async_trait]
pub trait Store: Send + Sync {
    // Agents

    async fn get_agent(&self, agent_id: &str) -> Result<Option<Agent>, SokoniError>;

    /// Agents eligible for session restoration at startup: active and
    /// marked connected when the process last saw them.
    async fn list_restorable_agents(&self) -> Result<Vec<Agent>, SokoniError>;

    /// Mirrors the live connection state onto the agent row.
    async fn update_agent_connection(
        &self,
        agent_id: &str,
        status: SessionStatus,
        phone_number: Option<&str>,
    ) -> Result<(), SokoniError>;

    async fn increment_agent_messages(&self, agent_id: &str) -> Result<(), SokoniError>;

    // Conversations

    /// Finds the thread for `(agent, contact_phone)`, creating it if absent.
    async fn find_or_create_conversation(
        &self,
        agent_id: &str,
        user_id: &str,
        contact_phone: &str,
    ) -> Result<Conversation, SokoniError>;

    async fn update_contact_name(
        &self,
        conversation_id: &str,
        name: &str,
    ) -> Result<(), SokoniError>;

    async fn update_lead(
        &self,
        conversation_id: &str,
        analysis: &LeadAnalysis,
    ) -> Result<(), SokoniError>;

    // Messages

    async fn insert_message(&self, record: &MessageRecord) -> Result<(), SokoniError>;

    /// The newest `limit` turns, returned in chronological order.
    async fn recent_messages(
        &self,
        conversation_id: &str,
        limit: u32,
    ) -> Result<Vec<MessageRecord>, SokoniError>;

    async fn count_messages(&self, conversation_id: &str) -> Result<i64, SokoniError>;

    // Catalog

    /// Available products for the owning user, variants decoded.
    async fn available_products(&self, user_id: &str) -> Result<Vec<Product>, SokoniError>;

    // Orders and bookings

    /// Inserts the order and its items in one transaction.
    async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> Result<(), SokoniError>;

    async fn get_order(&self, order_id: &str) -> Result<Option<Order>, SokoniError>;

    /// The customer's newest orders with this agent, newest first.
    async fn recent_orders_for_phone(
        &self,
        agent_id: &str,
        customer_phone: &str,
        limit: u32,
    ) -> Result<Vec<Order>, SokoniError>;

    async fn order_items(&self, order_id: &str) -> Result<Vec<OrderItem>, SokoniError>;

    async fn insert_booking(&self, booking: &Booking) -> Result<(), SokoniError>;

    // Credits

    async fn credit_balance(&self, user_id: &str) -> Result<Option<CreditBalance>, SokoniError>;

    /// Deducts `amount` credits if and only if the balance covers it.
    /// Returns whether the deduction happened. Must be atomic under
    /// concurrent callers: the check and the write are one statement.
    async fn deduct_credits(&self, user_id: &str, amount: i64) -> Result<bool, SokoniError>;
}
