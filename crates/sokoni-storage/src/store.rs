// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`Store`] trait.

use async_trait::async_trait;
use tracing::debug;

use sokoni_core::{
    Agent, Booking, Conversation, CreditBalance, LeadAnalysis, MessageRecord, Order, OrderItem,
    Product, SessionStatus, SokoniError, Store,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run migrations.
    pub async fn open(path: &str, wal: bool) -> Result<Self, SokoniError> {
        let db = Database::open_with_wal(path, wal).await?;
        debug!(path, wal, "SQLite store initialized");
        Ok(Self { db })
    }

    /// Wrap an already-open database handle.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The underlying database handle, for operational tooling.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_agent(&self, agent_id: &str) -> Result<Option<Agent>, SokoniError> {
        queries::agents::get_agent(&self.db, agent_id).await
    }

    async fn list_restorable_agents(&self) -> Result<Vec<Agent>, SokoniError> {
        queries::agents::list_restorable_agents(&self.db).await
    }

    async fn update_agent_connection(
        &self,
        agent_id: &str,
        status: SessionStatus,
        phone_number: Option<&str>,
    ) -> Result<(), SokoniError> {
        queries::agents::update_agent_connection(&self.db, agent_id, status, phone_number).await
    }

    async fn increment_agent_messages(&self, agent_id: &str) -> Result<(), SokoniError> {
        queries::agents::increment_agent_messages(&self.db, agent_id).await
    }

    async fn find_or_create_conversation(
        &self,
        agent_id: &str,
        user_id: &str,
        contact_phone: &str,
    ) -> Result<Conversation, SokoniError> {
        queries::conversations::find_or_create_conversation(&self.db, agent_id, user_id, contact_phone)
            .await
    }

    async fn update_contact_name(
        &self,
        conversation_id: &str,
        name: &str,
    ) -> Result<(), SokoniError> {
        queries::conversations::update_contact_name(&self.db, conversation_id, name).await
    }

    async fn update_lead(
        &self,
        conversation_id: &str,
        analysis: &LeadAnalysis,
    ) -> Result<(), SokoniError> {
        queries::conversations::update_lead(&self.db, conversation_id, analysis).await
    }

    async fn insert_message(&self, record: &MessageRecord) -> Result<(), SokoniError> {
        queries::messages::insert_message(&self.db, record).await
    }

    async fn recent_messages(
        &self,
        conversation_id: &str,
        limit: u32,
    ) -> Result<Vec<MessageRecord>, SokoniError> {
        queries::messages::recent_messages(&self.db, conversation_id, limit).await
    }

    async fn count_messages(&self, conversation_id: &str) -> Result<i64, SokoniError> {
        queries::messages::count_messages(&self.db, conversation_id).await
    }

    async fn available_products(&self, user_id: &str) -> Result<Vec<Product>, SokoniError> {
        queries::catalog::available_products(&self.db, user_id).await
    }

    async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> Result<(), SokoniError> {
        queries::orders::insert_order(&self.db, order, items).await
    }

    async fn get_order(&self, order_id: &str) -> Result<Option<Order>, SokoniError> {
        queries::orders::get_order(&self.db, order_id).await
    }

    async fn recent_orders_for_phone(
        &self,
        agent_id: &str,
        customer_phone: &str,
        limit: u32,
    ) -> Result<Vec<Order>, SokoniError> {
        queries::orders::recent_orders_for_phone(&self.db, agent_id, customer_phone, limit).await
    }

    async fn order_items(&self, order_id: &str) -> Result<Vec<OrderItem>, SokoniError> {
        queries::orders::order_items(&self.db, order_id).await
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<(), SokoniError> {
        queries::bookings::insert_booking(&self.db, booking).await
    }

    async fn credit_balance(&self, user_id: &str) -> Result<Option<CreditBalance>, SokoniError> {
        queries::profiles::credit_balance(&self.db, user_id).await
    }

    async fn deduct_credits(&self, user_id: &str, amount: i64) -> Result<bool, SokoniError> {
        queries::profiles::deduct_credits(&self.db, user_id, amount).await
    }
}
