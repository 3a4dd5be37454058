// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation thread operations.

use chrono::Utc;
use rusqlite::{params, Row};
use sokoni_core::{Conversation, LeadAnalysis, SokoniError};
use uuid::Uuid;

use crate::database::{map_tr_err, Database};

const CONVERSATION_COLUMNS: &str = "id, agent_id, user_id, contact_phone, contact_name, \
     bot_paused, lead_score, lead_status, lead_notes, created_at";

fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        agent_id: row.get(1)?,
        user_id: row.get(2)?,
        contact_phone: row.get(3)?,
        contact_name: row.get(4)?,
        bot_paused: row.get(5)?,
        lead_score: row.get(6)?,
        lead_status: row.get(7)?,
        lead_notes: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Find the thread for `(agent, contact_phone)`, creating it if absent.
pub async fn find_or_create_conversation(
    db: &Database,
    agent_id: &str,
    user_id: &str,
    contact_phone: &str,
) -> Result<Conversation, SokoniError> {
    let agent_id = agent_id.to_string();
    let user_id = user_id.to_string();
    let contact_phone = contact_phone.to_string();
    let new_id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations
                 WHERE agent_id = ?1 AND contact_phone = ?2"
            ))?;
            let mut rows = stmt.query_map(params![agent_id, contact_phone], conversation_from_row)?;
            if let Some(row) = rows.next() {
                return Ok(row?);
            }
            drop(rows);
            drop(stmt);

            conn.execute(
                "INSERT INTO conversations (id, agent_id, user_id, contact_phone, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![new_id, agent_id, user_id, contact_phone, now],
            )?;
            Ok(Conversation {
                id: new_id,
                agent_id,
                user_id,
                contact_phone,
                contact_name: None,
                bot_paused: false,
                lead_score: None,
                lead_status: None,
                lead_notes: None,
                created_at: now,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Record the contact's display name on the thread.
pub async fn update_contact_name(
    db: &Database,
    conversation_id: &str,
    name: &str,
) -> Result<(), SokoniError> {
    let conversation_id = conversation_id.to_string();
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversations SET contact_name = ?2 WHERE id = ?1",
                params![conversation_id, name],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Store the latest lead classification on the thread.
pub async fn update_lead(
    db: &Database,
    conversation_id: &str,
    analysis: &LeadAnalysis,
) -> Result<(), SokoniError> {
    let conversation_id = conversation_id.to_string();
    let analysis = analysis.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversations SET lead_score = ?2, lead_status = ?3, lead_notes = ?4
                 WHERE id = ?1",
                params![
                    conversation_id,
                    analysis.score,
                    analysis.status,
                    analysis.reasoning
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Set or clear the human-takeover flag. Operational tooling hook.
pub async fn set_bot_paused(
    db: &Database,
    conversation_id: &str,
    paused: bool,
) -> Result<(), SokoniError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversations SET bot_paused = ?2 WHERE id = ?1",
                params![conversation_id, paused],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
