// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent row operations.

use rusqlite::{params, Row};
use sokoni_core::{Agent, SessionStatus, SokoniError};

use crate::database::{map_tr_err, Database};
use crate::queries::parse_col;

const AGENT_COLUMNS: &str = "id, user_id, name, is_active, model, temperature, max_tokens, \
     system_prompt, use_emojis, tone, language, business_address, business_hours, latitude, \
     longitude, payment_mode, mobile_money_orange, mobile_money_mtn, mobile_money_wave, \
     voice_enabled, voice_id, response_delay_seconds, total_messages, connection_status, \
     connected, phone_number";

fn agent_from_row(row: &Row<'_>) -> rusqlite::Result<Agent> {
    let payment_mode: String = row.get(15)?;
    Ok(Agent {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        is_active: row.get(3)?,
        model: row.get(4)?,
        temperature: row.get(5)?,
        max_tokens: row.get(6)?,
        system_prompt: row.get(7)?,
        use_emojis: row.get(8)?,
        tone: row.get(9)?,
        language: row.get(10)?,
        business_address: row.get(11)?,
        business_hours: row.get(12)?,
        latitude: row.get(13)?,
        longitude: row.get(14)?,
        payment_mode: parse_col(15, &payment_mode)?,
        mobile_money_orange: row.get(16)?,
        mobile_money_mtn: row.get(17)?,
        mobile_money_wave: row.get(18)?,
        voice_enabled: row.get(19)?,
        voice_id: row.get(20)?,
        response_delay_seconds: row.get::<_, i64>(21)? as u64,
        total_messages: row.get(22)?,
        connection_status: row.get(23)?,
        connected: row.get(24)?,
        phone_number: row.get(25)?,
    })
}

/// Fetch one agent by id.
pub async fn get_agent(db: &Database, agent_id: &str) -> Result<Option<Agent>, SokoniError> {
    let agent_id = agent_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {AGENT_COLUMNS} FROM agents WHERE id = ?1"))?;
            let mut rows = stmt.query_map(params![agent_id], agent_from_row)?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Agents to bring back online at startup: active and previously connected.
pub async fn list_restorable_agents(db: &Database) -> Result<Vec<Agent>, SokoniError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {AGENT_COLUMNS} FROM agents WHERE is_active = 1 AND connected = 1"
            ))?;
            let rows = stmt.query_map([], agent_from_row)?;
            let mut agents = Vec::new();
            for row in rows {
                agents.push(row?);
            }
            Ok(agents)
        })
        .await
        .map_err(map_tr_err)
}

/// Mirror live connection state onto the agent row.
pub async fn update_agent_connection(
    db: &Database,
    agent_id: &str,
    status: SessionStatus,
    phone_number: Option<&str>,
) -> Result<(), SokoniError> {
    let agent_id = agent_id.to_string();
    let status_str = status.to_string();
    let connected = status == SessionStatus::Connected;
    let phone = phone_number.map(str::to_string);
    db.connection()
        .call(move |conn| {
            match phone {
                Some(phone) => conn.execute(
                    "UPDATE agents SET connection_status = ?2, connected = ?3, phone_number = ?4
                     WHERE id = ?1",
                    params![agent_id, status_str, connected, phone],
                )?,
                None => conn.execute(
                    "UPDATE agents SET connection_status = ?2, connected = ?3 WHERE id = ?1",
                    params![agent_id, status_str, connected],
                )?,
            };
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Bump the agent's lifetime processed-message counter.
pub async fn increment_agent_messages(db: &Database, agent_id: &str) -> Result<(), SokoniError> {
    let agent_id = agent_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE agents SET total_messages = total_messages + 1 WHERE id = ?1",
                params![agent_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a full agent row. Agent CRUD belongs to the companion web app;
/// this exists for fixtures and operational tooling.
pub async fn insert_agent(db: &Database, agent: &Agent) -> Result<(), SokoniError> {
    let agent = agent.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO agents ({AGENT_COLUMNS}) VALUES \
                     (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
                      ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)"
                ),
                params![
                    agent.id,
                    agent.user_id,
                    agent.name,
                    agent.is_active,
                    agent.model,
                    agent.temperature,
                    agent.max_tokens,
                    agent.system_prompt,
                    agent.use_emojis,
                    agent.tone,
                    agent.language,
                    agent.business_address,
                    agent.business_hours,
                    agent.latitude,
                    agent.longitude,
                    agent.payment_mode.to_string(),
                    agent.mobile_money_orange,
                    agent.mobile_money_mtn,
                    agent.mobile_money_wave,
                    agent.voice_enabled,
                    agent.voice_id,
                    agent.response_delay_seconds as i64,
                    agent.total_messages,
                    agent.connection_status,
                    agent.connected,
                    agent.phone_number,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
