// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message history operations.

use rusqlite::{params, Row};
use sokoni_core::{MessageRecord, SokoniError};

use crate::database::{map_tr_err, Database};
use crate::queries::parse_col;

const MESSAGE_COLUMNS: &str = "id, conversation_id, agent_id, role, content, message_kind, \
     provider_message_id, tokens_used, response_time_ms, model_used, status, created_at";

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRecord> {
    let role: String = row.get(3)?;
    let kind: String = row.get(5)?;
    let status: String = row.get(10)?;
    Ok(MessageRecord {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        agent_id: row.get(2)?,
        role: parse_col(3, &role)?,
        content: row.get(4)?,
        message_kind: parse_col(5, &kind)?,
        provider_message_id: row.get(6)?,
        tokens_used: row.get(7)?,
        response_time_ms: row.get(8)?,
        model_used: row.get(9)?,
        status: parse_col(10, &status)?,
        created_at: row.get(11)?,
    })
}

/// Insert one conversation turn.
pub async fn insert_message(db: &Database, record: &MessageRecord) -> Result<(), SokoniError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO messages ({MESSAGE_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ),
                params![
                    record.id,
                    record.conversation_id,
                    record.agent_id,
                    record.role.to_string(),
                    record.content,
                    record.message_kind.to_string(),
                    record.provider_message_id,
                    record.tokens_used,
                    record.response_time_ms,
                    record.model_used,
                    record.status.to_string(),
                    record.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// The newest `limit` turns of a thread, in chronological order.
pub async fn recent_messages(
    db: &Database,
    conversation_id: &str,
    limit: u32,
) -> Result<Vec<MessageRecord>, SokoniError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = ?1
                 ORDER BY created_at DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![conversation_id, limit], message_from_row)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            // Query runs newest-first for the LIMIT; callers want oldest-first.
            messages.reverse();
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

/// Total turns stored for a thread.
pub async fn count_messages(db: &Database, conversation_id: &str) -> Result<i64, SokoniError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE conversation_id = ?1",
                params![conversation_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup() -> (Database, String, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();
        crate::queries::agents::insert_agent(&db, &crate::test_fixtures::agent("a1"))
            .await
            .unwrap();
        let convo =
            crate::queries::conversations::find_or_create_conversation(&db, "a1", "user-1", "225")
                .await
                .unwrap();
        (db, convo.id, dir)
    }

    #[tokio::test]
    async fn recent_messages_keeps_newest_in_order() {
        let (db, convo_id, _dir) = setup().await;

        for i in 0..6 {
            let record = crate::test_fixtures::message(
                &format!("m{i}"),
                &convo_id,
                &format!("msg {i}"),
                &format!("2026-02-01T00:00:0{i}+00:00"),
            );
            insert_message(&db, &record).await.unwrap();
        }

        let messages = recent_messages(&db, &convo_id, 3).await.unwrap();
        assert_eq!(messages.len(), 3);
        // Oldest of the kept window first.
        assert_eq!(messages[0].id, "m3");
        assert_eq!(messages[2].id, "m5");
        assert_eq!(count_messages(&db, &convo_id).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn empty_thread_reads_cleanly() {
        let (db, convo_id, _dir) = setup().await;
        assert!(recent_messages(&db, &convo_id, 50).await.unwrap().is_empty());
        assert_eq!(count_messages(&db, &convo_id).await.unwrap(), 0);
    }
}
