// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat upsert and listing.

use facewatch_core::{Chat, FacewatchError};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::millis_to_datetime;

/// Insert or update a chat.
///
/// The name is refreshed unless the new one is only the raw chat id, which
/// never replaces a resolved name. `last_message_time` only moves forward so
/// replayed backlog cannot regress a chat's recency.
pub async fn upsert_chat(db: &Database, chat: &Chat) -> Result<(), FacewatchError> {
    let chat = chat.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO chats (jid, name, last_message_time) VALUES (?1, ?2, ?3)
                 ON CONFLICT(jid) DO UPDATE SET
                     name = CASE WHEN excluded.name = excluded.jid THEN chats.name
                                 ELSE excluded.name END,
                     last_message_time = MAX(chats.last_message_time, excluded.last_message_time)",
                params![chat.id, chat.name, chat.last_message_at.timestamp_millis()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// List all chats, most recently active first.
pub async fn list_chats(db: &Database) -> Result<Vec<Chat>, FacewatchError> {
    db.connection()
        .call(|conn| -> Result<Vec<Chat>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT jid, name, last_message_time FROM chats
                 ORDER BY last_message_time DESC, jid ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Chat {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    last_message_at: millis_to_datetime(2, row.get(2)?)?,
                })
            })?;
            let chats = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(chats)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    async fn open_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    fn chat(id: &str, name: &str, secs: i64) -> Chat {
        Chat {
            id: id.to_string(),
            name: name.to_string(),
            last_message_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn upsert_keeps_newest_timestamp() {
        let (db, _dir) = open_db().await;
        upsert_chat(&db, &chat("g1@g.us", "Family", 2_000)).await.unwrap();
        // Older backlog replay must not move recency backwards.
        upsert_chat(&db, &chat("g1@g.us", "Family Group", 1_000)).await.unwrap();

        let chats = list_chats(&db).await.unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].name, "Family Group");
        assert_eq!(chats[0].last_message_at.timestamp(), 2_000);

        upsert_chat(&db, &chat("g1@g.us", "Family Group", 3_000)).await.unwrap();
        let chats = list_chats(&db).await.unwrap();
        assert_eq!(chats[0].last_message_at.timestamp(), 3_000);
    }

    #[tokio::test]
    async fn raw_identifier_does_not_replace_resolved_name() {
        let (db, _dir) = open_db().await;
        upsert_chat(&db, &chat("g1@g.us", "g1@g.us", 1_000)).await.unwrap();
        assert_eq!(list_chats(&db).await.unwrap()[0].name, "g1@g.us");

        upsert_chat(&db, &chat("g1@g.us", "Family", 2_000)).await.unwrap();
        upsert_chat(&db, &chat("g1@g.us", "g1@g.us", 3_000)).await.unwrap();

        let chats = list_chats(&db).await.unwrap();
        assert_eq!(chats[0].name, "Family");
        assert_eq!(chats[0].last_message_at.timestamp(), 3_000);
    }

    #[tokio::test]
    async fn list_orders_by_recency_desc() {
        let (db, _dir) = open_db().await;
        upsert_chat(&db, &chat("a", "A", 100)).await.unwrap();
        upsert_chat(&db, &chat("b", "B", 300)).await.unwrap();
        upsert_chat(&db, &chat("c", "C", 200)).await.unwrap();

        let ids: Vec<String> = list_chats(&db).await.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }
}
