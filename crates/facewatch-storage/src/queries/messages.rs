// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message upsert and listing.

use facewatch_core::{ArchivedMessage, FacewatchError, MediaKind};
use rusqlite::{Row, params};

use crate::database::{Database, map_tr_err};
use crate::queries::millis_to_datetime;

/// Insert or overwrite a message keyed by `(id, chat_jid)`.
///
/// Returns `Ok(false)` without touching the database when the message has
/// neither text nor media.
pub async fn upsert_message(db: &Database, msg: &ArchivedMessage) -> Result<bool, FacewatchError> {
    if !msg.has_payload() {
        return Ok(false);
    }

    let msg = msg.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO messages
                     (id, chat_jid, sender, content, timestamp, is_from_me, media_path, thumbnail, media_kind)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id, chat_jid) DO UPDATE SET
                     sender = excluded.sender,
                     content = excluded.content,
                     timestamp = excluded.timestamp,
                     is_from_me = excluded.is_from_me,
                     media_path = excluded.media_path,
                     thumbnail = excluded.thumbnail,
                     media_kind = excluded.media_kind",
                params![
                    msg.id,
                    msg.chat_id,
                    msg.sender,
                    msg.content,
                    msg.timestamp.timestamp_millis(),
                    msg.is_from_me,
                    msg.media_path,
                    msg.thumbnail,
                    msg.media_kind.as_ref().map(MediaKind::as_str),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    Ok(true)
}

/// Get the `limit` most recent messages of a chat, newest first.
pub async fn list_messages(
    db: &Database,
    chat_id: &str,
    limit: usize,
) -> Result<Vec<ArchivedMessage>, FacewatchError> {
    let chat_id = chat_id.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<ArchivedMessage>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, chat_jid, sender, content, timestamp, is_from_me,
                        media_path, thumbnail, media_kind
                 FROM messages WHERE chat_jid = ?1
                 ORDER BY timestamp DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![chat_id, limit], row_to_message)?;
            let messages = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<ArchivedMessage> {
    Ok(ArchivedMessage {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        sender: row.get(2)?,
        content: row.get(3)?,
        timestamp: millis_to_datetime(4, row.get(4)?)?,
        is_from_me: row.get(5)?,
        media_path: row.get(6)?,
        thumbnail: row.get(7)?,
        media_kind: row.get::<_, Option<String>>(8)?.map(MediaKind::from),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::chats::upsert_chat;
    use chrono::{TimeZone, Utc};
    use facewatch_core::Chat;
    use tempfile::tempdir;

    async fn setup_db_with_chat() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        let chat = Chat {
            id: "g1@g.us".to_string(),
            name: "Family".to_string(),
            last_message_at: Utc.timestamp_opt(1_000, 0).unwrap(),
        };
        upsert_chat(&db, &chat).await.unwrap();
        (db, dir)
    }

    fn message(id: &str, content: &str, secs: i64) -> ArchivedMessage {
        ArchivedMessage {
            id: id.to_string(),
            chat_id: "g1@g.us".to_string(),
            sender: "15550001111".to_string(),
            content: content.to_string(),
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            is_from_me: false,
            media_path: None,
            thumbnail: None,
            media_kind: None,
        }
    }

    #[tokio::test]
    async fn upsert_same_key_overwrites() {
        let (db, _dir) = setup_db_with_chat().await;
        assert!(upsert_message(&db, &message("m1", "first", 10)).await.unwrap());
        assert!(upsert_message(&db, &message("m1", "edited", 10)).await.unwrap());

        let messages = list_messages(&db, "g1@g.us", 10).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "edited");
    }

    #[tokio::test]
    async fn empty_message_is_not_stored() {
        let (db, _dir) = setup_db_with_chat().await;
        assert!(!upsert_message(&db, &message("m1", "", 10)).await.unwrap());
        assert!(list_messages(&db, "g1@g.us", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn media_only_message_round_trips_media_fields() {
        let (db, _dir) = setup_db_with_chat().await;
        let mut msg = message("m2", "", 20);
        msg.media_path = Some("store/media/g1@g.us/img_1.jpg".into());
        msg.thumbnail = Some(vec![0xFF, 0xD8, 0xFF]);
        msg.media_kind = Some(MediaKind::Image);
        assert!(upsert_message(&db, &msg).await.unwrap());

        let stored = list_messages(&db, "g1@g.us", 1).await.unwrap();
        assert_eq!(stored[0], msg);
    }

    #[tokio::test]
    async fn list_returns_most_recent_first_with_limit() {
        let (db, _dir) = setup_db_with_chat().await;
        for (id, secs) in [("a", 10), ("b", 30), ("c", 20), ("d", 40)] {
            upsert_message(&db, &message(id, id, secs)).await.unwrap();
        }

        let ids: Vec<String> = list_messages(&db, "g1@g.us", 3)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["d", "b", "c"]);
    }

    #[tokio::test]
    async fn same_message_id_in_different_chats_is_distinct() {
        let (db, _dir) = setup_db_with_chat().await;
        upsert_chat(
            &db,
            &Chat {
                id: "g2@g.us".into(),
                name: "School".into(),
                last_message_at: Utc.timestamp_opt(1_000, 0).unwrap(),
            },
        )
        .await
        .unwrap();

        upsert_message(&db, &message("m1", "one", 10)).await.unwrap();
        let mut other = message("m1", "two", 10);
        other.chat_id = "g2@g.us".into();
        upsert_message(&db, &other).await.unwrap();

        assert_eq!(list_messages(&db, "g1@g.us", 10).await.unwrap()[0].content, "one");
        assert_eq!(list_messages(&db, "g2@g.us", 10).await.unwrap()[0].content, "two");
    }
}
