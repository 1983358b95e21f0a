// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the ArchiveAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use facewatch_config::model::StorageConfig;
use facewatch_core::{
    AdapterType, ArchiveAdapter, ArchivedMessage, Chat, FacewatchError, HealthStatus,
    PluginAdapter,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed conversation archive.
///
/// The database is opened on the first call to
/// [`ArchiveAdapter::initialize`].
pub struct SqliteArchive {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteArchive {
    /// The database connection is not opened until `initialize` is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, FacewatchError> {
        self.db.get().ok_or_else(|| FacewatchError::Storage {
            source: "archive not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteArchive {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, FacewatchError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FacewatchError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl ArchiveAdapter for SqliteArchive {
    async fn initialize(&self) -> Result<(), FacewatchError> {
        let db = Database::open(&self.config.archive_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| FacewatchError::Storage {
            source: "archive already initialized".into(),
        })?;
        debug!(path = %self.config.archive_path, "archive initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), FacewatchError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn upsert_chat(&self, chat: &Chat) -> Result<(), FacewatchError> {
        queries::chats::upsert_chat(self.db()?, chat)
            .await
            .inspect_err(|e| warn!(chat = %chat.id, error = %e, "chat upsert failed"))
    }

    async fn upsert_message(&self, message: &ArchivedMessage) -> Result<bool, FacewatchError> {
        queries::messages::upsert_message(self.db()?, message)
            .await
            .inspect_err(|e| {
                warn!(
                    chat = %message.chat_id,
                    message = %message.id,
                    error = %e,
                    "message upsert failed"
                )
            })
    }

    async fn list_messages(
        &self,
        chat_id: &str,
        limit: usize,
    ) -> Result<Vec<ArchivedMessage>, FacewatchError> {
        queries::messages::list_messages(self.db()?, chat_id, limit).await
    }

    async fn list_chats(&self) -> Result<Vec<Chat>, FacewatchError> {
        queries::chats::list_chats(self.db()?).await
    }
}
