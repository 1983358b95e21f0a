// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation archive trait.

use async_trait::async_trait;

use crate::error::FacewatchError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ArchivedMessage, Chat};

/// Durable store of chats and messages.
///
/// All writes are idempotent upserts, so callers may re-deliver the same
/// chat or message safely.
#[async_trait]
pub trait ArchiveAdapter: PluginAdapter {
    /// Opens the backing store and applies migrations.
    async fn initialize(&self) -> Result<(), FacewatchError>;

    /// Flushes pending writes and releases the backing store.
    async fn close(&self) -> Result<(), FacewatchError>;

    /// Inserts or updates a chat. The stored last-message time never moves
    /// backwards.
    async fn upsert_chat(&self, chat: &Chat) -> Result<(), FacewatchError>;

    /// Inserts or overwrites a message keyed by `(id, chat_id)`.
    ///
    /// Returns `false` without writing when the message has neither text nor
    /// media.
    async fn upsert_message(&self, message: &ArchivedMessage) -> Result<bool, FacewatchError>;

    /// Returns the `limit` most recent messages of a chat, newest first.
    async fn list_messages(
        &self,
        chat_id: &str,
        limit: usize,
    ) -> Result<Vec<ArchivedMessage>, FacewatchError>;

    /// Returns all chats, most recently active first.
    async fn list_chats(&self) -> Result<Vec<Chat>, FacewatchError>;
}
