// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routes session events into archive writes and media acquisition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use facewatch_core::{
    ArchiveAdapter, ArchivedMessage, BacklogBatch, BacklogConversation, BacklogMessage, Chat,
    FacewatchError, LiveMessage, MediaKind, MessageBody, SessionClient, SessionEvent,
};
use facewatch_media::{Acquired, MediaPipeline, Origin};

use crate::connection::{ConnectionState, render_pairing_code};

/// Media columns of an archived message.
type MediaColumns = (Option<String>, Option<Vec<u8>>, Option<MediaKind>);

/// Counts from one backlog sync.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BacklogSummary {
    pub conversations: usize,
    pub stored: usize,
    pub skipped: usize,
}

/// Consumes session events one at a time and persists them.
pub struct EventRouter {
    session: Arc<dyn SessionClient>,
    archive: Arc<dyn ArchiveAdapter>,
    media: MediaPipeline,
    state: watch::Sender<ConnectionState>,
}

impl EventRouter {
    pub fn new(
        session: Arc<dyn SessionClient>,
        archive: Arc<dyn ArchiveAdapter>,
        media: MediaPipeline,
        state: watch::Sender<ConnectionState>,
    ) -> Self {
        Self {
            session,
            archive,
            media,
            state,
        }
    }

    /// Runs until the event stream ends or `cancel` fires.
    ///
    /// An event that was already received is handled to completion before
    /// cancellation is observed.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), FacewatchError> {
        info!("event router started");
        loop {
            tokio::select! {
                event = self.session.next_event() => {
                    match event {
                        Ok(Some(event)) => self.handle_event(event).await,
                        Ok(None) => {
                            info!("session event stream ended");
                            break;
                        }
                        Err(e) => {
                            error!(error = %e, "failed to receive session event");
                            return Err(e);
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("event router stopping");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Dispatches one event by kind.
    pub async fn handle_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::LiveMessage(msg) => {
                if let Err(e) = self.handle_live(msg).await {
                    error!(error = %e, "failed to archive live message");
                }
            }
            SessionEvent::BacklogSync(batch) => {
                let summary = self.handle_backlog(batch).await;
                info!(
                    conversations = summary.conversations,
                    stored = summary.stored,
                    skipped = summary.skipped,
                    "backlog sync complete"
                );
            }
            SessionEvent::PairingCode(code) => {
                self.state.send_replace(ConnectionState::AwaitingPairing);
                match render_pairing_code(&code) {
                    Ok(qr) => {
                        eprintln!("\nScan this QR code with the messaging app:\n{qr}");
                        info!("waiting for pairing code to be scanned");
                    }
                    Err(e) => warn!(error = %e, "failed to render pairing code"),
                }
            }
            SessionEvent::Connected => {
                self.state.send_replace(ConnectionState::Connected);
                match self.session.joined_groups().await {
                    Ok(groups) => {
                        info!(groups = groups.len(), "connected to messaging network");
                        for group in &groups {
                            debug!(id = %group.id, name = %group.name, "joined group");
                        }
                    }
                    Err(e) => warn!(error = %e, "connected, but failed to list groups"),
                }
            }
            SessionEvent::LoggedOut => {
                self.state.send_replace(ConnectionState::LoggedOut);
                warn!("device logged out, re-pairing required");
            }
            SessionEvent::Disconnected => {
                self.state.send_replace(ConnectionState::Disconnected);
                info!("disconnected from messaging network");
            }
        }
    }

    /// Archives a live message. Returns whether a row was written.
    pub async fn handle_live(&self, msg: LiveMessage) -> Result<bool, FacewatchError> {
        let content = msg.body.text();
        let (media_path, thumbnail, media_kind) = self
            .stage_image(&msg.chat_id, &msg.id, &msg.body, Origin::Live, msg.timestamp)
            .await;

        let message = ArchivedMessage {
            id: msg.id,
            chat_id: msg.chat_id,
            sender: msg.sender,
            content,
            timestamp: msg.timestamp,
            is_from_me: msg.is_from_me,
            media_path,
            thumbnail,
            media_kind,
        };
        if !message.has_payload() {
            debug!(id = %message.id, chat = %message.chat_id, "skipping empty message");
            return Ok(false);
        }

        let name = self.chat_name(&message.chat_id, None).await;
        self.archive
            .upsert_chat(&Chat {
                id: message.chat_id.clone(),
                name,
                last_message_at: message.timestamp,
            })
            .await?;
        let stored = self.archive.upsert_message(&message).await?;
        if stored {
            facewatch_prometheus::record_message_archived(Origin::Live.as_str());
            info!(
                id = %message.id,
                chat = %message.chat_id,
                sender = %message.sender,
                from_me = message.is_from_me,
                media = message.media_path.as_deref().unwrap_or(""),
                "stored message"
            );
        }
        Ok(stored)
    }

    /// Archives every conversation of a backlog sync.
    ///
    /// Failures are logged per message; the rest of the batch continues.
    pub async fn handle_backlog(&self, batch: BacklogBatch) -> BacklogSummary {
        let mut summary = BacklogSummary {
            conversations: batch.conversations.len(),
            ..BacklogSummary::default()
        };
        info!(conversations = summary.conversations, "received backlog sync");

        for conversation in batch.conversations {
            if let Err(e) = self.archive_conversation(conversation, &mut summary).await {
                error!(error = %e, "failed to archive backlog conversation");
            }
        }
        summary
    }

    async fn archive_conversation(
        &self,
        conversation: BacklogConversation,
        summary: &mut BacklogSummary,
    ) -> Result<(), FacewatchError> {
        let BacklogConversation {
            chat_id,
            name,
            messages,
        } = conversation;

        let Some(latest) = messages
            .iter()
            .filter_map(|m| timestamp_from_secs(m.timestamp))
            .max()
        else {
            summary.skipped += messages.len();
            return Ok(());
        };

        let name = self.chat_name(&chat_id, name).await;
        self.archive
            .upsert_chat(&Chat {
                id: chat_id.clone(),
                name,
                last_message_at: latest,
            })
            .await?;

        let own_id = self.session.own_id();
        for msg in messages {
            match self.archive_backlog_message(&chat_id, own_id.as_deref(), msg).await {
                Ok(true) => summary.stored += 1,
                Ok(false) => summary.skipped += 1,
                Err(e) => {
                    summary.skipped += 1;
                    warn!(chat = %chat_id, error = %e, "failed to store backlog message");
                }
            }
        }
        Ok(())
    }

    async fn archive_backlog_message(
        &self,
        chat_id: &str,
        own_id: Option<&str>,
        msg: BacklogMessage,
    ) -> Result<bool, FacewatchError> {
        let Some(timestamp) = timestamp_from_secs(msg.timestamp) else {
            return Ok(false);
        };
        let content = msg.body.text();
        let (media_path, thumbnail, media_kind) = self
            .stage_image(chat_id, &msg.id, &msg.body, Origin::Backlog, timestamp)
            .await;

        let message = ArchivedMessage {
            sender: backlog_sender(chat_id, own_id, &msg),
            id: msg.id,
            chat_id: chat_id.to_string(),
            content,
            timestamp,
            is_from_me: msg.from_me,
            media_path,
            thumbnail,
            media_kind,
        };
        let stored = self.archive.upsert_message(&message).await?;
        if stored {
            facewatch_prometheus::record_message_archived(Origin::Backlog.as_str());
            debug!(id = %message.id, chat = chat_id, "stored backlog message");
        }
        Ok(stored)
    }

    /// Stages the image of a message, if any. Failures leave the message
    /// without media; a re-delivered message keeps its first staging.
    async fn stage_image(
        &self,
        chat_id: &str,
        message_id: &str,
        body: &MessageBody,
        origin: Origin,
        timestamp: DateTime<Utc>,
    ) -> MediaColumns {
        let Some(image) = &body.image else {
            return (None, None, None);
        };
        match self
            .media
            .acquire(chat_id, message_id, image, origin, timestamp)
            .await
        {
            Ok(Acquired::Staged(staged) | Acquired::Duplicate(staged)) => (
                Some(staged.path.display().to_string()),
                staged.thumbnail,
                Some(staged.kind),
            ),
            Ok(Acquired::Skipped(_)) => (None, None, None),
            Err(e) => {
                warn!(chat = chat_id, origin = origin.as_str(), error = %e, "failed to process media");
                facewatch_prometheus::record_media_skipped("error");
                (None, None, None)
            }
        }
    }

    /// Prefers a supplied name, then the session's contact book, then the
    /// raw chat identifier.
    async fn chat_name(&self, chat_id: &str, supplied: Option<String>) -> String {
        if let Some(name) = supplied.filter(|n| !n.is_empty()) {
            return name;
        }
        match self.session.contact_name(chat_id).await {
            Ok(Some(name)) if !name.is_empty() => name,
            Ok(_) => chat_id.to_string(),
            Err(e) => {
                debug!(chat = chat_id, error = %e, "contact lookup failed");
                chat_id.to_string()
            }
        }
    }
}

/// Participant when received, the operator when sent, otherwise the chat's
/// own user part.
fn backlog_sender(chat_id: &str, own_id: Option<&str>, msg: &BacklogMessage) -> String {
    let chat_user = || chat_id.split('@').next().unwrap_or(chat_id).to_string();
    if msg.from_me {
        return own_id.map(str::to_string).unwrap_or_else(chat_user);
    }
    match msg.participant.as_deref() {
        Some(participant) if !participant.is_empty() => participant.to_string(),
        _ => chat_user(),
    }
}

/// Zero means "unknown" in backlog data.
fn timestamp_from_secs(secs: i64) -> Option<DateTime<Utc>> {
    if secs == 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0)
}
