// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image acquisition: recency policy, download, staging.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use facewatch_config::model::MediaConfig;
use facewatch_core::{FacewatchError, ImageAttachment, MediaKind, SessionClient};

use crate::staging;

/// Where a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Delivered in real time.
    Live,
    /// Delivered as part of a backlog sync.
    Backlog,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Backlog => "backlog",
        }
    }
}

/// A downloaded image on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedMedia {
    pub path: PathBuf,
    /// Embedded low-resolution preview from the message, if any.
    pub thumbnail: Option<Vec<u8>>,
    pub kind: MediaKind,
}

/// Why an acquisition was skipped without downloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A live message older than the recency window.
    Stale { age: Duration },
}

/// Outcome of [`MediaPipeline::acquire`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquired {
    Staged(StagedMedia),
    /// The message was already acquired; carries the earlier staging so the
    /// archive row keeps its media reference. Nothing new is written.
    Duplicate(StagedMedia),
    Skipped(SkipReason),
}

/// Messages remembered for duplicate suppression.
pub const ACQUIRED_CAPACITY: usize = 4096;

/// Recently acquired `(chat id, message id)` pairs, oldest evicted first.
struct AcquiredLog {
    capacity: usize,
    staged: HashMap<(String, String), StagedMedia>,
    order: VecDeque<(String, String)>,
}

impl AcquiredLog {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            staged: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, key: &(String, String)) -> Option<StagedMedia> {
        self.staged.get(key).cloned()
    }

    fn insert(&mut self, key: (String, String), media: StagedMedia) {
        if self.staged.insert(key.clone(), media).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.staged.remove(&oldest);
            }
        }
    }
}

/// Downloads image attachments and stages them under the store path.
///
/// Each message is staged at most once per process, so a re-delivered event
/// never reaches the match engine twice.
pub struct MediaPipeline {
    session: Arc<dyn SessionClient>,
    store_path: PathBuf,
    recency_window: Duration,
    acquired: Mutex<AcquiredLog>,
}

impl MediaPipeline {
    pub fn new(session: Arc<dyn SessionClient>, config: &MediaConfig) -> Self {
        Self {
            session,
            store_path: PathBuf::from(&config.store_path),
            recency_window: Duration::from_secs(config.live_recency_secs),
            acquired: Mutex::new(AcquiredLog::new(ACQUIRED_CAPACITY)),
        }
    }

    /// Caps the number of messages remembered for duplicate suppression.
    pub fn with_acquired_capacity(mut self, capacity: usize) -> Self {
        self.acquired = Mutex::new(AcquiredLog::new(capacity));
        self
    }

    fn lookup(&self, key: &(String, String)) -> Option<StagedMedia> {
        self.acquired
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
    }

    fn remember(&self, key: (String, String), media: StagedMedia) {
        self.acquired
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, media);
    }

    pub fn store_path(&self) -> &std::path::Path {
        &self.store_path
    }

    /// Acquire the image attachment of message `message_id` in `chat_id`.
    pub async fn acquire(
        &self,
        chat_id: &str,
        message_id: &str,
        image: &ImageAttachment,
        origin: Origin,
        timestamp: DateTime<Utc>,
    ) -> Result<Acquired, FacewatchError> {
        self.acquire_at(chat_id, message_id, image, origin, timestamp, Utc::now())
            .await
    }

    /// [`acquire`](Self::acquire) with an explicit acquisition time.
    ///
    /// Live messages older than the recency window relative to `now` are
    /// skipped without downloading. Backlog messages are never filtered. A
    /// message that was already staged is reported as a duplicate without
    /// downloading.
    pub async fn acquire_at(
        &self,
        chat_id: &str,
        message_id: &str,
        image: &ImageAttachment,
        origin: Origin,
        timestamp: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Acquired, FacewatchError> {
        let key = (chat_id.to_string(), message_id.to_string());
        if let Some(earlier) = self.lookup(&key) {
            debug!(chat = chat_id, id = message_id, "image already staged, skipping");
            facewatch_prometheus::record_media_skipped("duplicate");
            return Ok(Acquired::Duplicate(earlier));
        }

        if origin == Origin::Live {
            // A timestamp in the future counts as fresh.
            let age = (now - timestamp).to_std().unwrap_or(Duration::ZERO);
            if age > self.recency_window {
                debug!(chat = chat_id, age_secs = age.as_secs(), "skipping stale live image");
                facewatch_prometheus::record_media_skipped("stale");
                return Ok(Acquired::Skipped(SkipReason::Stale { age }));
            }
        }

        let data = self.session.download(&image.handle).await?;
        let path = staging::staged_path(&self.store_path, chat_id);
        staging::write_staged(&path, &data).await?;

        info!(
            chat = chat_id,
            origin = origin.as_str(),
            path = %path.display(),
            bytes = data.len(),
            "image staged"
        );
        facewatch_prometheus::record_media_staged();

        let staged = StagedMedia {
            path,
            thumbnail: image.jpeg_thumbnail.clone(),
            kind: MediaKind::Image,
        };
        self.remember(key, staged.clone());
        Ok(Acquired::Staged(staged))
    }
}
