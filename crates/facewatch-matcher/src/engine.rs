// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity match engine.
//!
//! Each staged image goes through one pass: monitored-chat check, face
//! embedding, quorum evaluation against every identity, one notification
//! per matched identity, then deletion. There are no retries; whatever the
//! outcome, the staged file is removed at the end.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use facewatch_config::FacewatchConfig;
use facewatch_core::{FaceEmbedder, MediaKind};
use facewatch_gateway::{DispatchGateway, SendOutcome, SendRequest};
use facewatch_media::{StagedPath, chat_key};

use crate::quorum::{self, Identity, IdentityMatch, MatchPolicy};
use crate::registry::IdentityRegistry;

/// Decision reached for one staged image.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// The image did not come from a monitored group.
    Rejected,
    NoFaces,
    NoMatch,
    Matched(Vec<IdentityMatch>),
    /// Reading or embedding the image failed.
    Failed(String),
}

impl MatchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rejected => "rejected",
            Self::NoFaces => "no_faces",
            Self::NoMatch => "no_match",
            Self::Matched(_) => "matched",
            Self::Failed(_) => "error",
        }
    }
}

/// A notification sent for one matched identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub identity: String,
    pub destination: String,
    pub outcome: SendOutcome,
}

/// What happened to one staged image.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchReport {
    pub path: PathBuf,
    pub outcome: MatchOutcome,
    pub dispatches: Vec<Dispatch>,
    /// Whether the staged file is gone after processing.
    pub deleted: bool,
}

pub struct MatchEngine {
    registry: Arc<IdentityRegistry>,
    embedder: Arc<dyn FaceEmbedder>,
    gateway: Arc<DispatchGateway>,
    /// Staging directory names of the monitored groups.
    monitored: HashSet<String>,
    policy: MatchPolicy,
    debug_dir: Option<PathBuf>,
    max_concurrent: usize,
}

impl MatchEngine {
    pub fn new(
        config: &FacewatchConfig,
        registry: Arc<IdentityRegistry>,
        embedder: Arc<dyn FaceEmbedder>,
        gateway: Arc<DispatchGateway>,
    ) -> Self {
        Self {
            registry,
            embedder,
            gateway,
            monitored: config.input_groups.iter().map(|g| chat_key(g)).collect(),
            policy: MatchPolicy {
                threshold: config.face_detection.confidence_threshold,
                min_matching_faces: config.face_detection.min_matching_faces,
            },
            debug_dir: config
                .debug
                .enabled
                .then(|| PathBuf::from(&config.debug.output_dir)),
            max_concurrent: config.face_detection.max_concurrent.max(1),
        }
    }

    /// Processes staged images from `stream` until it ends or `cancel`
    /// fires. Images already being processed are finished.
    pub async fn run<S>(&self, stream: S, cancel: CancellationToken)
    where
        S: Stream<Item = StagedPath>,
    {
        info!(max_concurrent = self.max_concurrent, "match engine started");
        let engine = self;
        stream
            .take_until(async move { cancel.cancelled().await })
            .for_each_concurrent(self.max_concurrent, move |staged| async move {
                engine.process(staged).await;
            })
            .await;
        info!("match engine stopped");
    }

    /// Runs one staged image through the full pipeline and deletes it.
    pub async fn process(&self, staged: StagedPath) -> MatchReport {
        let started = Instant::now();
        let (outcome, dispatches) = self.decide_and_notify(&staged).await;
        let deleted = remove_staged(&staged.path).await;

        facewatch_prometheus::record_match_decision(outcome.label());
        facewatch_prometheus::record_match_latency(started.elapsed().as_secs_f64());
        info!(
            path = %staged.path.display(),
            outcome = outcome.label(),
            notifications = dispatches.len(),
            deleted,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "staged image processed"
        );

        MatchReport {
            path: staged.path,
            outcome,
            dispatches,
            deleted,
        }
    }

    async fn decide_and_notify(&self, staged: &StagedPath) -> (MatchOutcome, Vec<Dispatch>) {
        let monitored = staged
            .chat_key
            .as_ref()
            .is_some_and(|key| self.monitored.contains(key));
        if !monitored {
            debug!(path = %staged.path.display(), chat = ?staged.chat_key, "image not from a monitored group");
            return (MatchOutcome::Rejected, Vec::new());
        }

        let bytes = match tokio::fs::read(&staged.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %staged.path.display(), error = %e, "staged image unreadable");
                return (MatchOutcome::Failed(e.to_string()), Vec::new());
            }
        };
        let faces = match self.embedder.embed_faces(&bytes).await {
            Ok(faces) => faces,
            Err(e) => {
                warn!(path = %staged.path.display(), error = %e.detail(), "face embedding failed");
                return (MatchOutcome::Failed(e.detail()), Vec::new());
            }
        };
        if faces.is_empty() {
            debug!(path = %staged.path.display(), "no faces found");
            return (MatchOutcome::NoFaces, Vec::new());
        }

        let identities = self.registry.snapshot();
        let matches = quorum::evaluate(&faces, &identities, self.policy);
        if matches.is_empty() {
            info!(path = %staged.path.display(), faces = faces.len(), "no identity matched");
            return (MatchOutcome::NoMatch, Vec::new());
        }

        for m in &matches {
            info!(
                identity = %m.key,
                matched_references = m.matched_references,
                total_references = m.total_references,
                best_distance = m.best_distance,
                "identity matched"
            );
            if let Some(dir) = &self.debug_dir {
                save_debug_copy(dir, &m.key, &staged.path).await;
            }
        }

        let sends = matches.iter().filter_map(|m| {
            let identity = identities.iter().find(|i| i.key == m.key)?;
            Some(self.notify(identity, &staged.path))
        });
        let dispatches = futures::future::join_all(sends).await;
        (MatchOutcome::Matched(matches), dispatches)
    }

    async fn notify(&self, identity: &Identity, path: &Path) -> Dispatch {
        let request = SendRequest {
            destination: identity.destination.clone(),
            text: String::new(),
            media_path: Some(path.to_path_buf()),
            media_kind: Some(MediaKind::Image),
            caption: Some(identity.name.clone()),
        };
        let outcome = self.gateway.send(&request).await;
        if !outcome.success {
            warn!(identity = %identity.key, detail = %outcome.detail, "notification failed");
        }
        Dispatch {
            identity: identity.key.clone(),
            destination: identity.destination.clone(),
            outcome,
        }
    }
}

/// Removes a staged file. A file that is already gone counts as removed.
async fn remove_staged(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            facewatch_prometheus::record_staged_deleted();
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to delete staged image");
            false
        }
    }
}

/// Copies the whole staged image into `dir`. The embedder reports vectors
/// only, with no face boxes, so there is no face region to crop.
async fn save_debug_copy(dir: &Path, identity: &str, source: &Path) {
    let name = format!(
        "match_{identity}_{}.jpg",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let target = dir.join(name);
    let result = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::copy(source, &target).await
    }
    .await;
    match result {
        Ok(_) => debug!(path = %target.display(), "saved debug copy"),
        Err(e) => warn!(path = %target.display(), error = %e, "failed to save debug copy"),
    }
}
