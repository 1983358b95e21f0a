// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staging directory watcher.
//!
//! Turns filesystem notifications under the staging root into a stream of
//! newly appeared staged images. Each file is yielded once per watcher; a
//! restarted watcher first reports files already present.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use dashmap::DashSet;
use futures::Stream;
use notify::{RecommendedWatcher, Watcher};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use facewatch_config::model::MediaConfig;
use facewatch_core::FacewatchError;

use crate::staging::PARTIAL_EXTENSION;

/// Quiet period before a burst of filesystem events is delivered.
const DEBOUNCE: Duration = Duration::from_millis(250);

/// A staged image ready for matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StagedPath {
    pub path: PathBuf,
    /// Chat directory the file was staged under, if any.
    pub chat_key: Option<String>,
}

/// Watches the staging tree for new images.
pub struct StagingWatcher {
    root: PathBuf,
    media: MediaConfig,
}

impl StagingWatcher {
    pub fn new(media: MediaConfig) -> Self {
        Self {
            root: PathBuf::from(&media.store_path),
            media,
        }
    }

    /// Start watching. Files already present are reported first.
    ///
    /// Dropping the returned stream stops the watcher; calling `start` again
    /// resumes from the current directory contents.
    pub fn start(&self) -> Result<StagingStream, FacewatchError> {
        std::fs::create_dir_all(&self.root)
            .map_err(|e| FacewatchError::media("failed to create staging directory", e))?;
        let root = std::fs::canonicalize(&self.root)
            .map_err(|e| FacewatchError::media("failed to resolve staging directory", e))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let filter = Arc::new(StagingFilter {
            root: root.clone(),
            media: self.media.clone(),
            seen: DashSet::new(),
        });

        let handler_filter = Arc::clone(&filter);
        let handler_tx = tx.clone();
        let mut debouncer = new_debouncer(DEBOUNCE, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in events {
                        for staged in handler_filter.classify_tree(&event.path) {
                            let _ = handler_tx.send(staged);
                        }
                    }
                }
                Err(e) => warn!(error = %e, "staging watcher error"),
            }
        })
        .map_err(|e| FacewatchError::media("failed to start staging watcher", e))?;

        debouncer
            .watcher()
            .watch(&root, notify::RecursiveMode::Recursive)
            .map_err(|e| FacewatchError::media("failed to watch staging directory", e))?;

        for path in existing_files(&root) {
            if let Some(staged) = filter.classify(&path) {
                let _ = tx.send(staged);
            }
        }

        info!(root = %root.display(), "staging watcher started");
        Ok(StagingStream {
            rx,
            _debouncer: debouncer,
        })
    }
}

/// Stream of newly staged images. Ends only when dropped.
pub struct StagingStream {
    rx: mpsc::UnboundedReceiver<StagedPath>,
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl Stream for StagingStream {
    type Item = StagedPath;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StagedPath>> {
        self.rx.poll_recv(cx)
    }
}

struct StagingFilter {
    root: PathBuf,
    media: MediaConfig,
    seen: DashSet<PathBuf>,
}

impl StagingFilter {
    /// Classify a changed path. A new chat directory may already hold files
    /// written before its watch was registered, so directories are scanned.
    fn classify_tree(&self, path: &Path) -> Vec<StagedPath> {
        if path.is_dir() {
            return std::fs::read_dir(path)
                .map(|entries| {
                    let mut children: Vec<PathBuf> =
                        entries.flatten().map(|entry| entry.path()).collect();
                    children.sort();
                    children
                        .iter()
                        .filter_map(|child| self.classify(child))
                        .collect()
                })
                .unwrap_or_default();
        }
        self.classify(path).into_iter().collect()
    }

    /// Decide whether a changed path is a new staged image.
    ///
    /// Disallowed files are deleted. Vanished files are forgotten so the
    /// seen set only holds files still on disk.
    fn classify(&self, path: &Path) -> Option<StagedPath> {
        if !path.exists() {
            self.seen.remove(path);
            return None;
        }
        if !path.is_file() || has_extension(path, PARTIAL_EXTENSION) {
            return None;
        }
        if !self.media.is_allowed(path) {
            match std::fs::remove_file(path) {
                Ok(()) => info!(
                    path = %path.display(),
                    allowed = ?self.media.allowed_extensions,
                    "removed staged file with disallowed extension"
                ),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove staged file"),
            }
            return None;
        }
        if !self.seen.insert(path.to_path_buf()) {
            return None;
        }

        let chat_key = path
            .parent()
            .filter(|parent| *parent != self.root)
            .and_then(|parent| parent.strip_prefix(&self.root).ok())
            .and_then(|rel| rel.components().next())
            .map(|c| c.as_os_str().to_string_lossy().into_owned());

        debug!(path = %path.display(), chat_key = ?chat_key, "new staged file");
        Some(StagedPath {
            path: path.to_path_buf(),
            chat_key,
        })
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Files currently under `root`, one level of chat directories deep, sorted.
fn existing_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = std::fs::read_dir(root) else {
        return files;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Ok(children) = std::fs::read_dir(&path) {
                files.extend(children.flatten().map(|c| c.path()).filter(|p| p.is_file()));
            }
        } else {
            files.push(path);
        }
    }
    files.sort();
    files
}
