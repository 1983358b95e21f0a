// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staging directory layout.
//!
//! Staged images live at `<store_path>/<chat key>/img_<nanos>.jpg`. Files are
//! written under a `.part` name and renamed into place, so a reader never
//! sees a partially written image.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use tracing::{info, warn};

use facewatch_core::FacewatchError;

/// Extension of files still being written.
pub const PARTIAL_EXTENSION: &str = "part";

static LAST_NANOS: AtomicI64 = AtomicI64::new(0);

/// Strictly increasing acquisition timestamp in nanoseconds.
///
/// Follows the wall clock but never repeats, even when two acquisitions land
/// on the same clock tick.
pub fn next_acquisition_nanos() -> i64 {
    let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
    let mut last = LAST_NANOS.load(Ordering::Relaxed);
    loop {
        let next = now.max(last.saturating_add(1));
        match LAST_NANOS.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Directory name for a chat: every character outside `[A-Za-z0-9@._-]`
/// becomes `_`, and a leading dot is replaced so the name never resolves to
/// `.` or `..`.
pub fn chat_key(chat_id: &str) -> String {
    let mut key: String = chat_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if key.is_empty() || key.starts_with('.') {
        key.insert(0, '_');
    }
    key
}

/// Path for a new staged image of `chat_id` under `store_path`.
pub fn staged_path(store_path: &Path, chat_id: &str) -> PathBuf {
    store_path
        .join(chat_key(chat_id))
        .join(format!("img_{}.jpg", next_acquisition_nanos()))
}

/// Write `data` to `path` atomically: create the parent directory, write a
/// `.part` sibling, then rename it into place.
pub async fn write_staged(path: &Path, data: &[u8]) -> Result<(), FacewatchError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FacewatchError::media("failed to create staging directory", e))?;
    }

    let partial = path.with_extension(format!("jpg.{PARTIAL_EXTENSION}"));
    if let Err(e) = tokio::fs::write(&partial, data).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(FacewatchError::media("failed to write staged file", e));
    }
    if let Err(e) = tokio::fs::rename(&partial, path).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(FacewatchError::media("failed to finalize staged file", e));
    }
    Ok(())
}

/// Remove every file left in the staging tree, keeping the directories.
///
/// Run once at startup: anything present was orphaned by a previous run.
/// Returns the number of files removed.
pub async fn sweep_staging(store_path: &Path) -> Result<usize, FacewatchError> {
    tokio::fs::create_dir_all(store_path)
        .await
        .map_err(|e| FacewatchError::media("failed to create staging directory", e))?;

    let mut removed = 0;
    let mut pending = vec![store_path.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| FacewatchError::media("failed to read staging directory", e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FacewatchError::media("failed to read staging directory", e))?
        {
            let path = entry.path();
            match entry.file_type().await {
                Ok(ft) if ft.is_dir() => pending.push(path),
                Ok(_) => match tokio::fs::remove_file(&path).await {
                    Ok(()) => {
                        info!(path = %path.display(), "removed leftover staged file");
                        removed += 1;
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "failed to remove staged file"),
                },
                Err(e) => warn!(path = %path.display(), error = %e, "failed to stat staged file"),
            }
        }
    }
    Ok(removed)
}
