// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loading reference photos into identities.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use facewatch_config::FacewatchConfig;
use facewatch_core::{FaceEmbedder, FacewatchError};

use crate::quorum::{Identity, ReferencePhoto};

/// Embeds the reference photos of every configured destination.
///
/// Each identity reads `known_faces_dir/<key>/`. A missing directory is a
/// configuration error. Photos without a detectable face, or that fail to
/// embed, are skipped. Only the first face of a reference photo is kept.
pub async fn load_identities(
    config: &FacewatchConfig,
    embedder: &dyn FaceEmbedder,
) -> Result<Vec<Identity>, FacewatchError> {
    warn_unconfigured_dirs(config);

    let mut identities = Vec::with_capacity(config.destinations.len());
    for (key, destination) in &config.destinations {
        let dir = config.reference_dir(key);
        let files = reference_files(config, &dir)?;

        let mut references = Vec::new();
        for file in files {
            match load_reference(embedder, &file).await {
                Ok(Some(photo)) => references.push(photo),
                Ok(None) => warn!(identity = %key, file = %file.display(), "no face in reference photo"),
                Err(e) => warn!(identity = %key, file = %file.display(), error = %e, "failed to embed reference photo"),
            }
        }

        if references.is_empty() {
            warn!(identity = %key, dir = %dir.display(), "no usable reference photos, identity can never match");
        } else {
            info!(identity = %key, references = references.len(), "loaded reference faces");
        }
        identities.push(Identity {
            key: key.clone(),
            name: destination.name.clone(),
            destination: destination.group.clone(),
            references,
        });
    }

    info!(identities = identities.len(), "reference faces loaded");
    Ok(identities)
}

async fn load_reference(
    embedder: &dyn FaceEmbedder,
    file: &Path,
) -> Result<Option<ReferencePhoto>, FacewatchError> {
    let bytes = tokio::fs::read(file)
        .await
        .map_err(|e| FacewatchError::media(format!("failed to read {}", file.display()), e))?;
    let faces = embedder.embed_faces(&bytes).await?;
    Ok(faces.into_iter().next().map(|face| ReferencePhoto {
        source: file.to_path_buf(),
        embeddings: vec![face],
    }))
}

/// Image files directly under `dir` with an allowed extension, sorted.
fn reference_files(config: &FacewatchConfig, dir: &Path) -> Result<Vec<PathBuf>, FacewatchError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        FacewatchError::Config(format!(
            "reference directory {} is not readable: {e}",
            dir.display()
        ))
    })?;
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && config.media.is_allowed(path))
        .collect();
    files.sort();
    Ok(files)
}

fn warn_unconfigured_dirs(config: &FacewatchConfig) {
    let Ok(entries) = std::fs::read_dir(&config.face_detection.known_faces_dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !config.destinations.contains_key(&name) {
            warn!(dir = %path.display(), "reference directory has no destination, ignoring");
        }
    }
}
