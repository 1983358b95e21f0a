// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hot-swappable identity set.
//!
//! Readers take a snapshot per image; a reload computes a fresh set and
//! swaps it in atomically, so an image is always matched against one
//! consistent generation of references.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use facewatch_config::FacewatchConfig;
use facewatch_core::{FaceEmbedder, FacewatchError};

use crate::quorum::Identity;
use crate::references::load_identities;

pub struct IdentityRegistry {
    identities: ArcSwap<Vec<Identity>>,
    config: FacewatchConfig,
    embedder: Arc<dyn FaceEmbedder>,
}

impl IdentityRegistry {
    /// Loads the initial identity set. Fails if any reference directory is
    /// missing.
    pub async fn load(
        config: FacewatchConfig,
        embedder: Arc<dyn FaceEmbedder>,
    ) -> Result<Self, FacewatchError> {
        let identities = load_identities(&config, embedder.as_ref()).await?;
        Ok(Self {
            identities: ArcSwap::from_pointee(identities),
            config,
            embedder,
        })
    }

    /// The current identity set.
    pub fn snapshot(&self) -> Arc<Vec<Identity>> {
        self.identities.load_full()
    }

    /// Recomputes reference embeddings from disk. On failure the previous
    /// set stays active.
    pub async fn reload(&self) -> Result<usize, FacewatchError> {
        let identities = load_identities(&self.config, self.embedder.as_ref()).await?;
        let count = identities.len();
        self.identities.store(Arc::new(identities));
        info!(identities = count, "reference faces reloaded");
        Ok(count)
    }

    /// Reloads whenever `trigger` is notified, until `cancel` fires.
    pub async fn reload_on(&self, trigger: Arc<Notify>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = trigger.notified() => {
                    if let Err(e) = self.reload().await {
                        error!(error = %e, "reference reload failed, keeping previous set");
                    }
                }
                _ = cancel.cancelled() => break,
            }
        }
    }
}
