// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock face embedder keyed by image bytes.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use facewatch_core::{
    AdapterType, FaceEmbedder, FaceEmbedding, FacewatchError, HealthStatus, PluginAdapter,
};

/// Returns pre-configured embeddings for known image bytes and no faces for
/// anything else.
#[derive(Default)]
pub struct MockEmbedder {
    faces: Mutex<HashMap<Vec<u8>, Vec<FaceEmbedding>>>,
    failing: Mutex<HashSet<Vec<u8>>>,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the faces detected in `image`.
    pub async fn set_faces(&self, image: &[u8], faces: Vec<FaceEmbedding>) {
        self.faces.lock().await.insert(image.to_vec(), faces);
    }

    /// Make embedding `image` fail.
    pub async fn fail_on(&self, image: &[u8]) {
        self.failing.lock().await.insert(image.to_vec());
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, FacewatchError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FacewatchError> {
        Ok(())
    }
}

#[async_trait]
impl FaceEmbedder for MockEmbedder {
    async fn embed_faces(&self, image: &[u8]) -> Result<Vec<FaceEmbedding>, FacewatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().await.contains(image) {
            return Err(FacewatchError::Embedding {
                message: "mock embedding failure".into(),
                source: None,
            });
        }
        Ok(self.faces.lock().await.get(image).cloned().unwrap_or_default())
    }
}
