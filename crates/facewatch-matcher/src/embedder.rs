// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for an external face embedding service.
//!
//! The service receives raw image bytes and answers with one embedding per
//! detected face: `{"faces": [{"embedding": [f32, ...]}, ...]}`. The face
//! detection model is passed in the `x-face-model` header.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use facewatch_config::model::EmbedderConfig;
use facewatch_core::{
    AdapterType, FaceEmbedder, FaceEmbedding, FacewatchError, HealthStatus, PluginAdapter,
};

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    faces: Vec<DetectedFace>,
}

#[derive(Debug, Deserialize)]
struct DetectedFace {
    embedding: Vec<f32>,
}

fn embedding_err(message: String, source: Option<reqwest::Error>) -> FacewatchError {
    FacewatchError::Embedding {
        message,
        source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
    }
}

/// [`FaceEmbedder`] backed by an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpFaceEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl HttpFaceEmbedder {
    pub fn new(config: &EmbedderConfig, model: &str) -> Result<Self, FacewatchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| embedding_err(format!("failed to build HTTP client: {e}"), Some(e)))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl PluginAdapter for HttpFaceEmbedder {
    fn name(&self) -> &str {
        "http-embedder"
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
impl FaceEmbedder for HttpFaceEmbedder {
    async fn embed_faces(&self, image: &[u8]) -> Result<Vec<FaceEmbedding>, FacewatchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/octet-stream")
            .header("x-face-model", &self.model)
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| embedding_err(format!("embedding request failed: {e}"), Some(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(embedding_err(
                format!("embedding service returned {status}: {body}"),
                None,
            ));
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            embedding_err(format!("invalid embedding response: {e}"), Some(e))
        })?;
        debug!(faces = parsed.faces.len(), bytes = image.len(), "faces embedded");
        Ok(parsed
            .faces
            .into_iter()
            .map(|f| FaceEmbedding(f.embedding))
            .collect())
    }
}
