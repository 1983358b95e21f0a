// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Face embedding trait.

use async_trait::async_trait;

use crate::error::FacewatchError;
use crate::traits::adapter::PluginAdapter;
use crate::types::FaceEmbedding;

/// Computes face embeddings for an image.
///
/// Implementations must be deterministic for identical bytes. An image with
/// no detectable face yields an empty vector, not an error.
#[async_trait]
pub trait FaceEmbedder: PluginAdapter {
    /// Returns one embedding per detected face, in detection order.
    async fn embed_faces(&self, image: &[u8]) -> Result<Vec<FaceEmbedding>, FacewatchError>;
}
