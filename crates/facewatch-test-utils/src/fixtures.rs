// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sample images, embeddings and configuration for tests.

use std::io::Cursor;
use std::path::Path;

use chrono::{DateTime, Utc};
use image::{ImageFormat, Rgb, RgbImage};

use facewatch_config::{DestinationConfig, FacewatchConfig};
use facewatch_core::{
    AttachmentHandle, FaceEmbedding, ImageAttachment, LiveMessage, MessageBody,
};

/// Embedding dimension used by fixtures.
pub const DIM: usize = 8;

/// The embedding of a detected face placed at the origin.
pub fn face_at_origin() -> FaceEmbedding {
    FaceEmbedding(vec![0.0; DIM])
}

/// An embedding at exactly `distance` from [`face_at_origin`], along `axis`.
pub fn embedding_at_distance(distance: f32, axis: usize) -> FaceEmbedding {
    let mut v = vec![0.0; DIM];
    v[axis % DIM] = distance;
    FaceEmbedding(v)
}

/// Encode a solid-colour image in the given format. Different `shade`
/// values produce different bytes.
pub fn sample_image(width: u32, height: u32, shade: u8, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([shade, 128, 255 - shade]));
    let mut buf = Cursor::new(Vec::new());
    // Encoding an in-memory RGB image cannot fail for these formats.
    img.write_to(&mut buf, format)
        .unwrap_or_else(|e| panic!("fixture encode failed: {e}"));
    buf.into_inner()
}

pub fn sample_png(shade: u8) -> Vec<u8> {
    sample_image(4, 3, shade, ImageFormat::Png)
}

pub fn sample_jpeg(shade: u8) -> Vec<u8> {
    sample_image(4, 3, shade, ImageFormat::Jpeg)
}

/// A live message carrying only an image.
pub fn live_image_message(
    id: &str,
    chat_id: &str,
    handle: AttachmentHandle,
    timestamp: DateTime<Utc>,
) -> LiveMessage {
    LiveMessage {
        id: id.to_string(),
        chat_id: chat_id.to_string(),
        sender: "15551110000".to_string(),
        is_from_me: false,
        timestamp,
        body: MessageBody {
            image: Some(ImageAttachment {
                handle,
                caption: None,
                jpeg_thumbnail: Some(vec![0xFF, 0xD8, 0xFF, 0xD9]),
                mimetype: Some("image/jpeg".to_string()),
            }),
            ..Default::default()
        },
    }
}

/// A live text message.
pub fn live_text_message(id: &str, chat_id: &str, text: &str) -> LiveMessage {
    LiveMessage {
        id: id.to_string(),
        chat_id: chat_id.to_string(),
        sender: "15551110000".to_string(),
        is_from_me: false,
        timestamp: Utc::now(),
        body: MessageBody {
            conversation: Some(text.to_string()),
            ..Default::default()
        },
    }
}

/// A configuration rooted in `dir`, with no groups or identities.
pub fn config_in(dir: &Path) -> FacewatchConfig {
    let mut config = FacewatchConfig::default();
    config.media.store_path = dir.join("media").display().to_string();
    config.storage.archive_path = dir.join("messages.db").display().to_string();
    config.face_detection.known_faces_dir = dir.join("known_faces").display().to_string();
    config.debug.output_dir = dir.join("debug").display().to_string();
    config
}

/// Add an identity and write its reference photos (one file per shade).
///
/// Returns the bytes of each reference photo in file-name order.
pub fn add_identity(
    config: &mut FacewatchConfig,
    key: &str,
    name: &str,
    destination: &str,
    shades: &[u8],
) -> Vec<Vec<u8>> {
    let dir = config.reference_dir(key);
    std::fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("fixture dir: {e}"));
    config.destinations.insert(
        key.to_string(),
        DestinationConfig {
            name: name.to_string(),
            group: destination.to_string(),
        },
    );
    shades
        .iter()
        .enumerate()
        .map(|(i, shade)| {
            let bytes = sample_png(*shade);
            std::fs::write(dir.join(format!("ref_{i}.png")), &bytes)
                .unwrap_or_else(|e| panic!("fixture write: {e}"));
            bytes
        })
        .collect()
}
