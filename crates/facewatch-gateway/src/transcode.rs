// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound media normalization.

use image::GenericImageView;
use image::codecs::jpeg::JpegEncoder;

use facewatch_core::FacewatchError;

/// Quality used for every re-encoded image.
pub const JPEG_QUALITY: u8 = 100;

/// Fallback content type for unrecognized video containers.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// An image re-encoded as JPEG.
#[derive(Debug, Clone)]
pub struct JpegImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decodes any supported image format and re-encodes it as JPEG.
pub fn to_jpeg(data: &[u8]) -> Result<JpegImage, FacewatchError> {
    let img = image::load_from_memory(data)
        .map_err(|e| FacewatchError::dispatch("error decoding image", e))?;
    let (width, height) = img.dimensions();

    // JPEG has no alpha channel; transparent pixels keep their colour.
    let rgb = img.to_rgb8();
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| FacewatchError::dispatch("error encoding JPEG", e))?;

    Ok(JpegImage {
        data,
        width,
        height,
    })
}

/// Detects a video content type from its leading bytes.
pub fn sniff_video_mimetype(data: &[u8]) -> &'static str {
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        let brand = &data[8..12];
        return if brand == b"qt  " {
            "video/quicktime"
        } else if brand.starts_with(b"3g") {
            "video/3gpp"
        } else {
            "video/mp4"
        };
    }
    if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return "video/webm";
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"AVI " {
        return "video/x-msvideo";
    }
    OCTET_STREAM
}
