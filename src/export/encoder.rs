//! PNG encoding of composited surfaces
//!
//! Two output shapes are produced from the same PNG bytes: a binary blob
//! (for object URLs) and a base64 data URL.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use image::RgbaImage;

use super::error::ExportError;
use crate::constants::EXPORT_MIME;
use crate::watermark::CompositeSurface;

/// Result of encoding a surface
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// The encoded image data
    pub data: Bytes,
    /// MIME type of `data`
    pub content_type: &'static str,
}

impl EncodedImage {
    pub fn png(data: Vec<u8>) -> Self {
        Self {
            data: Bytes::from(data),
            content_type: EXPORT_MIME,
        }
    }

    pub fn to_data_url(&self) -> String {
        data_url_from_bytes(self.content_type, &self.data)
    }
}

/// Encode RGBA pixels to PNG.
pub fn encode_png(image: &RgbaImage) -> Result<EncodedImage, ExportError> {
    use image::codecs::png::PngEncoder;
    use image::ImageEncoder as _;

    if image.width() == 0 || image.height() == 0 {
        return Err(ExportError::encode_failed("surface is empty"));
    }

    let mut output = Cursor::new(Vec::new());
    PngEncoder::new(&mut output)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ColorType::Rgba8,
        )
        .map_err(|e| ExportError::encode_failed(e.to_string()))?;

    Ok(EncodedImage::png(output.into_inner()))
}

/// Encode a surface to a PNG blob off the async executor.
pub async fn encode_blob(surface: &CompositeSurface) -> Result<EncodedImage, ExportError> {
    let pixels = surface.pixels().clone();
    tokio::task::spawn_blocking(move || encode_png(&pixels))
        .await
        .map_err(|e| ExportError::encode_failed(format!("encoder task failed: {}", e)))?
}

/// Encode a surface to a `data:image/png;base64,...` URL.
pub fn encode_data_url(surface: &CompositeSurface) -> Result<String, ExportError> {
    Ok(encode_png(surface.pixels())?.to_data_url())
}

pub fn data_url_from_bytes(mime: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(data))
}

/// Split a base64 data URL into its MIME type and decoded payload.
///
/// Returns `None` for anything that is not a well-formed base64 data URL.
pub fn decode_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let data = STANDARD.decode(payload.trim()).ok()?;
    Some((mime.to_string(), data))
}
