use crate::common::{GateError, Result};
use crate::core::object_key::ObjectKey;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage};
use std::path::Path;

pub const DEFAULT_MIME: &str = "image/jpeg";

/// Image payload pending authentication, from either a capture or a file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlob {
    bytes: Bytes,
    mime: String,
    file_name: String,
}

impl ImageBlob {
    pub fn new(bytes: impl Into<Bytes>, mime: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
            file_name: file_name.into(),
        }
    }

    /// Reads an image file from disk. Only the MIME category is checked.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mime = mime_for_path(path).ok_or_else(|| {
            GateError::UnsupportedFile(format!("{} is not an image", path.display()))
        })?;

        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();

        tracing::debug!("Selected {} ({}, {} bytes)", file_name, mime, bytes.len());
        Ok(Self::new(bytes, mime, file_name))
    }

    /// Scales a frame onto a `width`x`height` surface and encodes it as JPEG.
    pub fn from_frame(frame: &DynamicImage, width: u32, height: u32, quality: u8) -> Result<Self> {
        let surface = if frame.width() == width && frame.height() == height {
            frame.to_rgb8()
        } else {
            frame.resize_exact(width, height, FilterType::Triangle).to_rgb8()
        };

        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, quality)
            .encode(surface.as_raw(), width, height, ColorType::Rgb8)
            .map_err(|e| GateError::Capture(format!("JPEG encoding failed: {}", e)))?;

        if encoded.is_empty() {
            return Err(GateError::Capture("Encoder produced no data".into()));
        }

        Ok(Self::new(encoded, DEFAULT_MIME, ObjectKey::generate().to_string()))
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Content type sent with the upload.
    pub fn content_type(&self) -> &str {
        if self.mime.is_empty() {
            DEFAULT_MIME
        } else {
            &self.mime
        }
    }
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        "avif" => "image/avif",
        "heic" => "image/heic",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime)
}
