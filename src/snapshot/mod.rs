//! Immutable encoded image buffers that make up edit history.

use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::Engine;
use image::{ImageFormat, RgbaImage};
use thiserror::Error;

use crate::geometry::ImageSize;

const DATA_URL_PREFIX: &str = "data:";
const DATA_URL_BASE64_MARKER: &str = ";base64,";
const PNG_MIME: &str = "image/png";

static NEXT_SNAPSHOT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid data url: {message}")]
    InvalidDataUrl { message: String },
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("image has no pixels")]
    EmptyImage,
}

pub type SnapshotResult<T> = std::result::Result<T, SnapshotError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotId(u64);

impl SnapshotId {
    fn allocate() -> Self {
        Self(NEXT_SNAPSHOT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A PNG-encoded image that is never mutated once created.
///
/// Clones share the encoded buffer and keep the same id.
#[derive(Debug, Clone)]
pub struct ImageSnapshot {
    id: SnapshotId,
    size: ImageSize,
    encoded: Arc<[u8]>,
}

impl PartialEq for ImageSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ImageSnapshot {}

impl ImageSnapshot {
    pub fn from_pixels(pixels: &RgbaImage) -> SnapshotResult<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(SnapshotError::EmptyImage);
        }
        let mut buffer = Cursor::new(Vec::new());
        pixels
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(SnapshotError::Encode)?;
        Ok(Self {
            id: SnapshotId::allocate(),
            size: ImageSize::new(pixels.width(), pixels.height()),
            encoded: Arc::from(buffer.into_inner()),
        })
    }

    /// Decodes any supported image encoding and stores it as PNG.
    pub fn from_encoded(bytes: &[u8]) -> SnapshotResult<Self> {
        let pixels = image::load_from_memory(bytes)
            .map_err(SnapshotError::Decode)?
            .to_rgba8();
        Self::from_pixels(&pixels)
    }

    pub fn from_data_url(data_url: &str) -> SnapshotResult<Self> {
        let payload = parse_data_url(data_url)?;
        let bytes = base64::engine::general_purpose::STANDARD.decode(payload)?;
        Self::from_encoded(&bytes)
    }

    pub const fn id(&self) -> SnapshotId {
        self.id
    }

    pub const fn size(&self) -> ImageSize {
        self.size
    }

    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn to_data_url(&self) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(&self.encoded);
        format!("{DATA_URL_PREFIX}{PNG_MIME}{DATA_URL_BASE64_MARKER}{payload}")
    }

    /// Decodes a fresh RGBA pixel buffer owned by the caller.
    pub fn decode(&self) -> SnapshotResult<RgbaImage> {
        let pixels = image::load_from_memory_with_format(&self.encoded, ImageFormat::Png)
            .map_err(SnapshotError::Decode)?
            .to_rgba8();
        Ok(pixels)
    }
}

fn parse_data_url(data_url: &str) -> SnapshotResult<&str> {
    let rest = data_url
        .trim()
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or_else(|| SnapshotError::InvalidDataUrl {
            message: "missing `data:` prefix".to_string(),
        })?;
    let (mime, payload) =
        rest.split_once(DATA_URL_BASE64_MARKER)
            .ok_or_else(|| SnapshotError::InvalidDataUrl {
                message: "expected a base64 payload".to_string(),
            })?;
    if !mime.starts_with("image/") {
        return Err(SnapshotError::InvalidDataUrl {
            message: format!("unsupported mime type `{mime}`"),
        });
    }
    if payload.is_empty() {
        return Err(SnapshotError::InvalidDataUrl {
            message: "payload is empty".to_string(),
        });
    }
    Ok(payload)
}

#[cfg(test)]
pub(crate) fn solid_snapshot(width: u32, height: u32, rgba: [u8; 4]) -> ImageSnapshot {
    let pixels = RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    ImageSnapshot::from_pixels(&pixels).expect("solid image should encode")
}
