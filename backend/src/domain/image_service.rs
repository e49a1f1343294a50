//! # Image Uploads
//!
//! Photos and logos are re-encoded before they are stored: downscale so the
//! longest edge fits the configured dimension, then step JPEG quality down
//! from 90 until the file fits its size ceiling.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use shared::UploadResponse;
use std::str::FromStr;
use tracing::{info, warn};

use super::error::{SchoolError, SchoolResult};
use crate::config::UploadConfig;
use crate::storage::UploadStore;

const START_QUALITY: u8 = 90;
const MIN_QUALITY: u8 = 10;
const QUALITY_STEP: usize = 10;

/// Which size ceiling applies to an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    General,
    /// Small thumbnails such as ID-card photos
    Compact,
}

impl FromStr for UploadKind {
    type Err = SchoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "general" => Ok(UploadKind::General),
            "compact" => Ok(UploadKind::Compact),
            other => Err(SchoolError::validation(format!("Unknown upload kind: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub quality: u8,
}

/// Decode, downscale and re-encode until the JPEG fits `max_bytes`
pub fn compress_image(raw: &[u8], max_dimension: u32, max_bytes: usize) -> SchoolResult<CompressedImage> {
    let decoded = image::load_from_memory(raw)
        .map_err(|e| SchoolError::Upload(format!("Unsupported or corrupt image: {}", e)))?;

    let (width, height) = decoded.dimensions();
    let resized: DynamicImage = if width.max(height) > max_dimension {
        decoded.resize(max_dimension, max_dimension, FilterType::Triangle)
    } else {
        decoded
    };
    let rgb = resized.to_rgb8();

    for quality in (MIN_QUALITY..=START_QUALITY).rev().step_by(QUALITY_STEP) {
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, quality)
            .encode_image(&rgb)
            .map_err(|e| SchoolError::Upload(format!("Failed to encode JPEG: {}", e)))?;

        if buffer.len() <= max_bytes {
            return Ok(CompressedImage { bytes: buffer, quality });
        }
    }

    Err(SchoolError::Upload(format!(
        "Image cannot be compressed below {} KB",
        max_bytes / 1024
    )))
}

#[derive(Clone)]
pub struct ImageService {
    store: UploadStore,
    config: UploadConfig,
}

impl ImageService {
    pub fn new(store: UploadStore, config: UploadConfig) -> Self {
        Self { store, config }
    }

    pub fn ceiling(&self, kind: UploadKind) -> usize {
        match kind {
            UploadKind::General => self.config.general_max_bytes,
            UploadKind::Compact => self.config.compact_max_bytes,
        }
    }

    /// Compress and store an uploaded image, returning its public path
    pub async fn upload(&self, owner_id: &str, kind: UploadKind, raw: Vec<u8>) -> SchoolResult<UploadResponse> {
        info!("Uploading {:?} image of {} bytes", kind, raw.len());
        if raw.is_empty() {
            return Err(SchoolError::Upload("Empty upload".to_string()));
        }

        let max_bytes = self.ceiling(kind);
        let max_dimension = self.config.max_dimension;
        let compressed = tokio::task::spawn_blocking(move || compress_image(&raw, max_dimension, max_bytes))
            .await
            .map_err(|e| SchoolError::Upload(format!("Compression task failed: {}", e)))?;

        let compressed = match compressed {
            Ok(c) => c,
            Err(e) => {
                warn!("Rejected upload: {}", e);
                return Err(e);
            }
        };

        let path = self.store.store_jpeg(owner_id, &compressed.bytes).await?;
        Ok(UploadResponse { path, size_bytes: compressed.bytes.len(), quality: compressed.quality })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(image: RgbImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image).write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn flat(width: u32, height: u32) -> Vec<u8> {
        png(ImageBuffer::from_pixel(width, height, Rgb([40u8, 120, 200])))
    }

    /// Pseudo-random pixels that JPEG cannot squeeze
    fn noisy(width: u32, height: u32) -> Vec<u8> {
        let mut state: u32 = 0x1234_5678;
        png(ImageBuffer::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [a, b, c, _] = state.to_le_bytes();
            Rgb([a, b, c])
        }))
    }

    #[test]
    fn test_large_image_is_downscaled_and_fits() {
        let result = compress_image(&flat(2048, 1024), 1024, 20 * 1024).unwrap();
        assert!(result.bytes.len() <= 20 * 1024);
        assert_eq!(result.quality, 90);

        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (1024, 512));
    }

    #[test]
    fn test_small_image_is_not_upscaled() {
        let result = compress_image(&flat(200, 100), 1024, 20 * 1024).unwrap();
        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (200, 100));
    }

    #[test]
    fn test_incompressible_image_fails() {
        let result = compress_image(&noisy(1024, 1024), 1024, 5 * 1024);
        assert!(matches!(result, Err(SchoolError::Upload(_))));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(compress_image(b"not an image", 1024, 1024), Err(SchoolError::Upload(_))));
    }

    #[test]
    fn test_upload_kind_parsing() {
        assert_eq!("".parse::<UploadKind>().unwrap(), UploadKind::General);
        assert_eq!("Compact".parse::<UploadKind>().unwrap(), UploadKind::Compact);
        assert!("huge".parse::<UploadKind>().is_err());
    }

    #[tokio::test]
    async fn test_upload_stores_under_owner() {
        let dir = tempfile::tempdir().unwrap();
        let service = ImageService::new(UploadStore::new(dir.path()), UploadConfig::default());

        let response = service.upload("owner-9", UploadKind::Compact, flat(300, 300)).await.unwrap();
        assert!(response.path.starts_with("/uploads/owner-9/"));
        assert!(response.size_bytes <= 5 * 1024);

        assert!(matches!(
            service.upload("owner-9", UploadKind::General, Vec::new()).await,
            Err(SchoolError::Upload(_))
        ));
    }
}
