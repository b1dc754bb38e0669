// SPDX-License-Identifier: GPL-3.0-only

//! Async photo encoding
//!
//! This module encodes captured photos to:
//! - JPEG (with quality control, alpha dropped)
//! - PNG (lossless, alpha kept)
//!
//! Encoding and disk writes run on blocking tasks.

use super::raster::RasterImage;
use crate::constants::export;
use crate::errors::RasterError;
use image::{ImageFormat, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingFormat {
    /// JPEG format (lossy compression)
    #[default]
    Jpeg,
    /// PNG format (lossless compression)
    Png,
}

impl EncodingFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "jpg",
            EncodingFormat::Png => "png",
        }
    }
}

/// Encoded image data ready for saving
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: EncodingFormat,
    pub width: u32,
    pub height: u32,
}

/// Photo encoder
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    format: EncodingFormat,
    jpeg_quality: u8,
}

impl PhotoEncoder {
    /// JPEG at the default export quality
    pub fn new() -> Self {
        Self {
            format: EncodingFormat::Jpeg,
            jpeg_quality: export::DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_format(mut self, format: EncodingFormat) -> Self {
        self.format = format;
        self
    }

    /// JPEG quality 1-100; ignored for PNG
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn format(&self) -> EncodingFormat {
        self.format
    }

    /// Encode on a blocking task
    pub async fn encode(&self, image: RasterImage) -> Result<EncodedImage, RasterError> {
        info!(
            width = image.width(),
            height = image.height(),
            format = ?self.format,
            "Starting encoding"
        );

        let encoder = *self;
        tokio::task::spawn_blocking(move || encoder.encode_blocking(image))
            .await
            .map_err(|e| RasterError::Encoding(format!("Encoding task error: {}", e)))?
    }

    /// Encode on the calling thread
    pub fn encode_blocking(&self, image: RasterImage) -> Result<EncodedImage, RasterError> {
        let (width, height) = (image.width(), image.height());
        let rgba: RgbaImage = image.into();

        let data = match self.format {
            EncodingFormat::Jpeg => Self::encode_jpeg(&rgba, self.jpeg_quality)?,
            EncodingFormat::Png => Self::encode_png(&rgba)?,
        };

        debug!(size = data.len(), "Encoding complete");
        Ok(EncodedImage {
            data,
            format: self.format,
            width,
            height,
        })
    }

    /// Write encoded bytes to `path` on a blocking task
    pub async fn save(&self, encoded: EncodedImage, path: &Path) -> Result<PathBuf, RasterError> {
        let filepath = path.to_path_buf();
        info!(path = %filepath.display(), "Saving photo");

        let target = filepath.clone();
        tokio::task::spawn_blocking(move || std::fs::write(&target, &encoded.data))
            .await
            .map_err(|e| RasterError::SaveFailed(format!("Save task error: {}", e)))??;

        info!(path = %filepath.display(), "Photo saved successfully");
        Ok(filepath)
    }

    fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, RasterError> {
        // JPEG has no alpha channel
        let rgb: RgbImage = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();

        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
        encoder.encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )?;

        Ok(buffer)
    }

    fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RasterError> {
        let mut buffer = Vec::new();
        image.write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)?;
        Ok(buffer)
    }
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_extensions() {
        assert_eq!(EncodingFormat::Jpeg.extension(), "jpg");
        assert_eq!(EncodingFormat::Png.extension(), "png");
    }

    #[test]
    fn test_jpeg_quality_clamped() {
        let encoder = PhotoEncoder::new().with_jpeg_quality(0);
        assert_eq!(encoder.jpeg_quality, 1);
        let encoder = PhotoEncoder::new().with_jpeg_quality(250);
        assert_eq!(encoder.jpeg_quality, 100);
    }

    #[test]
    fn test_encode_produces_valid_files() {
        let image = RasterImage::filled(16, 8, [200, 100, 50, 255]);

        let jpeg = PhotoEncoder::new().encode_blocking(image.clone()).unwrap();
        assert_eq!(&jpeg.data[..2], &[0xFF, 0xD8], "JPEG SOI marker");

        let png = PhotoEncoder::new()
            .with_format(EncodingFormat::Png)
            .encode_blocking(image)
            .unwrap();
        let decoded = image::load_from_memory(&png.data).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (16, 8));
        assert_eq!(decoded.get_pixel(3, 3).0, [200, 100, 50, 255]);
    }
}
