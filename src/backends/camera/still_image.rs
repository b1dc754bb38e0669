// SPDX-License-Identifier: GPL-3.0-only

//! Still-image camera host
//!
//! Serves a single image file (or a generated test pattern) as a live
//! stream. Used for kiosks without a camera and for dry runs of a session.

use super::types::*;
use super::{CameraHost, LiveStream};
use crate::constants::{ResolutionPreset, file_formats};
use crate::errors::{AcquireError, DeviceQueryError, RasterError};
use std::path::Path;
use tracing::{debug, info};

/// Device id reported for the still-image source
pub const STILL_IMAGE_DEVICE_ID: &str = "still-image";

#[derive(Debug, Clone)]
enum StillSource {
    Image(CameraFrame),
    TestPattern,
}

/// Host exposing one fake device that always shows the same picture
#[derive(Debug, Clone)]
pub struct StillImageHost {
    source: StillSource,
    label: String,
}

impl StillImageHost {
    /// Serve the image at `path`
    pub fn from_path(path: &Path) -> Result<Self, RasterError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if !file_formats::is_image_extension(&extension) {
            return Err(RasterError::Encoding(format!(
                "Unsupported image format: {}",
                extension
            )));
        }

        let frame = load_image_as_frame(path)?;
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Still image".to_string());

        Ok(Self {
            source: StillSource::Image(frame),
            label,
        })
    }

    /// Serve a generated gradient at the requested resolution
    pub fn test_pattern() -> Self {
        Self {
            source: StillSource::TestPattern,
            label: "Test pattern".to_string(),
        }
    }

    fn descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor::new(STILL_IMAGE_DEVICE_ID, self.label.clone())
    }
}

impl CameraHost for StillImageHost {
    async fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, DeviceQueryError> {
        Ok(vec![self.descriptor()])
    }

    async fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn LiveStream>, AcquireError> {
        if let Some(Ideal(id)) = &constraints.device {
            if id.as_str() != STILL_IMAGE_DEVICE_ID {
                debug!(device = %id, "Unknown device requested, serving still image");
            }
        }

        let frame = match &self.source {
            StillSource::Image(frame) => frame.clone(),
            StillSource::TestPattern => {
                let (width, height) = constraints
                    .target_size()
                    .unwrap_or_else(|| ResolutionPreset::default().dimensions());
                test_pattern_frame(width, height)
            }
        };

        info!(
            label = %self.label,
            width = frame.width,
            height = frame.height,
            "Still image stream started"
        );

        Ok(Box::new(StillImageStream {
            frame: Some(frame),
        }))
    }

    fn name(&self) -> &'static str {
        "still-image"
    }
}

/// Stream that repeats one frame until stopped
pub struct StillImageStream {
    frame: Option<CameraFrame>,
}

impl LiveStream for StillImageStream {
    fn current_frame(&self) -> Option<CameraFrame> {
        self.frame.clone()
    }

    fn resolution(&self) -> (u32, u32) {
        self.frame
            .as_ref()
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0))
    }

    fn stop(&mut self) {
        self.frame = None;
    }

    fn is_live(&self) -> bool {
        self.frame.is_some()
    }
}

/// Load an image file as a tightly packed RGBA frame
pub fn load_image_as_frame(path: &Path) -> Result<CameraFrame, RasterError> {
    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        RasterError::Encoding(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();

    debug!(width, height, "Image loaded");
    Ok(CameraFrame::from_rgba(width, height, rgba.into_raw()))
}

/// Horizontal red ramp over a vertical green ramp on mid blue
fn test_pattern_frame(width: u32, height: u32) -> CameraFrame {
    let mut data = Vec::with_capacity((width as usize) * (height as usize) * 4);
    let wmax = width.saturating_sub(1).max(1);
    let hmax = height.saturating_sub(1).max(1);
    for y in 0..height {
        for x in 0..width {
            data.push((x * 255 / wmax) as u8);
            data.push((y * 255 / hmax) as u8);
            data.push(128);
            data.push(255);
        }
    }
    CameraFrame::from_rgba(width, height, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pattern_uses_requested_size() {
        let host = StillImageHost::test_pattern();
        let constraints = StreamConstraints::for_preset(None, ResolutionPreset::Hd720);
        let stream = host.acquire(&constraints).await.unwrap();
        assert_eq!(stream.resolution(), (1280, 720));

        let frame = stream.current_frame().unwrap();
        assert_eq!(frame.data.len(), 1280 * 720 * 4);
        assert_eq!(&frame.data[..4], &[0, 0, 128, 255]);
    }

    #[tokio::test]
    async fn test_stop_clears_frame() {
        let host = StillImageHost::test_pattern();
        let mut stream = host.acquire(&StreamConstraints::minimal()).await.unwrap();
        assert!(stream.is_live());
        stream.stop();
        stream.stop();
        assert!(!stream.is_live());
        assert!(stream.current_frame().is_none());
    }

    #[test]
    fn test_rejects_non_image_path() {
        let err = StillImageHost::from_path(Path::new("clip.mp4")).unwrap_err();
        assert!(matches!(err, RasterError::Encoding(_)));
    }

    #[test]
    fn test_loads_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        image::RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let host = StillImageHost::from_path(&path).unwrap();
        assert_eq!(host.label, "pic.png");
        let frame = load_image_as_frame(&path).unwrap();
        assert_eq!((frame.width, frame.height), (4, 3));
        assert_eq!(&frame.data[..4], &[10, 20, 30, 255]);
    }
}
