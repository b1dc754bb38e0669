// SPDX-License-Identifier: MPL-2.0

//! Frame snapshot from the live stream
//!
//! Copies the frame currently shown by the stream into an owned buffer at
//! the stream's native resolution. The preview keeps running.

use super::raster::RasterImage;
use crate::backends::camera::StreamHandle;
use crate::errors::EmptyFrameError;
use tracing::{debug, info, warn};

/// Snapshot handler
pub struct FrameSnapshotter;

impl FrameSnapshotter {
    /// Copy the current frame of the stream
    ///
    /// # Returns
    /// * `Ok(RasterImage)` - Packed RGBA copy of the frame
    /// * `Err(EmptyFrameError)` - The stream has not produced a frame yet,
    ///   or was stopped
    pub fn snapshot(handle: &StreamHandle) -> Result<RasterImage, EmptyFrameError> {
        let empty = || {
            let (width, height) = handle.resolution();
            EmptyFrameError { width, height }
        };

        let Some(frame) = handle.current_frame() else {
            warn!(stream = %handle.id(), "Snapshot before the stream produced a frame");
            return Err(empty());
        };

        if frame.is_empty() {
            warn!(
                width = frame.width,
                height = frame.height,
                "Snapshot of a zero-sized frame"
            );
            return Err(EmptyFrameError {
                width: frame.width,
                height: frame.height,
            });
        }

        let image = RasterImage::from_frame(&frame).map_err(|e| {
            warn!(error = %e, "Frame buffer does not match its dimensions");
            EmptyFrameError {
                width: frame.width,
                height: frame.height,
            }
        })?;

        debug!(
            age_ms = frame.captured_at.elapsed().as_millis() as u64,
            "Snapshot source frame"
        );
        info!(width = image.width(), height = image.height(), "Frame captured");
        Ok(image)
    }
}
