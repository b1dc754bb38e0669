// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Target resolution presets offered for the live stream
///
/// Presets are "ideal" targets: the host picks the closest mode the device
/// supports instead of failing on an inexact match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResolutionPreset {
    /// 1280x720 (default)
    #[default]
    #[serde(rename = "720p")]
    Hd720,
    /// 1920x1080
    #[serde(rename = "1080p")]
    FullHd1080,
}

impl ResolutionPreset {
    /// All presets for UI iteration
    pub const ALL: [ResolutionPreset; 2] = [ResolutionPreset::Hd720, ResolutionPreset::FullHd1080];

    /// Target (width, height) in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ResolutionPreset::Hd720 => (1280, 720),
            ResolutionPreset::FullHd1080 => (1920, 1080),
        }
    }

    /// Short label ("720p" / "1080p")
    pub fn display_name(&self) -> &'static str {
        match self {
            ResolutionPreset::Hd720 => "720p",
            ResolutionPreset::FullHd1080 => "1080p",
        }
    }

    /// Parse a label as accepted on the command line
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "720p" | "720" | "hd" => Some(ResolutionPreset::Hd720),
            "1080p" | "1080" | "fullhd" | "fhd" => Some(ResolutionPreset::FullHd1080),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResolutionPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Capture session limits and defaults
pub mod session {
    /// Largest photo count a session may request
    pub const MAX_PHOTO_COUNT: u32 = 10;

    /// Photos taken when nothing is configured
    pub const DEFAULT_PHOTO_COUNT: u32 = 1;

    /// Longest countdown before a shot, in seconds
    pub const MAX_CAPTURE_DELAY_SECS: u32 = 30;

    /// Countdown before each shot when nothing is configured
    pub const DEFAULT_CAPTURE_DELAY_SECS: u32 = 3;

    /// Upper bound of the skin smoothing slider
    pub const MAX_SMOOTHING_LEVEL: u8 = 100;
}

/// Skin smoothing parameters
pub mod smoothing {
    /// Gaussian sigma in pixels at smoothing level 100
    pub const MAX_BLUR_SIGMA: f32 = 2.0;

    /// Smallest sigma handed to the blur; below it the kernel side weights
    /// underflow to zero and the blur corrupts the first row
    pub const MIN_BLUR_SIGMA: f32 = 0.25;

    /// Share of the blurred copy in the final pixel at level 100
    pub const MAX_BLEND: f32 = 0.6;
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// One countdown tick
    pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

    /// Time the scheduler stays in Firing before returning to Idle
    pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

    /// Pause between consecutive shots of one session
    pub const INTER_SHOT_PAUSE: Duration = Duration::from_millis(800);

    /// GStreamer pipeline playing state timeout on start
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// GStreamer pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 120;
}

/// GStreamer pipeline constants
pub mod pipeline {
    /// Maximum buffer queue size (keep small for low latency)
    pub const MAX_BUFFERS: u32 = 2;

    /// Output pixel format for appsink
    pub const OUTPUT_FORMAT: &str = "RGBA";

    /// Device class filter for the device monitor
    pub const VIDEO_SOURCE_CLASS: &str = "Video/Source";
}

/// Export constants
pub mod export {
    /// JPEG quality used for exported photos
    pub const DEFAULT_JPEG_QUALITY: u8 = 90;

    /// Directory under the pictures dir where sessions are exported
    pub const PICTURES_SUBDIR: &str = "photobooth";

    /// Manifest written next to the exported photos
    pub const MANIFEST_FILE: &str = "session.json";
}

/// Supported image file extensions for still-image sources
pub mod file_formats {
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}
