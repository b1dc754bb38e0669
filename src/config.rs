// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{ResolutionPreset, export, session as limits};
use crate::errors::AppError;
use crate::frames::FrameSelection;
use crate::pipelines::photo::{CaptureSession, CosmeticStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory under the user config dir
const CONFIG_DIR: &str = "photobooth";

const CONFIG_FILE: &str = "config.json";

/// Booth settings; every field falls back to its default when absent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Index into the enumerated camera list
    pub camera_index: usize,
    /// Ideal stream resolution
    pub resolution: ResolutionPreset,
    /// Photos per session (1-10)
    pub photo_count: u32,
    /// Countdown before each shot, in seconds (0-30)
    pub capture_delay_seconds: u32,
    /// Cosmetic style applied at capture
    pub style: CosmeticStyle,
    /// Skin smoothing level (0-100)
    pub smoothing_level: u8,
    /// Frame id: `none`, a bundled frame id or `custom`
    pub frame: String,
    /// Frame image used when `frame` is `custom`
    pub custom_frame_path: Option<PathBuf>,
    /// Where finished sessions are exported
    pub output_dir: PathBuf,
    /// JPEG quality for exported photos
    pub jpeg_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_index: 0,
            resolution: ResolutionPreset::default(),
            photo_count: limits::DEFAULT_PHOTO_COUNT,
            capture_delay_seconds: limits::DEFAULT_CAPTURE_DELAY_SECS,
            style: CosmeticStyle::None,
            smoothing_level: 0,
            frame: "none".to_string(),
            custom_frame_path: None,
            output_dir: crate::storage::default_output_dir(),
            jpeg_quality: export::DEFAULT_JPEG_QUALITY,
        }
    }
}

impl Config {
    /// `~/.config/photobooth/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Read a JSON config file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::Config(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Invalid config {}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Load from the given path, or the default location when `None`
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) => Self::load(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Resolve the frame id into a selection
    pub fn frame_selection(&self) -> Result<FrameSelection, AppError> {
        FrameSelection::parse(&self.frame, self.custom_frame_path.as_deref())
            .map_err(AppError::Config)
    }

    /// Validate the session settings
    pub fn session(&self) -> Result<CaptureSession, AppError> {
        let frame = self.frame_selection()?;
        let session = CaptureSession::new(
            self.photo_count,
            self.capture_delay_seconds,
            self.style,
            self.smoothing_level,
            frame,
        )?;
        Ok(session)
    }
}
