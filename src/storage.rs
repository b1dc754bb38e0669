// SPDX-License-Identifier: MPL-2.0

//! Storage of finished sessions
//!
//! [`DiskExporter`] is the default [`Compositor`]: it writes the photos of a
//! session into their own timestamped directory together with a JSON
//! manifest describing how they were taken.

use crate::constants::export;
use crate::errors::AppError;
use crate::pipelines::photo::{Compositor, EncodingFormat, PhotoEncoder, SessionBundle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// `~/Pictures/photobooth`, or `./photobooth` without a pictures dir
pub fn default_output_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(export::PICTURES_SUBDIR)
}

/// Contents of `session.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionManifest {
    pub session_id: String,
    pub frame_id: String,
    /// Custom frame image, when the frame is `custom`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_path: Option<PathBuf>,
    pub style: String,
    pub smoothing_level: u8,
    pub photo_count: u32,
    pub capture_delay_seconds: u32,
    pub completed_at: String,
    /// Photo file names, in capture order
    pub photos: Vec<String>,
}

/// Where an exported session ended up
#[derive(Debug, Clone)]
pub struct ExportedSession {
    pub directory: PathBuf,
    pub photos: Vec<PathBuf>,
    pub manifest: PathBuf,
}

/// Writes session photos and a manifest to disk
#[derive(Debug, Clone)]
pub struct DiskExporter {
    output_dir: PathBuf,
    encoder: PhotoEncoder,
}

impl DiskExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            encoder: PhotoEncoder::new(),
        }
    }

    pub fn with_encoder(mut self, encoder: PhotoEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write every photo and the manifest of `bundle`
    pub async fn export(&self, bundle: SessionBundle) -> Result<ExportedSession, AppError> {
        let stamp = bundle.completed_at().format("%Y%m%d_%H%M%S").to_string();
        let directory = self.create_session_dir(&stamp).await?;
        info!(directory = %directory.display(), photos = bundle.photos().len(), "Exporting session");

        let extension = self.encoder.format().extension();
        let mut photos = Vec::with_capacity(bundle.photos().len());
        let mut names = Vec::with_capacity(bundle.photos().len());

        for (index, photo) in bundle.photos().iter().enumerate() {
            let name = format!("photo_{}.{}", index + 1, extension);
            let encoded = self.encoder.encode(photo.clone()).await?;
            let path = self.encoder.save(encoded, &directory.join(&name)).await?;
            debug!(path = %path.display(), "Photo exported");
            photos.push(path);
            names.push(name);
        }

        let manifest = SessionManifest {
            session_id: bundle.id().to_string(),
            frame_id: bundle.frame().id().to_string(),
            frame_path: match bundle.frame() {
                crate::frames::FrameSelection::Custom(path) => Some(path.clone()),
                _ => None,
            },
            style: bundle.style().name().to_string(),
            smoothing_level: bundle.smoothing_level(),
            photo_count: bundle.photo_count(),
            capture_delay_seconds: bundle.capture_delay_seconds(),
            completed_at: bundle.completed_at().to_rfc3339(),
            photos: names,
        };

        let manifest_path = directory.join(export::MANIFEST_FILE);
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| AppError::Storage(format!("Failed to serialize manifest: {}", e)))?;
        tokio::fs::write(&manifest_path, json).await?;

        info!(directory = %directory.display(), "Session exported");
        Ok(ExportedSession {
            directory,
            photos,
            manifest: manifest_path,
        })
    }

    /// `photobooth_<stamp>`, suffixed when a session finished in the same second
    async fn create_session_dir(&self, stamp: &str) -> Result<PathBuf, AppError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let base = format!("{}_{}", export::PICTURES_SUBDIR, stamp);
        let mut candidate = self.output_dir.join(&base);
        let mut suffix = 1;
        loop {
            match tokio::fs::create_dir(&candidate).await {
                Ok(()) => return Ok(candidate),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    suffix += 1;
                    candidate = self.output_dir.join(format!("{}_{}", base, suffix));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Default for DiskExporter {
    fn default() -> Self {
        Self::new(default_output_dir())
    }
}

impl Compositor for DiskExporter {
    type Output = ExportedSession;
    type Error = AppError;

    async fn compose(&self, bundle: SessionBundle) -> Result<ExportedSession, AppError> {
        self.export(bundle).await
    }
}

/// Encoding format for an output file name, by extension
pub fn format_for_path(path: &Path) -> Option<EncodingFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some(EncodingFormat::Jpeg),
        "png" => Some(EncodingFormat::Png),
        _ => None,
    }
}
