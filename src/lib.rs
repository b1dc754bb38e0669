// SPDX-License-Identifier: MPL-2.0

//! Photobooth - countdown capture sessions for a webcam
//!
//! This library provides the capture core of the photobooth: camera
//! enumeration and streaming, timed multi-shot sessions, cosmetic style
//! filters with skin smoothing, and hand-off of finished sessions to an
//! editor or exporter.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Camera host abstraction (GStreamer and still images)
//! - [`pipelines`]: Countdown, snapshot, filters and capture sessions
//! - [`frames`]: Decorative frame catalog and selection
//! - [`preview`]: Filter strings for the live preview
//! - [`feedback`]: Sound, notification and countdown overlay collaborators
//! - [`config`]: User configuration handling
//! - [`storage`]: Export of finished sessions
//!
//! # Example
//!
//! ```ignore
//! let mut controller = StreamController::new(GStreamerHost::new());
//! controller.refresh_devices().await;
//! let stream = controller.start(0, ResolutionPreset::Hd720).await?;
//!
//! let manager = CaptureSessionManager::new(
//!     Arc::new(CountdownScheduler::new()),
//!     CosmeticFilterEngine::new(),
//! );
//! manager.start(config.session()?, &stream).await?;
//! let exported = manager.hand_off_to(&DiskExporter::default()).await?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod feedback;
pub mod frames;
pub mod pipelines;
pub mod preview;
pub mod storage;

// Re-export commonly used types
pub use backends::camera::{GStreamerHost, StillImageHost, StreamController, StreamHandle};
pub use config::Config;
pub use constants::ResolutionPreset;
pub use errors::{AppError, AppResult};
pub use pipelines::photo::{
    CaptureSession, CaptureSessionManager, CosmeticFilterEngine, CosmeticStyle,
    CountdownScheduler, RasterImage,
};
pub use storage::DiskExporter;
