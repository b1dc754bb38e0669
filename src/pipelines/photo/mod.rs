// SPDX-License-Identifier: MPL-2.0

//! Photo capture pipeline
//!
//! ```text
//! StreamHandle → Countdown → Snapshot → Style → Skin smoothing → Session photos
//!       ↓                                                              ↓
//! Preview continues uninterrupted                           Compositor / export
//! ```
//!
//! # Modules
//!
//! - [`countdown`]: Countdown state machine and timer-driven scheduler
//! - [`snapshot`]: Copy of the current live frame
//! - [`filters`]: Cosmetic styles and skin smoothing
//! - [`session`]: Multi-shot capture sessions and hand-off
//! - [`encoding`]: JPEG/PNG encoding

pub mod countdown;
pub mod encoding;
pub mod filters;
pub mod raster;
pub mod session;
pub mod snapshot;

pub use countdown::{
    Countdown, CountdownEvent, CountdownPhase, CountdownScheduler, CountdownStep, CountdownTick,
};
pub use encoding::{EncodedImage, EncodingFormat, PhotoEncoder};
pub use filters::{CosmeticFilterEngine, CosmeticStyle};
pub use raster::RasterImage;
pub use session::{
    CaptureSession, CaptureSessionManager, Compositor, SessionBundle, SessionEvent, SessionPhase,
};
pub use snapshot::FrameSnapshotter;
