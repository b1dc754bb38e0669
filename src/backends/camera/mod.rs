// SPDX-License-Identifier: MPL-2.0

//! Camera host abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  Capture session /  │
//! │  preview surfaces   │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  StreamController   │  ← single live stream, fallback retry
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │   CameraHost trait  │  ← enumeration + acquisition
//! └──────────┬──────────┘
//!            │
//!       ┌────┴──────────┐
//!       ▼               ▼
//!  ┌──────────┐  ┌─────────────┐
//!  │GStreamer │  │ Still image │
//!  └──────────┘  └─────────────┘
//! ```

pub mod enumerator;
pub mod gst_host;
pub mod still_image;
pub mod stream_controller;
pub mod types;

pub use enumerator::DeviceEnumerator;
pub use gst_host::{GStreamerHost, GStreamerStream};
pub use still_image::StillImageHost;
pub use stream_controller::{StreamController, StreamHandle};
pub use types::*;

use crate::errors::{AcquireError, DeviceQueryError};
use std::future::Future;

/// A live capture stream handed out by a host
///
/// Exactly one of these is alive at a time; [`StreamController`] owns it.
pub trait LiveStream: Send + Sync {
    /// Most recent decoded frame, or `None` before the first frame arrives
    fn current_frame(&self) -> Option<CameraFrame>;

    /// Negotiated (width, height); (0, 0) until known
    fn resolution(&self) -> (u32, u32);

    /// Stop all tracks and release the device. Must be idempotent.
    fn stop(&mut self);

    /// Whether the stream is still delivering frames
    fn is_live(&self) -> bool;
}

/// Capture host: device enumeration and stream acquisition
///
/// Both operations may suspend (permission prompts, device startup).
pub trait CameraHost: Send + Sync {
    /// List video capture devices
    fn enumerate(&self) -> impl Future<Output = Result<Vec<DeviceDescriptor>, DeviceQueryError>> + Send;

    /// Open a stream honoring the constraints as closely as possible
    fn acquire(
        &self,
        constraints: &StreamConstraints,
    ) -> impl Future<Output = Result<Box<dyn LiveStream>, AcquireError>> + Send;

    /// Host name for logs
    fn name(&self) -> &'static str;
}
