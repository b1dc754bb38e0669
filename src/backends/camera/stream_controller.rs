// SPDX-License-Identifier: GPL-3.0-only

//! Live stream ownership
//!
//! The controller provides:
//! - At most one live stream at any time (the old one is stopped first)
//! - A single constraint-relaxation retry on overconstrained requests
//! - A "stream ready" watch channel for preview surfaces
//! - Device failures forwarded to an optional [`Notifier`]

use super::enumerator::DeviceEnumerator;
use super::types::*;
use super::{CameraHost, LiveStream};
use crate::constants::ResolutionPreset;
use crate::errors::{AcquireError, CameraUnavailableError};
use crate::feedback::{Notifier, Severity};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

struct HandleInner {
    id: Uuid,
    device: Option<DeviceDescriptor>,
    fallback: bool,
    stream: Mutex<Box<dyn LiveStream>>,
}

/// Shared view of the active stream
///
/// Clones refer to the same stream. Once the controller replaces or stops
/// it, every clone reports no frame.
#[derive(Clone)]
pub struct StreamHandle {
    inner: Arc<HandleInner>,
}

impl StreamHandle {
    fn new(device: Option<DeviceDescriptor>, fallback: bool, stream: Box<dyn LiveStream>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: Uuid::new_v4(),
                device,
                fallback,
                stream: Mutex::new(stream),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Device the stream was requested on, if one was known
    pub fn device(&self) -> Option<&DeviceDescriptor> {
        self.inner.device.as_ref()
    }

    /// Whether the stream came from the minimal fallback constraints
    pub fn used_fallback(&self) -> bool {
        self.inner.fallback
    }

    pub fn current_frame(&self) -> Option<CameraFrame> {
        self.inner.stream.lock().current_frame()
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.inner.stream.lock().resolution()
    }

    pub fn is_live(&self) -> bool {
        self.inner.stream.lock().is_live()
    }

    fn stop(&self) {
        self.inner.stream.lock().stop();
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("id", &self.inner.id)
            .field("device", &self.inner.device)
            .field("fallback", &self.inner.fallback)
            .finish()
    }
}

/// Owns the single active camera stream
pub struct StreamController<H: CameraHost> {
    host: H,
    devices: Vec<DeviceDescriptor>,
    active: Option<StreamHandle>,
    active_index: Option<usize>,
    preset: ResolutionPreset,
    status_tx: watch::Sender<StreamStatus>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl<H: CameraHost> StreamController<H> {
    pub fn new(host: H) -> Self {
        let (status_tx, _) = watch::channel(StreamStatus::Stopped);
        Self {
            host,
            devices: Vec::new(),
            active: None,
            active_index: None,
            preset: ResolutionPreset::default(),
            status_tx,
            notifier: None,
        }
    }

    /// Report enumeration and acquisition failures to the user
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Re-enumerate devices; a denied enumeration leaves the list empty
    pub async fn refresh_devices(&mut self) -> &[DeviceDescriptor] {
        self.devices = match DeviceEnumerator::list_devices(&self.host).await {
            Ok(devices) => devices,
            Err(e) => {
                warn!(host = self.host.name(), error = %e, "Device enumeration failed, using default device");
                if let Some(notifier) = &self.notifier {
                    notifier.notify(
                        &format!("Could not list cameras ({}), using the default camera", e),
                        Severity::Warning,
                    );
                }
                Vec::new()
            }
        };
        &self.devices
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    /// Start the given device at the given preset, replacing any live stream
    ///
    /// An index outside the device list requests the host's default device.
    pub async fn start(
        &mut self,
        device_index: usize,
        preset: ResolutionPreset,
    ) -> Result<StreamHandle, CameraUnavailableError> {
        // Never two live streams
        self.stop();

        let device = self.devices.get(device_index).cloned();
        let request = StreamConstraints::for_preset(device.as_ref(), preset);

        info!(
            host = self.host.name(),
            device = ?device.as_ref().map(|d| d.display_label(device_index)),
            preset = %preset,
            "Starting camera stream"
        );

        let (stream, fallback) = match self.host.acquire(&request).await {
            Ok(stream) => (stream, false),
            Err(e) if e.is_overconstrained() => {
                warn!(error = %e, "Requested constraints unsupported, retrying with minimal constraints");
                match self.host.acquire(&StreamConstraints::minimal()).await {
                    Ok(stream) => (stream, true),
                    Err(e) => return Err(self.unavailable(e)),
                }
            }
            Err(e) => return Err(self.unavailable(e)),
        };

        let (width, height) = stream.resolution();
        let handle = StreamHandle::new(device.clone(), fallback, stream);
        self.active = Some(handle.clone());
        self.active_index = Some(device_index);
        self.preset = preset;

        info!(id = %handle.id(), width, height, fallback, "Camera stream ready");
        self.status_tx.send_replace(StreamStatus::Ready {
            device,
            width,
            height,
            fallback,
        });

        Ok(handle)
    }

    /// Switch to another device at the current preset
    pub async fn switch_to(
        &mut self,
        device_index: usize,
    ) -> Result<StreamHandle, CameraUnavailableError> {
        self.start(device_index, self.preset).await
    }

    /// Cycle to the next enumerated device
    pub async fn switch_to_next(&mut self) -> Result<StreamHandle, CameraUnavailableError> {
        let next = match (self.active_index, self.devices.len()) {
            (_, 0) => 0,
            (Some(current), len) => (current + 1) % len,
            (None, _) => 0,
        };
        self.switch_to(next).await
    }

    /// Restart the current device at another preset
    pub async fn change_resolution(
        &mut self,
        preset: ResolutionPreset,
    ) -> Result<StreamHandle, CameraUnavailableError> {
        self.start(self.active_index.unwrap_or(0), preset).await
    }

    /// Release the live stream; no-op when nothing is running
    pub fn stop(&mut self) {
        let Some(handle) = self.active.take() else {
            return;
        };
        info!(id = %handle.id(), "Stopping camera stream");
        handle.stop();
        self.active_index = None;
        self.status_tx.send_replace(StreamStatus::Stopped);
    }

    pub fn active(&self) -> Option<&StreamHandle> {
        self.active.as_ref()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn preset(&self) -> ResolutionPreset {
        self.preset
    }

    /// Subscribe to stream ready / stopped notifications
    pub fn subscribe(&self) -> watch::Receiver<StreamStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> StreamStatus {
        self.status_tx.borrow().clone()
    }

    fn unavailable(&self, err: AcquireError) -> CameraUnavailableError {
        let reason = err.reason();
        warn!(reason = %reason, error = %err, "Camera unavailable");
        if let Some(notifier) = &self.notifier {
            notifier.notify(reason.user_message(), Severity::Error);
        }
        CameraUnavailableError::new(reason, err.to_string())
    }
}

impl<H: CameraHost> Drop for StreamController<H> {
    fn drop(&mut self) {
        self.stop();
    }
}
