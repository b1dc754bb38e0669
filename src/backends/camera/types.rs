// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera host abstraction

//! Shared types for camera hosts

use crate::constants::ResolutionPreset;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Opaque host-assigned device identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A video capture device as reported by enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: DeviceId,
    /// Human readable name; may be empty when the host hides labels
    pub label: String,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: DeviceId(id.into()),
            label: label.into(),
        }
    }

    /// Label for display, falling back to "Camera N" (1-based) like browsers do
    pub fn display_label(&self, index: usize) -> String {
        if self.label.trim().is_empty() {
            format!("Camera {}", index + 1)
        } else {
            self.label.clone()
        }
    }
}

/// Which way the requested camera should face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FacingMode {
    /// Front camera, facing the person at the booth
    #[default]
    User,
    /// Rear camera
    Environment,
}

/// A constraint the host should try to honor but may relax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ideal<T>(pub T);

/// Stream request passed to a host
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamConstraints {
    pub device: Option<Ideal<DeviceId>>,
    pub width: Option<Ideal<u32>>,
    pub height: Option<Ideal<u32>>,
    pub facing: Option<FacingMode>,
}

impl StreamConstraints {
    /// Full request: device (if known) and preset resolution, both ideal
    pub fn for_preset(device: Option<&DeviceDescriptor>, preset: ResolutionPreset) -> Self {
        let (width, height) = preset.dimensions();
        Self {
            device: device.map(|d| Ideal(d.id.clone())),
            width: Some(Ideal(width)),
            height: Some(Ideal(height)),
            facing: Some(FacingMode::User),
        }
    }

    /// Fallback request: front-facing camera only, no resolution, no device
    pub fn minimal() -> Self {
        Self {
            device: None,
            width: None,
            height: None,
            facing: Some(FacingMode::User),
        }
    }

    /// Requested (width, height) if both are set
    pub fn target_size(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(Ideal(w)), Some(Ideal(h))) => Some((w, h)),
            _ => None,
        }
    }

    pub fn is_minimal(&self) -> bool {
        self.device.is_none() && self.width.is_none() && self.height.is_none()
    }
}

/// One decoded RGBA frame from a live stream
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row; at least width * 4
    pub stride: u32,
    pub data: Arc<[u8]>,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed RGBA frame
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width * 4,
            data: Arc::from(data.into_boxed_slice()),
            captured_at: Instant::now(),
        }
    }

    /// True when the frame carries no pixels (stream not ready)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }
}

/// Observable state of the stream owned by the controller
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StreamStatus {
    #[default]
    Stopped,
    Ready {
        device: Option<DeviceDescriptor>,
        width: u32,
        height: u32,
        /// Acquired with the relaxed fallback constraints
        fallback: bool,
    },
}

impl StreamStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, StreamStatus::Ready { .. })
    }
}
