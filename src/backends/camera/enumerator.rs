// SPDX-License-Identifier: GPL-3.0-only

//! Video capture device enumeration

use super::CameraHost;
use super::types::DeviceDescriptor;
use crate::errors::DeviceQueryError;
use tracing::{info, warn};

/// Lists video capture devices through a [`CameraHost`]
pub struct DeviceEnumerator;

impl DeviceEnumerator {
    /// List devices, failing if the host refuses enumeration
    pub async fn list_devices<H: CameraHost>(
        host: &H,
    ) -> Result<Vec<DeviceDescriptor>, DeviceQueryError> {
        let devices = host.enumerate().await?;
        info!(host = host.name(), count = devices.len(), "Enumerated cameras");
        for (index, device) in devices.iter().enumerate() {
            info!(index, id = %device.id, label = %device.display_label(index), "Camera");
        }
        Ok(devices)
    }

    /// List devices, degrading to an empty list when enumeration is denied
    ///
    /// Callers then start the host's default device.
    pub async fn list_devices_or_empty<H: CameraHost>(host: &H) -> Vec<DeviceDescriptor> {
        match Self::list_devices(host).await {
            Ok(devices) => devices,
            Err(e) => {
                warn!(host = host.name(), error = %e, "Device enumeration failed, using default device");
                Vec::new()
            }
        }
    }
}
