// SPDX-License-Identifier: MPL-2.0

//! Error types for the photobooth
//!
//! Device and stream failures are recovered or reported where they happen;
//! only [`AppError`] crosses into the CLI.

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Device enumeration was refused
    DeviceQuery(DeviceQueryError),
    /// No stream could be acquired, even with relaxed constraints
    Camera(CameraUnavailableError),
    /// A capture session step failed
    Session(SessionError),
    /// Pixel buffer or encoding errors
    Raster(RasterError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Enumeration of capture devices was denied by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceQueryError {
    /// Host refused enumeration permission
    PermissionDenied,
    /// Host-side failure while listing devices
    Backend(String),
}

/// Why a stream could not be acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraFailureReason {
    PermissionDenied,
    NoDevice,
    ConstraintError,
    Unknown,
}

impl CameraFailureReason {
    /// Stable kebab-case identifier for logs and manifests
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraFailureReason::PermissionDenied => "permission-denied",
            CameraFailureReason::NoDevice => "no-device",
            CameraFailureReason::ConstraintError => "constraint-error",
            CameraFailureReason::Unknown => "unknown",
        }
    }

    /// Message suitable for showing to the person in front of the camera
    pub fn user_message(&self) -> &'static str {
        match self {
            CameraFailureReason::PermissionDenied => {
                "Camera access denied. Please allow camera access and try again."
            }
            CameraFailureReason::NoDevice => "No camera found. Please connect a camera.",
            CameraFailureReason::ConstraintError => {
                "The camera does not support the requested settings."
            }
            CameraFailureReason::Unknown => {
                "Could not start camera. Please check permissions and ensure a camera is connected."
            }
        }
    }
}

impl fmt::Display for CameraFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stream acquisition failed after the single constraint-relaxation retry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraUnavailableError {
    pub reason: CameraFailureReason,
    pub detail: String,
}

impl CameraUnavailableError {
    pub fn new(reason: CameraFailureReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

/// Failure class of a single acquisition attempt, as reported by a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireError {
    /// The requested constraints cannot be satisfied by any device mode
    Overconstrained(String),
    /// The host denied access to the device
    PermissionDenied(String),
    /// No matching device exists
    NotFound(String),
    /// Anything else
    Other(String),
}

impl AcquireError {
    /// Map the attempt failure onto the user-facing reason
    pub fn reason(&self) -> CameraFailureReason {
        match self {
            AcquireError::Overconstrained(_) => CameraFailureReason::ConstraintError,
            AcquireError::PermissionDenied(_) => CameraFailureReason::PermissionDenied,
            AcquireError::NotFound(_) => CameraFailureReason::NoDevice,
            AcquireError::Other(_) => CameraFailureReason::Unknown,
        }
    }

    pub fn is_overconstrained(&self) -> bool {
        matches!(self, AcquireError::Overconstrained(_))
    }
}

/// Snapshot attempted before the stream produced a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyFrameError {
    pub width: u32,
    pub height: u32,
}

/// Capture session errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// `start` called while a run is in progress
    AlreadyRunning,
    /// A capture step failed; partial photos were discarded
    CaptureFailed(String),
    /// The run was cancelled by a retake
    Cancelled,
    /// Handoff requested but no completed session exists
    NotCompleted,
    /// Session parameters out of range
    InvalidSession(String),
}

/// Countdown scheduler errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownError {
    /// `begin` while already counting
    AlreadyCounting,
    /// Countdown was cancelled before firing
    Cancelled,
}

/// Pixel buffer and encoding errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    /// Buffer length is not width * height * 4
    BufferSizeMismatch { expected: usize, actual: usize },
    /// Encoding or decoding failed
    Encoding(String),
    /// Writing the encoded image failed
    SaveFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DeviceQuery(e) => write!(f, "Device query error: {}", e),
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Session(e) => write!(f, "Session error: {}", e),
            AppError::Raster(e) => write!(f, "Image error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for DeviceQueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceQueryError::PermissionDenied => write!(f, "Device enumeration denied"),
            DeviceQueryError::Backend(msg) => write!(f, "Device enumeration failed: {}", msg),
        }
    }
}

impl fmt::Display for CameraUnavailableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Camera unavailable ({}): {}", self.reason, self.detail)
    }
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquireError::Overconstrained(msg) => write!(f, "Overconstrained: {}", msg),
            AcquireError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            AcquireError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AcquireError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for EmptyFrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stream has no frame yet ({}x{})",
            self.width, self.height
        )
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::AlreadyRunning => write!(f, "A capture session is already running"),
            SessionError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            SessionError::Cancelled => write!(f, "Capture session cancelled"),
            SessionError::NotCompleted => write!(f, "No completed session to hand off"),
            SessionError::InvalidSession(msg) => write!(f, "Invalid session: {}", msg),
        }
    }
}

impl fmt::Display for CountdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountdownError::AlreadyCounting => write!(f, "Countdown already in progress"),
            CountdownError::Cancelled => write!(f, "Countdown cancelled"),
        }
    }
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::BufferSizeMismatch { expected, actual } => write!(
                f,
                "Pixel buffer size mismatch: expected {} bytes, got {}",
                expected, actual
            ),
            RasterError::Encoding(msg) => write!(f, "Encoding failed: {}", msg),
            RasterError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for DeviceQueryError {}
impl std::error::Error for CameraUnavailableError {}
impl std::error::Error for AcquireError {}
impl std::error::Error for EmptyFrameError {}
impl std::error::Error for SessionError {}
impl std::error::Error for CountdownError {}
impl std::error::Error for RasterError {}

// Conversions from sub-errors to AppError
impl From<DeviceQueryError> for AppError {
    fn from(err: DeviceQueryError) -> Self {
        AppError::DeviceQuery(err)
    }
}

impl From<CameraUnavailableError> for AppError {
    fn from(err: CameraUnavailableError) -> Self {
        AppError::Camera(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<RasterError> for AppError {
    fn from(err: RasterError) -> Self {
        AppError::Raster(err)
    }
}

impl From<EmptyFrameError> for SessionError {
    fn from(err: EmptyFrameError) -> Self {
        SessionError::CaptureFailed(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

// Conversions for I/O errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for RasterError {
    fn from(err: std::io::Error) -> Self {
        RasterError::SaveFailed(err.to_string())
    }
}

impl From<image::ImageError> for RasterError {
    fn from(err: image::ImageError) -> Self {
        RasterError::Encoding(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_error_reasons() {
        assert_eq!(
            AcquireError::Overconstrained("w".into()).reason(),
            CameraFailureReason::ConstraintError
        );
        assert_eq!(
            AcquireError::PermissionDenied("p".into()).reason(),
            CameraFailureReason::PermissionDenied
        );
        assert_eq!(
            AcquireError::NotFound("n".into()).reason(),
            CameraFailureReason::NoDevice
        );
        assert_eq!(
            AcquireError::Other("o".into()).reason(),
            CameraFailureReason::Unknown
        );
    }

    #[test]
    fn test_reason_identifiers() {
        assert_eq!(CameraFailureReason::PermissionDenied.as_str(), "permission-denied");
        assert_eq!(CameraFailureReason::NoDevice.as_str(), "no-device");
        assert_eq!(CameraFailureReason::ConstraintError.as_str(), "constraint-error");
        assert_eq!(CameraFailureReason::Unknown.as_str(), "unknown");
    }

    #[test]
    fn test_empty_frame_becomes_capture_failed() {
        let err: SessionError = EmptyFrameError {
            width: 0,
            height: 0,
        }
        .into();
        assert!(matches!(err, SessionError::CaptureFailed(_)));
    }
}
