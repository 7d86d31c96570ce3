//! Error types for device operations.
//!
//! Camera and audio failures are kept apart because the terminal treats
//! them very differently: a camera error ends the scanning session, an
//! audio error is logged and ignored.

/// Result type alias for camera operations.
pub type Result<T> = std::result::Result<T, CameraError>;

/// Errors raised while opening or running a camera capture pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    /// The platform refused access to the camera.
    #[error("Camera permission denied: {message}")]
    PermissionDenied { message: String },

    /// No camera matching the requested constraints is present.
    #[error("No camera available: {message}")]
    NoDeviceAvailable { message: String },

    /// Another capture pipeline already holds the device.
    #[error("Camera busy: already held by {holder}")]
    DeviceBusy { holder: String },

    /// The device went away after it was opened.
    #[error("Camera disconnected: {device}")]
    Disconnected { device: String },

    /// A frame could not be captured from an open device.
    #[error("Frame capture failed: {message}")]
    CaptureFailed { message: String },
}

impl CameraError {
    /// Create a new permission denied error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a new no device error.
    pub fn no_device(message: impl Into<String>) -> Self {
        Self::NoDeviceAvailable {
            message: message.into(),
        }
    }

    /// Create a new device busy error.
    pub fn busy(holder: impl Into<String>) -> Self {
        Self::DeviceBusy {
            holder: holder.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new capture failure error.
    pub fn capture_failed(message: impl Into<String>) -> Self {
        Self::CaptureFailed {
            message: message.into(),
        }
    }

    /// Short operator-facing description, without device internals.
    pub fn operator_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied { .. } => "Camera access was denied",
            Self::NoDeviceAvailable { .. } => "No camera found",
            Self::DeviceBusy { .. } => "Camera is in use",
            Self::Disconnected { .. } => "Camera was disconnected",
            Self::CaptureFailed { .. } => "Camera stopped responding",
        }
    }
}

/// Errors raised by audio output devices.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AudioError {
    /// No output device is present.
    #[error("No audio output device: {message}")]
    NoOutputDevice { message: String },

    /// The device rejected or failed to play the clip.
    #[error("Playback failed: {message}")]
    Playback { message: String },
}

impl AudioError {
    /// Create a new missing device error.
    pub fn no_output(message: impl Into<String>) -> Self {
        Self::NoOutputDevice {
            message: message.into(),
        }
    }

    /// Create a new playback error.
    pub fn playback(message: impl Into<String>) -> Self {
        Self::Playback {
            message: message.into(),
        }
    }
}
