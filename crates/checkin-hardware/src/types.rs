//! Common types shared across device implementations.
//!
//! Capture constraints, frames handed from camera to decoder, and the PCM
//! clips handed to audio outputs.

use bytes::Bytes;
use checkin_core::constants::{
    DEFAULT_FRAME_RATE, FALLBACK_CAPTURE_HEIGHT, FALLBACK_CAPTURE_WIDTH, PREFERRED_CAPTURE_HEIGHT,
    PREFERRED_CAPTURE_WIDTH,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Generic device information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "Front Desk Webcam", "Mock Camera").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional driver or firmware version string.
    pub driver_version: Option<String>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            driver_version: None,
        }
    }

    /// Set the driver version.
    pub fn with_driver_version(mut self, version: impl Into<String>) -> Self {
        self.driver_version = Some(version.into());
        self
    }
}

/// Which way a camera points.
///
/// Kiosks mount the screen toward the person checking in, so the
/// user-facing camera is the one that sees the badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraFacing {
    /// Camera on the screen side, facing the person at the kiosk.
    User,

    /// Camera on the back side.
    Environment,

    /// Whatever camera the platform offers.
    Any,
}

impl CameraFacing {
    /// Whether a physical camera facing `actual` satisfies this request.
    pub fn accepts(&self, actual: CameraFacing) -> bool {
        matches!(self, Self::Any) || *self == actual
    }
}

impl fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Environment => write!(f, "environment"),
            Self::Any => write!(f, "any"),
        }
    }
}

/// Requested capture geometry and rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    pub facing: CameraFacing,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

impl CaptureConstraints {
    /// First attempt: user-facing camera at full geometry.
    pub fn preferred(frame_rate: u32) -> Self {
        Self {
            facing: CameraFacing::User,
            width: PREFERRED_CAPTURE_WIDTH,
            height: PREFERRED_CAPTURE_HEIGHT,
            frame_rate,
        }
    }

    /// Second attempt: any camera, relaxed geometry.
    pub fn fallback(frame_rate: u32) -> Self {
        Self {
            facing: CameraFacing::Any,
            width: FALLBACK_CAPTURE_WIDTH,
            height: FALLBACK_CAPTURE_HEIGHT,
            frame_rate,
        }
    }

    /// Interval between decode ticks at the requested rate.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self::preferred(DEFAULT_FRAME_RATE)
    }
}

/// One captured video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Capture order within the current session, starting at 0.
    pub sequence: u64,

    pub width: u32,
    pub height: u32,

    /// Raw image payload as produced by the device.
    pub data: Bytes,

    pub captured_at: Instant,
}

impl Frame {
    pub fn new(sequence: u64, width: u32, height: u32, data: impl Into<Bytes>) -> Self {
        Self {
            sequence,
            width,
            height,
            data: data.into(),
            captured_at: Instant::now(),
        }
    }
}

/// Mono PCM clip ready for an audio output.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub sample_rate: u32,

    /// Samples in the range -1.0..=1.0.
    pub samples: Vec<f32>,
}

impl AudioClip {
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    /// Playback length of the clip.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |peak, s| peak.max(s.abs()))
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_info_builder() {
        let info = DeviceInfo::new("Lobby Cam", "UVC 1080p").with_driver_version("uvcvideo 1.1");

        assert_eq!(info.name, "Lobby Cam");
        assert_eq!(info.model, "UVC 1080p");
        assert_eq!(info.driver_version.as_deref(), Some("uvcvideo 1.1"));
    }

    #[test]
    fn test_facing_accepts() {
        assert!(CameraFacing::Any.accepts(CameraFacing::Environment));
        assert!(CameraFacing::User.accepts(CameraFacing::User));
        assert!(!CameraFacing::User.accepts(CameraFacing::Environment));
    }

    #[test]
    fn test_constraints_preferred_and_fallback() {
        let preferred = CaptureConstraints::preferred(10);
        let fallback = CaptureConstraints::fallback(10);

        assert_eq!(preferred.facing, CameraFacing::User);
        assert_eq!(fallback.facing, CameraFacing::Any);
        assert!(fallback.width < preferred.width);
        assert_eq!(preferred.frame_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_frame_rate_does_not_divide_by_zero() {
        let constraints = CaptureConstraints::preferred(0);
        assert_eq!(constraints.frame_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_audio_clip_duration_and_peak() {
        let clip = AudioClip::new(1000, vec![0.0, 0.5, -0.75, 0.25]);
        assert_eq!(clip.duration(), Duration::from_millis(4));
        assert_eq!(clip.peak(), 0.75);
        assert!(!clip.is_empty());
    }

    #[test]
    fn test_facing_serialization() {
        let json = serde_json::to_string(&CameraFacing::User).unwrap();
        assert_eq!(json, "\"user\"");
    }
}
