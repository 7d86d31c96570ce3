//! Enum wrappers for device dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn CameraDevice>`
//! is not available. These enums give concrete dispatch instead, which also
//! lets the capture loop run on a spawned Tokio task: the futures of every
//! variant are concrete types, so their `Send`-ness is known.
//!
//! # Examples
//!
//! ```
//! use checkin_hardware::devices::AnyCameraDevice;
//! use checkin_hardware::mock::MockCamera;
//!
//! let (camera, _handle) = MockCamera::new();
//! let any_camera = AnyCameraDevice::Mock(camera);
//! ```

use crate::error::AudioError;
use crate::mock::{MockAudio, MockCamera};
use crate::traits::{AudioOutput, CameraDevice};
use crate::types::{AudioClip, CameraFacing, CaptureConstraints, DeviceInfo, Frame};
use crate::Result;

/// Enum wrapper for camera dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyCameraDevice {
    /// Mock camera for development and testing.
    Mock(MockCamera),
    // TODO: add a V4L2 variant behind `hardware-v4l2` once a capture crate is chosen
}

impl CameraDevice for AnyCameraDevice {
    async fn open(&mut self, constraints: &CaptureConstraints) -> Result<CameraFacing> {
        match self {
            Self::Mock(device) => device.open(constraints).await,
        }
    }

    async fn capture_frame(&mut self) -> Result<Frame> {
        match self {
            Self::Mock(device) => device.capture_frame().await,
        }
    }

    async fn close(&mut self) {
        match self {
            Self::Mock(device) => device.close().await,
        }
    }

    fn is_open(&self) -> bool {
        match self {
            Self::Mock(device) => device.is_open(),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

impl From<MockCamera> for AnyCameraDevice {
    fn from(device: MockCamera) -> Self {
        Self::Mock(device)
    }
}

/// Enum wrapper for audio output dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyAudioOutput {
    /// Mock speaker for development and testing.
    Mock(MockAudio),
}

impl AudioOutput for AnyAudioOutput {
    async fn play(&mut self, clip: &AudioClip) -> std::result::Result<(), AudioError> {
        match self {
            Self::Mock(device) => device.play(clip).await,
        }
    }

    async fn get_info(&self) -> std::result::Result<DeviceInfo, AudioError> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

impl From<MockAudio> for AnyAudioOutput {
    fn from(device: MockAudio) -> Self {
        Self::Mock(device)
    }
}
