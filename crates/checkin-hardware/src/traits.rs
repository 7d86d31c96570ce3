//! Device trait definitions.
//!
//! These traits are the contract between the check-in terminal and the
//! kiosk's peripherals: the camera that captures badge images, the decoder
//! that turns frames into identity text, and the speaker that plays
//! feedback tones.
//!
//! Camera and audio traits use native `async fn` methods (Edition 2024
//! RPITIT). They are not object-safe; dynamic dispatch goes through the
//! enum wrappers in [`devices`](crate::devices).

#![allow(async_fn_in_trait)]

use crate::error::{AudioError, Result};
use crate::types::{AudioClip, CameraFacing, CaptureConstraints, DeviceInfo, Frame};

/// Video capture device.
///
/// A device is opened with a set of constraints, produces frames in capture
/// order while open, and is closed explicitly. Only one pipeline may hold
/// the device at a time; the [`CameraSessionManager`](crate::CameraSessionManager)
/// enforces that.
///
/// # Examples
///
/// ```no_run
/// use checkin_hardware::traits::CameraDevice;
/// use checkin_hardware::types::CaptureConstraints;
/// use checkin_hardware::Result;
///
/// async fn grab_one<C: CameraDevice>(camera: &mut C) -> Result<usize> {
///     camera.open(&CaptureConstraints::default()).await?;
///     let frame = camera.capture_frame().await?;
///     camera.close().await;
///     Ok(frame.data.len())
/// }
/// ```
pub trait CameraDevice: Send + Sync {
    /// Open the device with the given constraints.
    ///
    /// Returns the facing of the camera that was actually opened.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Camera access is denied by the platform
    /// - No camera satisfies the constraints
    /// - The device is already open
    async fn open(&mut self, constraints: &CaptureConstraints) -> Result<CameraFacing>;

    /// Wait for the next frame from an open device.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is not open, was disconnected, or a
    /// frame could not be read.
    async fn capture_frame(&mut self) -> Result<Frame>;

    /// Release the device. Closing a closed device is a no-op.
    async fn close(&mut self);

    /// Whether the device is currently open.
    fn is_open(&self) -> bool;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Turns a captured frame into decoded symbol text.
///
/// Decoders are synchronous and stateless so one instance can be shared by
/// every capture session.
pub trait FrameDecoder: Send + Sync {
    /// Decode the symbol in `frame`, if there is one.
    fn decode(&self, frame: &Frame) -> Option<String>;
}

/// Decoder for frames whose payload already is the symbol text.
///
/// Simulated cameras deliver the badge text as the frame payload; empty or
/// non-UTF-8 payloads decode to nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedPayloadDecoder;

impl FrameDecoder for EmbeddedPayloadDecoder {
    fn decode(&self, frame: &Frame) -> Option<String> {
        if frame.data.is_empty() {
            return None;
        }
        std::str::from_utf8(&frame.data).ok().map(str::to_owned)
    }
}

/// Speaker used for feedback tones.
pub trait AudioOutput: Send + Sync {
    /// Play a clip to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if no output device is present or playback fails.
    async fn play(&mut self, clip: &AudioClip) -> std::result::Result<(), AudioError>;

    /// Get device information.
    async fn get_info(&self) -> std::result::Result<DeviceInfo, AudioError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_decoder_reads_text() {
        let frame = Frame::new(0, 640, 480, "DED-123".as_bytes().to_vec());
        assert_eq!(
            EmbeddedPayloadDecoder.decode(&frame),
            Some("DED-123".to_string())
        );
    }

    #[test]
    fn test_embedded_decoder_ignores_empty_frame() {
        let frame = Frame::new(1, 640, 480, Vec::new());
        assert_eq!(EmbeddedPayloadDecoder.decode(&frame), None);
    }

    #[test]
    fn test_embedded_decoder_ignores_binary_noise() {
        let frame = Frame::new(2, 640, 480, vec![0xFF, 0xFE, 0x00]);
        assert_eq!(EmbeddedPayloadDecoder.decode(&frame), None);
    }
}
