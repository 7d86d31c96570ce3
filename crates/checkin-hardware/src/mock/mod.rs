//! Mock device implementations for testing and development.
//!
//! These devices are controlled programmatically through their handles and
//! need no physical hardware.

pub mod audio;
pub mod camera;

pub use audio::{MockAudio, MockAudioHandle};
pub use camera::{MockCamera, MockCameraHandle};
