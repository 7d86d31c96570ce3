//! Device layer for the chapel check-in kiosk.
//!
//! This crate abstracts the two peripherals the check-in terminal drives:
//! the camera that reads identity badges and the speaker that plays
//! feedback tones. It also owns the camera session lifecycle.
//!
//! # Design
//!
//! - **Async-first**: device I/O uses native `async fn` in traits
//!   (Rust 1.90 + Edition 2024).
//! - **Enum dispatch**: the traits are not object-safe, so
//!   [`devices::AnyCameraDevice`] and [`devices::AnyAudioOutput`] provide
//!   concrete dispatch over the available backends.
//! - **Single owner**: the [`CameraSessionManager`] is the only holder of
//!   the camera. At most one capture pipeline runs at a time and a second
//!   `open` is refused with [`CameraError::DeviceBusy`].
//!
//! # Camera sessions
//!
//! ```no_run
//! use checkin_hardware::mock::MockCamera;
//! use checkin_hardware::{CameraConfig, CameraEvent, CameraSessionManager};
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> checkin_hardware::Result<()> {
//! let (camera, _badge) = MockCamera::new();
//! let mut manager = CameraSessionManager::new(camera.into(), CameraConfig::default());
//!
//! let (tx, mut rx) = mpsc::channel(32);
//! manager.open(tx).await?;
//!
//! while let Some(event) = rx.recv().await {
//!     match event {
//!         CameraEvent::Decoded(scan) => println!("scanned {}", scan.text),
//!         CameraEvent::Fault { message, .. } => {
//!             eprintln!("camera failed: {}", message);
//!             break;
//!         }
//!     }
//! }
//!
//! manager.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Mock implementations
//!
//! [`mock::MockCamera`] and [`mock::MockAudio`] run without hardware and
//! come with handles for presenting badges, injecting faults and inspecting
//! what was played.

pub mod devices;
pub mod error;
pub mod mock;
pub mod session;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::{AnyAudioOutput, AnyCameraDevice};
pub use error::{AudioError, CameraError, Result};
pub use session::{CameraConfig, CameraEvent, CameraHandle, CameraSessionManager, CameraStats};
pub use traits::{AudioOutput, CameraDevice, EmbeddedPayloadDecoder, FrameDecoder};
pub use types::{AudioClip, CameraFacing, CaptureConstraints, DeviceInfo, Frame};
