//! Camera session manager.
//!
//! The `CameraSessionManager` owns the kiosk's single camera and runs at most
//! one capture pipeline over it. Opening a session hands the device to a
//! capture task that grabs frames at the configured rate, decodes them and
//! forwards every decoded payload to the caller's channel. Closing the
//! session cancels the task, which releases the device and hands it back to
//! the manager so the next session can reuse it.
//!
//! ```text
//!                 open()                       close()
//!  ┌─────────┐  ────────►  ┌──────────────┐  ──────────►  ┌─────────┐
//!  │ Manager │  (device)   │ Capture task │   (device)    │ Manager │
//!  │  idle   │             │ tick→grab→   │               │  idle   │
//!  └─────────┘             │ decode→send  │               └─────────┘
//!                          └──────┬───────┘
//!                                 │ CameraEvent
//!                                 ▼
//!                           Check-in terminal
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use checkin_hardware::mock::MockCamera;
//! use checkin_hardware::session::{CameraConfig, CameraEvent, CameraSessionManager};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> checkin_hardware::Result<()> {
//!     let (camera, badge) = MockCamera::new();
//!     let mut manager = CameraSessionManager::new(camera.into(), CameraConfig::default());
//!
//!     let (tx, mut rx) = mpsc::channel(32);
//!     let handle = manager.open(tx).await?;
//!     badge.present_code("DED-123").await;
//!
//!     if let Some(CameraEvent::Decoded(scan)) = rx.recv().await {
//!         assert_eq!(scan.session, handle.session());
//!     }
//!
//!     manager.close().await;
//!     Ok(())
//! }
//! ```

use crate::Result;
use crate::devices::AnyCameraDevice;
use crate::error::CameraError;
use crate::traits::{CameraDevice, EmbeddedPayloadDecoder, FrameDecoder};
use crate::types::{CameraFacing, CaptureConstraints};
use checkin_core::constants::DEFAULT_FRAME_RATE;
use checkin_core::{ScanEvent, SessionId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Event emitted by a running capture pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraEvent {
    /// A frame decoded to text. Duplicates are forwarded as-is.
    Decoded(ScanEvent),

    /// Capture failed after the session was opened.
    ///
    /// The capture task stops after sending this; the session stays
    /// registered until the owner calls `close`.
    Fault {
        session: SessionId,
        message: String,
    },
}

impl CameraEvent {
    /// Session that produced this event.
    pub fn session(&self) -> SessionId {
        match self {
            Self::Decoded(scan) => scan.session,
            Self::Fault { session, .. } => *session,
        }
    }
}

/// Opaque description of an open capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraHandle {
    session: SessionId,
    constraints: CaptureConstraints,
    facing: CameraFacing,
    fallback: bool,
}

impl CameraHandle {
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Constraints the device was opened with.
    pub fn constraints(&self) -> CaptureConstraints {
        self.constraints
    }

    /// Facing of the physical camera that was opened.
    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    /// Whether the preferred constraints failed and the fallback was used.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

/// Camera session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConfig {
    /// Target decode rate in frames per second.
    pub frame_rate: u32,

    /// Retry once with relaxed constraints when the preferred open fails.
    pub allow_fallback: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            allow_fallback: true,
        }
    }
}

impl CameraConfig {
    /// Set the target frame rate.
    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Enable or disable the fallback open.
    pub fn with_fallback(mut self, allow: bool) -> Self {
        self.allow_fallback = allow;
        self
    }

    pub fn preferred_constraints(&self) -> CaptureConstraints {
        CaptureConstraints::preferred(self.frame_rate)
    }

    pub fn fallback_constraints(&self) -> CaptureConstraints {
        CaptureConstraints::fallback(self.frame_rate)
    }
}

/// Session lifecycle counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraStats {
    /// Sessions opened.
    pub opens: u64,

    /// Sessions closed.
    pub closes: u64,

    /// Opens that only succeeded with the fallback constraints.
    pub fallbacks: u64,

    /// Open calls that returned an error (busy refusals excluded).
    pub failed_opens: u64,
}

/// Running capture pipeline.
struct ActiveSession {
    handle: CameraHandle,
    cancel: CancellationToken,
    task: JoinHandle<AnyCameraDevice>,
}

/// Owner of the kiosk camera and its single capture pipeline.
pub struct CameraSessionManager {
    /// The device while no session is running.
    device: Option<AnyCameraDevice>,

    /// Shared by every session's capture task.
    decoder: Arc<dyn FrameDecoder>,

    config: CameraConfig,

    active: Option<ActiveSession>,

    /// Id of the most recently opened session.
    last_session: SessionId,

    stats: CameraStats,
}

impl CameraSessionManager {
    /// Create a manager using the pass-through payload decoder.
    pub fn new(device: AnyCameraDevice, config: CameraConfig) -> Self {
        Self::with_decoder(device, Arc::new(EmbeddedPayloadDecoder), config)
    }

    /// Create a manager with a custom frame decoder.
    pub fn with_decoder(
        device: AnyCameraDevice,
        decoder: Arc<dyn FrameDecoder>,
        config: CameraConfig,
    ) -> Self {
        Self {
            device: Some(device),
            decoder,
            config,
            active: None,
            last_session: SessionId::new(0),
            stats: CameraStats::default(),
        }
    }

    /// Open a capture session and start forwarding decoded text to `events`.
    ///
    /// Tries the preferred constraints first, then (if enabled) the fallback
    /// constraints exactly once.
    ///
    /// # Errors
    ///
    /// Returns `DeviceBusy` if a session is already open, otherwise the error
    /// of the last open attempt (`PermissionDenied`, `NoDeviceAvailable`, ...).
    pub async fn open(&mut self, events: mpsc::Sender<CameraEvent>) -> Result<CameraHandle> {
        if let Some(active) = &self.active {
            warn!(
                "Refusing camera open: session {} is still open",
                active.handle.session
            );
            return Err(CameraError::busy(active.handle.session.to_string()));
        }

        let Some(mut device) = self.device.take() else {
            self.stats.failed_opens += 1;
            error!("Camera open failed: device was lost by a crashed capture task");
            return Err(CameraError::no_device("camera device is no longer available"));
        };

        let (constraints, facing, fallback) =
            match Self::open_device(&mut device, &self.config).await {
                Ok(opened) => opened,
                Err(e) => {
                    self.device = Some(device);
                    self.stats.failed_opens += 1;
                    error!("Camera open failed: {}", e);
                    return Err(e);
                }
            };

        self.last_session = self.last_session.next();
        let handle = CameraHandle {
            session: self.last_session,
            constraints,
            facing,
            fallback,
        };

        let cancel = CancellationToken::new();
        let task = tokio::spawn(capture_loop(
            device,
            Arc::clone(&self.decoder),
            handle,
            events,
            cancel.clone(),
        ));

        self.active = Some(ActiveSession {
            handle,
            cancel,
            task,
        });
        self.stats.opens += 1;
        if fallback {
            self.stats.fallbacks += 1;
        }

        info!(
            "Camera session {} opened: {} camera at {}x{}, {} fps",
            handle.session,
            facing,
            constraints.width,
            constraints.height,
            constraints.frame_rate
        );

        Ok(handle)
    }

    /// Try preferred then fallback constraints on `device`.
    async fn open_device(
        device: &mut AnyCameraDevice,
        config: &CameraConfig,
    ) -> Result<(CaptureConstraints, CameraFacing, bool)> {
        let preferred = config.preferred_constraints();
        match device.open(&preferred).await {
            Ok(facing) => Ok((preferred, facing, false)),
            Err(e) if config.allow_fallback => {
                warn!(
                    "Preferred camera unavailable ({}), retrying with relaxed constraints",
                    e
                );
                let fallback = config.fallback_constraints();
                let facing = device.open(&fallback).await?;
                Ok((fallback, facing, true))
            }
            Err(e) => Err(e),
        }
    }

    /// Stop the running session and release the device.
    ///
    /// Returns the handle of the session that was closed, or `None` when
    /// nothing was open. Safe to call at any time, including after a
    /// capture fault.
    pub async fn close(&mut self) -> Option<CameraHandle> {
        let active = self.active.take()?;
        active.cancel.cancel();

        match active.task.await {
            Ok(device) => self.device = Some(device),
            Err(e) => error!(
                "Capture task for session {} ended abnormally: {}",
                active.handle.session, e
            ),
        }

        self.stats.closes += 1;
        info!("Camera session {} closed", active.handle.session);
        Some(active.handle)
    }

    /// Whether a session is currently open.
    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Handle of the open session, if any.
    pub fn current(&self) -> Option<CameraHandle> {
        self.active.as_ref().map(|active| active.handle)
    }

    pub fn stats(&self) -> CameraStats {
        self.stats
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }
}

impl Drop for CameraSessionManager {
    fn drop(&mut self) {
        // The capture task closes the device on its way out.
        if let Some(active) = &self.active {
            active.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for CameraSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSessionManager")
            .field("config", &self.config)
            .field("current", &self.current())
            .field("stats", &self.stats)
            .finish()
    }
}

/// Frame-driven capture loop. Runs until cancelled, the receiver goes
/// away, or the device fails; always closes the device and returns it.
async fn capture_loop(
    mut device: AnyCameraDevice,
    decoder: Arc<dyn FrameDecoder>,
    handle: CameraHandle,
    events: mpsc::Sender<CameraEvent>,
    cancel: CancellationToken,
) -> AnyCameraDevice {
    let session = handle.session;
    let mut ticker = tokio::time::interval(handle.constraints.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let captured = tokio::select! {
            _ = cancel.cancelled() => break,
            captured = device.capture_frame() => captured,
        };

        let event = match captured {
            Ok(frame) => {
                let Some(text) = decoder.decode(&frame) else {
                    continue;
                };
                debug!(
                    "Session {} decoded frame {} ({} bytes)",
                    session,
                    frame.sequence,
                    text.len()
                );
                CameraEvent::Decoded(ScanEvent::new(session, text))
            }
            Err(e) => {
                error!("Camera session {} capture failed: {}", session, e);
                CameraEvent::Fault {
                    session,
                    message: e.operator_message().to_string(),
                }
            }
        };

        let is_fault = matches!(event, CameraEvent::Fault { .. });

        // Sending can block on a full channel; close must still get through.
        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = events.send(event) => {
                if sent.is_err() {
                    debug!("Session {} event receiver dropped", session);
                    break;
                }
            }
        }

        if is_fault {
            break;
        }
    }

    device.close().await;
    device
}
