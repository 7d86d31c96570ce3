//! Mock camera implementation for testing and development.
//!
//! The mock does not produce images. Each "frame" carries the badge text
//! as its payload, which [`EmbeddedPayloadDecoder`](crate::traits::EmbeddedPayloadDecoder)
//! passes straight through. A [`MockCameraHandle`] presents badges, injects
//! faults and exposes open/close counters for resource-lifecycle tests.

use crate::{
    Result,
    error::CameraError,
    traits::CameraDevice,
    types::{CameraFacing, CaptureConstraints, DeviceInfo, Frame},
};
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Capacity of the presented-frame queue.
const FRAME_QUEUE_CAPACITY: usize = 64;

/// Mock camera for testing and development.
///
/// # Examples
///
/// ```
/// use checkin_hardware::mock::MockCamera;
/// use checkin_hardware::traits::CameraDevice;
/// use checkin_hardware::types::CaptureConstraints;
///
/// #[tokio::main]
/// async fn main() -> checkin_hardware::Result<()> {
///     let (mut camera, handle) = MockCamera::new();
///
///     camera.open(&CaptureConstraints::default()).await?;
///     assert!(handle.present_code("DED-123").await);
///
///     let frame = camera.capture_frame().await?;
///     assert_eq!(&frame.data[..], b"DED-123");
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockCamera {
    /// Presented frames waiting to be captured
    frame_rx: mpsc::Receiver<MockFrame>,

    /// State shared with the handle
    state: Arc<Mutex<MockCameraState>>,

    /// Device name
    name: String,

    /// Next frame sequence number in the current session
    sequence: u64,
}

impl MockCamera {
    /// Create a mock camera with a single user-facing lens.
    pub fn new() -> (Self, MockCameraHandle) {
        Self::with_facings("Mock Camera", vec![CameraFacing::User])
    }

    /// Create a mock camera exposing the given physical lenses.
    ///
    /// An empty list simulates a kiosk with no camera attached.
    pub fn with_facings(
        name: impl Into<String>,
        facings: Vec<CameraFacing>,
    ) -> (Self, MockCameraHandle) {
        let (frame_tx, frame_rx) = mpsc::channel(FRAME_QUEUE_CAPACITY);
        let state = Arc::new(Mutex::new(MockCameraState {
            facings,
            ..MockCameraState::default()
        }));

        let camera = Self {
            frame_rx,
            state: Arc::clone(&state),
            name: name.into(),
            sequence: 0,
        };

        let handle = MockCameraHandle { frame_tx, state };

        (camera, handle)
    }

    /// Discard frames presented before the current session started.
    fn drain_stale_frames(&mut self) -> usize {
        let mut drained = 0;
        while self.frame_rx.try_recv().is_ok() {
            drained += 1;
        }
        drained
    }
}

impl CameraDevice for MockCamera {
    async fn open(&mut self, constraints: &CaptureConstraints) -> Result<CameraFacing> {
        let facing = {
            let mut state = self.state.lock();
            state.open_attempts += 1;

            if state.permission_denied {
                return Err(CameraError::permission_denied(
                    "camera access blocked for this kiosk",
                ));
            }
            if state.open {
                return Err(CameraError::busy(self.name.clone()));
            }

            let facing = state
                .facings
                .iter()
                .copied()
                .find(|f| constraints.facing.accepts(*f))
                .ok_or_else(|| {
                    CameraError::no_device(format!("no {} camera attached", constraints.facing))
                })?;

            state.open = true;
            state.opens += 1;
            state.last_constraints = Some(*constraints);
            facing
        };

        self.sequence = 0;
        self.drain_stale_frames();
        Ok(facing)
    }

    async fn capture_frame(&mut self) -> Result<Frame> {
        let constraints = {
            let state = self.state.lock();
            if !state.open {
                return Err(CameraError::disconnected(format!("{} is not open", self.name)));
            }
            state.last_constraints.unwrap_or_default()
        };

        let item = self
            .frame_rx
            .recv()
            .await
            .ok_or_else(|| CameraError::disconnected("mock frame channel closed"))?;

        match item {
            MockFrame::Payload(data) => {
                let frame = Frame::new(self.sequence, constraints.width, constraints.height, data);
                self.sequence += 1;
                Ok(frame)
            }
            MockFrame::Fault(error) => Err(error),
        }
    }

    async fn close(&mut self) {
        let mut state = self.state.lock();
        if state.open {
            state.open = false;
            state.closes += 1;
        }
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock").with_driver_version("simulated"))
    }
}

/// Internal queue item for the mock camera.
#[derive(Debug, Clone)]
enum MockFrame {
    Payload(Bytes),
    Fault(CameraError),
}

#[derive(Debug, Default)]
struct MockCameraState {
    facings: Vec<CameraFacing>,
    permission_denied: bool,
    open: bool,
    last_constraints: Option<CaptureConstraints>,
    open_attempts: u32,
    opens: u32,
    closes: u32,
}

/// Handle for controlling a mock camera.
#[derive(Debug, Clone)]
pub struct MockCameraHandle {
    frame_tx: mpsc::Sender<MockFrame>,
    state: Arc<Mutex<MockCameraState>>,
}

impl MockCameraHandle {
    /// Hold a badge in front of the lens for one frame.
    ///
    /// Returns `false` when the camera is closed and the badge is not seen.
    pub async fn present_code(&self, code: &str) -> bool {
        self.present_frame(Bytes::copy_from_slice(code.as_bytes()))
            .await
    }

    /// Deliver one frame with an arbitrary payload.
    pub async fn present_frame(&self, payload: Bytes) -> bool {
        if !self.state.lock().open {
            return false;
        }
        self.frame_tx.send(MockFrame::Payload(payload)).await.is_ok()
    }

    /// Make the next capture fail with `error`.
    pub async fn inject_fault(&self, error: CameraError) -> bool {
        self.frame_tx.send(MockFrame::Fault(error)).await.is_ok()
    }

    /// Make every open attempt fail with `PermissionDenied`.
    pub fn deny_permission(&self, denied: bool) {
        self.state.lock().permission_denied = denied;
    }

    /// Replace the set of physical lenses.
    pub fn set_facings(&self, facings: Vec<CameraFacing>) {
        self.state.lock().facings = facings;
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Number of open attempts, successful or not.
    pub fn open_attempts(&self) -> u32 {
        self.state.lock().open_attempts
    }

    /// Number of successful opens.
    pub fn open_count(&self) -> u32 {
        self.state.lock().opens
    }

    /// Number of closes of an open device.
    pub fn close_count(&self) -> u32 {
        self.state.lock().closes
    }

    /// Constraints used by the most recent successful open.
    pub fn last_constraints(&self) -> Option<CaptureConstraints> {
        self.state.lock().last_constraints
    }
}
