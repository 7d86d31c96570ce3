//! Mock audio output for testing and development.
//!
//! Records every clip it is asked to play instead of sending it to a
//! speaker. Can simulate a kiosk with no audio device, or a driver that
//! hangs and never finishes a clip.

use crate::{
    error::AudioError,
    traits::AudioOutput,
    types::{AudioClip, DeviceInfo},
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Mock speaker.
///
/// # Examples
///
/// ```
/// use checkin_hardware::mock::MockAudio;
/// use checkin_hardware::traits::AudioOutput;
/// use checkin_hardware::types::AudioClip;
///
/// #[tokio::main]
/// async fn main() {
///     let (mut speaker, handle) = MockAudio::new();
///     speaker.play(&AudioClip::new(8000, vec![0.0; 80])).await.unwrap();
///     assert_eq!(handle.played().len(), 1);
/// }
/// ```
#[derive(Debug)]
pub struct MockAudio {
    state: Arc<Mutex<MockAudioState>>,
}

#[derive(Debug)]
struct MockAudioState {
    available: bool,
    played: Vec<AudioClip>,
    failures: u32,
    stalled: bool,
    stalls: u32,
}

impl MockAudio {
    /// Create a working mock speaker.
    pub fn new() -> (Self, MockAudioHandle) {
        Self::build(true)
    }

    /// Create a mock that behaves like a kiosk without audio hardware.
    pub fn unavailable() -> (Self, MockAudioHandle) {
        Self::build(false)
    }

    fn build(available: bool) -> (Self, MockAudioHandle) {
        let state = Arc::new(Mutex::new(MockAudioState {
            available,
            played: Vec::new(),
            failures: 0,
            stalled: false,
            stalls: 0,
        }));

        (
            Self {
                state: Arc::clone(&state),
            },
            MockAudioHandle { state },
        )
    }
}

impl AudioOutput for MockAudio {
    async fn play(&mut self, clip: &AudioClip) -> Result<(), AudioError> {
        {
            let mut state = self.state.lock();
            if !state.available {
                state.failures += 1;
                return Err(AudioError::no_output("mock speaker unplugged"));
            }
            if !state.stalled {
                state.played.push(clip.clone());
                return Ok(());
            }
            state.stalls += 1;
        }

        // Hung driver: the clip never finishes.
        std::future::pending().await
    }

    async fn get_info(&self) -> Result<DeviceInfo, AudioError> {
        Ok(DeviceInfo::new("Mock Speaker", "Mock"))
    }
}

/// Inspection handle for a [`MockAudio`].
#[derive(Debug, Clone)]
pub struct MockAudioHandle {
    state: Arc<Mutex<MockAudioState>>,
}

impl MockAudioHandle {
    /// Clips played so far, oldest first.
    pub fn played(&self) -> Vec<AudioClip> {
        self.state.lock().played.clone()
    }

    /// Number of failed play attempts.
    pub fn failures(&self) -> u32 {
        self.state.lock().failures
    }

    /// Plug or unplug the simulated speaker.
    pub fn set_available(&self, available: bool) {
        self.state.lock().available = available;
    }

    /// Make every following clip hang instead of playing.
    pub fn set_stalled(&self, stalled: bool) {
        self.state.lock().stalled = stalled;
    }

    /// Clips that hung.
    pub fn stalls(&self) -> u32 {
        self.state.lock().stalls
    }

    pub fn clear(&self) {
        self.state.lock().played.clear();
    }
}
