//! Terminal configuration.

use std::time::Duration;

use checkin_core::constants::{
    DEFAULT_REJECTION_DELAY_MS, DEFAULT_ROSTER_CACHE_TTL_MS, DEFAULT_SUCCESS_DWELL_MS,
    DEFAULT_VERIFICATION_TIMEOUT_MS, SCAN_CHANNEL_CAPACITY,
};
use checkin_hardware::CameraConfig;

use crate::bus::DEFAULT_BUS_CAPACITY;
use crate::feedback::FeedbackConfig;

/// Timing and sizing of a [`CheckInTerminal`](crate::CheckInTerminal).
///
/// # Examples
///
/// ```
/// use checkin_terminal::TerminalConfig;
/// use std::time::Duration;
///
/// let config = TerminalConfig::default()
///     .with_success_dwell(Duration::from_secs(3))
///     .with_roster_cache_ttl(Duration::from_secs(30));
///
/// assert_eq!(config.rejection_delay, Duration::from_millis(1500));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalConfig {
    /// Time spent in `Success` before scanning resumes.
    pub success_dwell: Duration,

    /// Pause after a rejected code before scanning resumes.
    pub rejection_delay: Duration,

    /// Bound on one roster lookup plus attendance write.
    pub verification_timeout: Duration,

    /// Roster snapshot lifetime; zero fetches for every scan.
    pub roster_cache_ttl: Duration,

    /// Capacity of the camera event channel.
    pub scan_channel_capacity: usize,

    /// Capacity of the session bus.
    pub bus_capacity: usize,

    pub camera: CameraConfig,

    pub feedback: FeedbackConfig,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            success_dwell: Duration::from_millis(DEFAULT_SUCCESS_DWELL_MS),
            rejection_delay: Duration::from_millis(DEFAULT_REJECTION_DELAY_MS),
            verification_timeout: Duration::from_millis(DEFAULT_VERIFICATION_TIMEOUT_MS),
            roster_cache_ttl: Duration::from_millis(DEFAULT_ROSTER_CACHE_TTL_MS),
            scan_channel_capacity: SCAN_CHANNEL_CAPACITY,
            bus_capacity: DEFAULT_BUS_CAPACITY,
            camera: CameraConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }
}

impl TerminalConfig {
    pub fn with_success_dwell(mut self, dwell: Duration) -> Self {
        self.success_dwell = dwell;
        self
    }

    pub fn with_rejection_delay(mut self, delay: Duration) -> Self {
        self.rejection_delay = delay;
        self
    }

    pub fn with_verification_timeout(mut self, timeout: Duration) -> Self {
        self.verification_timeout = timeout;
        self
    }

    pub fn with_roster_cache_ttl(mut self, ttl: Duration) -> Self {
        self.roster_cache_ttl = ttl;
        self
    }

    pub fn with_scan_channel_capacity(mut self, capacity: usize) -> Self {
        self.scan_channel_capacity = capacity.max(1);
        self
    }

    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity.max(1);
        self
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_feedback(mut self, feedback: FeedbackConfig) -> Self {
        self.feedback = feedback;
        self
    }
}
