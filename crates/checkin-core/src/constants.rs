//! Timing, tone and validation constants for the check-in terminal.
//!
//! These are the defaults used when no configuration overrides them. The
//! tone parameters are chosen so success and error feedback differ in both
//! pitch and rhythm and can be told apart without looking at the screen.
//!
//! ```
//! use std::time::Duration;
//! use checkin_core::constants::*;
//!
//! let dwell = Duration::from_millis(DEFAULT_SUCCESS_DWELL_MS);
//! assert_eq!(dwell, Duration::from_secs(4));
//! assert!(SUCCESS_TONE_FREQUENCY_HZ > ERROR_TONE_FREQUENCY_HZ);
//! ```

// ============================================================================
// Terminal Timing
// ============================================================================

/// How long the terminal stays in `Success` before resuming scanning.
pub const DEFAULT_SUCCESS_DWELL_MS: u64 = 4_000;

/// Pause after a rejected code before scans are accepted again.
///
/// The camera stays open during this window; frames of the same badge are
/// dropped so one rejected badge does not produce a burst of error tones.
pub const DEFAULT_REJECTION_DELAY_MS: u64 = 1_500;

/// Upper bound for a single verification (roster fetch + attendance write).
///
/// Exceeding it is treated as a backend error.
pub const DEFAULT_VERIFICATION_TIMEOUT_MS: u64 = 10_000;

/// Roster snapshot lifetime. Zero means the roster is fetched for every scan.
pub const DEFAULT_ROSTER_CACHE_TTL_MS: u64 = 0;

/// Number of state transitions kept for diagnostics.
pub const MAX_TRANSITION_HISTORY: usize = 100;

// ============================================================================
// Camera
// ============================================================================

/// Target decode rate of the capture loop.
pub const DEFAULT_FRAME_RATE: u32 = 10;

/// Preferred capture width (user-facing camera).
pub const PREFERRED_CAPTURE_WIDTH: u32 = 1280;

/// Preferred capture height (user-facing camera).
pub const PREFERRED_CAPTURE_HEIGHT: u32 = 720;

/// Relaxed capture width used by the fallback attempt.
pub const FALLBACK_CAPTURE_WIDTH: u32 = 640;

/// Relaxed capture height used by the fallback attempt.
pub const FALLBACK_CAPTURE_HEIGHT: u32 = 480;

/// Capacity of the decoded-scan channel between capture loop and terminal.
pub const SCAN_CHANNEL_CAPACITY: usize = 32;

// ============================================================================
// Audio Feedback
// ============================================================================

/// Output sample rate for synthesized tones.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Peak gain of synthesized tones (0.0 - 1.0).
pub const DEFAULT_TONE_GAIN: f32 = 0.3;

/// Pitch of the success tone.
pub const SUCCESS_TONE_FREQUENCY_HZ: f32 = 1_200.0;

/// Length of the success tone.
pub const SUCCESS_TONE_DURATION_MS: u64 = 100;

/// Pitch of each error tone.
pub const ERROR_TONE_FREQUENCY_HZ: f32 = 220.0;

/// Length of each error tone.
pub const ERROR_TONE_DURATION_MS: u64 = 120;

/// Onset-to-onset spacing of the two error tones.
pub const ERROR_TONE_SPACING_MS: u64 = 230;

/// Envelope attack time shared by all tones.
pub const TONE_ATTACK_MS: u64 = 5;

/// Level the exponential decay reaches at the end of a tone.
pub const TONE_DECAY_FLOOR: f32 = 0.01;

/// Time an audio device gets beyond a clip's length before playback is
/// abandoned.
pub const AUDIO_PLAYBACK_GRACE_MS: u64 = 500;

// ============================================================================
// Instruction Banner
// ============================================================================

/// Characters per banner line.
pub const DEFAULT_BANNER_COLUMNS: usize = 48;

// ============================================================================
// Identity Codes
// ============================================================================

/// Maximum accepted length of a decoded identity code, in characters.
pub const MAX_IDENTITY_CODE_LENGTH: usize = 256;

/// Time-of-day format stored on attendance events.
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S";
