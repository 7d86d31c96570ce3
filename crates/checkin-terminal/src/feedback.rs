//! Audible and textual feedback.
//!
//! The emitter is the only place that touches the speaker. Audio faults are
//! logged and counted, never propagated: a kiosk without sound still checks
//! people in. Playback is bounded by the clip length plus a grace period so
//! a hung audio driver cannot stall the terminal.

use std::time::Duration;

use checkin_core::constants::{
    AUDIO_PLAYBACK_GRACE_MS, DEFAULT_BANNER_COLUMNS, DEFAULT_SAMPLE_RATE, DEFAULT_TONE_GAIN,
};
use checkin_hardware::{AnyAudioOutput, AudioOutput};
use tracing::{debug, warn};

use crate::banner::InstructionBanner;
use crate::tone::TonePattern;
use crate::KioskState;

/// Feedback configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackConfig {
    pub sample_rate: u32,

    /// Peak tone amplitude, 0.0 - 1.0.
    pub gain: f32,

    pub banner_columns: usize,

    /// Allowed overrun of a clip's length before playback is abandoned.
    pub playback_grace: Duration,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            gain: DEFAULT_TONE_GAIN,
            banner_columns: DEFAULT_BANNER_COLUMNS,
            playback_grace: Duration::from_millis(AUDIO_PLAYBACK_GRACE_MS),
        }
    }
}

impl FeedbackConfig {
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_banner_columns(mut self, columns: usize) -> Self {
        self.banner_columns = columns;
        self
    }

    pub fn with_playback_grace(mut self, grace: Duration) -> Self {
        self.playback_grace = grace;
        self
    }
}

/// Plays tones and owns the instruction banner.
#[derive(Debug)]
pub struct FeedbackEmitter {
    audio: AnyAudioOutput,
    banner: InstructionBanner,
    config: FeedbackConfig,
    tone_failures: u64,
}

impl FeedbackEmitter {
    pub fn new(audio: AnyAudioOutput, config: FeedbackConfig) -> Self {
        Self {
            audio,
            banner: InstructionBanner::new(config.banner_columns),
            config,
            tone_failures: 0,
        }
    }

    /// Single short high tone.
    pub async fn play_success_tone(&mut self) {
        self.play(TonePattern::success(), "success").await;
    }

    /// Two short low tones.
    pub async fn play_error_tone(&mut self) {
        self.play(TonePattern::error(), "error").await;
    }

    async fn play(&mut self, pattern: TonePattern, name: &str) {
        let clip = pattern
            .with_gain(self.config.gain)
            .render(self.config.sample_rate);

        let limit = clip.duration() + self.config.playback_grace;
        match tokio::time::timeout(limit, self.audio.play(&clip)).await {
            Ok(Ok(())) => debug!("Played {} tone ({:?})", name, clip.duration()),
            Ok(Err(e)) => {
                self.tone_failures += 1;
                warn!("Could not play {} tone: {}", name, e);
            }
            Err(_) => {
                self.tone_failures += 1;
                warn!("Abandoned {} tone, audio device did not finish within {:?}", name, limit);
            }
        }
    }

    /// Replace the banner headline.
    pub fn set_instruction(&mut self, text: &str) {
        self.banner.set_instruction(text);
    }

    pub fn set_detail(&mut self, text: &str) {
        self.banner.set_detail(text);
    }

    /// Show the default banner text for `state`.
    pub fn update_from_state(&mut self, state: KioskState) {
        self.banner.update_from_state(state);
    }

    pub fn banner(&self) -> &InstructionBanner {
        &self.banner
    }

    /// Tones that could not be played since creation.
    pub fn tone_failures(&self) -> u64 {
        self.tone_failures
    }

    pub fn config(&self) -> &FeedbackConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkin_hardware::mock::MockAudio;

    fn emitter() -> (FeedbackEmitter, checkin_hardware::mock::MockAudioHandle) {
        let (audio, handle) = MockAudio::new();
        (
            FeedbackEmitter::new(audio.into(), FeedbackConfig::default()),
            handle,
        )
    }

    #[tokio::test]
    async fn test_success_tone_is_played() {
        let (mut feedback, speaker) = emitter();
        feedback.play_success_tone().await;

        let played = speaker.played();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0].sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(feedback.tone_failures(), 0);
    }

    #[tokio::test]
    async fn test_error_tone_is_longer_than_success_tone() {
        let (mut feedback, speaker) = emitter();
        feedback.play_success_tone().await;
        feedback.play_error_tone().await;

        let played = speaker.played();
        assert!(played[1].duration() > played[0].duration());
    }

    #[tokio::test]
    async fn test_missing_speaker_is_tolerated() {
        let (audio, speaker) = MockAudio::unavailable();
        let mut feedback = FeedbackEmitter::new(audio.into(), FeedbackConfig::default());

        feedback.play_success_tone().await;
        feedback.play_error_tone().await;

        assert_eq!(feedback.tone_failures(), 2);
        assert!(speaker.played().is_empty());
    }

    #[tokio::test]
    async fn test_configured_gain_is_applied() {
        let (audio, speaker) = MockAudio::new();
        let config = FeedbackConfig::default().with_gain(0.1).with_sample_rate(8_000);
        let mut feedback = FeedbackEmitter::new(audio.into(), config);

        feedback.play_success_tone().await;

        let clip = &speaker.played()[0];
        assert_eq!(clip.sample_rate, 8_000);
        assert!(clip.peak() <= 0.1 + 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_speaker_is_abandoned() {
        let (audio, speaker) = MockAudio::new();
        speaker.set_stalled(true);
        let mut feedback = FeedbackEmitter::new(audio.into(), FeedbackConfig::default());

        let started = tokio::time::Instant::now();
        feedback.play_error_tone().await;

        // 350 ms clip plus the 500 ms grace period.
        assert!(started.elapsed() >= Duration::from_millis(850));
        assert!(started.elapsed() < Duration::from_millis(900));
        assert_eq!(feedback.tone_failures(), 1);
        assert_eq!(speaker.stalls(), 1);

        speaker.set_stalled(false);
        feedback.play_success_tone().await;
        assert_eq!(feedback.tone_failures(), 1);
        assert_eq!(speaker.played().len(), 1);
    }

    #[test]
    fn test_instruction_text() {
        let (mut feedback, _speaker) = emitter();
        feedback.update_from_state(KioskState::Scanning);
        feedback.set_instruction("Badge not recognized");

        assert_eq!(feedback.banner().headline(), "Badge not recognized");
        assert_eq!(feedback.banner().detail(), "");
    }
}
