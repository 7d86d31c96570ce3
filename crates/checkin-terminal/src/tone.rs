//! Feedback tone synthesis.
//!
//! Tones are plain sine waves shaped by a short linear attack and an
//! exponential decay, mixed into one mono clip. Rendering is deterministic:
//! the same pattern at the same sample rate always yields the same samples.

use std::f32::consts::TAU;
use std::time::Duration;

use checkin_core::constants::{
    DEFAULT_TONE_GAIN, ERROR_TONE_DURATION_MS, ERROR_TONE_FREQUENCY_HZ, ERROR_TONE_SPACING_MS,
    SUCCESS_TONE_DURATION_MS, SUCCESS_TONE_FREQUENCY_HZ, TONE_ATTACK_MS, TONE_DECAY_FLOOR,
};
use checkin_hardware::AudioClip;

/// One sine tone inside a pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    pub duration: Duration,

    /// Start time relative to the beginning of the pattern.
    pub onset: Duration,
}

impl ToneSpec {
    pub fn new(frequency_hz: f32, duration: Duration) -> Self {
        Self {
            frequency_hz,
            duration,
            onset: Duration::ZERO,
        }
    }

    pub fn starting_at(mut self, onset: Duration) -> Self {
        self.onset = onset;
        self
    }

    fn end(&self) -> Duration {
        self.onset + self.duration
    }
}

/// Attack/decay amplitude envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub attack: Duration,

    /// Amplitude reached at the very end of the tone.
    pub decay_floor: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack: Duration::from_millis(TONE_ATTACK_MS),
            decay_floor: TONE_DECAY_FLOOR,
        }
    }
}

impl Envelope {
    /// Amplitude in `0.0..=1.0` at `t` seconds into a tone of `length` seconds.
    pub fn amplitude(&self, t: f32, length: f32) -> f32 {
        let attack = self.attack.as_secs_f32().min(length);
        if t < 0.0 || t > length {
            return 0.0;
        }
        if t < attack {
            return t / attack;
        }

        let decay_length = length - attack;
        if decay_length <= f32::EPSILON {
            return 1.0;
        }
        let progress = (t - attack) / decay_length;
        (self.decay_floor.max(f32::MIN_POSITIVE).ln() * progress).exp()
    }
}

/// A sequence of tones rendered into one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct TonePattern {
    pub tones: Vec<ToneSpec>,
    pub envelope: Envelope,

    /// Peak amplitude of each tone.
    pub gain: f32,
}

impl TonePattern {
    /// Single short high tone.
    pub fn success() -> Self {
        Self {
            tones: vec![ToneSpec::new(
                SUCCESS_TONE_FREQUENCY_HZ,
                Duration::from_millis(SUCCESS_TONE_DURATION_MS),
            )],
            envelope: Envelope::default(),
            gain: DEFAULT_TONE_GAIN,
        }
    }

    /// Two short low tones.
    pub fn error() -> Self {
        let tone = ToneSpec::new(
            ERROR_TONE_FREQUENCY_HZ,
            Duration::from_millis(ERROR_TONE_DURATION_MS),
        );
        Self {
            tones: vec![
                tone,
                tone.starting_at(Duration::from_millis(ERROR_TONE_SPACING_MS)),
            ],
            envelope: Envelope::default(),
            gain: DEFAULT_TONE_GAIN,
        }
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain.clamp(0.0, 1.0);
        self
    }

    /// Time from the first onset to the end of the last tone.
    pub fn duration(&self) -> Duration {
        self.tones
            .iter()
            .map(ToneSpec::end)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    /// Render the pattern as mono PCM at `sample_rate`.
    pub fn render(&self, sample_rate: u32) -> AudioClip {
        let rate = sample_rate.max(1);
        let mut samples = vec![0.0_f32; samples_for(self.duration(), rate)];

        for tone in &self.tones {
            let start = samples_for(tone.onset, rate);
            let count = samples_for(tone.duration, rate);
            let length = tone.duration.as_secs_f32();

            for (i, sample) in samples.iter_mut().skip(start).take(count).enumerate() {
                let t = i as f32 / rate as f32;
                let amplitude = self.envelope.amplitude(t, length);
                *sample += self.gain * amplitude * (TAU * tone.frequency_hz * t).sin();
            }
        }

        for sample in &mut samples {
            *sample = sample.clamp(-1.0, 1.0);
        }

        AudioClip::new(rate, samples)
    }
}

fn samples_for(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * f64::from(sample_rate)).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkin_core::constants::DEFAULT_SAMPLE_RATE;

    fn sign_changes(samples: &[f32]) -> usize {
        samples
            .iter()
            .filter(|s| s.abs() > 1e-6)
            .map(|s| s.is_sign_positive())
            .collect::<Vec<_>>()
            .windows(2)
            .filter(|w| w[0] != w[1])
            .count()
    }

    #[test]
    fn test_success_tone_length() {
        let clip = TonePattern::success().render(DEFAULT_SAMPLE_RATE);
        assert_eq!(clip.samples.len(), 4_410);
        assert_eq!(clip.duration(), Duration::from_millis(100));
    }

    #[test]
    fn test_success_tone_peak_respects_gain() {
        let clip = TonePattern::success().render(DEFAULT_SAMPLE_RATE);
        let peak = clip.peak();
        assert!(peak <= DEFAULT_TONE_GAIN + 1e-6, "peak {} above gain", peak);
        assert!(peak > DEFAULT_TONE_GAIN * 0.9, "peak {} too quiet", peak);
    }

    #[test]
    fn test_success_tone_pitch() {
        let clip = TonePattern::success().render(DEFAULT_SAMPLE_RATE);
        // 1200 Hz for 100 ms is 120 cycles, two sign changes per cycle.
        let changes = sign_changes(&clip.samples);
        assert!((230..=245).contains(&changes), "{} sign changes", changes);
    }

    #[test]
    fn test_success_tone_decays() {
        let clip = TonePattern::success().render(DEFAULT_SAMPLE_RATE);
        let tail_peak = clip.samples[clip.samples.len() - 100..]
            .iter()
            .fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!(tail_peak < DEFAULT_TONE_GAIN * 0.05);
    }

    #[test]
    fn test_error_pattern_has_two_tones_with_gap() {
        let pattern = TonePattern::error();
        assert_eq!(pattern.duration(), Duration::from_millis(350));

        let clip = pattern.render(DEFAULT_SAMPLE_RATE);
        let rate = DEFAULT_SAMPLE_RATE as usize;
        let gap = &clip.samples[rate * 121 / 1000..rate * 229 / 1000];
        assert!(gap.iter().all(|s| *s == 0.0));

        let second = &clip.samples[rate * 230 / 1000..];
        assert!(second.iter().any(|s| s.abs() > 0.1));
    }

    #[test]
    fn test_error_tone_pitch_is_low() {
        let clip = TonePattern::error().render(DEFAULT_SAMPLE_RATE);
        let first = &clip.samples[..DEFAULT_SAMPLE_RATE as usize * 120 / 1000];
        // 220 Hz for 120 ms is 26.4 cycles.
        let changes = sign_changes(first);
        assert!((50..=54).contains(&changes), "{} sign changes", changes);
    }

    #[test]
    fn test_render_is_deterministic() {
        let a = TonePattern::error().render(8_000);
        let b = TonePattern::error().render(8_000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_envelope_shape() {
        let envelope = Envelope::default();
        assert_eq!(envelope.amplitude(0.0, 0.1), 0.0);
        assert!((envelope.amplitude(0.005, 0.1) - 1.0).abs() < 1e-3);
        assert!((envelope.amplitude(0.1, 0.1) - TONE_DECAY_FLOOR).abs() < 1e-3);
        assert_eq!(envelope.amplitude(0.2, 0.1), 0.0);
    }

    #[test]
    fn test_gain_is_clamped() {
        let pattern = TonePattern::success().with_gain(4.0);
        assert_eq!(pattern.gain, 1.0);
        assert!(pattern.render(DEFAULT_SAMPLE_RATE).peak() <= 1.0);
    }
}
