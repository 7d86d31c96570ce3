//! Kiosk configuration file.
//!
//! Every key is optional. Durations are given in milliseconds.
//!
//! ```toml
//! [terminal]
//! success_dwell_ms = 4000
//! rejection_delay_ms = 1500
//! verification_timeout_ms = 10000
//! roster_cache_ttl_ms = 0
//!
//! [camera]
//! frame_rate = 10
//! allow_fallback = true
//!
//! [audio]
//! enabled = true
//! gain = 0.3
//!
//! [database]
//! path = "checkin.db"
//!
//! [logging]
//! filter = "info"
//! format = "text"
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use checkin_core::constants::{
    DEFAULT_BANNER_COLUMNS, DEFAULT_FRAME_RATE, DEFAULT_REJECTION_DELAY_MS,
    DEFAULT_ROSTER_CACHE_TTL_MS, DEFAULT_SAMPLE_RATE, DEFAULT_SUCCESS_DWELL_MS,
    DEFAULT_TONE_GAIN, DEFAULT_VERIFICATION_TIMEOUT_MS,
};
use checkin_core::Error;
use checkin_hardware::{CameraConfig, CameraFacing};
use checkin_storage::DatabaseConfig;
use checkin_terminal::{FeedbackConfig, TerminalConfig};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KioskConfig {
    pub terminal: TerminalSection,
    pub camera: CameraSection,
    pub audio: AudioSection,
    pub database: DatabaseSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerminalSection {
    pub success_dwell_ms: u64,
    pub rejection_delay_ms: u64,
    pub verification_timeout_ms: u64,
    pub roster_cache_ttl_ms: u64,
    pub banner_columns: usize,
}

impl Default for TerminalSection {
    fn default() -> Self {
        Self {
            success_dwell_ms: DEFAULT_SUCCESS_DWELL_MS,
            rejection_delay_ms: DEFAULT_REJECTION_DELAY_MS,
            verification_timeout_ms: DEFAULT_VERIFICATION_TIMEOUT_MS,
            roster_cache_ttl_ms: DEFAULT_ROSTER_CACHE_TTL_MS,
            banner_columns: DEFAULT_BANNER_COLUMNS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraSection {
    pub frame_rate: u32,
    pub allow_fallback: bool,

    /// Lenses of the simulated camera used by `run`.
    pub simulated_facings: Vec<CameraFacing>,
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            allow_fallback: true,
            simulated_facings: vec![CameraFacing::User],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioSection {
    /// `false` simulates a kiosk without a speaker.
    pub enabled: bool,
    pub sample_rate: u32,
    pub gain: f32,
}

impl Default for AudioSection {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: DEFAULT_SAMPLE_RATE,
            gain: DEFAULT_TONE_GAIN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSection {
    pub path: String,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        let defaults = DatabaseConfig::default();
        Self {
            path: defaults.database_path,
            max_connections: defaults.max_connections,
            busy_timeout_ms: u64::try_from(defaults.busy_timeout.as_millis()).unwrap_or(5_000),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl KioskConfig {
    /// Load `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the terminal cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.camera.frame_rate == 0 {
            return Err(Error::Config("camera.frame_rate must be positive".into()));
        }
        if self.audio.sample_rate == 0 {
            return Err(Error::Config("audio.sample_rate must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.audio.gain) {
            return Err(Error::Config(format!(
                "audio.gain must be between 0.0 and 1.0, got {}",
                self.audio.gain
            )));
        }
        if self.terminal.banner_columns == 0 {
            return Err(Error::Config("terminal.banner_columns must be positive".into()));
        }
        if self.terminal.verification_timeout_ms == 0 {
            return Err(Error::Config(
                "terminal.verification_timeout_ms must be positive".into(),
            ));
        }
        if self.database.path.trim().is_empty() {
            return Err(Error::Config("database.path must not be empty".into()));
        }
        Ok(())
    }

    pub fn terminal_config(&self) -> TerminalConfig {
        let terminal = &self.terminal;
        TerminalConfig::default()
            .with_success_dwell(Duration::from_millis(terminal.success_dwell_ms))
            .with_rejection_delay(Duration::from_millis(terminal.rejection_delay_ms))
            .with_verification_timeout(Duration::from_millis(terminal.verification_timeout_ms))
            .with_roster_cache_ttl(Duration::from_millis(terminal.roster_cache_ttl_ms))
            .with_camera(
                CameraConfig::default()
                    .with_frame_rate(self.camera.frame_rate)
                    .with_fallback(self.camera.allow_fallback),
            )
            .with_feedback(
                FeedbackConfig::default()
                    .with_sample_rate(self.audio.sample_rate)
                    .with_gain(self.audio.gain)
                    .with_banner_columns(terminal.banner_columns),
            )
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = KioskConfig::from_toml_str("").unwrap();
        assert_eq!(config, KioskConfig::default());
        assert_eq!(config.terminal_config(), TerminalConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = KioskConfig::from_toml_str(
            r#"
            [terminal]
            success_dwell_ms = 2500
            roster_cache_ttl_ms = 60000

            [camera]
            simulated_facings = ["environment"]

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        let terminal = config.terminal_config();
        assert_eq!(terminal.success_dwell, Duration::from_millis(2500));
        assert_eq!(terminal.roster_cache_ttl, Duration::from_secs(60));
        assert_eq!(terminal.rejection_delay, Duration::from_millis(1500));
        assert_eq!(
            config.camera.simulated_facings,
            vec![CameraFacing::Environment]
        );
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = KioskConfig::from_toml_str("[terminal]\ndwell = 3\n").unwrap_err();
        assert!(format!("{:#}", err).contains("dwell"));
    }

    #[test]
    fn test_invalid_gain_rejected() {
        let err = KioskConfig::from_toml_str("[audio]\ngain = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("audio.gain"));
    }

    #[test]
    fn test_zero_frame_rate_rejected() {
        let config = KioskConfig {
            camera: CameraSection {
                frame_rate: 0,
                ..CameraSection::default()
            },
            ..KioskConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_database_config() {
        let config = KioskConfig::from_toml_str(
            "[database]\npath = \"/var/lib/kiosk/checkin.db\"\nbusy_timeout_ms = 250\n",
        )
        .unwrap();

        let database = config.database_config();
        assert_eq!(database.database_path, "/var/lib/kiosk/checkin.db");
        assert_eq!(database.busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(KioskConfig::load(Some(missing.as_path())).is_err());
        assert_eq!(KioskConfig::load(None).unwrap(), KioskConfig::default());
    }
}
