use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::experiment::TriggerSettings;
use crate::gpio::RelayPolarity;
use crate::radio::{
    encode_tuning_command, FrequencyError, FrequencySpec, RadioVariant, TuningCommand,
};
use crate::telemetry::EncoderOptions;
use crate::transport::SUPPORTED_BAUD_RATES;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("frequency: {0}")]
    Frequency(#[from] FrequencyError),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub payload: String,
    #[serde(default)]
    pub frequency: Option<String>,
    pub radio: RadioConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    pub experiment: ExperimentConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RadioConfig {
    pub variant: RadioVariant,
    #[serde(default = "default_device")]
    pub device: PathBuf,
    pub baud: u32,
}

fn default_device() -> PathBuf {
    PathBuf::from("/dev/ttyAMA0")
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub board_current: bool,
    #[serde(default)]
    pub environmental: bool,
    /// Pause between sentences. Back to back when unset.
    #[serde(default, deserialize_with = "deserialize_opt_duration")]
    pub interval: Option<Duration>,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentConfig {
    /// BCM GPIO number of the relay line.
    pub relay_pin: u32,
    #[serde(default)]
    pub polarity: RelayPolarity,
    pub target_altitude: i32,
    #[serde(default = "default_free_fall_margin")]
    pub free_fall_margin: i32,
    #[serde(default = "default_hold", deserialize_with = "deserialize_duration")]
    pub hold: Duration,
    #[serde(default = "default_tick", deserialize_with = "deserialize_duration")]
    pub tick: Duration,
    #[serde(default = "default_gpio_root")]
    pub gpio_root: PathBuf,
    #[serde(default)]
    pub test_mode: TestModeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestModeConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_test_delay", deserialize_with = "deserialize_duration")]
    pub delay: Duration,
}

impl Default for TestModeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay: default_test_delay(),
        }
    }
}

fn default_free_fall_margin() -> i32 {
    TriggerSettings::DEFAULT_FREE_FALL_MARGIN
}

fn default_hold() -> Duration {
    TriggerSettings::DEFAULT_HOLD
}

fn default_tick() -> Duration {
    Duration::from_secs(1)
}

fn default_test_delay() -> Duration {
    TriggerSettings::DEFAULT_TEST_DELAY
}

fn default_gpio_root() -> PathBuf {
    PathBuf::from(crate::gpio::DEFAULT_SYSFS_ROOT)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
}

pub(crate) fn deserialize_opt_duration<'de, D>(
    deserializer: D,
) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value {
        Some(raw) => humantime::parse_duration(raw.trim())
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses and validates. Anything rejected here is a startup failure.
    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.payload.is_empty() {
            return invalid("payload id must not be empty".into());
        }
        if let Some(c) = self
            .payload
            .chars()
            .find(|c| !c.is_ascii_graphic() || matches!(c, ',' | '*' | '$'))
        {
            return invalid(format!("payload id contains forbidden character {:?}", c));
        }
        if !SUPPORTED_BAUD_RATES.contains(&self.radio.baud) {
            return invalid(format!(
                "unsupported baud rate {} (expected one of {:?})",
                self.radio.baud, SUPPORTED_BAUD_RATES
            ));
        }
        if self.experiment.free_fall_margin <= 0 {
            return invalid("experiment.free_fall_margin must be positive".into());
        }
        if self.experiment.tick.is_zero() {
            return invalid("experiment.tick must be positive".into());
        }
        self.tuning_command()?;
        Ok(())
    }

    /// Tuning command for the configured transmitter, if a frequency is set.
    pub fn tuning_command(&self) -> Result<Option<TuningCommand>, FrequencyError> {
        self.frequency
            .as_deref()
            .map(|f| {
                let spec = FrequencySpec::parse(f)?;
                encode_tuning_command(&spec, self.radio.variant)
            })
            .transpose()
    }

    pub fn encoder_options(&self) -> EncoderOptions {
        EncoderOptions {
            include_board_current: self.telemetry.board_current,
            include_environmental: self.telemetry.environmental,
        }
    }

    pub fn trigger_settings(&self) -> TriggerSettings {
        let experiment = &self.experiment;
        TriggerSettings {
            target_altitude: experiment.target_altitude,
            free_fall_margin: experiment.free_fall_margin,
            hold: experiment.hold,
            test_delay: experiment
                .test_mode
                .enabled
                .then_some(experiment.test_mode.delay),
        }
    }
}
