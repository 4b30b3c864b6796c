//! Configuration file support for the swing tracker.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/racket/config.toml`.
//! Every field has a default, so a partial file only overrides what it names.
//! Classifier thresholds are tuning values and are expected to change between
//! sensor generations, which is why they live here rather than in code.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Shot classifier thresholds (angular velocities in rad/s)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClassifierConfig {
    #[serde(default = "default_smash_threshold")]
    pub smash_threshold: f32,

    #[serde(default = "default_clear_threshold")]
    pub clear_threshold: f32,

    #[serde(default = "default_drive_threshold")]
    pub drive_threshold: f32,

    #[serde(default = "default_drop_threshold")]
    pub drop_threshold: f32,

    /// Matches scoring below this are discarded
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    /// Windows with fewer samples are never classified
    #[serde(default = "default_min_window_size")]
    pub min_window_size: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            smash_threshold: default_smash_threshold(),
            clear_threshold: default_clear_threshold(),
            drive_threshold: default_drive_threshold(),
            drop_threshold: default_drop_threshold(),
            min_confidence: default_min_confidence(),
            min_window_size: default_min_window_size(),
        }
    }
}

/// Sliding window and debounce configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    #[serde(default = "default_window_duration_millis")]
    pub window_duration_millis: i64,

    /// Minimum time between two accepted shots
    #[serde(default = "default_minimum_gap_millis")]
    pub minimum_gap_millis: i64,

    /// Hard capacity of the sample window, independent of its duration
    #[serde(default = "default_max_window_samples")]
    pub max_window_samples: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_duration_millis: default_window_duration_millis(),
            minimum_gap_millis: default_minimum_gap_millis(),
            max_window_samples: default_max_window_samples(),
        }
    }
}

/// Heart-rate model and session lifecycle configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Resting heart rate, the zero point for load and intensity ratios
    #[serde(default = "default_baseline_heart_rate")]
    pub baseline_heart_rate: f32,

    #[serde(default = "default_max_heart_rate")]
    pub max_heart_rate: f32,

    /// Capacity of the rolling heart-rate window
    #[serde(default = "default_heart_rate_history")]
    pub heart_rate_history: usize,

    /// Shotless sessions shorter than this are not saved
    #[serde(default = "default_min_persist_duration_millis")]
    pub min_persist_duration_millis: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            baseline_heart_rate: default_baseline_heart_rate(),
            max_heart_rate: default_max_heart_rate(),
            heart_rate_history: default_heart_rate_history(),
            min_persist_duration_millis: default_min_persist_duration_millis(),
        }
    }
}

/// Saved session history configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HistoryConfig {
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join("racket")
}

fn default_smash_threshold() -> f32 {
    5.5
}

fn default_clear_threshold() -> f32 {
    4.0
}

fn default_drive_threshold() -> f32 {
    3.0
}

fn default_drop_threshold() -> f32 {
    2.0
}

fn default_min_confidence() -> f32 {
    0.35
}

fn default_min_window_size() -> usize {
    5
}

fn default_window_duration_millis() -> i64 {
    260
}

fn default_minimum_gap_millis() -> i64 {
    420
}

fn default_max_window_samples() -> usize {
    256
}

fn default_baseline_heart_rate() -> f32 {
    60.0
}

fn default_max_heart_rate() -> f32 {
    195.0
}

fn default_heart_rate_history() -> usize {
    120
}

fn default_min_persist_duration_millis() -> i64 {
    90_000
}

fn default_max_sessions() -> usize {
    40
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("racket")
            .join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject values that would make the engine meaningless
    pub fn validate(&self) -> Result<()> {
        let c = &self.classifier;
        let thresholds = [
            ("smash_threshold", c.smash_threshold),
            ("clear_threshold", c.clear_threshold),
            ("drive_threshold", c.drive_threshold),
            ("drop_threshold", c.drop_threshold),
        ];
        for (name, value) in thresholds {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Config(format!(
                    "classifier.{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !(0.0..=1.0).contains(&c.min_confidence) {
            return Err(Error::Config(format!(
                "classifier.min_confidence must be within [0, 1], got {}",
                c.min_confidence
            )));
        }
        if c.min_window_size == 0 {
            return Err(Error::Config(
                "classifier.min_window_size must be at least 1".into(),
            ));
        }

        let p = &self.pipeline;
        if p.window_duration_millis <= 0 || p.minimum_gap_millis < 0 {
            return Err(Error::Config(format!(
                "pipeline durations must be positive (window {} ms, gap {} ms)",
                p.window_duration_millis, p.minimum_gap_millis
            )));
        }
        if p.max_window_samples < c.min_window_size {
            return Err(Error::Config(format!(
                "pipeline.max_window_samples ({}) is below classifier.min_window_size ({})",
                p.max_window_samples, c.min_window_size
            )));
        }

        let s = &self.session;
        if !(s.max_heart_rate > s.baseline_heart_rate) {
            return Err(Error::Config(format!(
                "session.max_heart_rate ({}) must exceed baseline_heart_rate ({})",
                s.max_heart_rate, s.baseline_heart_rate
            )));
        }
        if s.heart_rate_history == 0 {
            return Err(Error::Config(
                "session.heart_rate_history must be at least 1".into(),
            ));
        }

        if self.history.max_sessions == 0 {
            return Err(Error::Config("history.max_sessions must be at least 1".into()));
        }

        Ok(())
    }
}
