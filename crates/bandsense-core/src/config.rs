//! Configuration management
//!
//! Detector tuning, metrics server settings and logging preferences, stored as
//! JSON in the platform config directory. Missing fields fall back to their
//! defaults so older files keep loading.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::band::{Band, BandSettings};
use crate::error::{CoreError, Result};
use crate::logging::LogConfig;

/// Tuning for the dual-band detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Low band (bass / kick)
    pub low: BandSettings,
    /// High band (voice / presence)
    pub high: BandSettings,
    /// Minimum time between two fires of the same band, in milliseconds
    pub cooldown_ms: u64,
    /// Envelope attack coefficient
    pub attack: f32,
    /// Envelope release coefficient
    pub release: f32,
    /// Noise floor smoothing coefficient
    pub noise_smoothing: f32,
    /// Per-sample lower bound on noise floor decay (fraction of previous value)
    pub noise_decay_clamp: f32,
    /// Margin above the noise floor for the raw threshold, in dB
    pub margin_db: f32,
    /// Threshold smoothing speed per buffer
    pub threshold_speed: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            low: BandSettings::default_for(Band::Low),
            high: BandSettings::default_for(Band::High),
            cooldown_ms: 80,
            attack: 0.8,
            release: 0.02,
            noise_smoothing: 0.002,
            noise_decay_clamp: 0.995,
            margin_db: 3.5,
            threshold_speed: 0.5,
        }
    }
}

impl DetectorConfig {
    /// Settings of one band
    pub fn band(&self, band: Band) -> &BandSettings {
        match band {
            Band::Low => &self.low,
            Band::High => &self.high,
        }
    }

    /// Cooldown as a duration
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Check all coefficients are in range
    pub fn validate(&self) -> Result<()> {
        let unit = [
            ("attack", self.attack),
            ("release", self.release),
            ("noise_smoothing", self.noise_smoothing),
            ("noise_decay_clamp", self.noise_decay_clamp),
            ("threshold_speed", self.threshold_speed),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(CoreError::Config(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, value
                )));
            }
        }
        if !self.margin_db.is_finite() {
            return Err(CoreError::Config("margin_db must be finite".to_string()));
        }
        for band in Band::ALL {
            let settings = self.band(band);
            if !settings.min_threshold_db.is_finite() {
                return Err(CoreError::Config(format!(
                    "{} band min_threshold_db must be finite",
                    band
                )));
            }
            if !settings.center_hz.is_finite() || settings.center_hz <= 0.0 {
                return Err(CoreError::Config(format!(
                    "{} band center_hz must be positive",
                    band
                )));
            }
            if !settings.q.is_finite() || settings.q <= 0.0 {
                return Err(CoreError::Config(format!("{} band q must be positive", band)));
            }
        }
        Ok(())
    }
}

/// Debug metrics server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsServerSettings {
    /// Publish snapshots and serve them over HTTP
    pub enabled: bool,
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for MetricsServerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            // Local only: the page is a debugging aid, not a public endpoint
            host: "127.0.0.1".to_string(),
            port: 5005,
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Detector tuning
    pub detector: DetectorConfig,
    /// Metrics server
    pub metrics: MetricsServerSettings,
    /// Logging
    pub log: LogConfig,
    /// Capture device name; `None` uses the system default
    pub audio_device: Option<String>,
}

impl AppConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("BandSense");
            p.push("config.json");
            p
        })
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file yields the defaults. A file that exists but cannot be
    /// parsed or fails validation is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(p) => p,
            None => return Ok(Self::default()),
        };
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.detector.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Save as pretty JSON, creating the parent directory
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
