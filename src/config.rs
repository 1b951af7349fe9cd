use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RecoveryError;
use crate::logging::LogConfig;

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// Daily readiness scoring parameters
    pub readiness: ReadinessConfig,

    /// Subjective calibration parameters
    pub calibration: CalibrationConfig,

    /// In-workout fatigue tracking parameters
    pub fatigue: FatigueConfig,

    /// Logging output
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Readiness scorer parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessConfig {
    /// History days required before scoring (fewer returns the fallback)
    pub min_history_days: usize,

    /// Rolling baseline window in days
    pub baseline_window_days: usize,

    /// HRV z-score below which the HRV penalty applies
    pub hrv_z_threshold: f64,
    pub hrv_penalty_per_z: f64,
    pub hrv_penalty_cap: f64,

    /// Resting HR z-score above which the RHR penalty applies
    pub rhr_z_threshold: f64,
    pub rhr_penalty_per_z: f64,
    pub rhr_penalty_cap: f64,

    /// Sleep duration mapping to a duration factor of 0
    pub sleep_min_hours: f64,
    /// Sleep duration mapping to a duration factor of 1
    pub sleep_target_hours: f64,
    /// Deep + REM minutes mapping to a stage factor of 1
    pub restorative_target_minutes: f64,
    pub sleep_duration_weight: f64,
    pub sleep_efficiency_weight: f64,
    pub sleep_stage_weight: f64,
    /// Sleep quality below which the sleep penalty applies
    pub sleep_quality_threshold: f64,
    pub sleep_penalty_scale: f64,

    /// Trailing days considered for acute load
    pub load_window_days: usize,
    pub load_ewma_alpha: f64,
    pub load_ratio_threshold: f64,
    pub load_penalty_per_ratio: f64,
    pub load_penalty_cap: f64,

    /// Bonus for each improving 7-day trend
    pub trend_bonus: f64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        ReadinessConfig {
            min_history_days: 7,
            baseline_window_days: 7,
            hrv_z_threshold: -1.0,
            hrv_penalty_per_z: 10.0,
            hrv_penalty_cap: 20.0,
            rhr_z_threshold: 1.0,
            rhr_penalty_per_z: 8.0,
            rhr_penalty_cap: 15.0,
            sleep_min_hours: 5.0,
            sleep_target_hours: 8.0,
            restorative_target_minutes: 90.0,
            sleep_duration_weight: 0.5,
            sleep_efficiency_weight: 0.3,
            sleep_stage_weight: 0.2,
            sleep_quality_threshold: 0.85,
            sleep_penalty_scale: 25.0,
            load_window_days: 7,
            load_ewma_alpha: 0.3,
            load_ratio_threshold: 1.2,
            load_penalty_per_ratio: 25.0,
            load_penalty_cap: 20.0,
            trend_bonus: 5.0,
        }
    }
}

/// Calibration manager parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// EWMA smoothing factor for the bias
    pub smoothing_alpha: f64,

    /// Multiplier taking the 1-10 subjective scale onto the 0-100 band
    pub subjective_scale: f64,

    /// Bias magnitude below which no note is emitted
    pub note_threshold: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        CalibrationConfig {
            smoothing_alpha: 0.1,
            subjective_scale: 10.0,
            note_threshold: 0.05,
        }
    }
}

/// Fatigue tracker parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueConfig {
    /// Sliding sample buffer length (seconds)
    pub buffer_seconds: f64,
    /// Sub-window used for the HR derivative (seconds)
    pub derivative_window_seconds: f64,
    /// Derivative (bpm/s) that starts a set
    pub acceleration_threshold: f64,
    /// Derivative (bpm/s) that ends a set
    pub deceleration_threshold: f64,
    /// Derivative magnitude (bpm/s) treated as stable
    pub stable_threshold: f64,
    /// Longest set before recovery is forced (seconds)
    pub max_set_seconds: f64,
    /// Shortest rest period that is kept (seconds)
    pub min_rest_seconds: f64,
    /// Rest periods in the rolling recovery window
    pub rolling_window: usize,
    /// Normalized variance below which recovery has plateaued
    pub asymptote_variance: f64,
    /// Degradation (%) above which a plateau counts as an asymptote
    pub asymptote_degradation: f64,
    pub productive_degradation: f64,
    pub fatigued_degradation: f64,
    pub depleted_degradation: f64,
    /// Degradation (%) at which a session is considered spent
    pub depletion_limit: f64,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        FatigueConfig {
            buffer_seconds: 30.0,
            derivative_window_seconds: 10.0,
            acceleration_threshold: 0.5,
            deceleration_threshold: -0.3,
            stable_threshold: 0.1,
            max_set_seconds: 90.0,
            min_rest_seconds: 15.0,
            rolling_window: 3,
            asymptote_variance: 5.0,
            asymptote_degradation: 15.0,
            productive_degradation: 15.0,
            fatigued_degradation: 35.0,
            depleted_degradation: 40.0,
            depletion_limit: 50.0,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let now = Utc::now();

        EngineConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            readiness: ReadinessConfig::default(),
            calibration: CalibrationConfig::default(),
            fatigue: FatigueConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Configuration management implementation
impl EngineConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: EngineConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".recoveryrs")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::debug!(
                    path = %config_path.display(),
                    error = %err,
                    "Config file unavailable, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Reject parameter combinations the algorithms cannot work with
    pub fn validate(&self) -> std::result::Result<(), RecoveryError> {
        let r = &self.readiness;
        if r.baseline_window_days < 2 || r.load_window_days == 0 {
            return Err(invalid(
                "Readiness windows must cover at least two baseline days and one load day",
            ));
        }
        if !(0.0..=1.0).contains(&r.load_ewma_alpha) || r.load_ewma_alpha == 0.0 {
            return Err(invalid(format!(
                "load_ewma_alpha must be in (0, 1]: {}",
                r.load_ewma_alpha
            )));
        }
        if r.sleep_target_hours <= r.sleep_min_hours {
            return Err(invalid(format!(
                "sleep_target_hours ({}) must exceed sleep_min_hours ({})",
                r.sleep_target_hours,
                r.sleep_min_hours
            )));
        }
        if r.restorative_target_minutes <= 0.0 {
            return Err(invalid("restorative_target_minutes must be positive"));
        }

        let c = &self.calibration;
        if !(0.0..=1.0).contains(&c.smoothing_alpha) || c.smoothing_alpha == 0.0 {
            return Err(invalid(format!(
                "smoothing_alpha must be in (0, 1]: {}",
                c.smoothing_alpha
            )));
        }

        let f = &self.fatigue;
        if f.buffer_seconds <= 0.0 || f.derivative_window_seconds <= 0.0 {
            return Err(invalid("Fatigue buffer and derivative windows must be positive"));
        }
        if f.derivative_window_seconds > f.buffer_seconds {
            return Err(invalid("derivative_window_seconds cannot exceed buffer_seconds"));
        }
        if f.rolling_window == 0 {
            return Err(invalid("rolling_window must be at least 1"));
        }

        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> RecoveryError {
    RecoveryError::Configuration(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = EngineConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: EngineConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.metadata.version, deserialized.metadata.version);
        assert_eq!(config.readiness, deserialized.readiness);
        assert_eq!(config.fatigue, deserialized.fatigue);
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.calibration.smoothing_alpha = 0.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.readiness.sleep_target_hours = 4.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.fatigue.derivative_window_seconds = 60.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = EngineConfig::default();
        original.fatigue.min_rest_seconds = 20.0;
        original.save_to_file(&config_path).unwrap();

        let loaded = EngineConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.fatigue.min_rest_seconds, 20.0);
        assert_eq!(loaded.readiness, ReadinessConfig::default());
    }

    #[test]
    fn test_load_missing_file_fails_with_context() {
        let temp_dir = tempdir().unwrap();
        let err = EngineConfig::load_from_file(temp_dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
