// Library interface for RecoveryRS modules
// The CLI and the integration tests both build on these

pub mod calibration;
pub mod config;
pub mod error;
pub mod fatigue;
pub mod import;
pub mod load;
pub mod logging;
pub mod models;
pub mod readiness;
pub mod stats;
pub mod summary;

// Re-export commonly used types for convenience
pub use models::*;
pub use calibration::{CalibrationManager, CalibrationOutcome, CalibrationState};
pub use config::EngineConfig;
pub use fatigue::{FatigueLevel, FatigueSnapshot, FatigueTracker, RestPeriod, SessionSummary, WorkoutPhase};
pub use load::{AcuteLoad, LoadCalculator};
pub use readiness::{ReadinessResult, ReadinessScorer, ReadinessStatus, TrainingRecommendation};
pub use summary::{summarize_recovery, BedtimeConsistency, RecoverySummary, TrendDirection};
pub use error::{RecoveryError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
