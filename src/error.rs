//! Unified error hierarchy for RecoveryRS
//!
//! The scoring algorithms degrade gracefully and never fail on their own.
//! Errors only surface at the boundary: malformed inputs, unreadable files
//! and bad configuration.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all RecoveryRS operations
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// Structurally invalid input rejected at the boundary
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Import errors (JSON/CSV loaders)
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Calibration state could not be restored or persisted
    #[error("Calibration error: {0}")]
    Calibration(String),
}

/// Boundary validation failures for biometric inputs
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Duration is negative or not finite
    #[error("Invalid duration for {field}: {value}")]
    InvalidDuration { field: String, value: f64 },

    /// Heart rate outside the plausible range
    #[error("Heart rate out of range for {field}: {value} bpm (valid: 20-250)")]
    HeartRateOutOfRange { field: String, value: f64 },

    /// Fraction outside [0, 1]
    #[error("Fraction out of range for {field}: {value} (valid: 0-1)")]
    FractionOutOfRange { field: String, value: f64 },

    /// Negative value where only non-negative values make sense
    #[error("Negative value for {field}: {value}")]
    NegativeValue { field: String, value: f64 },

    /// NaN or infinite value
    #[error("Non-finite value for {field}")]
    NonFinite { field: String },

    /// Wake time earlier than bedtime
    #[error("Wake time precedes bedtime")]
    WakeBeforeBedtime,

    /// Subjective recovery rating outside the 1-10 scale
    #[error("Subjective rating out of range: {0} (valid: 1-10)")]
    SubjectiveOutOfRange(f64),

    /// Heart-rate sample older than the previous one
    #[error("Out-of-order heart rate sample: {current} precedes {previous}")]
    OutOfOrderSample { previous: String, current: String },

    /// More than one record for the same calendar date
    #[error("Duplicate biometrics record for {0}")]
    DuplicateDate(NaiveDate),
}

/// Import errors for the file loaders
#[derive(Debug, Error)]
pub enum ImportError {
    /// File not found at specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// Required column or field missing
    #[error("Missing required data: {field}")]
    MissingData { field: String },
}

/// Result type alias for RecoveryRS operations
pub type Result<T> = std::result::Result<T, RecoveryError>;

impl RecoveryError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RecoveryError::Validation(_) => ErrorSeverity::Warning,
            RecoveryError::Import(ImportError::FileNotFound { .. }) => ErrorSeverity::Warning,
            RecoveryError::Import(_) => ErrorSeverity::Error,
            RecoveryError::Io(_) => ErrorSeverity::Error,
            RecoveryError::Configuration(_) => ErrorSeverity::Critical,
            RecoveryError::Calibration(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            RecoveryError::Import(ImportError::FileNotFound { path }) => {
                format!("Could not find data file: {}", path.display())
            }
            RecoveryError::Validation(ValidationError::SubjectiveOutOfRange(value)) => {
                format!("Recovery rating must be between 1 and 10 (got {})", value)
            }
            RecoveryError::Validation(err) => {
                format!("Some biometric data looks invalid: {}", err)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
