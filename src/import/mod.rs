//! File loaders for the CLI and integration tests
//!
//! Daily biometrics, workouts and calibration state are read from JSON;
//! live heart-rate streams are replayed from CSV exports.

use std::fmt::Display;
use std::path::Path;

use crate::error::{ImportError, RecoveryError, Result};

pub mod csv;
pub mod json;

pub use self::csv::HeartRateCsvImporter;
pub use self::json::{load_biometric_history, load_daily_biometrics, load_workouts};

/// Trait for importing records from one file format
pub trait ImportFormat {
    type Record;

    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Import every record from the file
    fn import_file(&self, file_path: &Path) -> Result<Vec<Self::Record>>;

    /// Get the format name for this importer
    fn format_name(&self) -> &'static str;

    /// Parse failure tagged with this importer's format
    fn parse_error(&self, reason: impl Display) -> RecoveryError {
        ImportError::ParseError {
            format: self.format_name().to_string(),
            reason: reason.to_string(),
        }
        .into()
    }
}

pub(crate) fn ensure_exists(file_path: &Path) -> Result<()> {
    if file_path.is_file() {
        Ok(())
    } else {
        Err(ImportError::FileNotFound {
            path: file_path.to_path_buf(),
        }
        .into())
    }
}

pub(crate) fn has_extension(file_path: &Path, expected: &str) -> bool {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}
