use serde::de::DeserializeOwned;
use std::fs;
use std::marker::PhantomData;
use std::path::Path;

use crate::error::Result;
use crate::import::{ensure_exists, has_extension, ImportFormat};
use crate::models::{DailyBiometrics, WorkoutData};

/// JSON importer for a list of records of type `T`
pub struct JsonImporter<T> {
    _record: PhantomData<T>,
}

impl<T> JsonImporter<T> {
    pub fn new() -> Self {
        JsonImporter {
            _record: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> JsonImporter<T> {
    /// Read the whole file as one JSON value of type `U`
    fn read<U: DeserializeOwned>(&self, file_path: &Path) -> Result<U> {
        ensure_exists(file_path)?;
        let content = fs::read_to_string(file_path)?;
        serde_json::from_str(&content)
            .map_err(|e| self.parse_error(format!("{}: {}", file_path.display(), e)))
    }
}

impl<T> Default for JsonImporter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> ImportFormat for JsonImporter<T> {
    type Record = T;

    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "json")
    }

    /// Accepts either a JSON array or a single object
    fn import_file(&self, file_path: &Path) -> Result<Vec<T>> {
        let value: serde_json::Value = self.read(file_path)?;
        let records = match value {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<std::result::Result<Vec<T>, _>>(),
            single => serde_json::from_value(single).map(|record| vec![record]),
        }
        .map_err(|e| self.parse_error(format!("{}: {}", file_path.display(), e)))?;

        tracing::debug!(
            file = %file_path.display(),
            format = self.format_name(),
            records = records.len(),
            "Imported JSON records"
        );
        Ok(records)
    }

    fn format_name(&self) -> &'static str {
        "JSON"
    }
}

/// Load one day of biometrics (a single JSON object)
pub fn load_daily_biometrics(file_path: &Path) -> Result<DailyBiometrics> {
    JsonImporter::<DailyBiometrics>::new().read(file_path)
}

/// Load prior days, sorted by date
pub fn load_biometric_history(file_path: &Path) -> Result<Vec<DailyBiometrics>> {
    let mut history = JsonImporter::<DailyBiometrics>::new().import_file(file_path)?;
    history.sort_by_key(|day| day.date);
    Ok(history)
}

pub fn load_workouts(file_path: &Path) -> Result<Vec<WorkoutData>> {
    JsonImporter::<WorkoutData>::new().import_file(file_path)
}
