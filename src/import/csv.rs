use chrono::{DateTime, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{ImportError, Result};
use crate::import::{ensure_exists, has_extension, ImportFormat};
use crate::models::HeartRateSample;

const TIMESTAMP: &str = "timestamp";
const BPM: &str = "bpm";

/// Heart-rate stream importer with flexible column mapping
///
/// Expects one reading per row with a timestamp (RFC 3339, a common
/// date-time layout, or Unix epoch seconds) and a bpm value. Rows are
/// returned in timestamp order.
pub struct HeartRateCsvImporter {
    column_mapping: HashMap<String, String>,
}

impl HeartRateCsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Common column name variations
        Self::add_mapping(
            &mut column_mapping,
            TIMESTAMP,
            &["timestamp", "time", "datetime", "date", "start_date", "recorded_at"],
        );
        Self::add_mapping(
            &mut column_mapping,
            BPM,
            &["bpm", "heart_rate", "hr", "heartrate", "value"],
        );

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
        let value = value.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&Utc));
        }

        let formats = [
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S%.f",
            "%d/%m/%Y %H:%M:%S",
        ];
        for format in &formats {
            if let Ok(naive_dt) = NaiveDateTime::parse_from_str(value, format) {
                return Some(DateTime::from_naive_utc_and_offset(naive_dt, Utc));
            }
        }

        // Epoch seconds, possibly fractional
        let seconds = value.parse::<f64>().ok().filter(|s| s.is_finite())?;
        let whole = seconds.floor();
        let nanos = ((seconds - whole) * 1e9).round() as u32;
        DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
    }

    fn column_index(&self, headers: &csv::StringRecord, standard: &str) -> Result<usize> {
        headers
            .iter()
            .position(|header| self.normalize_column_name(header) == standard)
            .ok_or_else(|| {
                ImportError::MissingData {
                    field: format!("{} column", standard),
                }
                .into()
            })
    }
}

impl Default for HeartRateCsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for HeartRateCsvImporter {
    type Record = HeartRateSample;

    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "csv")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<HeartRateSample>> {
        ensure_exists(file_path)?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(file_path)
            .map_err(|e| self.parse_error(e))?;

        let headers = reader.headers().map_err(|e| self.parse_error(e))?.clone();
        let timestamp_col = self.column_index(&headers, TIMESTAMP)?;
        let bpm_col = self.column_index(&headers, BPM)?;

        let mut samples = Vec::new();
        let mut skipped = 0usize;

        for (row, result) in reader.records().enumerate() {
            let record = result.map_err(|e| self.parse_error(e))?;
            let timestamp = record.get(timestamp_col).and_then(Self::parse_datetime);
            let bpm = record.get(bpm_col).and_then(|v| v.parse::<f64>().ok());

            match (timestamp, bpm) {
                (Some(timestamp), Some(bpm)) => samples.push(HeartRateSample::new(timestamp, bpm)),
                _ => {
                    skipped += 1;
                    tracing::warn!(row = row + 2, "Skipping unparseable heart rate row");
                }
            }
        }

        if samples.is_empty() {
            return Err(ImportError::MissingData {
                field: "heart rate samples".to_string(),
            }
            .into());
        }

        samples.sort_by_key(|sample| sample.timestamp);

        tracing::info!(
            file = %file_path.display(),
            format = self.format_name(),
            samples = samples.len(),
            skipped,
            "Imported heart rate stream"
        );

        Ok(samples)
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}
