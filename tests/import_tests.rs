//! Integration tests for the file loaders
//!
//! Covers:
//! - JSON biometrics, history and workouts
//! - Heart-rate CSV column aliases and timestamp layouts
//! - Error reporting for missing or malformed files

use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

use recoveryrs::error::{ImportError, RecoveryError};
use recoveryrs::fatigue::{FatigueTracker, WorkoutPhase};
use recoveryrs::import::{self, HeartRateCsvImporter, ImportFormat};
use recoveryrs::models::ActivityType;

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_daily_biometrics() {
    let dir = tempdir().unwrap();
    let path = write_file(
        &dir,
        "today.json",
        r#"{
            "date": "2024-09-10",
            "cardiovascular": { "hrv_ms": 48.5, "resting_heart_rate": 57 },
            "sleep": {
                "bedtime": "2024-09-09T22:45:00Z",
                "wake_time": "2024-09-10T06:30:00Z",
                "total_sleep_minutes": 440,
                "efficiency": 0.91
            }
        }"#,
    );

    let today = import::load_daily_biometrics(&path).unwrap();
    assert_eq!(today.date.to_string(), "2024-09-10");
    assert_eq!(today.hrv(), Some(48.5));
    assert_eq!(today.resting_heart_rate(), Some(57.0));
    // Omitted sections default to absent
    assert_eq!(today.activity.step_count, 0);
}

#[test]
fn test_history_sorted_by_date() {
    let dir = tempdir().unwrap();
    let path = write_file(
        &dir,
        "history.json",
        r#"[
            { "date": "2024-09-08", "cardiovascular": { "hrv_ms": 51 } },
            { "date": "2024-09-06", "cardiovascular": { "hrv_ms": 49 } },
            { "date": "2024-09-07" }
        ]"#,
    );

    let history = import::load_biometric_history(&path).unwrap();
    let dates: Vec<String> = history.iter().map(|d| d.date.to_string()).collect();
    assert_eq!(dates, vec!["2024-09-06", "2024-09-07", "2024-09-08"]);
    assert_eq!(history[1].hrv(), None);
}

#[test]
fn test_load_workouts() {
    let dir = tempdir().unwrap();
    let path = write_file(
        &dir,
        "workouts.json",
        r#"[
            {
                "activity_type": "strength_training",
                "start_time": "2024-09-09T17:00:00Z",
                "duration_minutes": 55,
                "total_energy_kcal": 410
            }
        ]"#,
    );

    let workouts = import::load_workouts(&path).unwrap();
    assert_eq!(workouts.len(), 1);
    assert_eq!(workouts[0].activity_type, ActivityType::StrengthTraining);
    assert_eq!(workouts[0].average_heart_rate, 0.0);
}

#[test]
fn test_missing_file_reported() {
    let dir = tempdir().unwrap();
    let err = import::load_workouts(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(
        err,
        RecoveryError::Import(ImportError::FileNotFound { .. })
    ));
}

#[test]
fn test_malformed_json_reported() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "broken.json", r#"[{ "date": "not a date" }]"#);

    let err = import::load_biometric_history(&path).unwrap_err();
    match err {
        RecoveryError::Import(ImportError::ParseError { format, .. }) => assert_eq!(format, "JSON"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_csv_with_aliased_columns() {
    let dir = tempdir().unwrap();
    let path = write_file(
        &dir,
        "hr.csv",
        "Time,Heart Rate,Source\n\
         2024-09-10T17:30:02Z,101,watch\n\
         2024-09-10T17:30:00Z,99,watch\n\
         2024-09-10T17:30:01Z,100,watch\n",
    );

    let importer = HeartRateCsvImporter::new();
    assert!(importer.can_import(&path));

    let samples = importer.import_file(&path).unwrap();
    let bpm: Vec<f64> = samples.iter().map(|s| s.bpm).collect();
    // Returned in timestamp order
    assert_eq!(bpm, vec![99.0, 100.0, 101.0]);
}

#[test]
fn test_csv_epoch_timestamps_and_bad_rows() {
    let dir = tempdir().unwrap();
    let path = write_file(
        &dir,
        "epoch.csv",
        "timestamp,bpm\n\
         1725989400,120\n\
         1725989401,\n\
         garbage,130\n\
         1725989402,122\n",
    );

    let samples = HeartRateCsvImporter::new().import_file(&path).unwrap();
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].timestamp.timestamp(), 1725989400);
    assert_eq!(samples[1].bpm, 122.0);
}

#[test]
fn test_csv_missing_bpm_column() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "nobpm.csv", "timestamp,power\n1725989400,250\n");

    let err = HeartRateCsvImporter::new().import_file(&path).unwrap_err();
    assert!(matches!(
        err,
        RecoveryError::Import(ImportError::MissingData { .. })
    ));
}

#[test]
fn test_csv_replay_through_tracker() {
    let dir = tempdir().unwrap();
    let mut content = String::from("timestamp,bpm\n");
    let start = 1_725_989_400i64;
    for t in 0..=20 {
        content.push_str(&format!("{},{}\n", start + t, 100 + 2 * t));
    }
    for t in 21..=40 {
        content.push_str(&format!("{},{}\n", start + t, 140 - (t - 20)));
    }
    for t in 41..=60 {
        content.push_str(&format!("{},120\n", start + t));
    }
    let path = write_file(&dir, "session.csv", &content);

    let samples = HeartRateCsvImporter::new().import_file(&path).unwrap();
    let mut tracker = FatigueTracker::default();
    for sample in samples {
        tracker.process(sample).unwrap();
    }

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.phase, WorkoutPhase::Resting);
    assert_eq!(snapshot.rest_periods.len(), 1);
    assert_eq!(snapshot.peak_hr, 140.0);
}
