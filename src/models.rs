//! Signal models consumed by the recovery engine
//!
//! All biometric fields use `0.0` (or `None` for timestamps) to mean "not
//! recorded". Missing fields lower confidence but never fail a computation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Lowest heart rate accepted from a sensor or health store
pub const MIN_PLAUSIBLE_BPM: f64 = 20.0;

/// Highest heart rate accepted from a sensor or health store
pub const MAX_PLAUSIBLE_BPM: f64 = 250.0;

/// Cardiovascular metrics for one day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardiovascularMetrics {
    /// Mean heart rate across the day (bpm)
    pub mean_heart_rate: f64,

    /// Heart rate variability (SDNN/RMSSD, ms)
    pub hrv_ms: f64,

    /// Resting heart rate (bpm)
    pub resting_heart_rate: f64,

    /// One-minute heart rate recovery after exertion (bpm drop)
    pub heart_rate_recovery: f64,

    /// Estimated VO2max (ml/kg/min)
    pub vo2_max: f64,

    /// Respiratory rate (breaths/min)
    pub respiratory_rate: f64,
}

/// Sleep metrics for the night ending on this day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepMetrics {
    pub bedtime: Option<DateTime<Utc>>,
    pub wake_time: Option<DateTime<Utc>>,

    /// Total time asleep in minutes
    pub total_sleep_minutes: f64,
    pub rem_minutes: f64,
    pub core_minutes: f64,
    pub deep_minutes: f64,
    pub awake_minutes: f64,

    /// Time asleep / time in bed (0-1)
    pub efficiency: f64,
}

impl SleepMetrics {
    /// Deep plus REM minutes
    pub fn restorative_minutes(&self) -> f64 {
        self.deep_minutes + self.rem_minutes
    }

    pub fn total_sleep_hours(&self) -> f64 {
        self.total_sleep_minutes / 60.0
    }
}

/// Activity and energy metrics for one day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityMetrics {
    pub active_energy_kcal: f64,
    pub basal_energy_kcal: f64,
    pub step_count: u32,
    pub exercise_minutes: f64,
    pub stand_hours: u32,
}

/// One calendar day of aggregated biometrics
///
/// Exactly one record exists per date. A new day produces a new record; a
/// record is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBiometrics {
    /// Local calendar date this record is keyed on
    pub date: NaiveDate,

    #[serde(default)]
    pub cardiovascular: CardiovascularMetrics,

    #[serde(default)]
    pub sleep: SleepMetrics,

    #[serde(default)]
    pub activity: ActivityMetrics,
}

/// Every field that counts towards data completeness
///
/// Confidence is derived from this explicit list instead of inspecting the
/// record at runtime, so adding a field to the model means adding it here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiometricField {
    MeanHeartRate,
    Hrv,
    RestingHeartRate,
    HeartRateRecovery,
    Vo2Max,
    RespiratoryRate,
    Bedtime,
    WakeTime,
    TotalSleep,
    RemSleep,
    CoreSleep,
    DeepSleep,
    AwakeTime,
    SleepEfficiency,
    ActiveEnergy,
    BasalEnergy,
    StepCount,
    ExerciseTime,
    StandHours,
}

impl BiometricField {
    pub const ALL: [BiometricField; 19] = [
        BiometricField::MeanHeartRate,
        BiometricField::Hrv,
        BiometricField::RestingHeartRate,
        BiometricField::HeartRateRecovery,
        BiometricField::Vo2Max,
        BiometricField::RespiratoryRate,
        BiometricField::Bedtime,
        BiometricField::WakeTime,
        BiometricField::TotalSleep,
        BiometricField::RemSleep,
        BiometricField::CoreSleep,
        BiometricField::DeepSleep,
        BiometricField::AwakeTime,
        BiometricField::SleepEfficiency,
        BiometricField::ActiveEnergy,
        BiometricField::BasalEnergy,
        BiometricField::StepCount,
        BiometricField::ExerciseTime,
        BiometricField::StandHours,
    ];
}

impl DailyBiometrics {
    /// Create an empty record for a date
    pub fn new(date: NaiveDate) -> Self {
        DailyBiometrics {
            date,
            cardiovascular: CardiovascularMetrics::default(),
            sleep: SleepMetrics::default(),
            activity: ActivityMetrics::default(),
        }
    }

    pub fn with_cardiovascular(mut self, cardiovascular: CardiovascularMetrics) -> Self {
        self.cardiovascular = cardiovascular;
        self
    }

    pub fn with_sleep(mut self, sleep: SleepMetrics) -> Self {
        self.sleep = sleep;
        self
    }

    pub fn with_activity(mut self, activity: ActivityMetrics) -> Self {
        self.activity = activity;
        self
    }

    /// HRV if recorded
    pub fn hrv(&self) -> Option<f64> {
        present(self.cardiovascular.hrv_ms)
    }

    /// Resting heart rate if recorded
    pub fn resting_heart_rate(&self) -> Option<f64> {
        present(self.cardiovascular.resting_heart_rate)
    }

    /// Whether a field carries a real (non-zero, non-default) value
    pub fn is_present(&self, field: BiometricField) -> bool {
        let cv = &self.cardiovascular;
        let sleep = &self.sleep;
        let activity = &self.activity;

        match field {
            BiometricField::MeanHeartRate => cv.mean_heart_rate > 0.0,
            BiometricField::Hrv => cv.hrv_ms > 0.0,
            BiometricField::RestingHeartRate => cv.resting_heart_rate > 0.0,
            BiometricField::HeartRateRecovery => cv.heart_rate_recovery > 0.0,
            BiometricField::Vo2Max => cv.vo2_max > 0.0,
            BiometricField::RespiratoryRate => cv.respiratory_rate > 0.0,
            BiometricField::Bedtime => sleep.bedtime.is_some(),
            BiometricField::WakeTime => sleep.wake_time.is_some(),
            BiometricField::TotalSleep => sleep.total_sleep_minutes > 0.0,
            BiometricField::RemSleep => sleep.rem_minutes > 0.0,
            BiometricField::CoreSleep => sleep.core_minutes > 0.0,
            BiometricField::DeepSleep => sleep.deep_minutes > 0.0,
            BiometricField::AwakeTime => sleep.awake_minutes > 0.0,
            BiometricField::SleepEfficiency => sleep.efficiency > 0.0,
            BiometricField::ActiveEnergy => activity.active_energy_kcal > 0.0,
            BiometricField::BasalEnergy => activity.basal_energy_kcal > 0.0,
            BiometricField::StepCount => activity.step_count > 0,
            BiometricField::ExerciseTime => activity.exercise_minutes > 0.0,
            BiometricField::StandHours => activity.stand_hours > 0,
        }
    }

    /// Fraction of enumerated fields that are present (0-1)
    pub fn completeness(&self) -> f64 {
        let present = BiometricField::ALL
            .iter()
            .filter(|field| self.is_present(**field))
            .count();
        present as f64 / BiometricField::ALL.len() as f64
    }

    /// Reject structurally invalid records
    pub fn validate(&self) -> Result<(), ValidationError> {
        let cv = &self.cardiovascular;
        check_heart_rate("mean_heart_rate", cv.mean_heart_rate)?;
        check_heart_rate("resting_heart_rate", cv.resting_heart_rate)?;
        check_non_negative("hrv_ms", cv.hrv_ms)?;
        check_non_negative("heart_rate_recovery", cv.heart_rate_recovery)?;
        check_non_negative("vo2_max", cv.vo2_max)?;
        check_non_negative("respiratory_rate", cv.respiratory_rate)?;

        let sleep = &self.sleep;
        check_duration("total_sleep_minutes", sleep.total_sleep_minutes)?;
        check_duration("rem_minutes", sleep.rem_minutes)?;
        check_duration("core_minutes", sleep.core_minutes)?;
        check_duration("deep_minutes", sleep.deep_minutes)?;
        check_duration("awake_minutes", sleep.awake_minutes)?;
        check_fraction("efficiency", sleep.efficiency)?;
        if let (Some(bed), Some(wake)) = (sleep.bedtime, sleep.wake_time) {
            if wake < bed {
                return Err(ValidationError::WakeBeforeBedtime);
            }
        }

        let activity = &self.activity;
        check_non_negative("active_energy_kcal", activity.active_energy_kcal)?;
        check_non_negative("basal_energy_kcal", activity.basal_energy_kcal)?;
        check_duration("exercise_minutes", activity.exercise_minutes)?;

        Ok(())
    }
}

/// Activity type tag for a completed workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Running,
    Cycling,
    Swimming,
    Walking,
    Rowing,
    StrengthTraining,
    Hiit,
    Yoga,
    Other,
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityType::Running => write!(f, "Running"),
            ActivityType::Cycling => write!(f, "Cycling"),
            ActivityType::Swimming => write!(f, "Swimming"),
            ActivityType::Walking => write!(f, "Walking"),
            ActivityType::Rowing => write!(f, "Rowing"),
            ActivityType::StrengthTraining => write!(f, "Strength Training"),
            ActivityType::Hiit => write!(f, "HIIT"),
            ActivityType::Yoga => write!(f, "Yoga"),
            ActivityType::Other => write!(f, "Other"),
        }
    }
}

/// Summary of one completed workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutData {
    pub activity_type: ActivityType,

    pub start_time: DateTime<Utc>,

    /// Duration in minutes
    pub duration_minutes: f64,

    /// Total energy burned (kcal)
    #[serde(default)]
    pub total_energy_kcal: f64,

    /// Average heart rate (bpm), 0 if not recorded
    #[serde(default)]
    pub average_heart_rate: f64,
}

impl WorkoutData {
    /// Calendar day the workout is attributed to
    pub fn date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_duration("duration_minutes", self.duration_minutes)?;
        check_non_negative("total_energy_kcal", self.total_energy_kcal)?;
        check_heart_rate("average_heart_rate", self.average_heart_rate)?;
        Ok(())
    }
}

/// One instantaneous heart rate reading from a live sensor stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSample {
    pub timestamp: DateTime<Utc>,
    pub bpm: f64,
}

impl HeartRateSample {
    pub fn new(timestamp: DateTime<Utc>, bpm: f64) -> Self {
        HeartRateSample { timestamp, bpm }
    }

    /// Live samples must carry a real reading; zero is not "absent" here
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.bpm.is_finite() {
            return Err(ValidationError::NonFinite {
                field: "bpm".to_string(),
            });
        }
        if !(MIN_PLAUSIBLE_BPM..=MAX_PLAUSIBLE_BPM).contains(&self.bpm) {
            return Err(ValidationError::HeartRateOutOfRange {
                field: "bpm".to_string(),
                value: self.bpm,
            });
        }
        Ok(())
    }
}

fn present(value: f64) -> Option<f64> {
    (value > 0.0).then_some(value)
}

fn check_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite {
            field: field.to_string(),
        })
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    check_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::NegativeValue {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn check_duration(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidDuration {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn check_fraction(field: &str, value: f64) -> Result<(), ValidationError> {
    check_finite(field, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::FractionOutOfRange {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

// Zero means "not recorded" for daily aggregates
fn check_heart_rate(field: &str, value: f64) -> Result<(), ValidationError> {
    check_finite(field, value)?;
    if value != 0.0 && !(MIN_PLAUSIBLE_BPM..=MAX_PLAUSIBLE_BPM).contains(&value) {
        return Err(ValidationError::HeartRateOutOfRange {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}
