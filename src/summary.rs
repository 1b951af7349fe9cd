//! Multi-day recovery summary
//!
//! Averages sleep, HRV and resting heart rate over a recent window, with an
//! HRV trend, the latest day's deviation from its HRV baseline, and how
//! consistent bedtimes have been.

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::DailyBiometrics;
use crate::stats::{linear_trend_slope, mean_and_population_std_dev};

pub const MIN_SUMMARY_DAYS: u32 = 7;
pub const MAX_SUMMARY_DAYS: u32 = 30;

/// HRV slope (ms per reading) inside which the trend is flat
const HRV_TREND_BAND: f64 = 0.5;

/// Prior readings averaged into the latest day's HRV baseline
const HRV_BASELINE_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Improving => write!(f, "improving"),
            TrendDirection::Stable => write!(f, "stable"),
            TrendDirection::Declining => write!(f, "declining"),
        }
    }
}

/// Spread of bedtimes across the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BedtimeConsistency {
    /// Standard deviation of 30 minutes or less
    Stable,
    /// Up to an hour
    Variable,
    Irregular,
}

impl BedtimeConsistency {
    pub fn from_std_dev_minutes(sd: f64) -> Self {
        if sd <= 30.0 {
            BedtimeConsistency::Stable
        } else if sd <= 60.0 {
            BedtimeConsistency::Variable
        } else {
            BedtimeConsistency::Irregular
        }
    }
}

impl fmt::Display for BedtimeConsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BedtimeConsistency::Stable => write!(f, "stable"),
            BedtimeConsistency::Variable => write!(f, "variable"),
            BedtimeConsistency::Irregular => write!(f, "irregular"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSummary {
    pub average_hours: f64,
    pub nights_tracked: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrvSummary {
    pub average_ms: f64,
    pub readings: usize,
    pub trend: TrendDirection,

    /// Mean of up to seven readings before the latest day
    pub baseline_ms: Option<f64>,

    /// Latest day's HRV relative to `baseline_ms`, in percent
    pub deviation_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestingHrSummary {
    pub average_bpm: f64,
    pub readings: usize,
}

/// Recovery overview for the most recent `period_days` records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoverySummary {
    pub period_days: u32,
    pub sleep: Option<SleepSummary>,
    pub hrv: Option<HrvSummary>,
    pub resting_hr: Option<RestingHrSummary>,
    pub bedtime_consistency: Option<BedtimeConsistency>,
}

impl RecoverySummary {
    pub fn is_empty(&self) -> bool {
        self.sleep.is_none() && self.hrv.is_none() && self.resting_hr.is_none()
    }
}

/// Summarize the most recent `days` records (clamped to 7-30)
pub fn summarize_recovery(history: &[DailyBiometrics], days: u32) -> RecoverySummary {
    let period_days = days.clamp(MIN_SUMMARY_DAYS, MAX_SUMMARY_DAYS);

    let mut sorted: Vec<&DailyBiometrics> = history.iter().collect();
    sorted.sort_by_key(|day| day.date);
    let start = sorted.len().saturating_sub(period_days as usize);
    let window = &sorted[start..];

    let sleep_hours: Vec<f64> = window
        .iter()
        .map(|day| day.sleep.total_sleep_hours())
        .filter(|hours| *hours > 0.0)
        .collect();
    let hrv: Vec<f64> = window.iter().filter_map(|day| day.hrv()).collect();
    let rhr: Vec<f64> = window.iter().filter_map(|day| day.resting_heart_rate()).collect();

    let sleep = (!sleep_hours.is_empty()).then(|| SleepSummary {
        average_hours: mean(&sleep_hours),
        nights_tracked: sleep_hours.len(),
    });

    let hrv_summary = (!hrv.is_empty()).then(|| {
        let (baseline_ms, deviation_percent) = latest_hrv_deviation(&sorted);
        HrvSummary {
            average_ms: mean(&hrv),
            readings: hrv.len(),
            trend: hrv_trend(&hrv),
            baseline_ms,
            deviation_percent,
        }
    });

    let resting_hr = (!rhr.is_empty()).then(|| RestingHrSummary {
        average_bpm: mean(&rhr),
        readings: rhr.len(),
    });

    let summary = RecoverySummary {
        period_days,
        sleep,
        hrv: hrv_summary,
        resting_hr,
        bedtime_consistency: bedtime_consistency(window),
    };

    tracing::debug!(
        period_days,
        records = window.len(),
        nights = sleep_hours.len(),
        hrv_readings = hrv.len(),
        rhr_readings = rhr.len(),
        "Recovery summary computed"
    );

    summary
}

fn mean(values: &[f64]) -> f64 {
    mean_and_population_std_dev(values).0
}

fn hrv_trend(readings: &[f64]) -> TrendDirection {
    match linear_trend_slope(readings) {
        Some(slope) if slope > HRV_TREND_BAND => TrendDirection::Improving,
        Some(slope) if slope < -HRV_TREND_BAND => TrendDirection::Declining,
        _ => TrendDirection::Stable,
    }
}

/// Baseline and deviation for the most recent record, if it has HRV
fn latest_hrv_deviation(sorted: &[&DailyBiometrics]) -> (Option<f64>, Option<f64>) {
    let Some((latest, earlier)) = sorted.split_last() else {
        return (None, None);
    };
    let Some(today) = latest.hrv() else {
        return (None, None);
    };

    let prior: Vec<f64> = earlier
        .iter()
        .rev()
        .filter(|day| day.date < latest.date)
        .filter_map(|day| day.hrv())
        .take(HRV_BASELINE_DAYS)
        .collect();
    if prior.is_empty() {
        return (None, None);
    }

    let baseline = mean(&prior);
    let deviation = (today - baseline) / baseline * 100.0;
    (Some(baseline), Some(deviation))
}

/// Bedtime spread from minutes past midnight
///
/// Times before noon count as the previous evening's night, so 23:30 and
/// 00:30 are an hour apart rather than 23 hours.
fn bedtime_consistency(window: &[&DailyBiometrics]) -> Option<BedtimeConsistency> {
    let minutes: Vec<f64> = window
        .iter()
        .filter_map(|day| day.sleep.bedtime)
        .map(|bedtime| {
            let minute = f64::from(bedtime.hour() * 60 + bedtime.minute());
            if minute < 12.0 * 60.0 {
                minute + 24.0 * 60.0
            } else {
                minute
            }
        })
        .collect();

    if minutes.len() < 3 {
        return None;
    }
    let (_, sd) = mean_and_population_std_dev(&minutes);
    Some(BedtimeConsistency::from_std_dev_minutes(sd))
}
