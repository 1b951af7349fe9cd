//! Daily readiness scoring
//!
//! Produces a 0-100 readiness score from today's biometrics, a rolling
//! personal baseline and recent training load.
//!
//! # Algorithm
//!
//! The score starts at 100 and only decreases, apart from two trend bonuses:
//!
//! 1. Baseline: mean/sd of HRV and resting HR over the most recent 7 history days
//! 2. HRV penalty when `z(HRV) < -1`: `min(20, |z| × 10)`
//! 3. Resting HR penalty when `z(RHR) > 1`: `min(15, z × 8)`
//! 4. Sleep penalty when sleep quality `< 0.85`: `(1 − quality) × 25`
//! 5. Load penalty when the acute load ratio `> 1.2`: `min(20, (ratio − 1) × 25)`
//! 6. +5 for a rising HRV trend, +5 for a falling resting HR trend
//! 7. Clamp to 0-100, then apply subjective calibration
//!
//! Fewer than 7 history days short-circuits to a fixed low-confidence result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::calibration::CalibrationManager;
use crate::config::ReadinessConfig;
use crate::error::{Result, ValidationError};
use crate::load::LoadCalculator;
use crate::models::{DailyBiometrics, SleepMetrics, WorkoutData};
use crate::stats::{linear_trend_slope, linear_trend_slope_sign, mean_and_population_std_dev, z_score};

/// Limiting factor reported when history is too short to score
pub const INSUFFICIENT_HISTORY_FACTOR: &str = "insufficient historical data";

/// Readiness categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessStatus {
    /// Score 85 and above
    FullyRecovered,
    /// Score 70 to 85
    Adequate,
    /// Score 50 to 70
    Compromised,
    /// Score below 50
    NeedsRest,
}

impl ReadinessStatus {
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            ReadinessStatus::FullyRecovered
        } else if score >= 70.0 {
            ReadinessStatus::Adequate
        } else if score >= 50.0 {
            ReadinessStatus::Compromised
        } else {
            ReadinessStatus::NeedsRest
        }
    }

    pub fn recommendation(&self) -> TrainingRecommendation {
        match self {
            ReadinessStatus::FullyRecovered => TrainingRecommendation::HighIntensity,
            ReadinessStatus::Adequate => TrainingRecommendation::Moderate,
            ReadinessStatus::Compromised => TrainingRecommendation::ActiveRecovery,
            ReadinessStatus::NeedsRest => TrainingRecommendation::Rest,
        }
    }
}

impl fmt::Display for ReadinessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessStatus::FullyRecovered => write!(f, "Fully Recovered"),
            ReadinessStatus::Adequate => write!(f, "Adequate"),
            ReadinessStatus::Compromised => write!(f, "Compromised"),
            ReadinessStatus::NeedsRest => write!(f, "Needs Rest"),
        }
    }
}

/// Suggested training intensity for the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingRecommendation {
    HighIntensity,
    Moderate,
    ActiveRecovery,
    Rest,
}

impl TrainingRecommendation {
    pub fn description(&self) -> &'static str {
        match self {
            TrainingRecommendation::HighIntensity => "Good day for high-intensity work or testing",
            TrainingRecommendation::Moderate => "Train at moderate intensity",
            TrainingRecommendation::ActiveRecovery => "Keep it light: mobility, easy cardio",
            TrainingRecommendation::Rest => "Prioritize rest and recovery today",
        }
    }
}

impl fmt::Display for TrainingRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingRecommendation::HighIntensity => write!(f, "High Intensity"),
            TrainingRecommendation::Moderate => write!(f, "Moderate"),
            TrainingRecommendation::ActiveRecovery => write!(f, "Active Recovery"),
            TrainingRecommendation::Rest => write!(f, "Rest"),
        }
    }
}

/// Intermediate values behind a readiness score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessComponents {
    pub hrv_z: f64,
    pub rhr_z: f64,
    /// Sleep quality (0-1)
    pub sleep_quality: f64,
    pub load_ratio: f64,
    pub hrv_trend_improving: bool,
    pub rhr_trend_improving: bool,
    /// Clamped score before calibration
    pub raw_score: f64,
    /// Points added (or removed) by calibration
    pub calibration_adjustment: f64,
}

/// Readiness output for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessResult {
    /// Readiness score (0-100)
    pub score: f64,

    pub status: ReadinessStatus,

    /// Limiting factors, largest penalty first, followed by calibration notes
    pub limiting_factors: Vec<String>,

    pub recommendation: TrainingRecommendation,

    /// Data completeness of today's record (0-1)
    pub confidence: f64,

    /// Scoring breakdown; `None` for the insufficient-history fallback
    pub components: Option<ReadinessComponents>,
}

impl ReadinessResult {
    /// Fixed result returned when history is too short to build a baseline
    pub fn insufficient_history() -> Self {
        let status = ReadinessStatus::Compromised;
        ReadinessResult {
            score: 50.0,
            status,
            limiting_factors: vec![INSUFFICIENT_HISTORY_FACTOR.to_string()],
            recommendation: status.recommendation(),
            confidence: 0.3,
            components: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.components.is_none()
    }
}

/// Readiness scorer
///
/// Stateless across calls apart from the shared calibration manager, so one
/// scorer may serve concurrent callers.
pub struct ReadinessScorer {
    config: ReadinessConfig,
    calibration: Arc<CalibrationManager>,
    load: LoadCalculator,
}

impl ReadinessScorer {
    pub fn new(config: ReadinessConfig, calibration: Arc<CalibrationManager>) -> Self {
        let load = LoadCalculator::new(config.load_window_days, config.load_ewma_alpha);
        ReadinessScorer {
            config,
            calibration,
            load,
        }
    }

    /// Scorer with default parameters and a fresh calibration manager
    pub fn with_defaults() -> Self {
        Self::new(ReadinessConfig::default(), Arc::new(CalibrationManager::default()))
    }

    pub fn calibration(&self) -> &Arc<CalibrationManager> {
        &self.calibration
    }

    /// Compute readiness for `current`
    ///
    /// `history` may be in any order; only days before `current.date` are
    /// used. `subjective` is a 1-10 self-reported recovery rating.
    ///
    /// # Errors
    ///
    /// Only structurally invalid inputs are rejected. Sparse or missing
    /// fields lower confidence instead.
    #[tracing::instrument(
        skip(self, current, history, workouts),
        fields(date = %current.date, history_days = history.len())
    )]
    pub fn compute_readiness(
        &self,
        current: &DailyBiometrics,
        history: &[DailyBiometrics],
        workouts: &[WorkoutData],
        subjective: Option<f64>,
    ) -> Result<ReadinessResult> {
        current.validate()?;
        let mut seen = BTreeSet::new();
        for day in history {
            day.validate()?;
            if !seen.insert(day.date) {
                return Err(ValidationError::DuplicateDate(day.date).into());
            }
        }
        for workout in workouts {
            workout.validate()?;
        }
        if let Some(rating) = subjective {
            if !rating.is_finite() || !(1.0..=10.0).contains(&rating) {
                return Err(ValidationError::SubjectiveOutOfRange(rating).into());
            }
        }

        let mut prior: Vec<&DailyBiometrics> =
            history.iter().filter(|day| day.date < current.date).collect();

        if prior.len() < self.config.min_history_days {
            tracing::warn!(
                available = prior.len(),
                required = self.config.min_history_days,
                "Not enough history for a readiness baseline, returning fallback"
            );
            return Ok(ReadinessResult::insufficient_history());
        }

        prior.sort_by_key(|day| day.date);
        let window = &prior[prior.len().saturating_sub(self.config.baseline_window_days)..];

        let hrv_series: Vec<f64> = window.iter().filter_map(|day| day.hrv()).collect();
        let rhr_series: Vec<f64> = window
            .iter()
            .filter_map(|day| day.resting_heart_rate())
            .collect();

        let mut score = 100.0;
        let mut penalties: Vec<(f64, String)> = Vec::new();

        // HRV
        let (hrv_mean, hrv_sd) = mean_and_population_std_dev(&hrv_series);
        let hrv_z = current
            .hrv()
            .map(|hrv| z_score(hrv, hrv_mean, hrv_sd))
            .unwrap_or(0.0);
        if hrv_z < self.config.hrv_z_threshold {
            let penalty = (hrv_z.abs() * self.config.hrv_penalty_per_z).min(self.config.hrv_penalty_cap);
            score -= penalty;
            let drop_pct = (hrv_mean - current.cardiovascular.hrv_ms) / hrv_mean * 100.0;
            penalties.push((penalty, format!("HRV {:.0}% below baseline", drop_pct)));
            tracing::debug!(hrv_z, penalty, "HRV penalty applied");
        }

        // Resting heart rate
        let (rhr_mean, rhr_sd) = mean_and_population_std_dev(&rhr_series);
        let rhr_z = current
            .resting_heart_rate()
            .map(|rhr| z_score(rhr, rhr_mean, rhr_sd))
            .unwrap_or(0.0);
        if rhr_z > self.config.rhr_z_threshold {
            let penalty = (rhr_z * self.config.rhr_penalty_per_z).min(self.config.rhr_penalty_cap);
            score -= penalty;
            let elevation = current.cardiovascular.resting_heart_rate - rhr_mean;
            penalties.push((
                penalty,
                format!("Resting HR elevated {:.0} bpm above baseline", elevation),
            ));
            tracing::debug!(rhr_z, penalty, "Resting HR penalty applied");
        }

        // Sleep
        let sleep_quality = self.sleep_quality_score(&current.sleep);
        if sleep_quality < self.config.sleep_quality_threshold {
            let penalty = (1.0 - sleep_quality) * self.config.sleep_penalty_scale;
            score -= penalty;
            penalties.push((
                penalty,
                format!(
                    "Sleep quality {:.0}% ({:.1}h, {:.0}% efficiency)",
                    sleep_quality * 100.0,
                    current.sleep.total_sleep_hours(),
                    current.sleep.efficiency * 100.0
                ),
            ));
            tracing::debug!(sleep_quality, penalty, "Sleep penalty applied");
        }

        // Acute training load
        let load = self.load.acute_load(workouts, current.date);
        if load.ratio > self.config.load_ratio_threshold {
            let penalty = ((load.ratio - 1.0) * self.config.load_penalty_per_ratio)
                .min(self.config.load_penalty_cap);
            score -= penalty;
            penalties.push((
                penalty,
                format!("Acute training load {:.2}x normal", load.ratio),
            ));
            tracing::debug!(ratio = load.ratio, penalty, "Load penalty applied");
        }

        // Trends
        let hrv_trend_improving = linear_trend_slope_sign(&hrv_series);
        let rhr_trend_improving = linear_trend_slope(&rhr_series).is_some_and(|slope| slope < 0.0);
        if hrv_trend_improving {
            score += self.config.trend_bonus;
        }
        if rhr_trend_improving {
            score += self.config.trend_bonus;
        }

        let raw_score = score.clamp(0.0, 100.0);
        let calibrated = self.calibration.apply_calibration(raw_score, subjective);

        penalties.sort_by(|a, b| b.0.total_cmp(&a.0));
        let mut limiting_factors: Vec<String> =
            penalties.into_iter().map(|(_, factor)| factor).collect();
        limiting_factors.extend(calibrated.notes);

        let final_score = calibrated.score;
        let status = ReadinessStatus::from_score(final_score);
        let confidence = current.completeness();

        tracing::info!(
            score = final_score,
            raw_score,
            status = %status,
            confidence,
            "Readiness computed"
        );

        Ok(ReadinessResult {
            score: final_score,
            status,
            limiting_factors,
            recommendation: status.recommendation(),
            confidence,
            components: Some(ReadinessComponents {
                hrv_z,
                rhr_z,
                sleep_quality,
                load_ratio: load.ratio,
                hrv_trend_improving,
                rhr_trend_improving,
                raw_score,
                calibration_adjustment: final_score - raw_score,
            }),
        })
    }

    /// Sleep quality (0-1)
    ///
    /// `0.5 × duration + 0.3 × efficiency + 0.2 × restorative stages`, where
    /// duration ramps linearly from 5h (0) to 8h (1) and restorative stages
    /// are deep + REM minutes over 90, both clamped to 0-1.
    pub fn sleep_quality_score(&self, sleep: &SleepMetrics) -> f64 {
        let c = &self.config;
        let duration = ((sleep.total_sleep_hours() - c.sleep_min_hours)
            / (c.sleep_target_hours - c.sleep_min_hours))
            .clamp(0.0, 1.0);
        let efficiency = sleep.efficiency.clamp(0.0, 1.0);
        let stages = (sleep.restorative_minutes() / c.restorative_target_minutes).clamp(0.0, 1.0);

        c.sleep_duration_weight * duration
            + c.sleep_efficiency_weight * efficiency
            + c.sleep_stage_weight * stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationState;
    use crate::error::RecoveryError;
    use crate::config::CalibrationConfig;
    use crate::models::{ActivityType, CardiovascularMetrics};
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use proptest::prelude::*;

    fn date(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap() + Duration::days(offset)
    }

    fn day(offset: i64, hrv: f64, rhr: f64) -> DailyBiometrics {
        DailyBiometrics::new(date(offset))
            .with_cardiovascular(CardiovascularMetrics {
                hrv_ms: hrv,
                resting_heart_rate: rhr,
                ..Default::default()
            })
            .with_sleep(good_sleep())
    }

    fn good_sleep() -> SleepMetrics {
        SleepMetrics {
            total_sleep_minutes: 480.0,
            deep_minutes: 60.0,
            rem_minutes: 90.0,
            core_minutes: 300.0,
            efficiency: 0.9,
            ..Default::default()
        }
    }

    fn flat_history(days: i64) -> Vec<DailyBiometrics> {
        (1..=days).map(|i| day(-i, 50.0, 60.0)).collect()
    }

    /// HRV alternating around 50 (sd ~5 ms) and RHR around 60 (sd ~2 bpm),
    /// drifting in the unfavourable direction so no trend bonus applies
    fn noisy_history() -> Vec<DailyBiometrics> {
        (1..=7)
            .map(|i| {
                let drift = 0.1 * i as f64;
                let hrv = (if i % 2 == 0 { 45.0 } else { 55.0 }) + drift;
                let rhr = (if i % 2 == 0 { 58.0 } else { 62.0 }) - drift;
                day(-i, hrv, rhr)
            })
            .collect()
    }

    #[test]
    fn test_insufficient_history_fallback() {
        let scorer = ReadinessScorer::with_defaults();
        let result = scorer
            .compute_readiness(&day(0, 90.0, 45.0), &flat_history(6), &[], Some(9.0))
            .unwrap();

        assert_eq!(result.score, 50.0);
        assert_eq!(result.status, ReadinessStatus::Compromised);
        assert_eq!(result.confidence, 0.3);
        assert_eq!(result.limiting_factors, vec![INSUFFICIENT_HISTORY_FACTOR.to_string()]);
        assert!(result.is_fallback());
        // Fallback short-circuits before calibration
        assert_eq!(scorer.calibration().snapshot().sample_count, 0);
    }

    #[test]
    fn test_history_on_or_after_today_not_counted() {
        let scorer = ReadinessScorer::with_defaults();
        let mut history = flat_history(6);
        history.push(day(0, 50.0, 60.0));
        history.push(day(1, 50.0, 60.0));

        let result = scorer
            .compute_readiness(&day(0, 50.0, 60.0), &history, &[], None)
            .unwrap();
        assert!(result.is_fallback());
    }

    #[test]
    fn test_duplicate_history_dates_rejected() {
        let scorer = ReadinessScorer::with_defaults();
        // Seven copies of yesterday with a rising HRV series
        let history: Vec<_> = (0..7).map(|i| day(-1, 50.0 + i as f64, 60.0)).collect();

        let err = scorer
            .compute_readiness(&day(0, 50.0, 60.0), &history, &[], None)
            .unwrap_err();
        assert!(matches!(
            err,
            RecoveryError::Validation(ValidationError::DuplicateDate(d)) if d == date(-1)
        ));
        assert_eq!(scorer.calibration().snapshot().sample_count, 0);
    }

    #[test]
    fn test_stable_baseline_scores_fully_recovered() {
        let scorer = ReadinessScorer::with_defaults();
        let result = scorer
            .compute_readiness(&day(0, 50.0, 60.0), &flat_history(7), &[], None)
            .unwrap();

        assert_eq!(result.score, 100.0);
        assert_eq!(result.status, ReadinessStatus::FullyRecovered);
        assert_eq!(result.recommendation, TrainingRecommendation::HighIntensity);
        assert!(result.limiting_factors.is_empty());
    }

    #[test]
    fn test_hrv_penalty() {
        let scorer = ReadinessScorer::with_defaults();
        // baseline mean ~51 with sd ~5, today 35
        let result = scorer
            .compute_readiness(&day(0, 35.0, 60.0), &noisy_history(), &[], None)
            .unwrap();

        let components = result.components.unwrap();
        assert!(components.hrv_z < -1.0);
        // |z| is large enough to hit the 20 point cap
        assert!((components.raw_score - 80.0).abs() < 1e-9);
        assert!(result.limiting_factors[0].starts_with("HRV"));
    }

    #[test]
    fn test_rhr_penalty_capped() {
        let scorer = ReadinessScorer::with_defaults();
        let result = scorer
            .compute_readiness(&day(0, 50.0, 75.0), &noisy_history(), &[], None)
            .unwrap();

        let components = result.components.unwrap();
        assert!(components.rhr_z > 1.0);
        assert!((components.raw_score - 85.0).abs() < 1e-9);
        assert!(result.limiting_factors[0].contains("Resting HR elevated"));
    }

    #[test]
    fn test_zero_spread_baseline_never_penalizes() {
        let scorer = ReadinessScorer::with_defaults();
        let result = scorer
            .compute_readiness(&day(0, 20.0, 90.0), &flat_history(10), &[], None)
            .unwrap();
        let components = result.components.unwrap();
        assert_eq!(components.hrv_z, 0.0);
        assert_eq!(components.rhr_z, 0.0);
    }

    #[test]
    fn test_sleep_quality_score() {
        let scorer = ReadinessScorer::with_defaults();
        assert!((scorer.sleep_quality_score(&good_sleep()) - 0.97).abs() < 1e-9);

        let short = SleepMetrics {
            total_sleep_minutes: 390.0, // 6.5h -> 0.5
            efficiency: 0.8,
            deep_minutes: 30.0,
            rem_minutes: 15.0, // 45 / 90 -> 0.5
            ..Default::default()
        };
        // 0.25 + 0.24 + 0.1
        assert!((scorer.sleep_quality_score(&short) - 0.59).abs() < 1e-9);
        assert_eq!(scorer.sleep_quality_score(&SleepMetrics::default()), 0.0);
    }

    #[test]
    fn test_poor_sleep_penalty() {
        let scorer = ReadinessScorer::with_defaults();
        let mut today = day(0, 50.0, 60.0);
        today.sleep = SleepMetrics {
            total_sleep_minutes: 390.0,
            efficiency: 0.8,
            deep_minutes: 30.0,
            rem_minutes: 15.0,
            ..Default::default()
        };

        let result = scorer
            .compute_readiness(&today, &flat_history(7), &[], None)
            .unwrap();
        // (1 - 0.59) * 25 = 10.25
        assert!((result.score - 89.75).abs() < 1e-9);
        assert!(result.limiting_factors[0].starts_with("Sleep quality 59%"));
    }

    #[test]
    fn test_load_spike_penalty() {
        let scorer = ReadinessScorer::with_defaults();
        let workout = WorkoutData {
            activity_type: ActivityType::Hiit,
            start_time: Utc.with_ymd_and_hms(2024, 6, 15, 6, 30, 0).unwrap(),
            duration_minutes: 75.0,
            total_energy_kcal: 900.0,
            average_heart_rate: 162.0,
        };

        let result = scorer
            .compute_readiness(&day(0, 50.0, 60.0), &flat_history(7), &[workout], None)
            .unwrap();
        // ratio 2.1 -> min(20, 27.5)
        assert!((result.score - 80.0).abs() < 1e-9);
        assert_eq!(result.status, ReadinessStatus::Adequate);
        assert!(result.limiting_factors[0].contains("2.10x"));
    }

    #[test]
    fn test_trend_bonuses() {
        let scorer = ReadinessScorer::with_defaults();
        // HRV rising and RHR falling towards today
        let history: Vec<_> = (1..=7)
            .map(|i| day(-i, 60.0 - i as f64, 55.0 + i as f64))
            .collect();
        let mut today = day(0, 40.0, 65.0);
        today.sleep = SleepMetrics::default();

        let result = scorer.compute_readiness(&today, &history, &[], None).unwrap();
        let components = result.components.unwrap();
        assert!(components.hrv_trend_improving);
        assert!(components.rhr_trend_improving);
    }

    #[test]
    fn test_factors_ranked_by_penalty() {
        let scorer = ReadinessScorer::with_defaults();
        let mut today = day(0, 35.0, 60.0);
        today.sleep.total_sleep_minutes = 420.0;
        today.sleep.deep_minutes = 45.0;
        today.sleep.rem_minutes = 45.0;

        let result = scorer
            .compute_readiness(&today, &noisy_history(), &[], None)
            .unwrap();
        assert!(result.limiting_factors[0].starts_with("HRV"));
        assert!(result.limiting_factors[1].starts_with("Sleep"));
    }

    #[test]
    fn test_calibration_notes_appended() {
        let scorer = ReadinessScorer::with_defaults();
        let result = scorer
            .compute_readiness(&day(0, 50.0, 60.0), &flat_history(7), &[], Some(4.0))
            .unwrap();

        // raw 100, target 40, bias -6
        assert!((result.score - 94.0).abs() < 1e-9);
        assert!(result.limiting_factors.last().unwrap().contains("Calibrated -6.0"));
        assert!((scorer.calibration().current_bias() + 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_shared_calibration_manager() {
        let manager = Arc::new(CalibrationManager::from_state(
            CalibrationConfig::default(),
            CalibrationState {
                bias: -10.0,
                sample_count: 4,
            },
        ));
        let scorer = ReadinessScorer::new(ReadinessConfig::default(), Arc::clone(&manager));
        scorer
            .compute_readiness(&day(0, 50.0, 60.0), &flat_history(7), &[], Some(10.0))
            .unwrap();
        assert_eq!(manager.snapshot().sample_count, 5);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let scorer = ReadinessScorer::with_defaults();
        let err = scorer
            .compute_readiness(&day(0, 50.0, 60.0), &flat_history(7), &[], Some(11.0))
            .unwrap_err();
        assert!(err.to_string().contains("Subjective rating"));

        let mut bad = day(0, 50.0, 60.0);
        bad.sleep.deep_minutes = -30.0;
        assert!(scorer
            .compute_readiness(&bad, &flat_history(7), &[], None)
            .is_err());
    }

    #[test]
    fn test_confidence_reflects_completeness() {
        let scorer = ReadinessScorer::with_defaults();
        let result = scorer
            .compute_readiness(&day(0, 50.0, 60.0), &flat_history(7), &[], None)
            .unwrap();
        // hrv, rhr, total sleep, deep, rem, core, efficiency
        assert!((result.confidence - 7.0 / 19.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn test_fallback_for_short_history(
            len in 0i64..7,
            hrv in 0.0f64..200.0,
            rhr in 30.0f64..120.0
        ) {
            let scorer = ReadinessScorer::with_defaults();
            let result = scorer
                .compute_readiness(&day(0, hrv, rhr), &flat_history(len), &[], None)
                .unwrap();
            prop_assert_eq!(result.score, 50.0);
            prop_assert_eq!(result.status, ReadinessStatus::Compromised);
            prop_assert_eq!(result.confidence, 0.3);
        }

        #[test]
        fn test_score_always_clamped(
            hrv in 0.0f64..200.0,
            rhr in 30.0f64..200.0,
            sleep_minutes in 0.0f64..720.0,
            efficiency in 0.0f64..=1.0,
            kcal in 0.0f64..3000.0,
            subjective in proptest::option::of(1.0f64..=10.0)
        ) {
            let scorer = ReadinessScorer::with_defaults();
            let mut today = day(0, hrv, rhr);
            today.sleep.total_sleep_minutes = sleep_minutes;
            today.sleep.efficiency = efficiency;
            let workout = WorkoutData {
                activity_type: ActivityType::Cycling,
                start_time: Utc.with_ymd_and_hms(2024, 6, 15, 7, 0, 0).unwrap(),
                duration_minutes: 60.0,
                total_energy_kcal: kcal,
                average_heart_rate: 150.0,
            };

            let result = scorer
                .compute_readiness(&today, &noisy_history(), &[workout], subjective)
                .unwrap();
            prop_assert!((0.0..=100.0).contains(&result.score));
            prop_assert!((0.0..=1.0).contains(&result.confidence));
        }
    }
}
