//! Real-time in-workout fatigue tracking
//!
//! A per-session state machine fed one heart-rate sample at a time (about
//! 1 Hz). It detects set/rest boundaries from the heart-rate derivative,
//! measures how fast heart rate falls during each rest, and compares later
//! rests against the session's opening rests.
//!
//! # Phases
//!
//! ```text
//! Idle ──(dHR > +0.5)──▶ Exertion ──(dHR < −0.3 or set > 90 s)──▶ Recovery
//!                            ▲                                       │
//!                            │                           (|dHR| < 0.1)
//!                            │                                       ▼
//!                            └────────────(dHR > +0.5)──────────── Resting
//! ```
//!
//! Recovery also returns straight to Exertion when a new set starts before
//! heart rate settles. The derivative (bpm/s) is the linear change across the
//! most recent 10 s of a 30 s sliding buffer.
//!
//! A rest runs from the set's peak to the lowest heart rate reached before
//! the rest closes, so detection lag on either side does not skew its rate.
//!
//! # Fatigue
//!
//! Rest periods shorter than 15 s are discarded. The best two of the first
//! three rests set the baseline recovery rate; afterwards the mean of the
//! last three rests is compared against it:
//!
//! - `degradation = (baseline − rolling mean) / baseline × 100`
//! - `normalized variance = sd(rolling rates) / baseline × 100`
//! - asymptote (recovery has plateaued) when variance `< 5` and degradation `> 15`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use uuid::Uuid;

use crate::config::FatigueConfig;
use crate::error::{Result, ValidationError};
use crate::models::HeartRateSample;
use crate::stats::mean_and_population_std_dev;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutPhase {
    Idle,
    Exertion,
    Recovery,
    Resting,
}

impl fmt::Display for WorkoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkoutPhase::Idle => write!(f, "Idle"),
            WorkoutPhase::Exertion => write!(f, "Exertion"),
            WorkoutPhase::Recovery => write!(f, "Recovery"),
            WorkoutPhase::Resting => write!(f, "Resting"),
        }
    }
}

/// Cumulative fatigue classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatigueLevel {
    /// Recovery close to the session baseline
    Fresh,
    /// Meaningful but useful fatigue
    Productive,
    /// Recovery degraded by a third or more
    Fatigued,
    /// Recovery has plateaued at a degraded level
    Asymptote,
    /// Plateaued and heavily degraded
    Depleted,
}

impl FatigueLevel {
    pub fn description(&self) -> &'static str {
        match self {
            FatigueLevel::Fresh => "Recovering well between sets",
            FatigueLevel::Productive => "Productive fatigue, keep going",
            FatigueLevel::Fatigued => "Recovery is slowing, consider longer rests",
            FatigueLevel::Asymptote => "Diminishing returns, wrap up soon",
            FatigueLevel::Depleted => "Recovery has collapsed, end the session",
        }
    }
}

impl fmt::Display for FatigueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatigueLevel::Fresh => write!(f, "Fresh"),
            FatigueLevel::Productive => write!(f, "Productive"),
            FatigueLevel::Fatigued => write!(f, "Fatigued"),
            FatigueLevel::Asymptote => write!(f, "Asymptote"),
            FatigueLevel::Depleted => write!(f, "Depleted"),
        }
    }
}

/// One rest interval between sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestPeriod {
    /// Time of the preceding set's peak
    pub start_time: DateTime<Utc>,

    /// Peak heart rate of the preceding set
    pub start_hr: f64,

    /// Lowest heart rate reached before the rest closed
    pub end_hr: f64,

    /// Seconds from the peak to that low

    pub duration_seconds: f64,
}

impl RestPeriod {
    /// Heart rate drop per second of rest
    pub fn recovery_rate(&self) -> f64 {
        if self.duration_seconds > 0.0 {
            (self.start_hr - self.end_hr) / self.duration_seconds
        } else {
            0.0
        }
    }

    /// Extend the rest to `timestamp` if `bpm` is a new low
    fn extend_to(&mut self, timestamp: DateTime<Utc>, bpm: f64) {
        if bpm < self.end_hr {
            self.end_hr = bpm;
            self.duration_seconds = seconds_between(self.start_time, timestamp);
        }
    }
}

/// Tracker output, re-emitted after every sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueSnapshot {
    pub session_id: Uuid,
    pub phase: WorkoutPhase,
    pub current_hr: f64,
    pub peak_hr: f64,
    pub rest_periods: Vec<RestPeriod>,
    pub fatigue_level: FatigueLevel,
    pub degradation_percent: f64,
    pub completed_sets: u32,
    pub baseline_recovery_rate: Option<f64>,
    pub average_recovery_rate: Option<f64>,
    pub latest_recovery_rate: Option<f64>,
    /// Sets left before degradation reaches the depletion limit
    pub estimated_sets_remaining: Option<u32>,
    /// Share of heart-rate reserve recovered in the latest rest
    pub hr_reserve_recovered_percent: Option<f64>,
}

/// End-of-session report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
    pub completed_sets: u32,
    pub rest_periods: Vec<RestPeriod>,
    pub baseline_recovery_rate: Option<f64>,
    pub average_recovery_rate: Option<f64>,
    pub latest_recovery_rate: Option<f64>,
    pub final_fatigue_level: FatigueLevel,
    pub final_degradation_percent: f64,
}

/// Online fatigue tracker for one workout session
///
/// Samples must arrive in timestamp order. Call [`FatigueTracker::reset`] (or
/// [`FatigueTracker::finish_session`]) before reusing the tracker for a new
/// workout.
#[derive(Debug, Clone)]
pub struct FatigueTracker {
    config: FatigueConfig,
    session_id: Uuid,
    buffer: VecDeque<HeartRateSample>,
    phase: WorkoutPhase,
    current_hr: f64,
    peak_hr: f64,
    peak_time: Option<DateTime<Utc>>,
    session_start: Option<DateTime<Utc>>,
    set_start: Option<DateTime<Utc>>,
    completed_sets: u32,
    open_rest: Option<RestPeriod>,
    rest_periods: Vec<RestPeriod>,
    baseline_recovery_rate: Option<f64>,
    degradation_percent: f64,
    fatigue_level: FatigueLevel,
    baseline_resting_hr: Option<f64>,
}

impl Default for FatigueTracker {
    fn default() -> Self {
        Self::new(FatigueConfig::default())
    }
}

impl FatigueTracker {
    pub fn new(config: FatigueConfig) -> Self {
        FatigueTracker {
            config,
            session_id: Uuid::new_v4(),
            buffer: VecDeque::new(),
            phase: WorkoutPhase::Idle,
            current_hr: 0.0,
            peak_hr: 0.0,
            peak_time: None,
            session_start: None,
            set_start: None,
            completed_sets: 0,
            open_rest: None,
            rest_periods: Vec::new(),
            baseline_recovery_rate: None,
            degradation_percent: 0.0,
            fatigue_level: FatigueLevel::Fresh,
            baseline_resting_hr: None,
        }
    }

    /// Seed the resting heart rate from historical data
    pub fn set_baseline_resting_hr(&mut self, value: f64) {
        self.baseline_resting_hr = (value.is_finite() && value > 0.0).then_some(value);
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn phase(&self) -> WorkoutPhase {
        self.phase
    }

    /// Feed one sample and return the updated snapshot
    ///
    /// Invalid readings and samples older than the previous one are rejected
    /// without touching the session state.
    #[tracing::instrument(level = "trace", skip(self), fields(session = %self.session_id))]
    pub fn process_sample(&mut self, timestamp: DateTime<Utc>, bpm: f64) -> Result<FatigueSnapshot> {
        let sample = HeartRateSample::new(timestamp, bpm);
        sample.validate()?;
        if let Some(last) = self.buffer.back() {
            if timestamp < last.timestamp {
                return Err(ValidationError::OutOfOrderSample {
                    previous: last.timestamp.to_rfc3339(),
                    current: timestamp.to_rfc3339(),
                }
                .into());
            }
        }

        self.push_sample(sample);
        let derivative = self.derivative();
        self.step(timestamp, bpm, derivative);

        Ok(self.snapshot())
    }

    /// Convenience wrapper over [`FatigueTracker::process_sample`]
    pub fn process(&mut self, sample: HeartRateSample) -> Result<FatigueSnapshot> {
        self.process_sample(sample.timestamp, sample.bpm)
    }

    /// Clear all session state for a new workout
    ///
    /// The seeded resting heart rate is kept; it describes the user, not the
    /// session.
    pub fn reset(&mut self) {
        let resting = self.baseline_resting_hr;
        *self = Self::new(self.config.clone());
        self.baseline_resting_hr = resting;
    }

    /// End the session, discarding any unfinished rest, and reset
    pub fn finish_session(&mut self) -> SessionSummary {
        if let Some(open) = self.open_rest.take() {
            tracing::debug!(
                duration = open.duration_seconds,
                "Discarding unfinished rest period at session end"
            );
        }

        let duration_seconds = match (self.session_start, self.buffer.back()) {
            (Some(start), Some(last)) => seconds_between(start, last.timestamp),
            _ => 0.0,
        };

        let summary = SessionSummary {
            session_id: self.session_id,
            started_at: self.session_start,
            duration_seconds,
            completed_sets: self.completed_sets,
            rest_periods: self.rest_periods.clone(),
            baseline_recovery_rate: self.baseline_recovery_rate,
            average_recovery_rate: self.average_recovery_rate(),
            latest_recovery_rate: self.latest_recovery_rate(),
            final_fatigue_level: self.fatigue_level,
            final_degradation_percent: self.degradation_percent,
        };

        tracing::info!(
            session = %summary.session_id,
            sets = summary.completed_sets,
            rests = summary.rest_periods.len(),
            level = %summary.final_fatigue_level,
            "Workout session finished"
        );

        self.reset();
        summary
    }

    /// Current tracker output
    pub fn snapshot(&self) -> FatigueSnapshot {
        FatigueSnapshot {
            session_id: self.session_id,
            phase: self.phase,
            current_hr: self.current_hr,
            peak_hr: self.peak_hr,
            rest_periods: self.rest_periods.clone(),
            fatigue_level: self.fatigue_level,
            degradation_percent: self.degradation_percent,
            completed_sets: self.completed_sets,
            baseline_recovery_rate: self.baseline_recovery_rate,
            average_recovery_rate: self.average_recovery_rate(),
            latest_recovery_rate: self.latest_recovery_rate(),
            estimated_sets_remaining: self.estimated_sets_remaining(),
            hr_reserve_recovered_percent: self.hr_reserve_recovered_percent(),
        }
    }

    /// Mean recovery rate across all kept rest periods
    pub fn average_recovery_rate(&self) -> Option<f64> {
        if self.rest_periods.is_empty() {
            return None;
        }
        let total: f64 = self.rest_periods.iter().map(RestPeriod::recovery_rate).sum();
        Some(total / self.rest_periods.len() as f64)
    }

    pub fn latest_recovery_rate(&self) -> Option<f64> {
        self.rest_periods.last().map(RestPeriod::recovery_rate)
    }

    /// Linear extrapolation of sets left before the depletion limit
    ///
    /// `None` without degradation, once the limit is reached, or before any
    /// set has completed.
    pub fn estimated_sets_remaining(&self) -> Option<u32> {
        let degradation = self.degradation_percent;
        if degradation <= 0.0 || degradation >= self.config.depletion_limit || self.completed_sets == 0 {
            return None;
        }
        let per_set = degradation / self.completed_sets as f64;
        let remaining = (self.config.depletion_limit - degradation) / per_set;
        Some(remaining.floor() as u32)
    }

    fn hr_reserve_recovered_percent(&self) -> Option<f64> {
        let resting = self.baseline_resting_hr?;
        let latest = self.rest_periods.last()?;
        let reserve = latest.start_hr - resting;
        if reserve <= 0.0 {
            return None;
        }
        Some(((latest.start_hr - latest.end_hr) / reserve * 100.0).clamp(0.0, 100.0))
    }

    fn push_sample(&mut self, sample: HeartRateSample) {
        if self.session_start.is_none() {
            self.session_start = Some(sample.timestamp);
        }
        self.current_hr = sample.bpm;
        self.buffer.push_back(sample);

        let newest = sample.timestamp;
        while let Some(oldest) = self.buffer.front() {
            if seconds_between(oldest.timestamp, newest) > self.config.buffer_seconds {
                self.buffer.pop_front();
            } else {
                break;
            }
        }
    }

    /// Linear change (bpm/s) across the most recent derivative window
    fn derivative(&self) -> f64 {
        let Some(newest) = self.buffer.back() else {
            return 0.0;
        };
        let window = self.config.derivative_window_seconds;
        let Some(first) = self
            .buffer
            .iter()
            .find(|s| seconds_between(s.timestamp, newest.timestamp) <= window)
        else {
            return 0.0;
        };

        let elapsed = seconds_between(first.timestamp, newest.timestamp);
        if elapsed <= 0.0 {
            return 0.0;
        }
        (newest.bpm - first.bpm) / elapsed
    }

    fn step(&mut self, timestamp: DateTime<Utc>, bpm: f64, derivative: f64) {
        let accelerating = derivative > self.config.acceleration_threshold;
        let decelerating = derivative < self.config.deceleration_threshold;
        let stable = derivative.abs() < self.config.stable_threshold;

        match self.phase {
            WorkoutPhase::Idle => {
                if accelerating {
                    self.begin_set(timestamp, bpm, derivative);
                }
            }
            WorkoutPhase::Exertion => {
                if bpm > self.peak_hr {
                    self.peak_hr = bpm;
                    self.peak_time = Some(timestamp);
                }
                let set_seconds = self
                    .set_start
                    .map(|start| seconds_between(start, timestamp))
                    .unwrap_or(0.0);

                if decelerating || set_seconds > self.config.max_set_seconds {
                    self.completed_sets += 1;
                    let mut rest = RestPeriod {
                        start_time: self.peak_time.unwrap_or(timestamp),
                        start_hr: self.peak_hr,
                        end_hr: self.peak_hr,
                        duration_seconds: 0.0,
                    };
                    rest.extend_to(timestamp, bpm);
                    self.open_rest = Some(rest);
                    self.transition(WorkoutPhase::Recovery, derivative);
                }
            }
            WorkoutPhase::Recovery => {
                if let Some(rest) = self.open_rest.as_mut() {
                    rest.extend_to(timestamp, bpm);
                }

                if accelerating {
                    self.begin_set(timestamp, bpm, derivative);
                } else if stable {
                    self.finalize_open_rest();
                    self.transition(WorkoutPhase::Resting, derivative);
                }
            }
            WorkoutPhase::Resting => {
                if accelerating {
                    self.begin_set(timestamp, bpm, derivative);
                }
            }
        }
    }

    fn begin_set(&mut self, timestamp: DateTime<Utc>, bpm: f64, derivative: f64) {
        self.finalize_open_rest();
        self.set_start = Some(timestamp);
        self.peak_hr = bpm;
        self.peak_time = Some(timestamp);
        self.transition(WorkoutPhase::Exertion, derivative);
    }

    fn transition(&mut self, to: WorkoutPhase, derivative: f64) {
        tracing::debug!(
            from = %self.phase,
            to = %to,
            derivative,
            hr = self.current_hr,
            "Workout phase transition"
        );
        self.phase = to;
    }

    fn finalize_open_rest(&mut self) {
        if let Some(rest) = self.open_rest.take() {
            self.finalize_rest(rest);
        }
    }

    fn finalize_rest(&mut self, rest: RestPeriod) {
        if rest.duration_seconds < self.config.min_rest_seconds {
            tracing::debug!(
                duration = rest.duration_seconds,
                minimum = self.config.min_rest_seconds,
                "Rest period too short, discarded"
            );
            return;
        }

        tracing::info!(
            start_hr = rest.start_hr,
            end_hr = rest.end_hr,
            duration = rest.duration_seconds,
            recovery_rate = rest.recovery_rate(),
            "Rest period recorded"
        );
        self.rest_periods.push(rest);

        if self.baseline_recovery_rate.is_none() && self.rest_periods.len() >= 2 {
            self.baseline_recovery_rate = Some(self.opening_baseline());
            tracing::debug!(baseline = ?self.baseline_recovery_rate, "Session baseline established");
        }

        if self.baseline_recovery_rate.is_some() && self.rest_periods.len() >= self.config.rolling_window.max(3) {
            self.update_fatigue();
        }
    }

    /// Mean of the best two of the first three recovery rates
    fn opening_baseline(&self) -> f64 {
        let mut opening: Vec<f64> = self
            .rest_periods
            .iter()
            .take(3)
            .map(RestPeriod::recovery_rate)
            .collect();
        opening.sort_by(|a, b| b.total_cmp(a));
        let best: Vec<f64> = opening.into_iter().take(2).collect();
        best.iter().sum::<f64>() / best.len() as f64
    }

    fn update_fatigue(&mut self) {
        let Some(baseline) = self.baseline_recovery_rate else {
            return;
        };

        let window = self.config.rolling_window;
        let rates: Vec<f64> = self.rest_periods[self.rest_periods.len().saturating_sub(window)..]
            .iter()
            .map(RestPeriod::recovery_rate)
            .collect();
        let (current_average, sd) = mean_and_population_std_dev(&rates);

        let (degradation, normalized_variance) = if baseline > 0.0 {
            (
                (baseline - current_average) / baseline * 100.0,
                sd / baseline * 100.0,
            )
        } else {
            (0.0, 0.0)
        };

        self.degradation_percent = degradation;
        self.fatigue_level = self.classify(degradation, normalized_variance);

        tracing::debug!(
            baseline,
            current_average,
            degradation,
            normalized_variance,
            level = %self.fatigue_level,
            "Fatigue updated"
        );
    }

    fn classify(&self, degradation: f64, normalized_variance: f64) -> FatigueLevel {
        let c = &self.config;
        let asymptote = normalized_variance < c.asymptote_variance && degradation > c.asymptote_degradation;

        if asymptote && degradation > c.depleted_degradation {
            FatigueLevel::Depleted
        } else if asymptote {
            FatigueLevel::Asymptote
        } else if degradation >= c.fatigued_degradation {
            FatigueLevel::Fatigued
        } else if degradation >= c.productive_degradation {
            FatigueLevel::Productive
        } else {
            FatigueLevel::Fresh
        }
    }
}

fn seconds_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 1000.0
}
