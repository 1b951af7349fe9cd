//! Acute training load from workout energy expenditure
//!
//! Workouts are bucketed per calendar day, the trailing window (ending on the
//! scoring day) is smoothed with an EWMA and compared to its simple mean.
//! A ratio above 1 means load is concentrated in the most recent days.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::WorkoutData;
use crate::stats::exponential_moving_average;

/// Energy burned across all workouts on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEnergy {
    pub date: NaiveDate,
    pub total_energy_kcal: f64,
    pub workout_count: u32,
}

/// Acute load for the window ending on a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcuteLoad {
    /// Per-day energy, oldest first, one entry per window day
    pub daily_energy: Vec<f64>,

    /// EWMA over `daily_energy`
    pub ewma: f64,

    /// Simple mean over `daily_energy`
    pub mean: f64,

    /// `ewma / mean`, 0 when the window had no load
    pub ratio: f64,
}

/// Acute load calculator
pub struct LoadCalculator {
    window_days: usize,
    alpha: f64,
}

impl Default for LoadCalculator {
    fn default() -> Self {
        LoadCalculator::new(7, 0.3)
    }
}

impl LoadCalculator {
    pub fn new(window_days: usize, alpha: f64) -> Self {
        LoadCalculator { window_days, alpha }
    }

    /// Aggregate energy per day from a collection of workouts
    pub fn aggregate_daily_energy(&self, workouts: &[WorkoutData]) -> BTreeMap<NaiveDate, DailyEnergy> {
        let mut daily: BTreeMap<NaiveDate, DailyEnergy> = BTreeMap::new();

        for workout in workouts {
            let date = workout.date();
            daily
                .entry(date)
                .and_modify(|day| {
                    day.total_energy_kcal += workout.total_energy_kcal;
                    day.workout_count = day.workout_count.saturating_add(1);
                })
                .or_insert(DailyEnergy {
                    date,
                    total_energy_kcal: workout.total_energy_kcal,
                    workout_count: 1,
                });
        }

        daily
    }

    /// Acute load over the window ending on `as_of` (inclusive)
    pub fn acute_load(&self, workouts: &[WorkoutData], as_of: NaiveDate) -> AcuteLoad {
        let daily = self.aggregate_daily_energy(workouts);
        let window = self.window_days.max(1);

        let daily_energy: Vec<f64> = (0..window)
            .rev()
            .map(|offset| {
                as_of
                    .checked_sub_days(Days::new(offset as u64))
                    .and_then(|date| daily.get(&date))
                    .map(|day| day.total_energy_kcal)
                    .unwrap_or(0.0)
            })
            .collect();

        let mean = daily_energy.iter().sum::<f64>() / daily_energy.len() as f64;
        let ewma = exponential_moving_average(&daily_energy, self.alpha);
        let ratio = if mean > 0.0 { ewma / mean } else { 0.0 };

        tracing::trace!(?daily_energy, ewma, mean, ratio, "Acute load computed");

        AcuteLoad {
            daily_energy,
            ewma,
            mean,
            ratio,
        }
    }
}
