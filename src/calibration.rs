//! Subjective calibration of readiness scores
//!
//! The model's raw readiness score is reconciled with how recovered the user
//! says they feel. The difference is smoothed into a single additive bias
//! with an exponential moving average:
//!
//! ```text
//! target = subjective × 10            (1-10 scale onto 0-100)
//! error  = target − raw
//! bias  += α × (error − bias)         (α = 0.1)
//! score  = clamp(raw + bias, 0, 100)
//! ```
//!
//! The manager is created explicitly per user context and shared through an
//! `Arc`. Updates are serialized behind a mutex; the current bias is mirrored
//! into an atomic so display surfaces can read it without locking.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::config::CalibrationConfig;
use crate::error::{RecoveryError, Result};

/// Persistent calibration state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationState {
    /// Additive bias applied to raw readiness scores
    pub bias: f64,

    /// Number of subjective ratings folded into the bias
    pub sample_count: u64,
}

/// Result of applying calibration to a raw score
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationOutcome {
    /// Adjusted score, clamped to 0-100
    pub score: f64,

    /// Human-readable notes describing the adjustment
    pub notes: Vec<String>,
}

/// Owns and updates the calibration bias
#[derive(Debug)]
pub struct CalibrationManager {
    config: CalibrationConfig,
    state: Mutex<CalibrationState>,
    bias_bits: AtomicU64,
}

impl Default for CalibrationManager {
    fn default() -> Self {
        Self::new(CalibrationConfig::default())
    }
}

impl CalibrationManager {
    pub fn new(config: CalibrationConfig) -> Self {
        Self::from_state(config, CalibrationState::default())
    }

    /// Restore a manager from previously persisted state
    pub fn from_state(config: CalibrationConfig, state: CalibrationState) -> Self {
        CalibrationManager {
            config,
            bias_bits: AtomicU64::new(state.bias.to_bits()),
            state: Mutex::new(state),
        }
    }

    /// Reconcile `raw` with an optional 1-10 subjective rating
    ///
    /// Without a rating the raw score is returned untouched and the bias is
    /// not modified.
    pub fn apply_calibration(&self, raw: f64, subjective: Option<f64>) -> CalibrationOutcome {
        let Some(subjective) = subjective else {
            return CalibrationOutcome {
                score: raw,
                notes: Vec::new(),
            };
        };

        let target = subjective * self.config.subjective_scale;
        let error = target - raw;

        let bias = {
            let mut state = self.lock_state();
            state.bias += self.config.smoothing_alpha * (error - state.bias);
            state.sample_count += 1;
            self.bias_bits.store(state.bias.to_bits(), Ordering::Release);

            tracing::debug!(
                raw,
                target,
                bias = state.bias,
                samples = state.sample_count,
                "Calibration bias updated"
            );
            state.bias
        };

        let score = (raw + bias).clamp(0.0, 100.0);
        let adjustment = score - raw;

        let mut notes = Vec::new();
        if adjustment.abs() >= self.config.note_threshold {
            notes.push(format!(
                "Calibrated {:+.1} points toward your reported recovery",
                adjustment
            ));
        }

        CalibrationOutcome { score, notes }
    }

    /// Current bias, read without taking the lock
    pub fn current_bias(&self) -> f64 {
        f64::from_bits(self.bias_bits.load(Ordering::Acquire))
    }

    /// Copy of the full state (bias and sample count)
    pub fn snapshot(&self) -> CalibrationState {
        *self.lock_state()
    }

    /// Forget everything learned so far
    pub fn reset(&self) {
        let mut state = self.lock_state();
        *state = CalibrationState::default();
        self.bias_bits.store(0f64.to_bits(), Ordering::Release);
    }

    /// Serialize the current state to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| RecoveryError::Calibration(e.to_string()))
    }

    /// Restore a manager from JSON produced by [`CalibrationManager::to_json`]
    pub fn from_json(config: CalibrationConfig, json: &str) -> Result<Self> {
        let state: CalibrationState =
            serde_json::from_str(json).map_err(|e| RecoveryError::Calibration(e.to_string()))?;
        if !state.bias.is_finite() {
            return Err(RecoveryError::Calibration(
                "stored bias is not a finite number".to_string(),
            ));
        }
        Ok(Self::from_state(config, state))
    }

    // A poisoned lock still holds a consistent state: every write is a
    // single assignment completed before any code that could panic.
    fn lock_state(&self) -> MutexGuard<'_, CalibrationState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
