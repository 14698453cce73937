//! Analytic threshold crossing
//!
//! Solves `a·x² + b·x + c = T` for the earliest day after the current one.
//! `None` means the model does not reach the threshold in the future.

use crate::config::{ModelConfig, ThresholdConfig};
use crate::models::GrowthCoefficients;
use crate::utils::{interval_band, truncate_days};
use capacity_math::roots::quadratic_roots;
use serde::{Deserialize, Serialize};

/// Predicted crossing of one capacity threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPrediction {
    /// Fraction of total capacity, e.g. `0.8`
    pub threshold_fraction: f64,
    /// Absolute threshold value
    pub target_value: f64,
    /// Whole days from the current day, `None` when never reached
    pub days_from_now: Option<i64>,
    /// Approximate `(lower, upper)` bounds on `days_from_now`
    pub confidence_interval: (Option<i64>, Option<i64>),
}

/// Computes threshold crossings of a growth model
#[derive(Debug, Clone)]
pub struct ThresholdSolver {
    flat_epsilon: f64,
    thresholds: ThresholdConfig,
}

impl ThresholdSolver {
    pub fn new(model: &ModelConfig, thresholds: ThresholdConfig) -> Self {
        Self {
            flat_epsilon: model.flat_epsilon,
            thresholds,
        }
    }

    /// Fractional days after `current_day` at which the model reaches `target`
    pub fn solve_crossing(
        &self,
        coefficients: &GrowthCoefficients,
        target: f64,
        current_day: f64,
    ) -> Option<f64> {
        let GrowthCoefficients { a, b, c } = *coefficients;
        let c_adj = c - target;

        let crossing = if a.abs() < self.flat_epsilon {
            // flat or declining lines never reach a higher threshold
            if b.abs() < self.flat_epsilon || b < 0.0 {
                return None;
            }
            -c_adj / b
        } else {
            quadratic_roots(a, b, c_adj)
                .into_iter()
                .filter(|&root| root > current_day)
                .reduce(f64::min)?
        };

        let days = crossing - current_day;
        (days.is_finite() && days > 0.0).then_some(days)
    }

    /// Whole days after `current_day` until the model reaches `target`
    pub fn days_until(
        &self,
        coefficients: &GrowthCoefficients,
        target: f64,
        current_day: f64,
    ) -> Option<i64> {
        self.solve_crossing(coefficients, target, current_day)
            .map(truncate_days)
            .filter(|&days| days > 0)
    }

    /// Prediction for one fraction of total capacity
    pub fn predict(
        &self,
        coefficients: &GrowthCoefficients,
        fraction: f64,
        total_capacity: f64,
        current_day: f64,
    ) -> ThresholdPrediction {
        let target_value = total_capacity * fraction;
        let days_from_now = self.days_until(coefficients, target_value, current_day);
        ThresholdPrediction {
            threshold_fraction: fraction,
            target_value,
            days_from_now,
            confidence_interval: interval_band(days_from_now, self.thresholds.interval_band),
        }
    }

    /// Predictions for the warning, critical and exhaustion thresholds
    pub fn predict_all(
        &self,
        coefficients: &GrowthCoefficients,
        total_capacity: f64,
        current_day: f64,
    ) -> [ThresholdPrediction; 3] {
        self.thresholds
            .fractions()
            .map(|fraction| self.predict(coefficients, fraction, total_capacity, current_day))
    }
}
