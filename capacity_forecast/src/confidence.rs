//! Forecast confidence classification

use crate::config::ConfidenceConfig;
use serde::{Deserialize, Serialize};

/// Coarse confidence label for a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    High,
    Moderate,
    Low,
}

impl ConfidenceLevel {
    /// Discount factor downstream consumers apply to the forecast
    pub fn multiplier(&self) -> f64 {
        match self {
            ConfidenceLevel::High => 1.0,
            ConfidenceLevel::Moderate => 0.8,
            ConfidenceLevel::Low => 0.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "HIGH",
            ConfidenceLevel::Moderate => "MODERATE",
            ConfidenceLevel::Low => "LOW",
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceResult {
    pub level: ConfidenceLevel,
    pub multiplier: f64,
}

impl From<ConfidenceLevel> for ConfidenceResult {
    fn from(level: ConfidenceLevel) -> Self {
        Self {
            level,
            multiplier: level.multiplier(),
        }
    }
}

/// Maps fit quality and sample size to a confidence level
#[derive(Debug, Clone)]
pub struct ConfidenceClassifier {
    config: ConfidenceConfig,
    min_days: usize,
}

impl ConfidenceClassifier {
    /// `min_days` is the sample count required for MODERATE confidence
    pub fn new(config: ConfidenceConfig, min_days: usize) -> Self {
        Self { config, min_days }
    }

    pub fn classify(&self, r_squared: f64, sample_count: usize) -> ConfidenceResult {
        let level = if r_squared >= self.config.r_squared_high
            && sample_count >= self.config.high_min_samples
        {
            ConfidenceLevel::High
        } else if r_squared >= self.config.r_squared_moderate && sample_count >= self.min_days {
            ConfidenceLevel::Moderate
        } else {
            ConfidenceLevel::Low
        };
        level.into()
    }
}
