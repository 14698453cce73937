//! Deduplication trend classification
//!
//! Compares the mean efficiency ratio of the first and second half of the
//! window. A rising ratio means each new byte of backup data costs less raw
//! capacity, so projected growth is scaled down; a falling ratio scales it up.

use crate::config::DedupConfig;
use capacity_math::stats;
use serde::{Deserialize, Serialize};

/// Direction of the efficiency ratio over the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DedupClassification {
    Improving,
    Degrading,
    Stable,
    Unknown,
}

impl DedupClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            DedupClassification::Improving => "IMPROVING",
            DedupClassification::Degrading => "DEGRADING",
            DedupClassification::Stable => "STABLE",
            DedupClassification::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for DedupClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified trend with the growth multiplier it implies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DedupTrend {
    pub classification: DedupClassification,
    pub adjustment_factor: f64,
}

impl DedupTrend {
    /// Trend used when there is not enough ratio data
    pub fn unknown() -> Self {
        Self {
            classification: DedupClassification::Unknown,
            adjustment_factor: 1.0,
        }
    }

    /// Whether the factor changes projected growth
    pub fn is_adjusting(&self) -> bool {
        self.adjustment_factor != 1.0
    }
}

/// Classifies the efficiency ratio sub-series of a repository
#[derive(Debug, Clone)]
pub struct DeduplicationTrendClassifier {
    config: DedupConfig,
}

impl DeduplicationTrendClassifier {
    pub fn new(config: DedupConfig) -> Self {
        Self { config }
    }

    /// Classify ratios given in time order
    pub fn classify(&self, ratios: &[f64]) -> DedupTrend {
        if ratios.len() < self.config.min_observations {
            return DedupTrend::unknown();
        }

        let mid = ratios.len() / 2;
        let (Some(first_avg), Some(second_avg)) =
            (stats::mean(&ratios[..mid]), stats::mean(&ratios[mid..]))
        else {
            return DedupTrend::unknown();
        };

        let diff = second_avg - first_avg;
        if diff > self.config.improving_threshold {
            DedupTrend {
                classification: DedupClassification::Improving,
                adjustment_factor: self.config.improving_adjustment,
            }
        } else if diff < self.config.degrading_threshold {
            DedupTrend {
                classification: DedupClassification::Degrading,
                adjustment_factor: self.config.degrading_adjustment,
            }
        } else {
            DedupTrend {
                classification: DedupClassification::Stable,
                adjustment_factor: 1.0,
            }
        }
    }
}
