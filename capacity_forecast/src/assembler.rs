//! Per-repository forecast assembly
//!
//! Runs the pipeline for one repository: clean the series, classify the
//! dedup trend, fit and select a growth model, rescale future growth, solve
//! the capacity thresholds, grade confidence, then derive growth pattern,
//! priority and a sizing recommendation.

use crate::confidence::{ConfidenceClassifier, ConfidenceLevel, ConfidenceResult};
use crate::config::{ForecastConfig, PriorityConfig};
use crate::data::{CapacityObservation, RepositoryInput, SkipReason};
use crate::dedup::{DedupClassification, DedupTrend, DeduplicationTrendClassifier};
use crate::error::Result;
use crate::models::{FittedModel, GrowthModelFitter, ModelKind};
use crate::preprocess::SeriesPreprocessor;
use crate::solver::{ThresholdPrediction, ThresholdSolver};
use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Qualitative shape of projected growth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrowthPattern {
    Declining,
    Stable,
    Quadratic,
    Linear,
}

impl GrowthPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthPattern::Declining => "DECLINING",
            GrowthPattern::Stable => "STABLE",
            GrowthPattern::Quadratic => "QUADRATIC",
            GrowthPattern::Linear => "LINEAR",
        }
    }
}

impl std::fmt::Display for GrowthPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency of capacity action
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "URGENT",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured audit information attached to every forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityFlags {
    pub r_squared: f64,
    pub sample_count: usize,
    pub model_type: ModelKind,
    pub p_value: f64,
    pub dedup_adjustment: bool,
    pub confidence_level: ConfidenceLevel,
    /// Days inside the window left out because their gap was too long
    pub gaps_dropped: usize,
    /// Threshold fractions current usage already meets or exceeds
    pub thresholds_exceeded: Vec<f64>,
}

/// Forecast for one repository on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityForecast {
    pub repository_id: String,
    pub repository_name: String,
    pub repository_type: String,
    pub forecast_date: NaiveDate,
    pub total_capacity_gb: f64,
    pub used_space_gb: f64,
    pub utilization_pct: f64,

    /// Crossing of the warning threshold (80% by default)
    pub warning: ThresholdPrediction,
    /// Crossing of the critical threshold (90% by default)
    pub critical: ThresholdPrediction,
    /// Crossing of full capacity
    pub exhaustion: ThresholdPrediction,

    /// Linear coefficient of the dedup-adjusted model, GB/day
    pub growth_rate: f64,
    /// Quadratic coefficient of the dedup-adjusted model
    pub acceleration: f64,
    pub growth_pattern: GrowthPattern,
    pub model: FittedModel,

    pub dedup_trend: DedupTrend,
    pub dedup_adjustment_applied: bool,
    pub current_dedup_ratio: Option<f64>,

    pub confidence: ConfidenceResult,
    pub quality_flags: QualityFlags,
    pub gaps_interpolated: usize,
    pub outliers_removed: usize,

    pub priority: Priority,
    pub recommendation: String,
    pub recommended_capacity_gb: Option<f64>,
}

impl CapacityForecast {
    pub fn days_to_warning(&self) -> Option<i64> {
        self.warning.days_from_now
    }

    pub fn days_to_critical(&self) -> Option<i64> {
        self.critical.days_from_now
    }

    pub fn days_to_exhaustion(&self) -> Option<i64> {
        self.exhaustion.days_from_now
    }
}

/// Result of analysing one repository
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastOutcome {
    Forecast(Box<CapacityForecast>),
    Skipped(SkipReason),
}

impl ForecastOutcome {
    pub fn forecast(&self) -> Option<&CapacityForecast> {
        match self {
            ForecastOutcome::Forecast(f) => Some(f),
            ForecastOutcome::Skipped(_) => None,
        }
    }

    pub fn into_forecast(self) -> Option<CapacityForecast> {
        match self {
            ForecastOutcome::Forecast(f) => Some(*f),
            ForecastOutcome::Skipped(_) => None,
        }
    }
}

/// A repository that was skipped for lack of data
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRepository {
    pub repository_id: String,
    pub reason: SkipReason,
}

/// A repository whose input could not be analysed
#[derive(Debug, Clone, PartialEq)]
pub struct FailedRepository {
    pub repository_id: String,
    pub error: String,
}

/// Outcome of a run over many repositories
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub forecasts: Vec<CapacityForecast>,
    pub skipped: Vec<SkippedRepository>,
    pub failed: Vec<FailedRepository>,
}

/// Composes the pipeline components for each repository
#[derive(Debug, Clone)]
pub struct ForecastAssembler {
    preprocessor: SeriesPreprocessor,
    dedup: DeduplicationTrendClassifier,
    fitter: GrowthModelFitter,
    solver: ThresholdSolver,
    confidence: ConfidenceClassifier,
    priority: PriorityConfig,
    history_window_days: i64,
    min_samples: usize,
}

impl ForecastAssembler {
    /// Create an assembler from a validated configuration
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        let ForecastConfig {
            preprocess,
            dedup,
            model,
            thresholds,
            confidence,
            priority,
        } = config;

        Ok(Self {
            history_window_days: preprocess.history_window_days,
            min_samples: preprocess.min_samples,
            confidence: ConfidenceClassifier::new(confidence, preprocess.min_samples),
            preprocessor: SeriesPreprocessor::new(preprocess),
            dedup: DeduplicationTrendClassifier::new(dedup),
            solver: ThresholdSolver::new(&model, thresholds),
            fitter: GrowthModelFitter::new(model),
            priority,
        })
    }

    /// Forecast one repository as of `as_of`
    ///
    /// Insufficient data yields [`ForecastOutcome::Skipped`]; only malformed
    /// input is an error.
    pub fn assemble(&self, input: &RepositoryInput, as_of: NaiveDate) -> Result<ForecastOutcome> {
        input.validate()?;
        let snapshot = &input.snapshot;
        let repository_id = snapshot.repository_id.as_str();

        // a window reaching past the calendar range has no lower bound
        let window_start = Duration::try_days(self.history_window_days)
            .and_then(|window| as_of.checked_sub_signed(window));
        let mut observations: Vec<CapacityObservation> = input
            .history
            .iter()
            .filter(|o| window_start.map_or(true, |start| o.date >= start) && o.date <= as_of)
            .cloned()
            .collect();

        if observations.len() < self.min_samples {
            let reason = SkipReason::InsufficientHistory {
                observed: observations.len(),
                required: self.min_samples,
            };
            warn!(repository_id, %reason, "skipping repository");
            return Ok(ForecastOutcome::Skipped(reason));
        }

        observations.push(CapacityObservation {
            date: as_of,
            used_space_gb: snapshot.used_space_gb,
            dedup_ratio: None,
        });

        let series = match self.preprocessor.clean(&observations) {
            Ok(series) => series,
            Err(reason) => {
                warn!(repository_id, %reason, "skipping repository");
                return Ok(ForecastOutcome::Skipped(reason));
            }
        };

        let ratios = series.ratios();
        let dedup_trend = self.dedup.classify(&ratios);
        let current_dedup_ratio = match dedup_trend.classification {
            DedupClassification::Unknown => None,
            _ => ratios.last().copied(),
        };

        let model = self.fitter.fit(&series.x(), &series.y());
        let dedup_adjustment_applied = dedup_trend.is_adjusting();
        let adjusted = model
            .coefficients
            .scale_growth(dedup_trend.adjustment_factor);

        let current_day = series.current_day().unwrap_or(0) as f64;
        let [warning, critical, exhaustion] =
            self.solver
                .predict_all(&adjusted, snapshot.total_capacity_gb, current_day);

        let confidence = self.confidence.classify(model.r_squared, series.len());
        let growth_rate = adjusted.b;
        let acceleration = adjusted.a;
        let growth_pattern = self.growth_pattern(growth_rate, acceleration, model.kind);
        let priority = self.priority_for(warning.days_from_now);
        let recommendation =
            self.recommendation(growth_pattern, priority, growth_rate, &warning);
        let recommended_capacity_gb = exhaustion.days_from_now.map(|_| {
            snapshot.total_capacity_gb
                + self.priority.headroom_factor * growth_rate * self.priority.projection_days
        });

        let thresholds_exceeded = [&warning, &critical, &exhaustion]
            .iter()
            .filter(|p| snapshot.used_space_gb >= p.target_value)
            .map(|p| p.threshold_fraction)
            .collect();

        let quality_flags = QualityFlags {
            r_squared: model.r_squared,
            sample_count: series.len(),
            model_type: model.kind,
            p_value: model.p_value,
            dedup_adjustment: dedup_adjustment_applied,
            confidence_level: confidence.level,
            gaps_dropped: series.gaps_dropped(),
            thresholds_exceeded,
        };

        info!(
            repository_id,
            pattern = %growth_pattern,
            model = %model.kind,
            days_to_warning = ?warning.days_from_now,
            priority = %priority,
            "forecast assembled"
        );

        Ok(ForecastOutcome::Forecast(Box::new(CapacityForecast {
            repository_id: snapshot.repository_id.clone(),
            repository_name: snapshot.repository_name.clone(),
            repository_type: snapshot.repository_type.clone(),
            forecast_date: as_of,
            total_capacity_gb: snapshot.total_capacity_gb,
            used_space_gb: snapshot.used_space_gb,
            utilization_pct: snapshot.utilization_pct(),
            warning,
            critical,
            exhaustion,
            growth_rate,
            acceleration,
            growth_pattern,
            model,
            dedup_trend,
            dedup_adjustment_applied,
            current_dedup_ratio,
            confidence,
            quality_flags,
            gaps_interpolated: series.gaps_interpolated(),
            outliers_removed: series.outliers_removed(),
            priority,
            recommendation,
            recommended_capacity_gb,
        })))
    }

    /// Forecast every repository independently
    ///
    /// Repositories run in parallel. A failure in one is recorded in the
    /// report and does not affect the others. Report lists keep input order.
    pub fn forecast_all(&self, inputs: &[RepositoryInput], as_of: NaiveDate) -> BatchReport {
        let outcomes: Vec<(String, Result<ForecastOutcome>)> = inputs
            .par_iter()
            .map(|input| {
                (
                    input.snapshot.repository_id.clone(),
                    self.assemble(input, as_of),
                )
            })
            .collect();

        let mut report = BatchReport::default();
        for (repository_id, outcome) in outcomes {
            match outcome {
                Ok(ForecastOutcome::Forecast(forecast)) => report.forecasts.push(*forecast),
                Ok(ForecastOutcome::Skipped(reason)) => report.skipped.push(SkippedRepository {
                    repository_id,
                    reason,
                }),
                Err(e) => {
                    warn!(repository_id = %repository_id, error = %e, "failed to analyze repository");
                    report.failed.push(FailedRepository {
                        repository_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            forecasted = report.forecasts.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "capacity forecasting complete"
        );
        report
    }

    fn growth_pattern(&self, growth_rate: f64, acceleration: f64, kind: ModelKind) -> GrowthPattern {
        if growth_rate < self.priority.declining_rate {
            GrowthPattern::Declining
        } else if growth_rate.abs() < self.priority.stable_rate {
            GrowthPattern::Stable
        } else if kind == ModelKind::Quadratic && acceleration > self.priority.quadratic_acceleration
        {
            GrowthPattern::Quadratic
        } else {
            GrowthPattern::Linear
        }
    }

    fn priority_for(&self, days_to_warning: Option<i64>) -> Priority {
        match days_to_warning {
            Some(d) if d < self.priority.urgent_days => Priority::Urgent,
            Some(d) if d < self.priority.high_days => Priority::High,
            Some(d) if d < self.priority.medium_days => Priority::Medium,
            _ => Priority::Low,
        }
    }

    fn recommendation(
        &self,
        pattern: GrowthPattern,
        priority: Priority,
        growth_rate: f64,
        warning: &ThresholdPrediction,
    ) -> String {
        let pct = (warning.threshold_fraction * 100.0).round();
        if pattern == GrowthPattern::Declining {
            return format!(
                "Capacity declining at {:.1} GB/day. Monitor for stabilization.",
                growth_rate.abs()
            );
        }

        let days = warning
            .days_from_now
            .map(|d| d.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let action = match priority {
            Priority::Urgent => "Order storage immediately.",
            Priority::High => "Order storage within 2 weeks.",
            Priority::Medium => "Plan expansion within 30 days.",
            Priority::Low => "Monitor quarterly.",
        };
        format!("{}: {} days to {}% capacity. {}", priority, days, pct, action)
    }
}
