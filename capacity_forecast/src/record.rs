//! Flat forecast records and their store
//!
//! A [`ForecastRecord`] is the row handed to persistence: one per repository
//! per calendar day. Writing the same `(repository_id, forecast_date)` again
//! replaces the earlier row.

use crate::assembler::{CapacityForecast, QualityFlags};
use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

/// Persisted shape of a capacity forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub repository_id: String,
    pub repository_name: String,
    pub repository_type: String,
    pub forecast_date: NaiveDate,
    pub total_capacity: f64,
    pub used_space: f64,
    pub utilization_pct: f64,
    pub days_to_80: Option<i64>,
    pub days_to_90: Option<i64>,
    pub days_to_100: Option<i64>,
    pub days_to_80_ci_lower: Option<i64>,
    pub days_to_80_ci_upper: Option<i64>,
    pub days_to_100_ci_lower: Option<i64>,
    pub days_to_100_ci_upper: Option<i64>,
    pub growth_rate: f64,
    pub acceleration: f64,
    pub growth_pattern: String,
    pub model_type: String,
    pub r_squared: f64,
    pub sample_count: usize,
    pub confidence_level: String,
    pub confidence_multiplier: f64,
    pub dedup_trend: String,
    pub dedup_adjustment_applied: bool,
    pub current_dedup_ratio: Option<f64>,
    pub quality_flags: QualityFlags,
    pub gaps_interpolated: usize,
    pub outliers_removed: usize,
    pub priority: String,
    pub recommendation: String,
    pub recommended_capacity: Option<f64>,
}

impl From<&CapacityForecast> for ForecastRecord {
    fn from(f: &CapacityForecast) -> Self {
        Self {
            repository_id: f.repository_id.clone(),
            repository_name: f.repository_name.clone(),
            repository_type: f.repository_type.clone(),
            forecast_date: f.forecast_date,
            total_capacity: f.total_capacity_gb,
            used_space: f.used_space_gb,
            utilization_pct: f.utilization_pct,
            days_to_80: f.warning.days_from_now,
            days_to_90: f.critical.days_from_now,
            days_to_100: f.exhaustion.days_from_now,
            days_to_80_ci_lower: f.warning.confidence_interval.0,
            days_to_80_ci_upper: f.warning.confidence_interval.1,
            days_to_100_ci_lower: f.exhaustion.confidence_interval.0,
            days_to_100_ci_upper: f.exhaustion.confidence_interval.1,
            growth_rate: f.growth_rate,
            acceleration: f.acceleration,
            growth_pattern: f.growth_pattern.to_string(),
            model_type: f.model.kind.to_string(),
            r_squared: f.model.r_squared,
            sample_count: f.quality_flags.sample_count,
            confidence_level: f.confidence.level.to_string(),
            confidence_multiplier: f.confidence.multiplier,
            dedup_trend: f.dedup_trend.classification.to_string(),
            dedup_adjustment_applied: f.dedup_adjustment_applied,
            current_dedup_ratio: f.current_dedup_ratio,
            quality_flags: f.quality_flags.clone(),
            gaps_interpolated: f.gaps_interpolated,
            outliers_removed: f.outliers_removed,
            priority: f.priority.to_string(),
            recommendation: f.recommendation.clone(),
            recommended_capacity: f.recommended_capacity_gb,
        }
    }
}

impl ForecastRecord {
    /// Upsert key
    pub fn key(&self) -> (String, NaiveDate) {
        (self.repository_id.clone(), self.forecast_date)
    }
}

/// Destination for forecast records
pub trait ForecastStore {
    /// Insert a record, replacing any record with the same repository and day
    fn upsert(&mut self, record: ForecastRecord) -> Result<()>;

    /// Record for a repository on a given day
    fn get(&self, repository_id: &str, date: NaiveDate) -> Option<&ForecastRecord>;

    /// Most recent record for a repository
    fn latest(&self, repository_id: &str) -> Option<&ForecastRecord>;
}

/// In-memory forecast store ordered by repository then day
#[derive(Debug, Clone, Default)]
pub struct InMemoryForecastStore {
    records: BTreeMap<(String, NaiveDate), ForecastRecord>,
}

impl InMemoryForecastStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in key order
    pub fn records(&self) -> impl Iterator<Item = &ForecastRecord> {
        self.records.values()
    }

    /// Write all records as a pretty JSON array
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        let records: Vec<&ForecastRecord> = self.records().collect();
        serde_json::to_writer_pretty(&mut writer, &records)?;
        writer.flush()?;
        Ok(())
    }
}

impl ForecastStore for InMemoryForecastStore {
    fn upsert(&mut self, record: ForecastRecord) -> Result<()> {
        self.records.insert(record.key(), record);
        Ok(())
    }

    fn get(&self, repository_id: &str, date: NaiveDate) -> Option<&ForecastRecord> {
        self.records.get(&(repository_id.to_string(), date))
    }

    fn latest(&self, repository_id: &str) -> Option<&ForecastRecord> {
        self.records
            .range((repository_id.to_string(), NaiveDate::MIN)..=(repository_id.to_string(), NaiveDate::MAX))
            .next_back()
            .map(|(_, record)| record)
    }
}
