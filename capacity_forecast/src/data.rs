//! Capacity series data handling
//!
//! Inputs arrive in calendar form (dated readings plus a live snapshot) and
//! are turned into day-indexed samples by the preprocessor.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// A dated capacity reading for one repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityObservation {
    /// Calendar day of the reading
    pub date: NaiveDate,
    /// Used space in GB
    pub used_space_gb: f64,
    /// Storage efficiency ratio measured with the reading, when available
    pub dedup_ratio: Option<f64>,
}

/// One row of the historical capacity table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub repository_id: String,
    pub date: NaiveDate,
    pub used_space_gb: f64,
    #[serde(default)]
    pub dedup_ratio: Option<f64>,
}

impl From<HistoryRow> for CapacityObservation {
    fn from(row: HistoryRow) -> Self {
        Self {
            date: row.date,
            used_space_gb: row.used_space_gb,
            dedup_ratio: row.dedup_ratio,
        }
    }
}

/// Live capacity reading reported by the backup platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    pub repository_id: String,
    pub repository_name: String,
    #[serde(default = "default_repository_type")]
    pub repository_type: String,
    pub total_capacity_gb: f64,
    pub used_space_gb: f64,
}

fn default_repository_type() -> String {
    "Unknown".to_string()
}

impl RepositorySnapshot {
    /// Current utilization as a percentage of total capacity
    pub fn utilization_pct(&self) -> f64 {
        if self.total_capacity_gb > 0.0 {
            self.used_space_gb / self.total_capacity_gb * 100.0
        } else {
            0.0
        }
    }
}

/// Everything needed to forecast one repository
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryInput {
    pub snapshot: RepositorySnapshot,
    pub history: Vec<CapacityObservation>,
}

impl RepositoryInput {
    pub fn new(snapshot: RepositorySnapshot, history: Vec<CapacityObservation>) -> Self {
        Self { snapshot, history }
    }

    /// Reject input that cannot be modelled at all
    pub fn validate(&self) -> Result<()> {
        let s = &self.snapshot;
        if s.repository_id.trim().is_empty() {
            return Err(ForecastError::DataError(
                "Repository id must not be empty".to_string(),
            ));
        }
        if !s.total_capacity_gb.is_finite() || s.total_capacity_gb <= 0.0 {
            return Err(ForecastError::DataError(format!(
                "{}: total capacity must be positive, got {}",
                s.repository_id, s.total_capacity_gb
            )));
        }
        if !s.used_space_gb.is_finite() || s.used_space_gb < 0.0 {
            return Err(ForecastError::DataError(format!(
                "{}: used space must be non-negative, got {}",
                s.repository_id, s.used_space_gb
            )));
        }
        if let Some(bad) = self.history.iter().find(|o| {
            !o.used_space_gb.is_finite() || o.dedup_ratio.is_some_and(|r| !r.is_finite())
        }) {
            return Err(ForecastError::DataError(format!(
                "{}: non-finite reading on {}",
                s.repository_id, bad.date
            )));
        }
        Ok(())
    }
}

/// One point of a day-indexed series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Days since the first sample of the series
    pub day_index: i64,
    /// Used space at that day
    pub value: f64,
    /// Efficiency ratio measured that day
    pub aux_ratio: Option<f64>,
}

/// A gap-filled, outlier-free daily series ready for model fitting
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedSeries {
    pub(crate) samples: Vec<RawSample>,
    pub(crate) gaps_interpolated: usize,
    pub(crate) gaps_dropped: usize,
    pub(crate) outliers_removed: usize,
}

impl CleanedSeries {
    /// Samples in day order
    pub fn samples(&self) -> &[RawSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Day indices as regression inputs
    pub fn x(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.day_index as f64).collect()
    }

    /// Values as regression targets
    pub fn y(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Efficiency ratios that were observed, in time order
    pub fn ratios(&self) -> Vec<f64> {
        self.samples.iter().filter_map(|s| s.aux_ratio).collect()
    }

    /// Day index of the most recent sample
    pub fn current_day(&self) -> Option<i64> {
        self.samples.last().map(|s| s.day_index)
    }

    /// Number of days filled by interpolation
    pub fn gaps_interpolated(&self) -> usize {
        self.gaps_interpolated
    }

    /// Number of missing days left out because their gap was too long
    pub fn gaps_dropped(&self) -> usize {
        self.gaps_dropped
    }

    /// Number of samples removed as outliers
    pub fn outliers_removed(&self) -> usize {
        self.outliers_removed
    }
}

/// Why a repository produced no forecast in this run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Too few raw history rows inside the window
    InsufficientHistory { observed: usize, required: usize },
    /// Too few samples left after gap handling and outlier removal
    InsufficientAfterCleaning { remaining: usize, required: usize },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::InsufficientHistory { observed, required } => write!(
                f,
                "only {} days of history (min {} required)",
                observed, required
            ),
            SkipReason::InsufficientAfterCleaning {
                remaining,
                required,
            } => write!(
                f,
                "only {} samples after preprocessing (min {} required)",
                remaining, required
            ),
        }
    }
}

/// Data loader for capacity history and snapshots
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load history rows from a CSV file with columns
    /// `repository_id,date,used_space_gb,dedup_ratio`
    pub fn history_from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<HistoryRow>> {
        let file = File::open(path)?;
        Self::history_from_reader(file)
    }

    /// Load history rows from any CSV reader
    pub fn history_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<HistoryRow>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in csv_reader.deserialize() {
            rows.push(record?);
        }
        Ok(rows)
    }

    /// Load snapshots from a CSV file with columns
    /// `repository_id,repository_name,repository_type,total_capacity_gb,used_space_gb`
    pub fn snapshots_from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RepositorySnapshot>> {
        let file = File::open(path)?;
        Self::snapshots_from_reader(file)
    }

    /// Load snapshots from any CSV reader
    pub fn snapshots_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<RepositorySnapshot>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut snapshots = Vec::new();
        for record in csv_reader.deserialize() {
            snapshots.push(record?);
        }
        Ok(snapshots)
    }

    /// Join snapshots with their history, one input per snapshot
    ///
    /// History is sorted by date; rows for repositories without a snapshot
    /// are ignored.
    pub fn group_inputs(
        snapshots: Vec<RepositorySnapshot>,
        history: Vec<HistoryRow>,
    ) -> Vec<RepositoryInput> {
        let mut by_repo: BTreeMap<String, Vec<CapacityObservation>> = BTreeMap::new();
        for row in history {
            by_repo
                .entry(row.repository_id.clone())
                .or_default()
                .push(row.into());
        }

        snapshots
            .into_iter()
            .map(|snapshot| {
                let mut observations = by_repo
                    .remove(&snapshot.repository_id)
                    .unwrap_or_default();
                observations.sort_by_key(|o| o.date);
                RepositoryInput::new(snapshot, observations)
            })
            .collect()
    }
}
