//! Series cleaning ahead of model fitting
//!
//! Turns dated readings into a day-indexed series: readings are placed on a
//! complete daily grid, short gaps are filled by linear interpolation, long
//! gaps are dropped, and values far from the mean are removed as outliers.

use crate::config::PreprocessConfig;
use crate::data::{CapacityObservation, CleanedSeries, RawSample, SkipReason};
use crate::utils::day_offset;
use capacity_math::stats;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Cleans a raw per-day capacity series
#[derive(Debug, Clone)]
pub struct SeriesPreprocessor {
    config: PreprocessConfig,
}

/// One slot of the daily grid
#[derive(Debug, Clone, Copy)]
struct GridSlot {
    value: Option<f64>,
    ratio: Option<f64>,
}

impl SeriesPreprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Clean the observations of one repository
    ///
    /// Observations may be unsorted; when several share a date the last one
    /// wins. Returns a [`SkipReason`] when fewer than `min_samples` samples
    /// survive.
    pub fn clean(
        &self,
        observations: &[CapacityObservation],
    ) -> Result<CleanedSeries, SkipReason> {
        let required = self.config.min_samples;
        let insufficient = |remaining| SkipReason::InsufficientAfterCleaning {
            remaining,
            required,
        };

        let mut by_date: BTreeMap<NaiveDate, &CapacityObservation> = BTreeMap::new();
        for obs in observations {
            by_date.insert(obs.date, obs);
        }

        let (Some((&start, _)), Some((&end, _))) =
            (by_date.first_key_value(), by_date.last_key_value())
        else {
            return Err(insufficient(0));
        };

        let mut grid = vec![
            GridSlot {
                value: None,
                ratio: None,
            };
            day_offset(start, end) as usize + 1
        ];
        for (date, obs) in &by_date {
            let slot = &mut grid[day_offset(start, *date) as usize];
            slot.value = Some(obs.used_space_gb).filter(|v| v.is_finite());
            slot.ratio = obs.dedup_ratio.filter(|r| r.is_finite());
        }

        let (gaps_interpolated, gaps_dropped) = self.interpolate_gaps(&mut grid);
        if gaps_interpolated > 0 {
            info!(days = gaps_interpolated, "interpolated missing days");
        }
        if gaps_dropped > 0 {
            warn!(
                days = gaps_dropped,
                max_gap_days = self.config.max_gap_days,
                "dropped days in gaps longer than the interpolation budget"
            );
        }

        let samples: Vec<RawSample> = grid
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                slot.value.map(|value| RawSample {
                    day_index: i as i64,
                    value,
                    aux_ratio: slot.ratio,
                })
            })
            .collect();

        let (samples, outliers_removed) = self.remove_outliers(samples);
        if outliers_removed > 0 {
            warn!(
                count = outliers_removed,
                sigma = self.config.outlier_sigma,
                "removed outliers"
            );
        }

        if samples.len() < required {
            return Err(insufficient(samples.len()));
        }

        Ok(CleanedSeries {
            samples,
            gaps_interpolated,
            gaps_dropped,
            outliers_removed,
        })
    }

    /// Fill runs of missing values no longer than `max_gap_days`
    ///
    /// Returns `(interpolated, dropped)` day counts. The grid always starts
    /// and ends with an observed value, so every run has two neighbours.
    fn interpolate_gaps(&self, grid: &mut [GridSlot]) -> (usize, usize) {
        let mut interpolated = 0;
        let mut dropped = 0;
        let mut last_known: Option<usize> = None;

        for i in 0..grid.len() {
            let Some(right) = grid[i].value else {
                continue;
            };
            if let Some(l) = last_known {
                let run = i - l - 1;
                if run > 0 && run <= self.config.max_gap_days {
                    let left = grid[l].value.unwrap_or(right);
                    let span = (i - l) as f64;
                    for (k, slot) in grid[l + 1..i].iter_mut().enumerate() {
                        let t = (k + 1) as f64 / span;
                        slot.value = Some(left + (right - left) * t);
                    }
                    interpolated += run;
                } else {
                    dropped += run;
                }
            }
            last_known = Some(i);
        }

        (interpolated, dropped)
    }

    /// Remove points further than `outlier_sigma` standard deviations from the mean
    ///
    /// The mask is computed once and applied to whole samples, so day
    /// indices stay aligned with their values.
    fn remove_outliers(&self, samples: Vec<RawSample>) -> (Vec<RawSample>, usize) {
        if samples.len() < 3 {
            return (samples, 0);
        }

        let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
        let (Some(mean), Some(std)) = (stats::mean(&values), stats::population_std(&values))
        else {
            return (samples, 0);
        };
        if std == 0.0 {
            return (samples, 0);
        }

        let limit = self.config.outlier_sigma * std;
        let keep: Vec<bool> = values.iter().map(|v| (v - mean).abs() <= limit).collect();
        let removed = keep.iter().filter(|k| !**k).count();
        if removed == 0 {
            return (samples, 0);
        }

        let kept = samples
            .into_iter()
            .zip(keep)
            .filter_map(|(sample, keep)| keep.then_some(sample))
            .collect();
        (kept, removed)
    }
}
