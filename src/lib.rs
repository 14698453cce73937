//! # Capacity Watch
//!
//! `capacity_watch_workspace` bundles the capacity forecasting crates of this
//! workspace behind one dependency.
//!
//! - [`math`]: statistics, least-squares fits, the t-test and root finding
//! - [`forecast`]: the per-repository forecasting pipeline
//!
//! ## Example
//!
//! ```
//! use capacity_watch_workspace::forecast::models::GrowthCoefficients;
//! use capacity_watch_workspace::forecast::config::{ModelConfig, ThresholdConfig};
//! use capacity_watch_workspace::forecast::solver::ThresholdSolver;
//!
//! let solver = ThresholdSolver::new(&ModelConfig::default(), ThresholdConfig::default());
//! let growth = GrowthCoefficients::linear(5.0, 400.0);
//!
//! // 700 GB used on day 60, growing 5 GB/day: 800 GB is reached in 20 days
//! assert_eq!(solver.days_until(&growth, 800.0, 60.0), Some(20));
//! ```

pub use capacity_forecast as forecast;
pub use capacity_math as math;

/// Forecast one repository from its history with default settings.
///
/// Returns `None` when the repository was skipped for lack of data.
///
/// # Examples
///
/// ```
/// use capacity_watch_workspace::forecast::{CapacityObservation, RepositorySnapshot};
/// use capacity_watch_workspace::quick_forecast;
/// use chrono::{Duration, NaiveDate};
///
/// let as_of = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let history: Vec<_> = (0..30)
///     .map(|i| CapacityObservation {
///         date: as_of - Duration::days(30 - i),
///         used_space_gb: 100.0 + 10.0 * i as f64,
///         dedup_ratio: None,
///     })
///     .collect();
/// let snapshot = RepositorySnapshot {
///     repository_id: "repo-1".to_string(),
///     repository_name: "Primary".to_string(),
///     repository_type: "LinuxLocal".to_string(),
///     total_capacity_gb: 1000.0,
///     used_space_gb: 400.0,
/// };
///
/// let forecast = quick_forecast(snapshot, history, as_of).unwrap().unwrap();
/// assert_eq!(forecast.days_to_warning(), Some(40));
/// ```
pub fn quick_forecast(
    snapshot: forecast::RepositorySnapshot,
    history: Vec<forecast::CapacityObservation>,
    as_of: chrono::NaiveDate,
) -> forecast::Result<Option<forecast::CapacityForecast>> {
    let assembler = forecast::ForecastAssembler::new(forecast::ForecastConfig::default())?;
    let input = forecast::RepositoryInput::new(snapshot, history);
    Ok(assembler.assemble(&input, as_of)?.into_forecast())
}
