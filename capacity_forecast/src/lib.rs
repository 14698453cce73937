//! # Capacity Forecast
//!
//! Predicts when backup storage repositories will cross their capacity
//! thresholds.
//!
//! ## Features
//!
//! - Daily usage series cleaning (gap interpolation, outlier removal)
//! - Deduplication ratio trend classification with growth rescaling
//! - Linear versus quadratic growth model selection by significance test
//! - Analytic threshold crossing for the 80%, 90% and 100% levels
//! - Confidence grading, growth pattern, priority and sizing recommendation
//! - Parallel batch runs with per-repository failure isolation
//! - TOML configuration with environment variable overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use capacity_forecast::{DataLoader, ForecastAssembler, ForecastConfig};
//! use chrono::NaiveDate;
//!
//! let history = DataLoader::history_from_csv("history.csv")?;
//! let snapshots = DataLoader::snapshots_from_csv("snapshots.csv")?;
//! let inputs = DataLoader::group_inputs(snapshots, history);
//!
//! let assembler = ForecastAssembler::new(ForecastConfig::default())?;
//! let as_of = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let report = assembler.forecast_all(&inputs, as_of);
//!
//! for forecast in &report.forecasts {
//!     println!("{}: {}", forecast.repository_name, forecast.recommendation);
//! }
//! # Ok::<(), capacity_forecast::ForecastError>(())
//! ```

pub mod assembler;
pub mod confidence;
pub mod config;
pub mod data;
pub mod dedup;
pub mod error;
pub mod models;
pub mod preprocess;
pub mod record;
pub mod solver;
pub mod utils;

// Re-export commonly used types
pub use crate::assembler::{
    BatchReport, CapacityForecast, ForecastAssembler, ForecastOutcome, GrowthPattern, Priority,
};
pub use crate::confidence::{ConfidenceLevel, ConfidenceResult};
pub use crate::config::ForecastConfig;
pub use crate::data::{
    CapacityObservation, CleanedSeries, DataLoader, RepositoryInput, RepositorySnapshot,
    SkipReason,
};
pub use crate::dedup::{DedupClassification, DedupTrend};
pub use crate::error::{ForecastError, Result};
pub use crate::models::{FittedModel, GrowthCoefficients, ModelKind};
pub use crate::record::{ForecastRecord, ForecastStore, InMemoryForecastStore};
pub use crate::solver::ThresholdPrediction;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
