//! Forecast configuration
//!
//! Every threshold the pipeline uses lives here. Components receive the
//! section they need at construction and never consult global state.
//!
//! # Example
//!
//! ```rust
//! use capacity_forecast::config::ForecastConfig;
//!
//! let config = ForecastConfig::from_toml_str(
//!     r#"
//!     [preprocess]
//!     max_gap_days = 3
//!
//!     [priority]
//!     urgent_days = 10
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.preprocess.max_gap_days, 3);
//! assert_eq!(config.priority.urgent_days, 10);
//! assert_eq!(config.priority.high_days, 30);
//! config.validate().unwrap();
//! ```

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Longest accepted history window, roughly a century
pub const MAX_HISTORY_WINDOW_DAYS: i64 = 36_500;

/// Series cleaning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Longest run of missing days that is filled by interpolation
    pub max_gap_days: usize,
    /// Distance from the mean, in standard deviations, beyond which a point is an outlier
    pub outlier_sigma: f64,
    /// Minimum number of samples needed to fit a model
    pub min_samples: usize,
    /// Length of the rolling history window, in days
    pub history_window_days: i64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            max_gap_days: 2,
            outlier_sigma: 3.0,
            min_samples: 14,
            history_window_days: 60,
        }
    }
}

/// Deduplication trend parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Ratio observations required before a trend is classified
    pub min_observations: usize,
    /// Second-half minus first-half mean above which the trend is improving
    pub improving_threshold: f64,
    /// Second-half minus first-half mean below which the trend is degrading
    pub degrading_threshold: f64,
    /// Growth multiplier applied for an improving trend
    pub improving_adjustment: f64,
    /// Growth multiplier applied for a degrading trend
    pub degrading_adjustment: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            min_observations: 10,
            improving_threshold: 0.2,
            degrading_threshold: -0.2,
            improving_adjustment: 0.9,
            degrading_adjustment: 1.1,
        }
    }
}

/// Growth model selection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Significance level for keeping the quadratic term
    pub p_value_threshold: f64,
    /// Coefficients with magnitude below this are treated as zero by the solver
    pub flat_epsilon: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            p_value_threshold: 0.05,
            flat_epsilon: 1e-6,
        }
    }
}

/// Capacity thresholds to solve for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Fraction of total capacity that triggers planning
    pub warning_fraction: f64,
    /// Fraction of total capacity considered critical
    pub critical_fraction: f64,
    /// Fraction of total capacity at which the repository is full
    pub exhaustion_fraction: f64,
    /// Relative half-width of the band reported around each solved day count
    pub interval_band: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            warning_fraction: 0.80,
            critical_fraction: 0.90,
            exhaustion_fraction: 1.00,
            interval_band: 0.10,
        }
    }
}

impl ThresholdConfig {
    /// Fractions in ascending order: warning, critical, exhaustion
    pub fn fractions(&self) -> [f64; 3] {
        [
            self.warning_fraction,
            self.critical_fraction,
            self.exhaustion_fraction,
        ]
    }
}

/// Confidence classification parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub r_squared_high: f64,
    pub r_squared_moderate: f64,
    /// Samples required for HIGH confidence
    pub high_min_samples: usize,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            r_squared_high: 0.85,
            r_squared_moderate: 0.70,
            high_min_samples: 21,
        }
    }
}

/// Priority, growth pattern and sizing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityConfig {
    /// Days to the warning threshold below which priority is URGENT
    pub urgent_days: i64,
    /// Days to the warning threshold below which priority is HIGH
    pub high_days: i64,
    /// Days to the warning threshold below which priority is MEDIUM
    pub medium_days: i64,
    /// Growth rate (units/day) below which the pattern is DECLINING
    pub declining_rate: f64,
    /// Absolute growth rate below which the pattern is STABLE
    pub stable_rate: f64,
    /// Acceleration above which a quadratic model is labelled QUADRATIC
    pub quadratic_acceleration: f64,
    /// Horizon used to size recommended capacity, in days
    pub projection_days: f64,
    /// Multiplier applied to projected growth when sizing
    pub headroom_factor: f64,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            urgent_days: 15,
            high_days: 30,
            medium_days: 60,
            declining_rate: -1.0,
            stable_rate: 1.0,
            quadratic_acceleration: 0.1,
            projection_days: 180.0,
            headroom_factor: 1.2,
        }
    }
}

/// Complete forecast configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub preprocess: PreprocessConfig,
    pub dedup: DedupConfig,
    pub model: ModelConfig,
    pub thresholds: ThresholdConfig,
    pub confidence: ConfidenceConfig,
    pub priority: PriorityConfig,
}

impl ForecastConfig {
    /// Parse configuration from TOML text; missing keys take defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ForecastError::ConfigError(format!("Failed to read config: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Render configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ForecastError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Apply `CAPACITY_FORECAST_*` environment variable overrides
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(v) = env_value("CAPACITY_FORECAST_MIN_SAMPLES")? {
            self.preprocess.min_samples = v;
        }
        if let Some(v) = env_value("CAPACITY_FORECAST_MAX_GAP_DAYS")? {
            self.preprocess.max_gap_days = v;
        }
        if let Some(v) = env_value("CAPACITY_FORECAST_OUTLIER_SIGMA")? {
            self.preprocess.outlier_sigma = v;
        }
        if let Some(v) = env_value("CAPACITY_FORECAST_HISTORY_WINDOW_DAYS")? {
            self.preprocess.history_window_days = v;
        }
        if let Some(v) = env_value("CAPACITY_FORECAST_P_VALUE_THRESHOLD")? {
            self.model.p_value_threshold = v;
        }
        if let Some(v) = env_value("CAPACITY_FORECAST_R_SQUARED_HIGH")? {
            self.confidence.r_squared_high = v;
        }
        if let Some(v) = env_value("CAPACITY_FORECAST_R_SQUARED_MODERATE")? {
            self.confidence.r_squared_moderate = v;
        }
        if let Some(v) = env_value("CAPACITY_FORECAST_URGENT_DAYS")? {
            self.priority.urgent_days = v;
        }
        if let Some(v) = env_value("CAPACITY_FORECAST_HIGH_DAYS")? {
            self.priority.high_days = v;
        }
        if let Some(v) = env_value("CAPACITY_FORECAST_MEDIUM_DAYS")? {
            self.priority.medium_days = v;
        }
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.float_fields() {
            if !value.is_finite() {
                return Err(ForecastError::ConfigError(format!("{} must be finite", name)));
            }
        }

        let p = &self.preprocess;
        if p.min_samples < 4 {
            return invalid("preprocess.min_samples must be at least 4");
        }
        if !(p.outlier_sigma > 0.0) {
            return invalid("preprocess.outlier_sigma must be positive");
        }
        if !(1..=MAX_HISTORY_WINDOW_DAYS).contains(&p.history_window_days) {
            return invalid("preprocess.history_window_days must be between 1 and 36500");
        }

        let d = &self.dedup;
        if d.min_observations < 2 {
            return invalid("dedup.min_observations must be at least 2");
        }
        if d.degrading_threshold > d.improving_threshold {
            return invalid("dedup.degrading_threshold must not exceed dedup.improving_threshold");
        }
        if !(d.improving_adjustment > 0.0 && d.degrading_adjustment > 0.0) {
            return invalid("dedup adjustments must be positive");
        }

        let m = &self.model;
        if !(m.p_value_threshold > 0.0 && m.p_value_threshold < 1.0) {
            return invalid("model.p_value_threshold must be in (0, 1)");
        }
        if !(m.flat_epsilon >= 0.0) {
            return invalid("model.flat_epsilon must be non-negative");
        }

        let t = &self.thresholds;
        let fractions = t.fractions();
        if fractions[0] <= 0.0 || !fractions.windows(2).all(|w| w[0] < w[1]) {
            return invalid("threshold fractions must be positive and strictly increasing");
        }
        if !(t.interval_band >= 0.0 && t.interval_band < 1.0) {
            return invalid("thresholds.interval_band must be in [0, 1)");
        }

        let c = &self.confidence;
        for r in [c.r_squared_high, c.r_squared_moderate] {
            if !(0.0..=1.0).contains(&r) {
                return invalid("confidence r-squared cut-offs must be in [0, 1]");
            }
        }
        if c.r_squared_moderate > c.r_squared_high {
            return invalid("confidence.r_squared_moderate must not exceed r_squared_high");
        }

        let pr = &self.priority;
        if !(0 < pr.urgent_days && pr.urgent_days < pr.high_days && pr.high_days < pr.medium_days) {
            return invalid("priority day thresholds must be positive and strictly increasing");
        }
        if pr.declining_rate > 0.0 || pr.stable_rate < 0.0 {
            return invalid("priority.declining_rate must be <= 0 and stable_rate >= 0");
        }
        if !(pr.projection_days >= 0.0 && pr.headroom_factor >= 0.0) {
            return invalid("priority sizing parameters must be non-negative");
        }

        Ok(())
    }
}

impl ForecastConfig {
    fn float_fields(&self) -> [(&'static str, f64); 18] {
        [
            ("preprocess.outlier_sigma", self.preprocess.outlier_sigma),
            ("dedup.improving_threshold", self.dedup.improving_threshold),
            ("dedup.degrading_threshold", self.dedup.degrading_threshold),
            ("dedup.improving_adjustment", self.dedup.improving_adjustment),
            ("dedup.degrading_adjustment", self.dedup.degrading_adjustment),
            ("model.p_value_threshold", self.model.p_value_threshold),
            ("model.flat_epsilon", self.model.flat_epsilon),
            ("thresholds.warning_fraction", self.thresholds.warning_fraction),
            ("thresholds.critical_fraction", self.thresholds.critical_fraction),
            ("thresholds.exhaustion_fraction", self.thresholds.exhaustion_fraction),
            ("thresholds.interval_band", self.thresholds.interval_band),
            ("confidence.r_squared_high", self.confidence.r_squared_high),
            ("confidence.r_squared_moderate", self.confidence.r_squared_moderate),
            ("priority.declining_rate", self.priority.declining_rate),
            ("priority.stable_rate", self.priority.stable_rate),
            ("priority.quadratic_acceleration", self.priority.quadratic_acceleration),
            ("priority.projection_days", self.priority.projection_days),
            ("priority.headroom_factor", self.priority.headroom_factor),
        ]
    }
}

fn invalid(message: &str) -> Result<()> {
    Err(ForecastError::ConfigError(message.to_string()))
}

/// Read and parse an environment variable, `None` when unset
fn env_value<T: FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ForecastError::ConfigError(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(None),
    }
}
