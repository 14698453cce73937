use capacity_forecast::config::{DedupConfig, ForecastConfig, MAX_HISTORY_WINDOW_DAYS};
use capacity_forecast::error::ForecastError;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_defaults() {
    let config = ForecastConfig::default();

    assert_eq!(config.preprocess.max_gap_days, 2);
    assert_eq!(config.preprocess.outlier_sigma, 3.0);
    assert_eq!(config.preprocess.min_samples, 14);
    assert_eq!(config.preprocess.history_window_days, 60);
    assert_eq!(config.model.p_value_threshold, 0.05);
    assert_eq!(config.thresholds.fractions(), [0.8, 0.9, 1.0]);
    assert_eq!(config.thresholds.interval_band, 0.1);
    assert_eq!(config.confidence.r_squared_high, 0.85);
    assert_eq!(config.confidence.high_min_samples, 21);
    assert_eq!(config.priority.urgent_days, 15);
    assert_eq!(config.priority.medium_days, 60);
    assert_eq!(config.priority.headroom_factor, 1.2);
    config.validate().unwrap();
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = ForecastConfig::from_toml_str(
        r#"
        [preprocess]
        min_samples = 21

        [confidence]
        r_squared_high = 0.9
        "#,
    )
    .unwrap();

    assert_eq!(config.preprocess.min_samples, 21);
    assert_eq!(config.preprocess.max_gap_days, 2);
    assert_eq!(config.confidence.r_squared_high, 0.9);
    assert_eq!(config.confidence.r_squared_moderate, 0.70);
    assert_eq!(config.dedup, DedupConfig::default());
}

#[test]
fn test_empty_toml_is_default() {
    assert_eq!(ForecastConfig::from_toml_str("").unwrap(), ForecastConfig::default());
}

#[test]
fn test_malformed_toml() {
    let result = ForecastConfig::from_toml_str("[preprocess\nmin_samples = ");
    assert!(matches!(result, Err(ForecastError::ConfigError(_))));

    let result = ForecastConfig::from_toml_str("[preprocess]\nmin_samples = \"many\"");
    assert!(matches!(result, Err(ForecastError::ConfigError(_))));
}

#[test]
fn test_toml_round_trip() {
    let mut config = ForecastConfig::default();
    config.priority.urgent_days = 7;
    config.thresholds.interval_band = 0.2;

    let text = config.to_toml_string().unwrap();
    assert_eq!(ForecastConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn test_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[priority]").unwrap();
    writeln!(file, "high_days = 45").unwrap();

    let config = ForecastConfig::from_file(file.path()).unwrap();
    assert_eq!(config.priority.high_days, 45);

    let missing = ForecastConfig::from_file("/nonexistent/capacity.toml");
    assert!(matches!(missing, Err(ForecastError::ConfigError(_))));
}

#[test]
fn test_validation_failures() {
    let cases: [fn(&mut ForecastConfig); 16] = [
        |c| c.preprocess.min_samples = 3,
        |c| c.preprocess.outlier_sigma = 0.0,
        |c| c.preprocess.history_window_days = 0,
        |c| c.preprocess.history_window_days = i64::MAX / 2,
        |c| c.dedup.min_observations = 1,
        |c| c.dedup.degrading_threshold = 0.5,
        |c| c.dedup.improving_adjustment = 0.0,
        |c| c.model.p_value_threshold = 1.0,
        |c| c.thresholds.critical_fraction = 0.7,
        |c| c.thresholds.interval_band = 1.0,
        |c| c.confidence.r_squared_moderate = 0.9,
        |c| c.confidence.r_squared_high = 1.5,
        |c| c.priority.high_days = 15,
        |c| c.priority.urgent_days = 0,
        |c| c.priority.declining_rate = 0.5,
        |c| c.priority.headroom_factor = -1.0,
    ];

    for (i, mutate) in cases.into_iter().enumerate() {
        let mut config = ForecastConfig::default();
        mutate(&mut config);
        assert!(
            matches!(config.validate(), Err(ForecastError::ConfigError(_))),
            "case {} should be rejected",
            i
        );
    }
}

#[test]
fn test_history_window_bound() {
    let mut config = ForecastConfig::default();
    config.preprocess.history_window_days = MAX_HISTORY_WINDOW_DAYS;
    config.validate().unwrap();

    config.preprocess.history_window_days = MAX_HISTORY_WINDOW_DAYS + 1;
    let message = config.validate().unwrap_err().to_string();
    assert!(message.contains("history_window_days"));
}

#[test]
fn test_non_finite_values_rejected() {
    let cases: [fn(&mut ForecastConfig); 8] = [
        |c| c.preprocess.outlier_sigma = f64::INFINITY,
        |c| c.dedup.improving_threshold = f64::NAN,
        |c| c.dedup.degrading_threshold = f64::NAN,
        |c| c.model.flat_epsilon = f64::INFINITY,
        |c| c.thresholds.exhaustion_fraction = f64::INFINITY,
        |c| c.priority.declining_rate = f64::NAN,
        |c| c.priority.stable_rate = f64::NAN,
        |c| c.priority.quadratic_acceleration = f64::NAN,
    ];

    for (i, mutate) in cases.into_iter().enumerate() {
        let mut config = ForecastConfig::default();
        mutate(&mut config);
        let error = config.validate().unwrap_err();
        assert!(
            error.to_string().ends_with("must be finite"),
            "case {} gave {}",
            i,
            error
        );
    }
}

// The only test in this binary that touches the process environment
#[test]
fn test_env_overrides() {
    std::env::set_var("CAPACITY_FORECAST_MIN_SAMPLES", "21");
    std::env::set_var("CAPACITY_FORECAST_URGENT_DAYS", " 10 ");
    std::env::set_var("CAPACITY_FORECAST_P_VALUE_THRESHOLD", "0.01");

    let config = ForecastConfig::default().with_env_overrides().unwrap();
    assert_eq!(config.preprocess.min_samples, 21);
    assert_eq!(config.priority.urgent_days, 10);
    assert_eq!(config.model.p_value_threshold, 0.01);
    assert_eq!(config.priority.high_days, 30);

    std::env::set_var("CAPACITY_FORECAST_MIN_SAMPLES", "plenty");
    let result = ForecastConfig::default().with_env_overrides();
    assert!(matches!(result, Err(ForecastError::ConfigError(_))));

    std::env::remove_var("CAPACITY_FORECAST_MIN_SAMPLES");
    std::env::remove_var("CAPACITY_FORECAST_URGENT_DAYS");
    std::env::remove_var("CAPACITY_FORECAST_P_VALUE_THRESHOLD");
}
