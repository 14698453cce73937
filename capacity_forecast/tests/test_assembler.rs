use approx::{assert_abs_diff_eq, assert_relative_eq};
use capacity_forecast::assembler::{ForecastAssembler, ForecastOutcome, GrowthPattern, Priority};
use capacity_forecast::confidence::ConfidenceLevel;
use capacity_forecast::config::ForecastConfig;
use capacity_forecast::data::{CapacityObservation, RepositoryInput, RepositorySnapshot, SkipReason};
use capacity_forecast::dedup::DedupClassification;
use capacity_forecast::models::ModelKind;
use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn snapshot(id: &str, total: f64, used: f64) -> RepositorySnapshot {
    RepositorySnapshot {
        repository_id: id.to_string(),
        repository_name: format!("{} repository", id),
        repository_type: "LinuxLocal".to_string(),
        total_capacity_gb: total,
        used_space_gb: used,
    }
}

/// `days` daily readings ending the day before `as_of`, valued by `f(i)`
fn history(days: i64, f: impl Fn(i64) -> f64) -> Vec<CapacityObservation> {
    (0..days)
        .map(|i| CapacityObservation {
            date: as_of() - Duration::days(days - i),
            used_space_gb: f(i),
            dedup_ratio: None,
        })
        .collect()
}

fn assembler() -> ForecastAssembler {
    ForecastAssembler::new(ForecastConfig::default()).unwrap()
}

fn linear_input(id: &str) -> RepositoryInput {
    RepositoryInput::new(
        snapshot(id, 1000.0, 700.0),
        history(60, |i| 400.0 + 5.0 * i as f64),
    )
}

#[test]
fn test_steady_linear_growth() {
    let outcome = assembler().assemble(&linear_input("repo-1"), as_of()).unwrap();
    let forecast = outcome.into_forecast().unwrap();

    assert_eq!(forecast.forecast_date, as_of());
    assert_eq!(forecast.model.kind, ModelKind::Linear);
    assert_relative_eq!(forecast.growth_rate, 5.0, epsilon = 1e-9);
    assert_abs_diff_eq!(forecast.acceleration, 0.0);
    assert_eq!(forecast.growth_pattern, GrowthPattern::Linear);

    assert_eq!(forecast.days_to_warning(), Some(20));
    assert_eq!(forecast.days_to_critical(), Some(40));
    assert_eq!(forecast.days_to_exhaustion(), Some(60));
    assert_eq!(forecast.warning.confidence_interval, (Some(18), Some(22)));

    assert_eq!(forecast.priority, Priority::High);
    assert_eq!(
        forecast.recommendation,
        "HIGH: 20 days to 80% capacity. Order storage within 2 weeks."
    );
    assert_relative_eq!(forecast.recommended_capacity_gb.unwrap(), 2080.0, epsilon = 1e-6);

    assert_eq!(forecast.confidence.level, ConfidenceLevel::High);
    assert_eq!(forecast.dedup_trend.classification, DedupClassification::Unknown);
    assert!(!forecast.dedup_adjustment_applied);
    assert_eq!(forecast.current_dedup_ratio, None);

    assert_relative_eq!(forecast.utilization_pct, 70.0, epsilon = 1e-9);
    assert_eq!(forecast.quality_flags.sample_count, 61);
    assert_eq!(forecast.quality_flags.model_type, ModelKind::Linear);
    assert!(forecast.quality_flags.thresholds_exceeded.is_empty());
    assert_eq!(forecast.gaps_interpolated, 0);
    assert_eq!(forecast.outliers_removed, 0);
}

#[test]
fn test_readings_outside_window_are_ignored() {
    let mut input = linear_input("repo-1");
    let stale = (0..20).map(|i| CapacityObservation {
        date: as_of() - Duration::days(200 + i),
        used_space_gb: 9000.0,
        dedup_ratio: None,
    });
    input.history.extend(stale);
    input.history.push(CapacityObservation {
        date: as_of() + Duration::days(3),
        used_space_gb: 9000.0,
        dedup_ratio: None,
    });

    let forecast = assembler()
        .assemble(&input, as_of())
        .unwrap()
        .into_forecast()
        .unwrap();

    assert_eq!(forecast.days_to_warning(), Some(20));
    assert_eq!(forecast.quality_flags.sample_count, 61);
}

#[test]
fn test_window_reaching_before_calendar_start() {
    let mut config = ForecastConfig::default();
    config.preprocess.history_window_days = 36_500;
    let assembler = ForecastAssembler::new(config).unwrap();

    let as_of = NaiveDate::MIN + Duration::days(100);
    let history = (0..60)
        .map(|i| CapacityObservation {
            date: as_of - Duration::days(60 - i),
            used_space_gb: 400.0 + 5.0 * i as f64,
            dedup_ratio: None,
        })
        .collect();
    let input = RepositoryInput::new(snapshot("repo-old", 1000.0, 700.0), history);

    let forecast = assembler.assemble(&input, as_of).unwrap().into_forecast().unwrap();
    assert_eq!(forecast.days_to_warning(), Some(20));
    assert_eq!(forecast.quality_flags.sample_count, 61);
}

#[test]
fn test_short_history_is_skipped() {
    let input = RepositoryInput::new(
        snapshot("repo-short", 1000.0, 500.0),
        history(10, |i| 450.0 + 5.0 * i as f64),
    );
    let outcome = assembler().assemble(&input, as_of()).unwrap();

    assert_eq!(
        outcome,
        ForecastOutcome::Skipped(SkipReason::InsufficientHistory {
            observed: 10,
            required: 14
        })
    );
}

#[test]
fn test_flat_usage() {
    let input = RepositoryInput::new(snapshot("repo-flat", 1000.0, 500.0), history(30, |_| 500.0));
    let forecast = assembler()
        .assemble(&input, as_of())
        .unwrap()
        .into_forecast()
        .unwrap();

    assert_eq!(forecast.days_to_warning(), None);
    assert_eq!(forecast.days_to_critical(), None);
    assert_eq!(forecast.days_to_exhaustion(), None);
    assert_eq!(forecast.growth_pattern, GrowthPattern::Stable);
    assert_eq!(forecast.priority, Priority::Low);
    assert_eq!(forecast.recommended_capacity_gb, None);
    assert_eq!(
        forecast.recommendation,
        "LOW: N/A days to 80% capacity. Monitor quarterly."
    );
}

#[test]
fn test_declining_usage() {
    let input = RepositoryInput::new(
        snapshot("repo-down", 1000.0, 420.0),
        history(60, |i| 600.0 - 3.0 * i as f64),
    );
    let forecast = assembler()
        .assemble(&input, as_of())
        .unwrap()
        .into_forecast()
        .unwrap();

    assert_eq!(forecast.growth_pattern, GrowthPattern::Declining);
    assert_eq!(forecast.days_to_warning(), None);
    assert_eq!(forecast.days_to_exhaustion(), None);
    assert_eq!(forecast.priority, Priority::Low);
    assert_eq!(
        forecast.recommendation,
        "Capacity declining at 3.0 GB/day. Monitor for stabilization."
    );
}

#[test]
fn test_improving_dedup_slows_growth() {
    let mut input = linear_input("repo-dedup");
    for (i, obs) in input.history.iter_mut().enumerate() {
        obs.dedup_ratio = Some(if i < 30 { 2.0 } else { 3.0 });
    }

    let forecast = assembler()
        .assemble(&input, as_of())
        .unwrap()
        .into_forecast()
        .unwrap();

    assert_eq!(forecast.dedup_trend.classification, DedupClassification::Improving);
    assert!(forecast.dedup_adjustment_applied);
    assert!(forecast.quality_flags.dedup_adjustment);
    assert_eq!(forecast.current_dedup_ratio, Some(3.0));
    assert_relative_eq!(forecast.growth_rate, 4.5, epsilon = 1e-9);
    // 4.5·x + 400 = 800 at x ≈ 88.9, i.e. 28.9 days after day 60
    assert_eq!(forecast.days_to_warning(), Some(28));
    assert_eq!(forecast.priority, Priority::High);
}

#[test]
fn test_threshold_already_exceeded() {
    let input = RepositoryInput::new(
        snapshot("repo-full", 800.0, 700.0),
        history(60, |i| 400.0 + 5.0 * i as f64),
    );
    let forecast = assembler()
        .assemble(&input, as_of())
        .unwrap()
        .into_forecast()
        .unwrap();

    assert_eq!(forecast.quality_flags.thresholds_exceeded, vec![0.8]);
    assert_eq!(forecast.days_to_warning(), None);
    assert_eq!(forecast.days_to_critical(), Some(4));
    assert_eq!(forecast.days_to_exhaustion(), Some(20));
    assert_eq!(forecast.priority, Priority::Low);
}

#[test]
fn test_accelerating_growth() {
    let input = RepositoryInput::new(
        snapshot("repo-accel", 5000.0, 0.5 * 3600.0 + 2.0 * 60.0 + 100.0),
        history(60, |i| {
            let d = i as f64;
            0.5 * d * d + 2.0 * d + 100.0 + if i % 2 == 0 { 2.0 } else { -2.0 }
        }),
    );
    let forecast = assembler()
        .assemble(&input, as_of())
        .unwrap()
        .into_forecast()
        .unwrap();

    assert_eq!(forecast.model.kind, ModelKind::Quadratic);
    assert_eq!(forecast.growth_pattern, GrowthPattern::Quadratic);
    assert!(forecast.acceleration > 0.4);
    assert!(forecast.days_to_warning().is_some());
}

#[test]
fn test_noise_free_acceleration() {
    let curve = |d: f64| 0.2 * d * d + 2.0 * d + 100.0;
    let input = RepositoryInput::new(
        snapshot("repo-curve", 2000.0, curve(60.0)),
        history(60, |i| curve(i as f64)),
    );
    let forecast = assembler()
        .assemble(&input, as_of())
        .unwrap()
        .into_forecast()
        .unwrap();

    assert_eq!(forecast.model.kind, ModelKind::Quadratic);
    assert_eq!(forecast.growth_pattern, GrowthPattern::Quadratic);
    assert_relative_eq!(forecast.acceleration, 0.2, epsilon = 1e-6);
    // 0.2x² + 2x + 100 = 1600 at x ≈ 81.7, i.e. 21.7 days after day 60
    assert_eq!(forecast.days_to_warning(), Some(21));
    assert_eq!(forecast.confidence.level, ConfidenceLevel::High);
    assert_eq!(forecast.priority, Priority::High);
}

#[test]
fn test_invalid_capacity_is_an_error() {
    let input = RepositoryInput::new(snapshot("repo-bad", 0.0, 10.0), history(30, |_| 10.0));
    assert!(assembler().assemble(&input, as_of()).is_err());
}

#[test]
fn test_batch_isolates_failures() {
    let inputs = vec![
        linear_input("repo-a"),
        RepositoryInput::new(snapshot("repo-bad", -5.0, 10.0), history(30, |_| 10.0)),
        RepositoryInput::new(snapshot("repo-short", 1000.0, 100.0), history(3, |_| 100.0)),
        linear_input("repo-b"),
    ];

    let report = assembler().forecast_all(&inputs, as_of());

    let ids: Vec<&str> = report
        .forecasts
        .iter()
        .map(|f| f.repository_id.as_str())
        .collect();
    assert_eq!(ids, vec!["repo-a", "repo-b"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].repository_id, "repo-bad");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].repository_id, "repo-short");
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = ForecastConfig::default();
    config.priority.urgent_days = 40;
    assert!(ForecastAssembler::new(config).is_err());
}
